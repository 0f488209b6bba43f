use foundation::color::Rgb;
use foundation::math::GeoPoint;
use serde::{Deserialize, Serialize};

use crate::point::PointRecord;

/// Identity of a cluster across recompute passes.
///
/// Derived from the centroid rounded to `precision` decimals plus the member
/// count. This is a heuristic: any change in grouping produces a new key, and
/// two unrelated clusters with the same rounded centroid and size collide.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ClusterKey {
    pub lat_e: i64,
    pub lng_e: i64,
    pub member_count: u32,
    pub precision: u8,
}

impl ClusterKey {
    /// Keys a centroid at `precision` decimals (capped at 9).
    ///
    /// Expects a finite centroid. Clustering only averages finite positions,
    /// so its keys always are; a non-finite coordinate passed here saturates
    /// (NaN becomes 0) and may collide with a real cluster.
    pub fn from_centroid(centroid: GeoPoint, member_count: usize, precision: u32) -> Self {
        let precision = precision.min(9);
        let scale = 10f64.powi(precision as i32);
        Self {
            lat_e: (centroid.lat * scale).round() as i64,
            lng_e: (centroid.lng * scale).round() as i64,
            member_count: u32::try_from(member_count).unwrap_or(u32::MAX),
            precision: precision as u8,
        }
    }

    /// The rounded centroid this key was derived from.
    pub fn centroid(&self) -> GeoPoint {
        let scale = 10f64.powi(self.precision as i32);
        GeoPoint::new(self.lat_e as f64 / scale, self.lng_e as f64 / scale)
    }
}

impl std::fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.centroid();
        let p = self.precision as usize;
        write!(f, "{:.p$},{:.p$}x{}", c.lat, c.lng, self.member_count)
    }
}

/// Two or more points merged for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub centroid: GeoPoint,
    /// Input indices of the members, ascending.
    pub member_indices: Vec<usize>,
    /// Member texts in input order.
    pub member_texts: Vec<String>,
    pub color: Rgb,
    pub key: ClusterKey,
}

impl Cluster {
    pub fn member_count(&self) -> usize {
        self.member_indices.len()
    }

    /// `"{n} memories"` followed by one bullet line per member.
    pub fn label_text(&self) -> String {
        let mut out = format!("{} memories", self.member_count());
        for text in &self.member_texts {
            out.push_str("\n• ");
            out.push_str(text);
        }
        out
    }
}

/// One element of a level-of-detail partition.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEntity {
    Single { index: usize, record: PointRecord },
    Cluster(Cluster),
}

impl DisplayEntity {
    pub fn is_cluster(&self) -> bool {
        matches!(self, DisplayEntity::Cluster(_))
    }

    pub fn position(&self) -> GeoPoint {
        match self {
            DisplayEntity::Single { record, .. } => record.position(),
            DisplayEntity::Cluster(c) => c.centroid,
        }
    }

    pub fn member_count(&self) -> usize {
        match self {
            DisplayEntity::Single { .. } => 1,
            DisplayEntity::Cluster(c) => c.member_count(),
        }
    }

    pub fn key(&self) -> Option<ClusterKey> {
        match self {
            DisplayEntity::Single { .. } => None,
            DisplayEntity::Cluster(c) => Some(c.key),
        }
    }

    pub fn label_text(&self) -> String {
        match self {
            DisplayEntity::Single { record, .. } => record.text.clone(),
            DisplayEntity::Cluster(c) => c.label_text(),
        }
    }

    /// Input indices covered by this entity.
    pub fn indices(&self) -> Vec<usize> {
        match self {
            DisplayEntity::Single { index, .. } => vec![*index],
            DisplayEntity::Cluster(c) => c.member_indices.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cluster, ClusterKey};
    use foundation::color::Rgb;
    use foundation::math::GeoPoint;

    #[test]
    fn key_rounds_centroid() {
        let a = ClusterKey::from_centroid(GeoPoint::new(40.70504, -74.00496), 2, 4);
        let b = ClusterKey::from_centroid(GeoPoint::new(40.70496, -74.00504), 2, 4);
        assert_eq!(a, b);
        assert_eq!(a.lat_e, 407_050);
        assert_eq!(a.lng_e, -740_050);
    }

    #[test]
    fn key_distinguishes_member_count() {
        let c = GeoPoint::new(1.0, 2.0);
        assert_ne!(
            ClusterKey::from_centroid(c, 2, 4),
            ClusterKey::from_centroid(c, 3, 4)
        );
    }

    #[test]
    fn key_display_uses_precision() {
        let k = ClusterKey::from_centroid(GeoPoint::new(40.705, -74.005), 2, 3);
        assert_eq!(k.to_string(), "40.705,-74.005x2");
    }

    #[test]
    fn nan_centroid_still_yields_a_key() {
        let k = ClusterKey::from_centroid(GeoPoint::new(f64::NAN, 1.0), 2, 4);
        assert_eq!(k.lat_e, 0);
    }

    #[test]
    fn cluster_label_lists_members() {
        let c = Cluster {
            centroid: GeoPoint::new(0.0, 0.0),
            member_indices: vec![0, 2],
            member_texts: vec!["a".into(), "c".into()],
            color: Rgb::new(0, 0, 0),
            key: ClusterKey::from_centroid(GeoPoint::new(0.0, 0.0), 2, 4),
        };
        assert_eq!(c.label_text(), "2 memories\n• a\n• c");
    }
}
