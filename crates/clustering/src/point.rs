use foundation::math::GeoPoint;
use serde::{Deserialize, Serialize};

/// A geo-tagged note as delivered by the ingestion collaborator.
///
/// Coordinates are not validated here: out-of-range or NaN values simply never
/// merge with anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub lat: f64,
    pub lng: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl PointRecord {
    pub fn new(lat: f64, lng: f64, text: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            text: text.into(),
            color: None,
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Parses the JSON array served by the memories endpoint.
pub fn parse_points(json: &str) -> Result<Vec<PointRecord>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::{PointRecord, parse_points};

    #[test]
    fn parses_records_with_and_without_color() {
        let pts = parse_points(
            r##"[
                {"lat": 40.7, "lng": -74.0, "text": "a"},
                {"lat": 35.68, "lng": 139.69, "text": "b", "color": "#00ff99", "id": 7}
            ]"##,
        )
        .unwrap();
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[0], PointRecord::new(40.7, -74.0, "a"));
        assert_eq!(pts[1].color.as_deref(), Some("#00ff99"));
    }

    #[test]
    fn serializes_without_absent_color() {
        let json = serde_json::to_string(&PointRecord::new(1.0, 2.0, "x")).unwrap();
        assert_eq!(json, r#"{"lat":1.0,"lng":2.0,"text":"x"}"#);
    }
}
