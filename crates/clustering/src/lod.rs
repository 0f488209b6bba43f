use tracing::debug;

use crate::config::WallConfig;
use crate::engine::cluster_points;
use crate::entity::{ClusterKey, DisplayEntity};
use crate::merge_distance::merge_distance_km;
use crate::point::PointRecord;
use crate::snapshot::{RenderEntity, Snapshot};
use crate::visuals::{Palette, VisualParams, visual_params};

/// Sanitized configuration plus its parsed palette.
///
/// One recompute pass is `merge_distance_km` → `cluster` → `visual_params` for
/// every entity, bundled by [`Lod::build_snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct Lod {
    config: WallConfig,
    palette: Palette,
}

impl Lod {
    pub fn new(config: WallConfig) -> Self {
        let config = config.sanitized();
        let palette = Palette::from_config(&config);
        Self { config, palette }
    }

    pub fn config(&self) -> &WallConfig {
        &self.config
    }

    pub fn merge_distance_km(&self, altitude: f64) -> f64 {
        merge_distance_km(altitude, &self.config)
    }

    pub fn cluster(
        &self,
        points: &[PointRecord],
        merge_distance_km: f64,
        altitude: f64,
    ) -> Vec<DisplayEntity> {
        cluster_points(points, merge_distance_km, altitude, &self.config, &self.palette)
    }

    pub fn visual_params(&self, entity: &DisplayEntity, altitude: f64) -> VisualParams {
        visual_params(entity, altitude, &self.config, &self.palette)
    }

    /// Runs one full pass over the original records.
    ///
    /// `summary_for` supplies cached summaries; clusters whose key has one get
    /// an augmented label.
    pub fn build_snapshot<'a>(
        &self,
        pass: u64,
        points: &[PointRecord],
        altitude: f64,
        summary_for: impl Fn(&ClusterKey) -> Option<&'a str>,
    ) -> Snapshot {
        let merge_km = self.merge_distance_km(altitude);
        let entities: Vec<RenderEntity> = self
            .cluster(points, merge_km, altitude)
            .iter()
            .map(|entity| {
                let mut render = RenderEntity::new(entity, self.visual_params(entity, altitude));
                if let Some(key) = entity.key()
                    && let Some(summary) = summary_for(&key)
                {
                    render.augment(summary);
                }
                render
            })
            .collect();

        let snapshot = Snapshot {
            pass,
            altitude,
            merge_distance_km: merge_km,
            entities,
        };
        debug!(
            pass,
            altitude,
            merge_km,
            points = points.len(),
            clusters = snapshot.cluster_count(),
            singles = snapshot.single_count(),
            "lod pass"
        );
        snapshot
    }
}

impl Default for Lod {
    fn default() -> Self {
        Self::new(WallConfig::default())
    }
}
