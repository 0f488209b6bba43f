use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::merge_distance::MIN_CURVE_STEEPNESS;

/// Base marker size for lone points.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SingleSize {
    pub base_radius: f64,
    pub base_altitude: f64,
}

impl Default for SingleSize {
    fn default() -> Self {
        Self {
            base_radius: 0.08,
            base_altitude: 0.015,
        }
    }
}

/// Base marker size for clusters and how it grows with member count.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterSize {
    pub base_radius: f64,
    pub base_altitude: f64,
    /// Growth per additional member.
    pub size_scaling: f64,
    /// Upper bound on the member-count factor.
    pub max_scaling: f64,
}

impl Default for ClusterSize {
    fn default() -> Self {
        Self {
            base_radius: 0.12,
            base_altitude: 0.02,
            size_scaling: 0.05,
            max_scaling: 3.0,
        }
    }
}

/// Every tunable of the LOD engine.
///
/// Deserializes from camelCase JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WallConfig {
    /// At or below this altitude nothing clusters.
    pub min_clustering_altitude: f64,
    /// Altitude at which the merge distance reaches `max_distance_km`.
    pub max_clustering_altitude: f64,
    pub max_distance_km: f64,
    /// Larger values push aggressive clustering toward high altitudes.
    pub curve_steepness: f64,
    /// At or above this altitude every point collapses into one cluster.
    pub full_collapse_altitude: f64,
    pub single_size: SingleSize,
    pub cluster_size: ClusterSize,
    /// Member count at which cluster color reaches `large_cluster_color`.
    pub saturation_count: u32,
    pub small_cluster_color: String,
    pub large_cluster_color: String,
    /// Pin color for records that carry none.
    pub default_point_color: String,
    /// Altitude at which markers are drawn at their base size.
    pub visual_reference_altitude: f64,
    /// Lower bound on the altitude factor for cluster heights.
    pub cluster_height_floor: f64,
    /// Minimum altitude change that triggers a recompute.
    pub altitude_epsilon: f64,
    /// Decimal places kept when deriving cluster keys.
    pub enrichment_key_precision: u32,
}

pub const DEFAULT_SMALL_CLUSTER_COLOR: &str = "#ffd166";
pub const DEFAULT_LARGE_CLUSTER_COLOR: &str = "#ef476f";
pub const DEFAULT_POINT_COLOR: &str = "#ff0000";

const MAX_KEY_PRECISION: u32 = 9;

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            min_clustering_altitude: 0.5,
            max_clustering_altitude: 3.0,
            max_distance_km: 2000.0,
            curve_steepness: 2.0,
            full_collapse_altitude: 4.5,
            single_size: SingleSize::default(),
            cluster_size: ClusterSize::default(),
            saturation_count: 100,
            small_cluster_color: DEFAULT_SMALL_CLUSTER_COLOR.to_string(),
            large_cluster_color: DEFAULT_LARGE_CLUSTER_COLOR.to_string(),
            default_point_color: DEFAULT_POINT_COLOR.to_string(),
            visual_reference_altitude: 1.0,
            cluster_height_floor: 0.5,
            altitude_epsilon: 0.01,
            enrichment_key_precision: 4,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "failed to read config {path}: {message}")
            }
            ConfigError::Parse(err) => write!(f, "invalid config json: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { .. } => None,
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl WallConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Parse)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    /// Clamps values that would otherwise produce NaN or negative output.
    ///
    /// Degenerate clustering ranges are left alone: the merge-distance mapper
    /// already maps them to "no clustering".
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !(self.curve_steepness >= MIN_CURVE_STEEPNESS) {
            self.curve_steepness = MIN_CURVE_STEEPNESS;
        }
        self.max_distance_km = non_negative_or(self.max_distance_km, 0.0);
        self.saturation_count = self.saturation_count.max(1);
        if !(self.visual_reference_altitude > 0.0 && self.visual_reference_altitude.is_finite()) {
            self.visual_reference_altitude = defaults.visual_reference_altitude;
        }
        if !(self.cluster_height_floor > 0.0 && self.cluster_height_floor.is_finite()) {
            self.cluster_height_floor = defaults.cluster_height_floor;
        }
        self.altitude_epsilon = non_negative_or(self.altitude_epsilon, defaults.altitude_epsilon);
        self.enrichment_key_precision = self.enrichment_key_precision.min(MAX_KEY_PRECISION);

        self.single_size.base_radius = non_negative_or(
            self.single_size.base_radius,
            defaults.single_size.base_radius,
        );
        self.single_size.base_altitude = non_negative_or(
            self.single_size.base_altitude,
            defaults.single_size.base_altitude,
        );
        self.cluster_size.base_radius = non_negative_or(
            self.cluster_size.base_radius,
            defaults.cluster_size.base_radius,
        );
        self.cluster_size.base_altitude = non_negative_or(
            self.cluster_size.base_altitude,
            defaults.cluster_size.base_altitude,
        );
        self.cluster_size.size_scaling = non_negative_or(self.cluster_size.size_scaling, 0.0);
        if !(self.cluster_size.max_scaling >= 1.0) {
            self.cluster_size.max_scaling = 1.0;
        }

        self
    }
}

fn non_negative_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { fallback }
}
