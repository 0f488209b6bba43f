use foundation::color::Rgb;
use tracing::warn;

use crate::config::{
    DEFAULT_LARGE_CLUSTER_COLOR, DEFAULT_POINT_COLOR, DEFAULT_SMALL_CLUSTER_COLOR, WallConfig,
};
use crate::entity::DisplayEntity;

/// Render parameters for one entity at one altitude.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VisualParams {
    pub radius: f64,
    pub height_above_surface: f64,
    pub color: Rgb,
}

/// Configured colors, parsed once.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Palette {
    pub small_cluster: Rgb,
    pub large_cluster: Rgb,
    pub default_point: Rgb,
}

impl Palette {
    /// Unparsable colors fall back to the built-in defaults.
    pub fn from_config(config: &WallConfig) -> Self {
        Self {
            small_cluster: parse_or(&config.small_cluster_color, DEFAULT_SMALL_CLUSTER_COLOR),
            large_cluster: parse_or(&config.large_cluster_color, DEFAULT_LARGE_CLUSTER_COLOR),
            default_point: parse_or(&config.default_point_color, DEFAULT_POINT_COLOR),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_config(&WallConfig::default())
    }
}

fn parse_or(value: &str, fallback: &str) -> Rgb {
    match Rgb::parse_hex(value) {
        Ok(c) => c,
        Err(err) => {
            warn!(value, %err, "unusable color, using {fallback}");
            Rgb::parse_hex(fallback).unwrap_or(Rgb::new(255, 0, 0))
        }
    }
}

/// Altitude-derived growth factor, never below `floor`.
///
/// NaN or negative altitudes resolve to `floor`.
pub fn altitude_scale(altitude: f64, reference_altitude: f64, floor: f64) -> f64 {
    let reference = if reference_altitude > 0.0 {
        reference_altitude
    } else {
        1.0
    };
    let ratio = altitude / reference;
    if ratio.is_nan() { floor } else { ratio.max(floor) }
}

/// `min(1 + (count - 1) * size_scaling, max_scaling)`.
pub fn cluster_size_factor(member_count: usize, config: &WallConfig) -> f64 {
    let extra = member_count.saturating_sub(1) as f64;
    (1.0 + extra * config.cluster_size.size_scaling).min(config.cluster_size.max_scaling)
}

/// Gradient position of a cluster color.
///
/// `count <= 1` sits exactly on the small-cluster color; from there the
/// fraction is `min(count, saturation) / saturation`, which reaches 1 exactly
/// at the saturation count.
pub fn cluster_color_fraction(member_count: usize, saturation_count: u32) -> f64 {
    if member_count <= 1 {
        return 0.0;
    }
    let saturation = saturation_count.max(1) as usize;
    member_count.min(saturation) as f64 / saturation as f64
}

pub fn cluster_color(member_count: usize, saturation_count: u32, palette: &Palette) -> Rgb {
    palette.small_cluster.lerp(
        palette.large_cluster,
        cluster_color_fraction(member_count, saturation_count),
    )
}

/// Color for a lone point: its own color if parsable, else the default pin color.
pub fn point_color(color: Option<&str>, palette: &Palette) -> Rgb {
    color
        .and_then(|c| Rgb::parse_hex(c).ok())
        .unwrap_or(palette.default_point)
}

/// Pure per-frame visual calculation.
///
/// Singles never shrink below their base size as the camera pulls back.
/// Clusters additionally grow with member count, capped at `max_scaling`; their
/// height uses the softer `cluster_height_floor`.
pub fn visual_params(
    entity: &DisplayEntity,
    altitude: f64,
    config: &WallConfig,
    palette: &Palette,
) -> VisualParams {
    let reference = config.visual_reference_altitude;
    match entity {
        DisplayEntity::Single { record, .. } => {
            let scale = altitude_scale(altitude, reference, 1.0);
            VisualParams {
                radius: config.single_size.base_radius * scale,
                height_above_surface: config.single_size.base_altitude * scale,
                color: point_color(record.color.as_deref(), palette),
            }
        }
        DisplayEntity::Cluster(cluster) => {
            let size = cluster_size_factor(cluster.member_count(), config);
            let radius_scale = altitude_scale(altitude, reference, 1.0);
            let height_scale = altitude_scale(altitude, reference, config.cluster_height_floor);
            VisualParams {
                radius: config.cluster_size.base_radius * size * radius_scale,
                height_above_surface: config.cluster_size.base_altitude * size * height_scale,
                color: cluster.color,
            }
        }
    }
}
