use crate::config::WallConfig;

/// Steepness used when a caller supplies zero, negative or NaN.
pub const MIN_CURVE_STEEPNESS: f64 = 0.1;

/// Maps a camera altitude to the clustering radius in kilometers.
///
/// - At or below `min_clustering_altitude` the radius is 0 (no clustering).
/// - Between min and max the normalized altitude is bent by
///   `normalized^(1 / curve_steepness)`, which leaves near range mostly
///   unclustered and ramps up toward the far end.
/// - Beyond `max_clustering_altitude` the radius saturates at `max_distance_km`.
///
/// Never negative, never NaN, and monotone non-decreasing in `altitude`. A
/// degenerate range (`max <= min` or non-finite bounds) yields 0.
pub fn merge_distance_km(altitude: f64, config: &WallConfig) -> f64 {
    let min = config.min_clustering_altitude;
    let max = config.max_clustering_altitude;

    if !min.is_finite() || !max.is_finite() || max <= min {
        return 0.0;
    }
    // Also rejects NaN altitudes.
    if !(altitude > min) {
        return 0.0;
    }

    let max_km = if config.max_distance_km.is_finite() {
        config.max_distance_km.max(0.0)
    } else {
        0.0
    };
    let steepness = if config.curve_steepness >= MIN_CURVE_STEEPNESS {
        config.curve_steepness
    } else {
        MIN_CURVE_STEEPNESS
    };

    let normalized = ((altitude - min) / (max - min)).clamp(0.0, 1.0);
    normalized.powf(1.0 / steepness) * max_km
}
