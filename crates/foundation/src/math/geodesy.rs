/// Mean Earth radius used for great-circle distances (kilometers).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geographic coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Great-circle distance on a sphere of radius [`EARTH_RADIUS_KM`].
///
/// NaN in either input yields NaN. Callers comparing against a limit should go
/// through [`within_km`], which treats NaN as "too far".
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let s_lat = (dlat * 0.5).sin();
    let s_lng = (dlng * 0.5).sin();
    let h = s_lat * s_lat + lat1.cos() * lat2.cos() * s_lng * s_lng;
    if h.is_nan() {
        return f64::NAN;
    }

    // Rounding can push `h` slightly above 1 near antipodes.
    2.0 * EARTH_RADIUS_KM * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Returns `true` iff the great-circle distance is at most `limit_km`.
///
/// Any NaN (coordinates or limit) compares false.
pub fn within_km(a: GeoPoint, b: GeoPoint, limit_km: f64) -> bool {
    haversine_km(a, b) <= limit_km
}

/// Unweighted arithmetic mean of raw coordinates.
///
/// Returns `None` for an empty slice.
pub fn mean_point(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat_sum, lng_sum) = points
        .iter()
        .fold((0.0, 0.0), |(la, ln), p| (la + p.lat, ln + p.lng));
    Some(GeoPoint::new(lat_sum / n, lng_sum / n))
}

#[cfg(test)]
mod tests {
    use super::{GeoPoint, haversine_km, mean_point, within_km};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = GeoPoint::new(40.7128, -74.006);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(40.70, -74.00);
        let b = GeoPoint::new(35.68, 139.69);
        assert_close(haversine_km(a, b), haversine_km(b, a), 1e-9);
    }

    #[test]
    fn quarter_meridian_matches_sphere() {
        let equator = GeoPoint::new(0.0, 0.0);
        let pole = GeoPoint::new(90.0, 0.0);
        let expected = super::EARTH_RADIUS_KM * std::f64::consts::FRAC_PI_2;
        assert_close(haversine_km(equator, pole), expected, 1e-6);
    }

    #[test]
    fn antipodes_do_not_produce_nan() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 180.0);
        let d = haversine_km(a, b);
        assert!(d.is_finite());
        assert_close(d, super::EARTH_RADIUS_KM * std::f64::consts::PI, 1e-6);
    }

    #[test]
    fn nyc_neighbours_are_about_1_4_km_apart() {
        let a = GeoPoint::new(40.70, -74.00);
        let b = GeoPoint::new(40.71, -74.01);
        let d = haversine_km(a, b);
        assert!(d > 1.0 && d < 1.6, "got {d}");
    }

    #[test]
    fn grows_with_angular_separation() {
        let origin = GeoPoint::new(10.0, 20.0);
        let mut last = 0.0;
        for step in 1..=18 {
            let d = haversine_km(origin, GeoPoint::new(10.0, 20.0 + step as f64 * 5.0));
            assert!(d > last);
            last = d;
        }
    }

    #[test]
    fn nan_is_never_within_limit() {
        let a = GeoPoint::new(f64::NAN, 0.0);
        let b = GeoPoint::new(0.0, 0.0);
        assert!(haversine_km(a, b).is_nan());
        assert!(!within_km(a, b, f64::INFINITY));
        assert!(!within_km(b, b, f64::NAN));
    }

    #[test]
    fn mean_point_averages_raw_coordinates() {
        let m = mean_point(&[GeoPoint::new(0.0, 10.0), GeoPoint::new(2.0, 20.0)]).unwrap();
        assert_eq!(m, GeoPoint::new(1.0, 15.0));
        assert!(mean_point(&[]).is_none());
    }
}
