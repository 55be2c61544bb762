//! Geographic primitives: positions, great-circle distance, and the local
//! distance post-filter applied to query results before reconciliation.

use serde::{Deserialize, Serialize};

/// Mean Earth radius (IUGG), kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Equatorial circumference (WGS-84), kilometres.
pub const EARTH_CIRCUMFERENCE_KM: f64 = 40075.016686;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

// ---------------------------------------------------------------------------
// Great-circle distance
// ---------------------------------------------------------------------------

/// Haversine distance between two points, in kilometres.
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box spanning `radius_km` in every direction from
/// `center`, as `(south_west, north_east)`. Longitude degrees shrink with
/// latitude, so the east/west extent is widened by `1 / cos(lat)`.
pub fn bounds_around(center: LatLng, radius_km: f64) -> (LatLng, LatLng) {
    let d_lat = radius_km / EARTH_CIRCUMFERENCE_KM * 360.0;
    let d_lng = d_lat / center.lat.to_radians().cos();
    (
        LatLng::new(center.lat - d_lat, center.lng - d_lng),
        LatLng::new(center.lat + d_lat, center.lng + d_lng),
    )
}

// ---------------------------------------------------------------------------
// Distance guard
// ---------------------------------------------------------------------------

/// Drop items whose great-circle distance from `center` exceeds `radius_km`.
///
/// The remote query's notion of "near" may be coarser than the exact radius
/// promised to the user (bounding-box pre-filters are common), so this runs
/// on every accepted response before reconciliation.
pub fn retain_within<T, F>(items: Vec<T>, center: LatLng, radius_km: f64, location: F) -> Vec<T>
where
    F: Fn(&T) -> LatLng,
{
    items
        .into_iter()
        .filter(|item| haversine_km(center, location(item)) <= radius_km)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, retain_within, LatLng};

    #[test]
    fn haversine_zero_for_identical_points() {
        let p = LatLng::new(52.516267, 13.322455);
        assert!(haversine_km(p, p) < 1e-9);
    }

    #[test]
    fn haversine_matches_known_distance() {
        // Berlin Zoologischer Garten → Alexanderplatz, roughly 6.7 km.
        let zoo = LatLng::new(52.5067, 13.3326);
        let alex = LatLng::new(52.5219, 13.4132);
        let d = haversine_km(zoo, alex);
        assert!(d > 6.0 && d < 7.5, "unexpected distance: {d}");
    }

    #[test]
    fn retain_within_drops_points_beyond_radius() {
        let center = LatLng::new(52.516, 13.322);
        // ~0.055 km per 0.0005 deg of latitude; the far point is well past 5 km.
        let near = LatLng::new(52.52, 13.322);
        let far = LatLng::new(52.58, 13.322);
        let kept = retain_within(vec![near, far], center, 5.0, |p| *p);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0], near);
    }

    #[test]
    fn bounds_around_span_the_radius_in_each_direction() {
        let center = LatLng::new(52.516, 13.322);
        let (sw, ne) = super::bounds_around(center, 8.0);
        assert!(sw.lat < center.lat && center.lat < ne.lat);
        assert!(sw.lng < center.lng && center.lng < ne.lng);
        // 8 km of latitude is ~0.0719 degrees.
        assert!((ne.lat - center.lat - 0.0719).abs() < 1e-3);
        // Longitude span is wider than the latitude span at this latitude.
        assert!(ne.lng - center.lng > ne.lat - center.lat);
        // Edge midpoints sit at the requested radius.
        let east = LatLng::new(center.lat, ne.lng);
        assert!((haversine_km(center, east) - 8.0).abs() < 0.1);
    }
}
