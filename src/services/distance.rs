use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Mean Earth radius used for every delivery distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Great-circle distance between two points in kilometres (haversine formula).
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // rounding can push `a` a hair outside [0, 1], where asin/sqrt return NaN
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    c * EARTH_RADIUS_KM
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_YORK: Coordinates = Coordinates::new(40.7128, -74.0060);
    const LONDON: Coordinates = Coordinates::new(51.5074, -0.1278);

    #[test]
    fn same_point_is_zero() {
        assert!(haversine_km(NEW_YORK, NEW_YORK).abs() < 1e-9);
    }

    #[test]
    fn new_york_to_london() {
        let km = haversine_km(NEW_YORK, LONDON);
        assert!((km - 5570.2).abs() < 1.0, "got {km}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let km = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 0.0));
        assert!((km - 111.195).abs() < 0.01, "got {km}");
    }

    #[test]
    fn antipodes_do_not_produce_nan() {
        let km = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0));
        assert!((km - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn symmetric() {
        assert_eq!(haversine_km(NEW_YORK, LONDON), haversine_km(LONDON, NEW_YORK));
    }
}
