//! Great-circle helpers shared by check-in geofencing and matching.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Haversine distance to `other` in meters.
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        haversine_meters(*self, *other)
    }
}

pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    EARTH_RADIUS_METERS * c
}

/// True when `point` lies within `radius_meters` of `site`. A negative or non-finite radius
/// never matches.
pub fn is_location_near(point: GeoPoint, site: GeoPoint, radius_meters: f64) -> bool {
    if !radius_meters.is_finite() || radius_meters < 0.0 {
        return false;
    }
    haversine_meters(point, site) <= radius_meters
}
