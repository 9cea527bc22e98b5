use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{GeodesyError, Result};

/// Mean Earth radius of the spherical model, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const NM_TO_KM: f64 = 1.852;

/// Flat approximation used by the circle generator: 1 degree ~ 111 km.
pub const KM_PER_DEGREE: f64 = 111.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Abrolhos archipelago (BA), the default reference position.
    pub const ABROLHOS: GeoPoint = GeoPoint {
        latitude: -17.9647,
        longitude: -38.6941,
    };

    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Rejects non-finite or out-of-range coordinates.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeodesyError::invalid(
                "latitude",
                self.latitude,
                "must lie within [-90, 90]",
            ));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeodesyError::invalid(
                "longitude",
                self.longitude,
                "must lie within [-180, 180]",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}°, {:.6}°", self.latitude, self.longitude)
    }
}

pub fn nm_to_km(distance_nm: f64) -> f64 {
    distance_nm * NM_TO_KM
}

pub fn km_to_nm(distance_km: f64) -> f64 {
    distance_km / NM_TO_KM
}

/// Great-circle direct problem on the sphere.
///
/// The resulting longitude is not wrapped, so a projection across the
/// antimeridian may return a value outside [-180, 180].
pub fn destination_point(origin: GeoPoint, true_bearing_deg: f64, distance_km: f64) -> Result<GeoPoint> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(GeodesyError::invalid(
            "distance_km",
            distance_km,
            "must be a finite, non-negative distance",
        ));
    }
    if !true_bearing_deg.is_finite() {
        return Err(GeodesyError::invalid("true_bearing", true_bearing_deg, "must be finite"));
    }

    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();
    let brng = true_bearing_deg.to_radians();
    let delta = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * brng.cos()).asin();
    let lon2 = lon1
        + (brng.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    Ok(GeoPoint {
        latitude: lat2.to_degrees(),
        longitude: lon2.to_degrees(),
    })
}

/// Haversine distance between two points, in kilometres.
pub fn great_circle_distance_km(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlat = (p2.latitude - p1.latitude).to_radians();
    let dlon = (p2.longitude - p1.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Initial true bearing from `p1` towards `p2`, in [0, 360).
pub fn initial_bearing(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlon = (p2.longitude - p1.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let bearing = y.atan2(x) * (180.0 / PI);

    bearing.rem_euclid(360.0)
}
