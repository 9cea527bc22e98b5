use serde::{Deserialize, Serialize};

use crate::error::{GeodesyError, Result};
use crate::geo::{destination_point, GeoPoint};

/// Corrects a magnetic bearing by the local declination.
///
/// East declination is positive. The sum is reduced into [0, 360) with a
/// single Euclidean remainder.
pub fn true_bearing(magnetic_bearing_deg: f64, declination_deg: f64) -> Result<f64> {
    if !magnetic_bearing_deg.is_finite() {
        return Err(GeodesyError::invalid(
            "magnetic_bearing",
            magnetic_bearing_deg,
            "must be finite",
        ));
    }
    if !declination_deg.is_finite() {
        return Err(GeodesyError::invalid("declination", declination_deg, "must be finite"));
    }

    let bearing = (magnetic_bearing_deg + declination_deg).rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    Ok(if bearing >= 360.0 { 0.0 } else { bearing })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub origin: GeoPoint,
    pub magnetic_bearing: f64,
    pub declination: f64,
    pub true_bearing: f64,
    pub distance_km: f64,
    pub target: GeoPoint,
}

/// Projects `distance_km` from `origin` along a magnetic bearing.
pub fn project(
    origin: GeoPoint,
    magnetic_bearing_deg: f64,
    declination_deg: f64,
    distance_km: f64,
) -> Result<ProjectionResult> {
    let true_bearing = true_bearing(magnetic_bearing_deg, declination_deg)?;
    let target = destination_point(origin, true_bearing, distance_km)?;

    Ok(ProjectionResult {
        origin,
        magnetic_bearing: magnetic_bearing_deg,
        declination: declination_deg,
        true_bearing,
        distance_km,
        target,
    })
}
