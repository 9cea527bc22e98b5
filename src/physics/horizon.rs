use serde::{Deserialize, Serialize};

use crate::error::{GeodesyError, Result};
use crate::geo::{km_to_nm, EARTH_RADIUS_KM};

/// Distance to the sea-level horizon for an eye at `height_m` above it.
///
/// d = sqrt(2 R h + h²), both terms in kilometres. No refraction term.
pub fn horizon_distance(height_m: f64) -> Result<f64> {
    if !height_m.is_finite() || height_m < 0.0 {
        return Err(GeodesyError::invalid(
            "height_m",
            height_m,
            "height above sea level cannot be negative",
        ));
    }
    let h_km = height_m / 1000.0;
    Ok((2.0 * EARTH_RADIUS_KM * h_km + h_km * h_km).sqrt())
}

/// Maximum range at which an object of `object_height_m` can be seen.
///
/// Sum of both horizons; the two tangent rays are assumed to meet at the
/// sea surface.
pub fn visibility_distance(observer_height_m: f64, object_height_m: f64) -> Result<f64> {
    Ok(horizon_distance(observer_height_m)? + horizon_distance(object_height_m)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonResult {
    pub height_m: f64,
    pub distance_km: f64,
    pub distance_nm: f64,
}

impl HorizonResult {
    pub fn from_height(height_m: f64) -> Result<Self> {
        let distance_km = horizon_distance(height_m)?;
        Ok(Self {
            height_m,
            distance_km,
            distance_nm: km_to_nm(distance_km),
        })
    }
}

impl std::fmt::Display for HorizonResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} km ({:.2} NM)", self.distance_km, self.distance_nm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilityResult {
    pub observer: HorizonResult,
    pub object: HorizonResult,
    pub distance_km: f64,
    pub distance_nm: f64,
}

impl VisibilityResult {
    pub fn from_heights(observer_height_m: f64, object_height_m: f64) -> Result<Self> {
        let observer = HorizonResult::from_height(observer_height_m)?;
        let object = HorizonResult::from_height(object_height_m)?;
        let distance_km = observer.distance_km + object.distance_km;
        Ok(Self {
            observer,
            object,
            distance_km,
            distance_nm: km_to_nm(distance_km),
        })
    }
}

impl std::fmt::Display for VisibilityResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} km ({:.2} NM)", self.distance_km, self.distance_nm)
    }
}
