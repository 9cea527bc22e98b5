use crate::error::{GeodesyError, Result};
use crate::geo::{GeoPoint, KM_PER_DEGREE};

pub const DEFAULT_SEGMENTS: usize = 64;

/// Closed polygon ring around `center` with a radius of `radius_km`.
///
/// The radius is turned into degrees with the 111 km/degree flat
/// approximation and applied equally to latitude and longitude, so the ring
/// stretches east-west away from the equator. Downstream layers depend on
/// this shape; it is not a geodesic buffer.
///
/// Returns `segment_count + 1` vertices, the last one repeating the first.
pub fn generate_circle(center: GeoPoint, radius_km: f64, segment_count: usize) -> Result<Vec<GeoPoint>> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(GeodesyError::invalid(
            "radius_km",
            radius_km,
            "circle radius must be positive",
        ));
    }
    if segment_count < 3 {
        return Err(GeodesyError::invalid(
            "segment_count",
            segment_count as f64,
            "a polygon needs at least 3 segments",
        ));
    }

    let radius_deg = radius_km / KM_PER_DEGREE;
    let step_deg = 360.0 / segment_count as f64;

    let mut vertices: Vec<GeoPoint> = (0..segment_count)
        .map(|i| {
            let theta = (step_deg * i as f64).to_radians();
            GeoPoint {
                latitude: center.latitude + radius_deg * theta.sin(),
                longitude: center.longitude + radius_deg * theta.cos(),
            }
        })
        .collect();
    vertices.push(vertices[0]);

    Ok(vertices)
}
