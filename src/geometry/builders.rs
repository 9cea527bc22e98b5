use tracing::debug;

use crate::error::Result;
use crate::geo::GeoPoint;
use crate::geometry::circle::{generate_circle, DEFAULT_SEGMENTS};
use crate::geometry::feature::{FeatureBatch, FeatureKind, FeatureLayer, GeometryFeature, GeometryType};
use crate::physics::bearing::project;
use crate::physics::horizon::{HorizonResult, VisibilityResult};
use crate::rings::{build_rings, RingOptions};

// Every builder computes all of its geometry before assembling records, so
// an error never leaves a partial batch behind.

/// Horizon circle around the observer plus the observer marker.
pub fn horizon_features(observer: GeoPoint, height_m: f64) -> Result<FeatureBatch> {
    observer.validate()?;
    let horizon = HorizonResult::from_height(height_m)?;
    let circle = generate_circle(observer, horizon.distance_km, DEFAULT_SEGMENTS)?;

    let polygon = GeometryFeature::polygon(FeatureKind::Horizon, circle)
        .with("kind", FeatureKind::Horizon.as_str())
        .with("distance_km", horizon.distance_km)
        .with("distance_nm", horizon.distance_nm)
        .with("observer_height_m", height_m);

    debug!("Horizon for {} m at {}: {}", height_m, observer, horizon);

    Ok(FeatureBatch::new(vec![
        FeatureLayer::new(
            format!("Horizon ({:.2} km)", horizon.distance_km),
            GeometryType::Polygon,
            vec![polygon],
        ),
        FeatureLayer::new(
            "Observer",
            GeometryType::Point,
            vec![position_marker(FeatureKind::Observer, FeatureKind::Observer.as_str(), observer)],
        ),
    ]))
}

/// Circle of maximum range at which an object of the given height shows
/// above the horizon.
pub fn object_features(observer: GeoPoint, observer_height_m: f64, object_height_m: f64) -> Result<FeatureBatch> {
    observer.validate()?;
    let visibility = VisibilityResult::from_heights(observer_height_m, object_height_m)?;
    let circle = generate_circle(observer, visibility.distance_km, DEFAULT_SEGMENTS)?;

    let polygon = GeometryFeature::polygon(FeatureKind::ObjectVisible, circle)
        .with("kind", FeatureKind::ObjectVisible.as_str())
        .with("distance_km", visibility.distance_km)
        .with("observer_height_m", observer_height_m)
        .with("object_height_m", object_height_m);

    debug!(
        "Object of {} m visible from {} m up to {}",
        object_height_m, observer_height_m, visibility
    );

    Ok(FeatureBatch::new(vec![FeatureLayer::new(
        format!("Visible Object ({:.2} km)", visibility.distance_km),
        GeometryType::Polygon,
        vec![polygon],
    )]))
}

/// Bearing line from `origin` to the projected target, plus both end points.
pub fn projection_features(
    origin: GeoPoint,
    magnetic_bearing_deg: f64,
    declination_deg: f64,
    distance_km: f64,
) -> Result<FeatureBatch> {
    origin.validate()?;
    let projection = project(origin, magnetic_bearing_deg, declination_deg, distance_km)?;

    let line = GeometryFeature::line(FeatureKind::ProjectionLine, vec![origin, projection.target])
        .with("magnetic_bearing", magnetic_bearing_deg)
        .with("true_bearing", projection.true_bearing)
        .with("distance_km", distance_km);

    debug!(
        "Projected {} km at {:.2}° true from {} to {}",
        distance_km, projection.true_bearing, origin, projection.target
    );

    Ok(FeatureBatch::new(vec![
        FeatureLayer::new(
            format!("Projection ({:.0}° mag)", magnetic_bearing_deg),
            GeometryType::Line,
            vec![line],
        ),
        FeatureLayer::new(
            "Projection Points",
            GeometryType::Point,
            vec![
                position_marker(FeatureKind::ProjectionPoint, "origin", origin),
                position_marker(FeatureKind::ProjectionPoint, "target", projection.target),
            ],
        ),
    ]))
}

/// Range rings layer and its center marker.
pub fn ring_features(
    center: GeoPoint,
    ring_count: u32,
    interval_nm: f64,
    options: RingOptions,
) -> Result<FeatureBatch> {
    center.validate()?;
    let ring_set = build_rings(center, ring_count, interval_nm, options)?;

    let rings = ring_set
        .rings
        .into_iter()
        .map(|ring| {
            let feature = GeometryFeature::polygon(FeatureKind::Ring, ring.polygon)
                .with("ring", ring.spec.index)
                .with("distance_nm", ring.spec.distance_nm)
                .with("distance_km", ring.spec.distance_km);
            let feature = match &ring.spec.color {
                Some(color) => feature.with("color", color.hex()),
                None => feature,
            };
            match ring.spec.label {
                Some(label) => feature.with("label", label),
                None => feature,
            }
        })
        .collect();

    let center_marker = GeometryFeature::point(FeatureKind::RingCenter, center).with("kind", "center");

    Ok(FeatureBatch::new(vec![
        FeatureLayer::new(
            format!("Distance Rings ({} NM)", interval_nm),
            GeometryType::Polygon,
            rings,
        ),
        FeatureLayer::new("Ring Center", GeometryType::Point, vec![center_marker]),
    ])
    .with_labels(options.labels))
}

fn position_marker(kind: FeatureKind, tag: &str, at: GeoPoint) -> GeometryFeature {
    GeometryFeature::point(kind, at)
        .with("kind", tag)
        .with("lat", at.latitude)
        .with("lon", at.longitude)
}
