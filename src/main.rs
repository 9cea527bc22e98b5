use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use horizon_projector::geometry::{
    horizon_features, object_features, projection_features, ring_features, Extent, FeatureLayer,
};
use horizon_projector::io::export::{export_to_path, ExportFormat};
use horizon_projector::io::load_plan_from_json;
use horizon_projector::physics::{project, HorizonResult, VisibilityResult};
use horizon_projector::render::{present, LabelStyle, MapHost, Style, StyleCategory};
use horizon_projector::session::Session;

#[derive(Parser, Debug)]
#[command(name = "horizon_projector")]
#[command(author, version, about = "Horizon, visibility, bearing projection and range ring geometry")]
struct Args {
    /// Observation plan (JSON)
    plan: String,

    /// Export format: geojson, kml, gpx, shp, csv
    #[arg(short, long, default_value = "geojson")]
    format: ExportFormat,

    /// Output file (directory for shp), defaults to the plan name with the format extension
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Stands in for a map canvas: logs what would be drawn.
#[derive(Default)]
struct LogHost {
    extent: Option<Extent>,
}

impl MapHost for LogHost {
    fn add_layer(&mut self, layer: &FeatureLayer, style: Style, categories: &[StyleCategory], labels: Option<LabelStyle>) {
        info!(
            "Layer {:?}: {} features, {}{}",
            layer.name(),
            layer.features().len(),
            style.primary_color().hex(),
            if labels.is_some() { ", labelled" } else { "" }
        );
        for category in categories {
            info!("  {} {}", category.style.primary_color().hex(), category.caption);
        }
    }

    fn zoom_to(&mut self, extent: Extent) {
        self.extent = Some(match self.extent {
            Some(current) => current.combine(extent),
            None => extent,
        });
    }

    fn remove_layer(&mut self, name: &str) {
        info!("Removed layer {:?}", name);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("horizon_projector=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let plan = load_plan_from_json(&args.plan)?;
    if plan.is_empty() {
        warn!("Plan {} requests nothing to draw", args.plan);
    }

    let mut host = LogHost::default();
    let mut session = Session::new();

    if let Some(req) = &plan.horizon {
        let horizon = HorizonResult::from_height(req.observer_height_m)?;
        info!("Distance to horizon: {}", horizon);
        present(&mut host, &mut session, &horizon_features(req.position, req.observer_height_m)?);
    }

    if let Some(req) = &plan.object {
        let visibility = VisibilityResult::from_heights(req.observer_height_m, req.object_height_m)?;
        info!("Distance to object: {}", visibility);
        present(
            &mut host,
            &mut session,
            &object_features(req.position, req.observer_height_m, req.object_height_m)?,
        );
    }

    if let Some(req) = &plan.projection {
        let projection = project(req.origin, req.magnetic_bearing, req.declination, req.distance_km)?;
        info!(
            "Target: {} (true bearing {:.2}°)",
            projection.target, projection.true_bearing
        );
        present(
            &mut host,
            &mut session,
            &projection_features(req.origin, req.magnetic_bearing, req.declination, req.distance_km)?,
        );
    }

    if let Some(req) = &plan.rings {
        let batch = ring_features(req.center, req.ring_count, req.interval_nm, req.options)?;
        info!("{} rings drawn", req.ring_count);
        present(&mut host, &mut session, &batch);
    }

    if let Some(extent) = host.extent {
        info!(
            "View extent: lat {:.4}..{:.4}, lon {:.4}..{:.4}",
            extent.min_lat, extent.max_lat, extent.min_lon, extent.max_lon
        );
    }

    if session.is_empty() {
        return Ok(());
    }

    let output = args.output.unwrap_or_else(|| {
        let plan = PathBuf::from(&args.plan);
        if args.format.writes_directory() {
            plan.with_extension("")
        } else {
            plan.with_extension(args.format.extension())
        }
    });
    export_to_path(session.layers(), args.format, &output)?;

    Ok(())
}
