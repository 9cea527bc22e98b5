pub mod export;
pub mod shp;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geo::GeoPoint;
use crate::rings::RingOptions;

fn abrolhos() -> GeoPoint {
    GeoPoint::ABROLHOS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonRequest {
    #[serde(default = "abrolhos")]
    pub position: GeoPoint,
    pub observer_height_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRequest {
    #[serde(default = "abrolhos")]
    pub position: GeoPoint,
    pub observer_height_m: f64,
    pub object_height_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRequest {
    #[serde(default = "abrolhos")]
    pub origin: GeoPoint,
    pub magnetic_bearing: f64,
    #[serde(default)]
    pub declination: f64,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingsRequest {
    #[serde(default = "abrolhos")]
    pub center: GeoPoint,
    pub ring_count: u32,
    pub interval_nm: f64,
    #[serde(flatten)]
    pub options: RingOptions,
}

/// Everything one planning run should draw. Absent sections are skipped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObservationPlan {
    #[serde(default)]
    pub horizon: Option<HorizonRequest>,
    #[serde(default)]
    pub object: Option<ObjectRequest>,
    #[serde(default)]
    pub projection: Option<ProjectionRequest>,
    #[serde(default)]
    pub rings: Option<RingsRequest>,
}

impl ObservationPlan {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Malformed observation plan")
    }

    pub fn is_empty(&self) -> bool {
        self.horizon.is_none() && self.object.is_none() && self.projection.is_none() && self.rings.is_none()
    }
}

pub fn load_plan_from_json(path: &str) -> Result<ObservationPlan> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = std::io::BufReader::new(file);
    let plan: ObservationPlan =
        serde_json::from_reader(reader).with_context(|| format!("Malformed observation plan {:?}", path))?;
    debug!("Loaded plan from {}", path);
    Ok(plan)
}
