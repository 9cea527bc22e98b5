//! Host-neutral feature records.
//!
//! Everything the engine draws ends up here: a [`GeometryFeature`] carries
//! its vertices and a flat attribute table, and features produced by one
//! action are grouped into named [`FeatureLayer`]s the host registers as map
//! layers. Records are never mutated once built.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Observer,
    Horizon,
    ObjectVisible,
    ProjectionLine,
    ProjectionPoint,
    Ring,
    RingCenter,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Observer => "observer",
            FeatureKind::Horizon => "horizon",
            FeatureKind::ObjectVisible => "object_visible",
            FeatureKind::ProjectionLine => "projection_line",
            FeatureKind::ProjectionPoint => "projection_point",
            FeatureKind::Ring => "ring",
            FeatureKind::RingCenter => "ring_center",
        }
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    Line,
    Polygon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Integer(v) => write!(f, "{}", v),
            AttributeValue::Real(v) => write!(f, "{}", v),
            AttributeValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Real(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<u32> for AttributeValue {
    fn from(v: u32) -> Self {
        AttributeValue::Integer(v as i64)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryFeature {
    kind: FeatureKind,
    geometry: GeometryType,
    vertices: Vec<GeoPoint>,
    attributes: BTreeMap<String, AttributeValue>,
}

impl GeometryFeature {
    pub(crate) fn point(kind: FeatureKind, at: GeoPoint) -> Self {
        Self::new(kind, GeometryType::Point, vec![at])
    }

    pub(crate) fn line(kind: FeatureKind, vertices: Vec<GeoPoint>) -> Self {
        Self::new(kind, GeometryType::Line, vertices)
    }

    pub(crate) fn polygon(kind: FeatureKind, ring: Vec<GeoPoint>) -> Self {
        Self::new(kind, GeometryType::Polygon, ring)
    }

    fn new(kind: FeatureKind, geometry: GeometryType, vertices: Vec<GeoPoint>) -> Self {
        Self {
            kind,
            geometry,
            vertices,
            attributes: BTreeMap::new(),
        }
    }

    /// Attribute setter, only available while the builders assemble the record.
    pub(crate) fn with(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    pub fn geometry(&self) -> GeometryType {
        self.geometry
    }

    pub fn vertices(&self) -> &[GeoPoint] {
        &self.vertices
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn real(&self, name: &str) -> Option<f64> {
        match self.attributes.get(name)? {
            AttributeValue::Real(v) => Some(*v),
            AttributeValue::Integer(v) => Some(*v as f64),
            AttributeValue::Text(_) => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.attributes.get(name)? {
            AttributeValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Extent {
    pub fn of_points<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Option<Self> {
        let (lat, lon): (Vec<f64>, Vec<f64>) = points
            .into_iter()
            .map(|p| (p.latitude, p.longitude))
            .unzip();
        let (min_lat, max_lat) = lat.into_iter().minmax_by(f64::total_cmp).into_option()?;
        let (min_lon, max_lon) = lon.into_iter().minmax_by(f64::total_cmp).into_option()?;
        Some(Self { min_lat, min_lon, max_lat, max_lon })
    }

    pub fn combine(self, other: Extent) -> Extent {
        Extent {
            min_lat: self.min_lat.min(other.min_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lat: self.max_lat.max(other.max_lat),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            latitude: (self.min_lat + self.max_lat) / 2.0,
            longitude: (self.min_lon + self.max_lon) / 2.0,
        }
    }
}

/// Features of one geometry type registered together by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLayer {
    name: String,
    geometry: GeometryType,
    features: Vec<GeometryFeature>,
}

impl FeatureLayer {
    pub(crate) fn new(name: impl Into<String>, geometry: GeometryType, features: Vec<GeometryFeature>) -> Self {
        Self {
            name: name.into(),
            geometry,
            features,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> GeometryType {
        self.geometry
    }

    pub fn features(&self) -> &[GeometryFeature] {
        &self.features
    }

    pub fn extent(&self) -> Option<Extent> {
        Extent::of_points(self.features.iter().flat_map(|f| f.vertices.iter()))
    }
}

/// Layers emitted by a single drawing action.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureBatch {
    layers: Vec<FeatureLayer>,
    labels_enabled: bool,
}

impl FeatureBatch {
    pub(crate) fn new(layers: Vec<FeatureLayer>) -> Self {
        Self { layers, labels_enabled: false }
    }

    pub(crate) fn with_labels(mut self, enabled: bool) -> Self {
        self.labels_enabled = enabled;
        self
    }

    pub fn layers(&self) -> &[FeatureLayer] {
        &self.layers
    }

    /// Ring layers carry a `label` attribute the host should display.
    pub fn labels_enabled(&self) -> bool {
        self.labels_enabled
    }

    pub fn features(&self) -> impl Iterator<Item = &GeometryFeature> {
        self.layers.iter().flat_map(|l| l.features.iter())
    }

    /// Combined bounding extent of every layer in the batch.
    pub fn extent(&self) -> Option<Extent> {
        self.layers
            .iter()
            .filter_map(FeatureLayer::extent)
            .reduce(Extent::combine)
    }
}
