use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use geo_types::Point;
use gpx::{Gpx, GpxVersion, Waypoint};
use itertools::Itertools;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::geo::GeoPoint;
use crate::geometry::feature::{FeatureLayer, GeometryFeature, GeometryType};
use crate::io::shp::export_shapefiles;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: {0}")]
    NothingToExport(&'static str),
    #[error("{0:?} output is a set of files, export it to a directory")]
    NeedsDirectory(ExportFormat),
    #[error("attribute {0:?} is not a valid dBase field name")]
    FieldName(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("GPX error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    GeoJson,
    Kml,
    Gpx,
    Shapefile,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "geojson" | "json" => Ok(Self::GeoJson),
            "kml" => Ok(Self::Kml),
            "gpx" => Ok(Self::Gpx),
            "shp" | "shapefile" => Ok(Self::Shapefile),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::GeoJson => "geojson",
            ExportFormat::Kml => "kml",
            ExportFormat::Gpx => "gpx",
            ExportFormat::Shapefile => "shp",
            ExportFormat::Csv => "csv",
        }
    }

    /// GPX carries waypoints only.
    pub fn supports(&self, geometry: GeometryType) -> bool {
        match self {
            ExportFormat::Gpx => geometry == GeometryType::Point,
            _ => true,
        }
    }

    /// Shapefile output is one file set per layer inside a directory.
    pub fn writes_directory(&self) -> bool {
        *self == ExportFormat::Shapefile
    }
}

fn select(layers: &[FeatureLayer], format: ExportFormat) -> Result<Vec<(&str, &GeometryFeature)>, ExportError> {
    if layers.is_empty() {
        return Err(ExportError::NothingToExport("no layers have been created yet"));
    }
    let selected: Vec<(&str, &GeometryFeature)> = layers
        .iter()
        .flat_map(|l| l.features().iter().map(move |f| (l.name(), f)))
        .filter(|(_, f)| format.supports(f.geometry()))
        .collect();
    if selected.is_empty() {
        return Err(ExportError::NothingToExport("no features this format can carry"));
    }
    Ok(selected)
}

/// Writes one artifact holding every exportable feature of `layers`.
///
/// Geometry the format cannot carry is skipped without error. Returns the
/// number of features written.
pub fn export<W: Write>(layers: &[FeatureLayer], format: ExportFormat, out: &mut W) -> Result<usize, ExportError> {
    let selected = select(layers, format)?;

    match format {
        ExportFormat::GeoJson => write_geojson(&selected, out)?,
        ExportFormat::Kml => write_kml(&selected, out)?,
        ExportFormat::Gpx => write_gpx(&selected, out)?,
        ExportFormat::Csv => write_csv(&selected, out)?,
        ExportFormat::Shapefile => return Err(ExportError::NeedsDirectory(format)),
    }
    debug!("Exported {} features as {:?}", selected.len(), format);
    Ok(selected.len())
}

/// Writes to `path`, which is a directory for Shapefile output and a file
/// otherwise.
pub fn export_to_path(layers: &[FeatureLayer], format: ExportFormat, path: &Path) -> Result<usize, ExportError> {
    if format.writes_directory() {
        select(layers, format)?;
        return export_shapefiles(layers, path);
    }

    let mut out = BufWriter::new(File::create(path)?);
    let count = export(layers, format, &mut out)?;
    out.flush()?;
    info!("Wrote {} features to {}", count, path.display());
    Ok(count)
}

fn position(p: &GeoPoint) -> Value {
    json!([p.longitude, p.latitude])
}

fn geojson_geometry(feature: &GeometryFeature) -> Value {
    match feature.geometry() {
        GeometryType::Point => json!({
            "type": "Point",
            "coordinates": feature.vertices().first().map(position).unwrap_or(Value::Null),
        }),
        GeometryType::Line => json!({
            "type": "LineString",
            "coordinates": feature.vertices().iter().map(position).collect::<Vec<_>>(),
        }),
        GeometryType::Polygon => json!({
            "type": "Polygon",
            "coordinates": [feature.vertices().iter().map(position).collect::<Vec<_>>()],
        }),
    }
}

fn write_geojson<W: Write>(features: &[(&str, &GeometryFeature)], out: &mut W) -> Result<(), ExportError> {
    let features: Vec<Value> = features
        .iter()
        .map(|(layer, f)| -> Result<Value, serde_json::Error> {
            let mut properties = Map::new();
            properties.insert("layer".to_string(), json!(layer));
            properties.insert("feature_kind".to_string(), json!(f.kind()));
            for (name, value) in f.attributes() {
                properties.insert(name.clone(), serde_json::to_value(value)?);
            }
            Ok(json!({
                "type": "Feature",
                "geometry": geojson_geometry(f),
                "properties": properties,
            }))
        })
        .collect::<Result<_, _>>()?;

    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    serde_json::to_writer_pretty(&mut *out, &collection)?;
    writeln!(out)?;
    Ok(())
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn kml_coordinates(vertices: &[GeoPoint]) -> String {
    vertices
        .iter()
        .map(|p| format!("{},{},0", p.longitude, p.latitude))
        .join(" ")
}

fn placemark_name(layer: &str, feature: &GeometryFeature) -> String {
    match feature.attribute("label") {
        Some(label) => label.to_string(),
        None => format!("{} ({})", layer, feature.kind()),
    }
}

fn write_kml<W: Write>(features: &[(&str, &GeometryFeature)], out: &mut W) -> Result<(), ExportError> {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#)?;
    writeln!(out, "<Document>")?;
    for (layer, group) in &features.iter().chunk_by(|(layer, _)| *layer) {
        writeln!(out, "<Folder><name>{}</name>", escape_xml(layer))?;
        for (_, f) in group {
            writeln!(out, "<Placemark>")?;
            writeln!(out, "<name>{}</name>", escape_xml(&placemark_name(layer, f)))?;
            writeln!(out, "<ExtendedData>")?;
            for (name, value) in f.attributes() {
                writeln!(
                    out,
                    r#"<Data name="{}"><value>{}</value></Data>"#,
                    escape_xml(name),
                    escape_xml(&value.to_string())
                )?;
            }
            writeln!(out, "</ExtendedData>")?;
            let coordinates = kml_coordinates(f.vertices());
            match f.geometry() {
                GeometryType::Point => writeln!(out, "<Point><coordinates>{}</coordinates></Point>", coordinates)?,
                GeometryType::Line => {
                    writeln!(out, "<LineString><coordinates>{}</coordinates></LineString>", coordinates)?
                }
                GeometryType::Polygon => writeln!(
                    out,
                    "<Polygon><outerBoundaryIs><LinearRing><coordinates>{}</coordinates></LinearRing></outerBoundaryIs></Polygon>",
                    coordinates
                )?,
            }
            writeln!(out, "</Placemark>")?;
        }
        writeln!(out, "</Folder>")?;
    }
    writeln!(out, "</Document>")?;
    writeln!(out, "</kml>")?;
    Ok(())
}

fn write_gpx<W: Write>(features: &[(&str, &GeometryFeature)], out: &mut W) -> Result<(), ExportError> {
    let waypoints = features
        .iter()
        .filter_map(|(layer, f)| {
            let p = f.vertices().first()?;
            let mut waypoint = Waypoint::new(Point::new(p.longitude, p.latitude));
            waypoint.name = Some(f.text("kind").map_or_else(|| f.kind().to_string(), str::to_string));
            waypoint.description = Some(layer.to_string());
            Some(waypoint)
        })
        .collect();

    let mut doc = Gpx::default();
    doc.version = GpxVersion::Gpx11;
    doc.creator = Some("horizon_projector".to_string());
    doc.waypoints = waypoints;

    gpx::write(&doc, out)?;
    Ok(())
}

fn wkt(feature: &GeometryFeature) -> String {
    let coords = feature
        .vertices()
        .iter()
        .map(|p| format!("{} {}", p.longitude, p.latitude))
        .join(", ");
    match feature.geometry() {
        GeometryType::Point => format!("POINT ({})", coords),
        GeometryType::Line => format!("LINESTRING ({})", coords),
        GeometryType::Polygon => format!("POLYGON (({}))", coords),
    }
}

/// Attribute table, one row per feature, geometry as WKT.
fn write_csv<W: Write>(features: &[(&str, &GeometryFeature)], out: &mut W) -> Result<(), ExportError> {
    let columns: BTreeSet<&str> = features
        .iter()
        .flat_map(|(_, f)| f.attributes().keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(out);
    let header = ["layer", "feature_kind", "wkt"]
        .into_iter()
        .chain(columns.iter().copied());
    writer.write_record(header)?;

    for (layer, f) in features {
        let fixed = [layer.to_string(), f.kind().to_string(), wkt(f)];
        let values = columns
            .iter()
            .map(|c| f.attribute(c).map(ToString::to_string).unwrap_or_default());
        writer.write_record(fixed.into_iter().chain(values))?;
    }
    writer.flush()?;
    Ok(())
}
