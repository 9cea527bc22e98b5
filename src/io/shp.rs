use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing, Polyline};
use tracing::info;

use crate::geometry::feature::{AttributeValue, FeatureLayer, GeometryFeature, GeometryType};
use crate::io::export::ExportError;

/// dBase III field names hold at most 10 characters.
const DBF_NAME_LEN: usize = 10;
const DBF_TEXT_LEN: u8 = 254;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnType {
    Integer,
    Real,
    Text,
}

impl From<&AttributeValue> for ColumnType {
    fn from(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Integer(_) => ColumnType::Integer,
            AttributeValue::Real(_) => ColumnType::Real,
            AttributeValue::Text(_) => ColumnType::Text,
        }
    }
}

/// Truncated the way GIS writers shorten long attribute names,
/// e.g. `distance_km` -> `distance_k`.
pub fn dbf_field_name(attribute: &str) -> String {
    attribute.chars().take(DBF_NAME_LEN).collect()
}

fn file_stem(name: &str, taken: &mut HashSet<String>) -> String {
    let base: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    let mut stem = base.clone();
    let mut n = 1;
    while !taken.insert(stem.clone()) {
        stem = format!("{}_{}", base, n);
        n += 1;
    }
    stem
}

/// Column layout of a layer's attribute table, keyed by attribute name.
fn columns(layer: &FeatureLayer) -> BTreeMap<&str, ColumnType> {
    let mut columns = BTreeMap::new();
    for feature in layer.features() {
        for (name, value) in feature.attributes() {
            columns.entry(name.as_str()).or_insert_with(|| ColumnType::from(value));
        }
    }
    columns
}

fn table_builder(columns: &BTreeMap<&str, ColumnType>) -> Result<TableWriterBuilder, ExportError> {
    let mut builder = TableWriterBuilder::new();
    for (name, column) in columns {
        let dbf_name = dbf_field_name(name);
        let field = FieldName::try_from(dbf_name.as_str()).map_err(|_| ExportError::FieldName(name.to_string()))?;
        builder = match column {
            ColumnType::Integer => builder.add_numeric_field(field, 10, 0),
            ColumnType::Real => builder.add_numeric_field(field, 24, 10),
            ColumnType::Text => builder.add_character_field(field, DBF_TEXT_LEN),
        };
    }
    Ok(builder)
}

fn record(feature: &GeometryFeature, columns: &BTreeMap<&str, ColumnType>) -> Record {
    let mut record = Record::default();
    for (name, column) in columns {
        let value = match (column, feature.attribute(name)) {
            (ColumnType::Text, value) => FieldValue::Character(value.map(ToString::to_string)),
            (_, Some(AttributeValue::Integer(v))) => FieldValue::Numeric(Some(*v as f64)),
            (_, Some(AttributeValue::Real(v))) => FieldValue::Numeric(Some(*v)),
            (_, _) => FieldValue::Numeric(None),
        };
        record.insert(dbf_field_name(name), value);
    }
    record
}

fn shp_points(feature: &GeometryFeature) -> Vec<Point> {
    feature
        .vertices()
        .iter()
        .map(|p| Point::new(p.longitude, p.latitude))
        .collect()
}

fn write_layer(layer: &FeatureLayer, path: &Path) -> Result<usize, ExportError> {
    let columns = columns(layer);
    let mut writer = shapefile::Writer::from_path(path, table_builder(&columns)?)?;

    for feature in layer.features() {
        let record = record(feature, &columns);
        match feature.geometry() {
            GeometryType::Point => {
                let p = &feature.vertices()[0];
                writer.write_shape_and_record(&Point::new(p.longitude, p.latitude), &record)?;
            }
            GeometryType::Line => {
                writer.write_shape_and_record(&Polyline::new(shp_points(feature)), &record)?;
            }
            GeometryType::Polygon => {
                let polygon = Polygon::new(PolygonRing::Outer(shp_points(feature)));
                writer.write_shape_and_record(&polygon, &record)?;
            }
        }
    }
    Ok(layer.features().len())
}

/// One `.shp`/`.shx`/`.dbf` set per layer in `dir`, named after the layer.
///
/// Layers sharing a name get a numeric suffix instead of overwriting each
/// other. Returns the number of features written.
pub fn export_shapefiles(layers: &[FeatureLayer], dir: &Path) -> Result<usize, ExportError> {
    if layers.is_empty() {
        return Err(ExportError::NothingToExport("no layers have been created yet"));
    }
    std::fs::create_dir_all(dir)?;

    let mut taken = HashSet::new();
    let mut written = 0;
    for layer in layers.iter().filter(|l| !l.features().is_empty()) {
        let path: PathBuf = dir.join(format!("{}.shp", file_stem(layer.name(), &mut taken)));
        written += write_layer(layer, &path)?;
        info!("Wrote layer {:?} to {}", layer.name(), path.display());
    }
    Ok(written)
}
