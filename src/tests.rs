use crate::error::GeodesyError;
use crate::geo::{
    destination_point, great_circle_distance_km, initial_bearing, km_to_nm, nm_to_km, GeoPoint,
};
use crate::geometry::{
    generate_circle, horizon_features, object_features, projection_features, ring_features,
    AttributeValue, Extent, FeatureKind, FeatureLayer, GeometryType, DEFAULT_SEGMENTS,
};
use crate::io::export::{export, export_to_path, ExportError, ExportFormat};
use crate::io::shp::dbf_field_name;
use crate::io::ObservationPlan;
use crate::physics::{horizon_distance, project, visibility_distance, HorizonResult};
use crate::render::{self, style_for, LabelStyle, MapHost, Style, StyleCategory, CYAN, ORANGE};
use crate::rings::{build_rings, RingOptions};
use crate::session::Session;

#[derive(Default)]
struct MockHost {
    layers: Vec<(String, Style, Vec<StyleCategory>, bool)>,
    zooms: Vec<Extent>,
    removed: Vec<String>,
}

impl MapHost for MockHost {
    fn add_layer(&mut self, layer: &FeatureLayer, style: Style, categories: &[StyleCategory], labels: Option<LabelStyle>) {
        self.layers
            .push((layer.name().to_string(), style, categories.to_vec(), labels.is_some()));
    }

    fn zoom_to(&mut self, extent: Extent) {
        self.zooms.push(extent);
    }

    fn remove_layer(&mut self, name: &str) {
        self.removed.push(name.to_string());
    }
}

fn export_string(layers: &[FeatureLayer], format: ExportFormat) -> String {
    let mut buf = Vec::new();
    export(layers, format, &mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn test_horizon_zero_and_monotonic() {
    assert_eq!(horizon_distance(0.0).unwrap(), 0.0);

    let mut previous = 0.0;
    for h in [0.5, 1.0, 2.0, 10.0, 50.0, 300.0, 3000.0, 11000.0] {
        let d = horizon_distance(h).unwrap();
        assert!(d > previous, "horizon at {} m not above {}", h, previous);
        previous = d;
    }
}

#[test]
fn test_horizon_from_ten_metres() {
    let d = horizon_distance(10.0).unwrap();
    assert!((d - 11.288).abs() < 1e-3);
    assert!((d - 11.30).abs() < 0.02);

    let result = HorizonResult::from_height(10.0).unwrap();
    assert_eq!(result.to_string(), "11.29 km (6.10 NM)");
}

#[test]
fn test_negative_height_rejected() {
    let err = horizon_distance(-1.0).unwrap_err();
    assert_eq!(err.field(), "height_m");
    assert!(visibility_distance(10.0, -5.0).is_err());
    assert!(horizon_distance(f64::NAN).is_err());
}

#[test]
fn test_visibility_is_sum_of_horizons() {
    for (a, b) in [(0.0, 0.0), (10.0, 21.0), (2.5, 120.0), (1000.0, 0.0)] {
        let sum = horizon_distance(a).unwrap() + horizon_distance(b).unwrap();
        assert_eq!(visibility_distance(a, b).unwrap(), sum);
    }
    assert!((visibility_distance(10.0, 21.0).unwrap() - 27.646).abs() < 1e-3);
}

#[test]
fn test_nautical_mile_conversion() {
    for nm in [0.0, 1.0, 5.0, 12.5, 200.0] {
        let km = nm_to_km(nm);
        assert!((km - nm * 1.852).abs() < 1e-9);
        assert!((km_to_nm(km) - nm).abs() < 1e-9);
    }
}

#[test]
fn test_destination_at_zero_distance_is_origin() {
    let origin = GeoPoint::new(45.0, 5.0);
    for bearing in [0.0, 90.0, 217.0] {
        let p = destination_point(origin, bearing, 0.0).unwrap();
        assert!((p.latitude - origin.latitude).abs() < 1e-9);
        assert!((p.longitude - origin.longitude).abs() < 1e-9);
    }
}

#[test]
fn test_destination_east_of_abrolhos() {
    let p = destination_point(GeoPoint::ABROLHOS, 90.0, 100.0).unwrap();

    assert!((p.latitude - GeoPoint::ABROLHOS.latitude).abs() < 0.01);
    let dlon = p.longitude - GeoPoint::ABROLHOS.longitude;
    assert!((dlon - 0.945).abs() < 0.005, "dlon = {}", dlon);

    // Inverse problem brings us back.
    let d = great_circle_distance_km(GeoPoint::ABROLHOS, p);
    assert!((d - 100.0).abs() < 1e-6);
    assert!((initial_bearing(GeoPoint::ABROLHOS, p) - 90.0).abs() < 1e-6);
}

#[test]
fn test_destination_longitude_not_wrapped() {
    let p = destination_point(GeoPoint::new(0.0, 179.5), 90.0, 222.4).unwrap();
    assert!(p.longitude > 180.0);
}

#[test]
fn test_destination_negative_distance_rejected() {
    assert!(destination_point(GeoPoint::ABROLHOS, 0.0, -1.0).is_err());
}

#[test]
fn test_projection_uses_true_bearing() {
    let projection = project(GeoPoint::ABROLHOS, 350.0, 20.0, 50.0).unwrap();
    assert_eq!(projection.true_bearing, 10.0);
    let direct = destination_point(GeoPoint::ABROLHOS, 10.0, 50.0).unwrap();
    assert_eq!(projection.target, direct);
}

#[test]
fn test_circle_closed_with_65_vertices() {
    let center = GeoPoint::new(-17.9647, -38.6941);
    let circle = generate_circle(center, 11.1, DEFAULT_SEGMENTS).unwrap();

    assert_eq!(circle.len(), 65);
    assert_eq!(circle.first(), circle.last());
    // Vertex 0 sits due east, a tenth of a degree out.
    assert!((circle[0].longitude - (center.longitude + 0.1)).abs() < 1e-12);
    assert!((circle[0].latitude - center.latitude).abs() < 1e-12);
    // Quarter turn is due north.
    assert!((circle[16].latitude - (center.latitude + 0.1)).abs() < 1e-12);
}

#[test]
fn test_circle_degenerate_radius_rejected() {
    let center = GeoPoint::ABROLHOS;
    assert!(matches!(
        generate_circle(center, 0.0, 64),
        Err(GeodesyError::InvalidInput { field: "radius_km", .. })
    ));
    assert!(generate_circle(center, -3.0, 64).is_err());
    assert!(generate_circle(center, 5.0, 2).is_err());
}

#[test]
fn test_three_rings_every_five_nm() {
    let set = build_rings(
        GeoPoint::ABROLHOS,
        3,
        5.0,
        RingOptions { gradient: true, labels: true },
    )
    .unwrap();

    assert_eq!(set.len(), 3);
    let expected_km = [9.26, 18.52, 27.78];
    let expected_hue = [80.0, 40.0, 0.0];
    for (i, ring) in set.rings.iter().enumerate() {
        assert_eq!(ring.spec.index, i as u32 + 1);
        assert_eq!(ring.spec.distance_nm, 5.0 * (i + 1) as f64);
        assert!((ring.spec.distance_km - expected_km[i]).abs() < 1e-9);
        assert_eq!(ring.polygon.len(), 65);

        let color = ring.spec.color.unwrap();
        assert!((color.hue - expected_hue[i]).abs() < 1e-9);
        assert_eq!((color.saturation, color.value, color.alpha), (180, 200, 80));
    }
    assert_eq!(set.rings[0].spec.label.as_deref(), Some("Ring 1 (5 NM)"));
    assert_eq!(set.rings[2].spec.caption(), "15 NM");
    assert_eq!(set.outer_distance_km(), Some(set.rings[2].spec.distance_km));
}

#[test]
fn test_gradient_runs_green_to_red() {
    let set = build_rings(GeoPoint::ABROLHOS, 3, 5.0, RingOptions { gradient: true, labels: false }).unwrap();
    let close = |a: (u8, u8, u8), b: (u8, u8, u8)| {
        (a.0 as i16 - b.0 as i16).abs() <= 1
            && (a.1 as i16 - b.1 as i16).abs() <= 1
            && (a.2 as i16 - b.2 as i16).abs() <= 1
    };
    let rgb: Vec<_> = set.rings.iter().map(|r| r.spec.color.unwrap().rgb).collect();
    assert!(close(rgb[0], (153, 200, 59)), "{:?}", rgb[0]);
    assert!(close(rgb[1], (200, 153, 59)), "{:?}", rgb[1]);
    assert!(close(rgb[2], (200, 59, 59)), "{:?}", rgb[2]);
}

#[test]
fn test_rings_without_options_have_no_color_or_label() {
    let set = build_rings(GeoPoint::ABROLHOS, 2, 1.5, RingOptions::default()).unwrap();
    assert!(set.rings.iter().all(|r| r.spec.color.is_none() && r.spec.label.is_none()));
    assert_eq!(set.rings[1].spec.distance_nm, 3.0);
}

#[test]
fn test_ring_inputs_rejected() {
    let opts = RingOptions::default();
    assert!(build_rings(GeoPoint::ABROLHOS, 0, 5.0, opts).is_err());
    assert!(build_rings(GeoPoint::ABROLHOS, 3, 0.0, opts).is_err());
    assert!(build_rings(GeoPoint::ABROLHOS, 3, -2.0, opts).is_err());
}

#[test]
fn test_horizon_batch_layers_and_attributes() {
    let batch = horizon_features(GeoPoint::ABROLHOS, 10.0).unwrap();
    assert_eq!(batch.layers().len(), 2);

    let polygon_layer = &batch.layers()[0];
    assert_eq!(polygon_layer.name(), "Horizon (11.29 km)");
    assert_eq!(polygon_layer.geometry(), GeometryType::Polygon);
    let horizon = &polygon_layer.features()[0];
    assert_eq!(horizon.kind(), FeatureKind::Horizon);
    assert_eq!(horizon.attribute("kind"), Some(&AttributeValue::Text("horizon".into())));
    assert_eq!(horizon.real("observer_height_m"), Some(10.0));
    assert!((horizon.real("distance_nm").unwrap() - 6.095).abs() < 1e-3);

    let observer = &batch.layers()[1].features()[0];
    assert_eq!(observer.kind(), FeatureKind::Observer);
    assert_eq!(observer.vertices(), &[GeoPoint::ABROLHOS]);
    assert_eq!(observer.real("lat"), Some(GeoPoint::ABROLHOS.latitude));
}

#[test]
fn test_projection_batch_has_line_and_two_points() {
    let batch = projection_features(GeoPoint::ABROLHOS, 90.0, 0.0, 100.0).unwrap();
    assert_eq!(batch.layers()[0].name(), "Projection (90° mag)");

    let line = &batch.layers()[0].features()[0];
    assert_eq!(line.kind(), FeatureKind::ProjectionLine);
    assert_eq!(line.vertices().len(), 2);
    assert_eq!(line.vertices()[0], GeoPoint::ABROLHOS);

    let points = batch.layers()[1].features();
    assert_eq!(points.len(), 2);
    assert_eq!(points[1].text("kind"), Some("target"));
    assert_eq!(points[1].vertices()[0], line.vertices()[1]);

    let extent = batch.extent().unwrap();
    assert_eq!(extent.min_lon, GeoPoint::ABROLHOS.longitude);
    assert!(extent.max_lon > extent.min_lon + 0.9);
}

#[test]
fn test_out_of_range_center_rejected() {
    assert!(horizon_features(GeoPoint::new(95.0, 0.0), 10.0).is_err());
    assert!(ring_features(GeoPoint::new(0.0, -181.0), 2, 1.0, RingOptions::default()).is_err());
    assert!(object_features(GeoPoint::new(f64::NAN, 0.0), 10.0, 5.0).is_err());
}

#[test]
fn test_failed_action_leaves_session_untouched() {
    let mut host = MockHost::default();
    let mut session = Session::new();

    let batch = horizon_features(GeoPoint::ABROLHOS, 10.0).unwrap();
    render::present(&mut host, &mut session, &batch);
    assert_eq!(session.len(), 2);

    assert!(object_features(GeoPoint::ABROLHOS, -10.0, 5.0).is_err());
    assert!(ring_features(GeoPoint::ABROLHOS, 3, 0.0, RingOptions::default()).is_err());
    assert_eq!(session.len(), 2);
    assert_eq!(host.layers.len(), 2);
}

#[test]
fn test_present_styles_and_zooms() {
    let mut host = MockHost::default();
    let mut session = Session::new();

    let rings = ring_features(GeoPoint::ABROLHOS, 4, 2.0, RingOptions { gradient: true, labels: true }).unwrap();
    render::present(&mut host, &mut session, &rings);

    let (name, _, categories, labelled) = &host.layers[0];
    assert_eq!(name, "Distance Rings (2 NM)");
    assert!(*labelled);
    let legend: Vec<(u32, &str)> = categories.iter().map(|c| (c.value, c.caption.as_str())).collect();
    assert_eq!(legend, vec![(1, "2 NM"), (2, "4 NM"), (3, "6 NM"), (4, "8 NM")]);
    let (_, center_style, center_categories, center_labelled) = &host.layers[1];
    assert_eq!(center_style.primary_color(), CYAN);
    assert!(center_categories.is_empty());
    assert!(!center_labelled);

    assert_eq!(host.zooms.len(), 1);
    assert_eq!(host.zooms[0], rings.extent().unwrap());

    let removed = render::clear(&mut host, &mut session);
    assert_eq!(removed, 2);
    assert!(session.is_empty());
    assert_eq!(host.removed, vec!["Distance Rings (2 NM)", "Ring Center"]);
}

#[test]
fn test_style_palette() {
    assert_eq!(CYAN.hex(), "#00FFF5");
    assert_eq!(ORANGE.hex(), "#FF6B35");
    assert_eq!(style_for(FeatureKind::Horizon, None).primary_color(), CYAN);
    assert_eq!(style_for(FeatureKind::ObjectVisible, None).primary_color(), ORANGE);
    assert!(matches!(
        style_for(FeatureKind::ProjectionLine, None),
        Style::Line { dashed: true, .. }
    ));
    assert!(matches!(
        style_for(FeatureKind::Ring, None),
        Style::Fill { fill, .. } if fill.a == 20
    ));
}

#[test]
fn test_gpx_keeps_points_only() {
    let mut session = Session::new();
    session.record(&horizon_features(GeoPoint::ABROLHOS, 10.0).unwrap());
    session.record(&projection_features(GeoPoint::ABROLHOS, 45.0, 0.0, 20.0).unwrap());

    let mut buf = Vec::new();
    assert_eq!(export(session.layers(), ExportFormat::Gpx, &mut buf).unwrap(), 3);

    let doc = gpx::read(buf.as_slice()).unwrap();
    assert!(doc.tracks.is_empty() && doc.routes.is_empty());
    let names: Vec<_> = doc.waypoints.iter().map(|w| w.name.as_deref().unwrap()).collect();
    assert_eq!(names, vec!["observer", "origin", "target"]);
    assert_eq!(doc.waypoints[0].description.as_deref(), Some("Observer"));

    let observer = doc.waypoints[0].point();
    assert!((observer.y() - GeoPoint::ABROLHOS.latitude).abs() < 1e-9);
    assert!((observer.x() - GeoPoint::ABROLHOS.longitude).abs() < 1e-9);
}

#[test]
fn test_shapefile_layer_per_file() {
    use shapefile::dbase::{FieldValue, Record};

    let mut session = Session::new();
    session.record(&horizon_features(GeoPoint::ABROLHOS, 10.0).unwrap());
    session.record(&projection_features(GeoPoint::ABROLHOS, 90.0, 0.0, 100.0).unwrap());
    session.record(&horizon_features(GeoPoint::ABROLHOS, 10.0).unwrap());

    let dir = tempfile::TempDir::new().unwrap();
    let written = export_to_path(session.layers(), ExportFormat::Shapefile, dir.path()).unwrap();
    assert_eq!(written, 7);

    let horizon = shapefile::read_as::<_, shapefile::Polygon, Record>(dir.path().join("Horizon (11.29 km).shp")).unwrap();
    assert_eq!(horizon.len(), 1);
    let (polygon, record) = &horizon[0];
    assert_eq!(polygon.rings()[0].points().len(), 65);
    match record.get("distance_k") {
        Some(FieldValue::Numeric(Some(km))) => assert!((km - 11.288).abs() < 1e-3),
        other => panic!("unexpected distance_k {:?}", other),
    }

    // Same layer name again lands next to the first instead of over it.
    assert!(dir.path().join("Horizon (11.29 km)_1.shp").exists());
    assert!(dir.path().join("Horizon (11.29 km)_1.dbf").exists());

    let line = shapefile::read_shapes_as::<_, shapefile::Polyline>(dir.path().join("Projection (90° mag).shp")).unwrap();
    assert_eq!(line[0].parts()[0].len(), 2);

    let points = shapefile::read_shapes_as::<_, shapefile::Point>(dir.path().join("Projection Points.shp")).unwrap();
    assert_eq!(points.len(), 2);
    assert!((points[0].x - GeoPoint::ABROLHOS.longitude).abs() < 1e-9);
}

#[test]
fn test_shapefile_needs_directory() {
    let mut session = Session::new();
    session.record(&horizon_features(GeoPoint::ABROLHOS, 10.0).unwrap());

    let mut buf = Vec::new();
    assert!(matches!(
        export(session.layers(), ExportFormat::Shapefile, &mut buf),
        Err(ExportError::NeedsDirectory(ExportFormat::Shapefile))
    ));
    assert_eq!(dbf_field_name("observer_height_m"), "observer_h");
    assert_eq!(dbf_field_name("ring"), "ring");
}

#[test]
fn test_gpx_without_points_is_nothing_to_export() {
    let mut session = Session::new();
    session.record(&object_features(GeoPoint::ABROLHOS, 10.0, 21.0).unwrap());

    let mut buf = Vec::new();
    let err = export(session.layers(), ExportFormat::Gpx, &mut buf).unwrap_err();
    assert!(matches!(err, ExportError::NothingToExport(_)));
    assert!(matches!(
        export(&[], ExportFormat::GeoJson, &mut buf),
        Err(ExportError::NothingToExport(_))
    ));
}

#[test]
fn test_geojson_feature_collection() {
    let mut session = Session::new();
    session.record(&ring_features(GeoPoint::ABROLHOS, 2, 5.0, RingOptions { gradient: false, labels: true }).unwrap());

    let text = export_string(session.layers(), ExportFormat::GeoJson);
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    let features = doc["features"].as_array().unwrap();
    assert_eq!(doc["type"], "FeatureCollection");
    assert_eq!(features.len(), 3);
    assert_eq!(features[0]["geometry"]["type"], "Polygon");
    assert_eq!(features[0]["geometry"]["coordinates"][0].as_array().unwrap().len(), 65);
    assert_eq!(features[1]["properties"]["label"], "Ring 2 (10 NM)");
    assert_eq!(features[1]["properties"]["ring"], 2);
    assert_eq!(features[2]["properties"]["feature_kind"], "ring_center");
    // GeoJSON positions are lon, lat
    assert_eq!(features[2]["geometry"]["coordinates"][0], GeoPoint::ABROLHOS.longitude);
}

#[test]
fn test_kml_and_csv_carry_every_feature() {
    let mut session = Session::new();
    session.record(&projection_features(GeoPoint::ABROLHOS, 90.0, 0.0, 10.0).unwrap());

    let kml = export_string(session.layers(), ExportFormat::Kml);
    assert_eq!(kml.matches("<Placemark>").count(), 3);
    assert!(kml.contains("<LineString>"));
    assert_eq!(kml.matches("<Folder>").count(), 2);

    let csv = export_string(session.layers(), ExportFormat::Csv);
    let mut lines = csv.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("layer,feature_kind,wkt"));
    assert!(header.contains("true_bearing"));
    assert_eq!(lines.count(), 3);
    assert!(csv.contains("LINESTRING ("));
}

#[test]
fn test_export_format_parsing() {
    assert_eq!("GeoJSON".parse::<ExportFormat>().unwrap(), ExportFormat::GeoJson);
    assert_eq!("kml".parse::<ExportFormat>().unwrap().extension(), "kml");
    assert_eq!("shp".parse::<ExportFormat>().unwrap(), ExportFormat::Shapefile);
    assert!(ExportFormat::Shapefile.writes_directory());
    assert!("dxf".parse::<ExportFormat>().is_err());
}

#[test]
fn test_plan_defaults_to_abrolhos() {
    let plan = ObservationPlan::from_json(
        r#"{ "horizon": { "observer_height_m": 25.0 },
             "rings": { "ring_count": 3, "interval_nm": 5.0, "gradient": true } }"#,
    )
    .unwrap();

    let horizon = plan.horizon.unwrap();
    assert_eq!(horizon.position, GeoPoint::ABROLHOS);
    let rings = plan.rings.unwrap();
    assert!(rings.options.gradient);
    assert!(!rings.options.labels);
    assert!(plan.projection.is_none());

    assert!(ObservationPlan::from_json("{}").unwrap().is_empty());
    assert!(ObservationPlan::from_json(r#"{ "horizon": {} }"#).is_err());
}

#[test]
fn test_bundled_plan_parses() {
    let plan = ObservationPlan::from_json(include_str!("../plans/abrolhos.json")).unwrap();
    let projection = plan.projection.unwrap();
    assert_eq!(projection.declination, -23.0);
    assert_eq!(plan.object.unwrap().position, GeoPoint::ABROLHOS);
}
