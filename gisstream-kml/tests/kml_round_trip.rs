//! Write-then-read round trips through the KML codec.

use approx::assert_abs_diff_eq;
use gisstream_kml::{KmlReader, KmlWriter};
use gisstream_types::events::{
    ContainerKind, ContainerStart, Feature, FieldValue, GisObject, Schema, SimpleField, Style,
};
use gisstream_types::events::{FieldType, LineStyle};
use gisstream_types::geometry::{Geometry, Line, LinearRing, Point, Polygon};
use gisstream_types::GeoPoint;

fn round_trip(objects: &[GisObject]) -> Vec<GisObject> {
    let mut writer = KmlWriter::new(Vec::new());
    writer.write_all(objects).expect("write");
    let bytes = writer.close().expect("close");
    let mut reader = KmlReader::new(bytes.as_slice());
    let mut out = Vec::new();
    while let Some(obj) = reader.read().expect("read") {
        out.push(obj);
    }
    out
}

fn pt(lon: f64, lat: f64) -> Point {
    Point::new(GeoPoint::new(lon, lat))
}

fn feature_named(name: &str, geometry: Option<Geometry>) -> Feature {
    let mut f = Feature::default();
    f.common.name = Some(name.to_string());
    f.geometry = geometry;
    f
}

#[test]
fn geometries_survive_a_round_trip() {
    let line = Line::new(vec![pt(0.0, 0.0), pt(1.0, 1.0), pt(2.0, 0.5)]).expect("line");
    let ring = LinearRing::new(vec![
        pt(0.0, 0.0),
        pt(0.0, 5.0),
        pt(5.0, 5.0),
        pt(5.0, 0.0),
        pt(0.0, 0.0),
    ])
    .expect("ring");
    let polygon = Polygon::new(ring.clone(), Vec::new());

    let objects = vec![
        GisObject::DocumentStart,
        GisObject::Feature(feature_named(
            "point",
            Some(Geometry::Point(pt(10.5, -20.25))),
        )),
        GisObject::Feature(feature_named("line", Some(Geometry::Line(line.clone())))),
        GisObject::Feature(feature_named("ring", Some(Geometry::LinearRing(ring)))),
        GisObject::Feature(feature_named("poly", Some(Geometry::Polygon(polygon)))),
    ];
    let out = round_trip(&objects);

    assert_eq!(out.len(), objects.len());
    for (before, after) in objects.iter().zip(&out).skip(1) {
        let (GisObject::Feature(b), GisObject::Feature(a)) = (before, after) else {
            panic!("expected features, got {} / {}", before.kind(), after.kind());
        };
        assert!(b.approximately_equals(a), "feature {:?} changed", b.common.name);
        assert_eq!(b.geometry, a.geometry);
    }
}

#[test]
fn high_precision_coordinates_survive() {
    let objects = vec![
        GisObject::DocumentStart,
        GisObject::Feature(feature_named(
            "precise",
            Some(Geometry::Point(pt(10.123456789, -45.987654321))),
        )),
    ];
    let out = round_trip(&objects);
    let GisObject::Feature(f) = &out[1] else {
        panic!("expected feature, got {}", out[1].kind());
    };
    let Some(Geometry::Point(p)) = &f.geometry else {
        panic!("expected point geometry");
    };
    assert_abs_diff_eq!(p.coord().lon(), 10.123456789, epsilon = 1e-9);
    assert_abs_diff_eq!(p.coord().lat(), -45.987654321, epsilon = 1e-9);
}

#[test]
fn containers_and_schema_round_trip() {
    let mut schema = Schema::new("soundings", "s1");
    schema.put(SimpleField::typed("depth", FieldType::Double));

    let mut doc = ContainerStart::new(ContainerKind::Document);
    doc.common.name = Some("survey".to_string());

    let mut f = Feature::default();
    f.common.name = Some("buoy".to_string());
    f.common.row.schema = Some("#s1".to_string());
    f.common.row.put(
        SimpleField::typed("depth", FieldType::Double),
        FieldValue::Double(12.5),
    );

    let objects = vec![
        GisObject::DocumentStart,
        GisObject::ContainerStart(doc),
        GisObject::Schema(schema.clone()),
        GisObject::Feature(f.clone()),
        GisObject::ContainerEnd,
    ];
    let out = round_trip(&objects);

    let kinds: Vec<&str> = out.iter().map(GisObject::kind).collect();
    assert_eq!(
        kinds,
        ["DocumentStart", "ContainerStart", "Schema", "Feature", "ContainerEnd"]
    );
    let GisObject::ContainerStart(doc_after) = &out[1] else {
        panic!("expected container");
    };
    assert_eq!(doc_after.common.name.as_deref(), Some("survey"));
    assert_eq!(out[2], GisObject::Schema(schema));
    let GisObject::Feature(f_after) = &out[3] else {
        panic!("expected feature");
    };
    assert!(f.approximately_equals(f_after));
    assert_eq!(f_after.common.row.get("depth"), Some(&FieldValue::Double(12.5)));
}

#[test]
fn empty_container_disappears() {
    let objects = vec![
        GisObject::DocumentStart,
        GisObject::ContainerStart(ContainerStart::new(ContainerKind::Folder)),
        GisObject::ContainerEnd,
        GisObject::Feature(feature_named("after", None)),
    ];
    let out = round_trip(&objects);
    let kinds: Vec<&str> = out.iter().map(GisObject::kind).collect();
    assert_eq!(kinds, ["DocumentStart", "Feature"]);
}

#[test]
fn floating_style_comes_back_before_its_feature() {
    let mut style = Style::with_id("track");
    style.line = Some(LineStyle {
        color: None,
        width: Some(4.0),
    });
    let mut f = feature_named("styled", None);
    f.common.set_style_url("#track");

    let objects = vec![
        GisObject::DocumentStart,
        GisObject::Style(style.clone()),
        GisObject::Feature(f),
    ];
    let out = round_trip(&objects);

    let kinds: Vec<&str> = out.iter().map(GisObject::kind).collect();
    assert_eq!(kinds, ["DocumentStart", "Style", "Feature"]);
    assert_eq!(out[1], GisObject::Style(style));
    let GisObject::Feature(f_after) = &out[2] else {
        panic!("expected feature");
    };
    assert_eq!(f_after.common.style_url(), Some("#track"));
}

#[test]
fn nested_containers_round_trip_in_order() {
    let mut outer = ContainerStart::new(ContainerKind::Document);
    outer.common.name = Some("outer".to_string());
    let mut inner = ContainerStart::new(ContainerKind::Folder);
    inner.common.name = Some("inner".to_string());

    let objects = vec![
        GisObject::DocumentStart,
        GisObject::ContainerStart(outer),
        GisObject::ContainerStart(inner),
        GisObject::Feature(feature_named("leaf", None)),
        GisObject::ContainerEnd,
        GisObject::ContainerEnd,
    ];
    let out = round_trip(&objects);
    let kinds: Vec<&str> = out.iter().map(GisObject::kind).collect();
    assert_eq!(
        kinds,
        [
            "DocumentStart",
            "ContainerStart",
            "ContainerStart",
            "Feature",
            "ContainerEnd",
            "ContainerEnd"
        ]
    );
    let names: Vec<Option<&str>> = out
        .iter()
        .filter_map(|obj| match obj {
            GisObject::ContainerStart(c) => Some(c.common.name.as_deref()),
            _ => None,
        })
        .collect();
    assert_eq!(names, [Some("outer"), Some("inner")]);
}
