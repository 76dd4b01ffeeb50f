//! Features, containers and the properties they share.

use crate::events::element::{Element, TaggedMap};
use crate::events::row::Row;
use crate::geometry::{AltitudeMode, Geometry};
use crate::events::style::Color;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Epsilon used by the approximate feature comparisons.
pub const APPROX_EPSILON: f64 = 1e-5;

/// True if `s` is a bare XML identifier: a name that can be turned into a
/// local `#id` style reference.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

/// Normalizes a style URL: blank becomes `None`, a bare identifier becomes
/// a local `#id` reference, anything else passes through untouched.
pub fn normalize_style_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        None
    } else if is_identifier(url) {
        Some(format!("#{url}"))
    } else {
        Some(url.to_string())
    }
}

/// Properties shared by features, overlays and containers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Common {
    /// Display name.
    pub name: Option<String>,
    /// Description, possibly HTML.
    pub description: Option<String>,
    /// Short snippet shown in place lists.
    pub snippet: Option<String>,
    /// Whether the feature is initially shown.
    pub visibility: Option<bool>,
    /// Start of the valid time span.
    pub start_time: Option<DateTime<Utc>>,
    /// End of the valid time span.
    pub end_time: Option<DateTime<Utc>>,
    style_url: Option<String>,
    /// LookAt or Camera parameters.
    pub view: Option<TaggedMap>,
    /// Region parameters.
    pub region: Option<TaggedMap>,
    /// Unrecognized XML kept for round-tripping.
    pub elements: Vec<Element>,
    /// Extended data.
    pub row: Row,
}

impl Common {
    /// Sets the style URL with identifier normalization; blank clears it.
    pub fn set_style_url(&mut self, url: &str) {
        self.style_url = normalize_style_url(url);
    }

    /// The normalized style URL.
    pub fn style_url(&self) -> Option<&str> {
        self.style_url.as_deref()
    }
}

/// A placemark: shared properties plus an optional geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Shared feature properties.
    pub common: Common,
    /// The feature's geometry, when it has one.
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Loose equality for round-trip comparisons.
    ///
    /// Scalar fields compare exactly. Extended data decides on the first
    /// field where both rows carry a value, skipping the geometry check in
    /// that case; this mirrors long-standing behavior that downstream
    /// consumers rely on. Geometry compares by bounding box within
    /// [`APPROX_EPSILON`] and by point count.
    pub fn approximately_equals(&self, other: &Feature) -> bool {
        let a = &self.common;
        let b = &other.common;
        if a.description != b.description
            || a.name != b.name
            || a.row.schema != b.row.schema
            || a.style_url != b.style_url
            || a.end_time != b.end_time
            || a.start_time != b.start_time
        {
            return false;
        }

        for name in union_of_field_names(&a.row, &b.row) {
            match (a.row.get(&name), b.row.get(&name)) {
                (Some(v1), Some(v2)) => return v1.approx_eq(v2, APPROX_EPSILON),
                _ => return false,
            }
        }

        match (&self.geometry, &other.geometry) {
            (None, None) => true,
            (Some(g1), Some(g2)) => {
                let boxes_match = match (g1.bounding_box(), g2.bounding_box()) {
                    (None, None) => true,
                    (Some(b1), Some(b2)) => b1.approx_eq(b2, APPROX_EPSILON),
                    _ => false,
                };
                boxes_match && g1.num_points() == g2.num_points()
            }
            _ => false,
        }
    }
}

fn union_of_field_names(a: &Row, b: &Row) -> Vec<String> {
    let mut names: Vec<String> = a.entries().iter().map(|(f, _)| f.name.clone()).collect();
    for (f, _) in b.entries() {
        if !names.contains(&f.name) {
            names.push(f.name.clone());
        }
    }
    names
}

/// A reference to another document that should be fetched and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkLink {
    /// Shared feature properties.
    pub common: Common,
    /// Link parameters: href, refresh and view-bound settings.
    pub link: Option<TaggedMap>,
    /// Whether the link overrides the visibility of fetched features.
    pub refresh_visibility: bool,
    /// Whether the view flies to the linked content on refresh.
    pub fly_to_view: bool,
}

/// An image draped over a latitude/longitude box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundOverlay {
    /// Shared feature properties.
    pub common: Common,
    /// Image reference and refresh parameters.
    pub icon: Option<TaggedMap>,
    /// Tint color.
    pub color: Option<Color>,
    /// Stacking order among overlapping overlays.
    pub draw_order: Option<i32>,
    /// Northern edge in degrees.
    pub north: Option<f64>,
    /// Southern edge in degrees.
    pub south: Option<f64>,
    /// Eastern edge in degrees.
    pub east: Option<f64>,
    /// Western edge in degrees.
    pub west: Option<f64>,
    /// Counter-clockwise rotation of the image in degrees.
    pub rotation: Option<f64>,
    /// Drape altitude in meters.
    pub altitude: Option<f64>,
    /// Vertical interpretation of the altitude.
    pub altitude_mode: Option<AltitudeMode>,
}

impl GroundOverlay {
    /// Loose equality: the box edges, rotation and altitude compare within
    /// [`APPROX_EPSILON`], the rest exactly.
    pub fn approximately_equals(&self, other: &GroundOverlay) -> bool {
        let close = |a: Option<f64>, b: Option<f64>| match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => (a - b).abs() < APPROX_EPSILON,
            _ => false,
        };
        self.common.name == other.common.name
            && self.icon == other.icon
            && self.color == other.color
            && self.draw_order == other.draw_order
            && self.altitude_mode == other.altitude_mode
            && close(self.north, other.north)
            && close(self.south, other.south)
            && close(self.east, other.east)
            && close(self.west, other.west)
            && close(self.rotation, other.rotation)
            && close(self.altitude, other.altitude)
    }
}

/// Kind of KML container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerKind {
    /// A `Document`, which may own shared styles and schemata.
    #[default]
    Document,
    /// A `Folder` grouping.
    Folder,
}

impl ContainerKind {
    /// The KML element name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Document => "Document",
            ContainerKind::Folder => "Folder",
        }
    }
}

/// Opens a nested group of features; closed by a matching
/// [`GisObject::ContainerEnd`](crate::events::GisObject::ContainerEnd).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerStart {
    /// Shared feature properties.
    pub common: Common,
    /// Document or Folder.
    pub kind: ContainerKind,
    /// Whether the container is initially expanded.
    pub open: Option<bool>,
}

impl ContainerStart {
    /// Creates an empty container of the given kind.
    pub fn new(kind: ContainerKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::row::{FieldValue, SimpleField};
    use crate::geo::GeoPoint;
    use crate::geometry::Point;

    #[test]
    fn style_url_normalization() {
        let mut c = Common::default();
        c.set_style_url("  ");
        assert_eq!(c.style_url(), None);
        c.set_style_url("myStyle");
        assert_eq!(c.style_url(), Some("#myStyle"));
        c.set_style_url("#already");
        assert_eq!(c.style_url(), Some("#already"));
        c.set_style_url("http://example.com/doc.kml#remote");
        assert_eq!(c.style_url(), Some("http://example.com/doc.kml#remote"));
    }

    #[test]
    fn features_with_close_geometry_compare_equal() {
        let mut a = Feature::default();
        a.common.name = Some("site".to_string());
        a.geometry = Some(Geometry::Point(Point::new(GeoPoint::new(10.0, 20.0))));
        let mut b = a.clone();
        b.geometry = Some(Geometry::Point(Point::new(GeoPoint::new(
            10.0 + 1e-7,
            20.0,
        ))));
        assert!(a.approximately_equals(&b));

        b.common.name = Some("other".to_string());
        assert!(!a.approximately_equals(&b));
    }

    #[test]
    fn first_populated_field_decides_extended_data() {
        // Both rows carry "a", so the comparison returns on that field and
        // never looks at "b" or the geometry.
        let mut a = Feature::default();
        a.common
            .row
            .put(SimpleField::new("a"), FieldValue::Double(1.0));
        a.common
            .row
            .put(SimpleField::new("b"), FieldValue::from("left"));
        let mut b = Feature::default();
        b.common
            .row
            .put(SimpleField::new("a"), FieldValue::Double(1.0));
        b.common
            .row
            .put(SimpleField::new("b"), FieldValue::from("right"));
        assert!(a.approximately_equals(&b));
    }

    #[test]
    fn one_sided_field_fails_comparison() {
        let mut a = Feature::default();
        a.common
            .row
            .put(SimpleField::new("a"), FieldValue::from("x"));
        let b = Feature::default();
        assert!(!a.approximately_equals(&b));
    }

    #[test]
    fn ground_overlay_edges_compare_with_epsilon() {
        let mut a = GroundOverlay {
            north: Some(10.0),
            south: Some(0.0),
            east: Some(10.0),
            west: Some(0.0),
            ..GroundOverlay::default()
        };
        let mut b = a.clone();
        b.north = Some(10.0 + 1e-7);
        assert!(a.approximately_equals(&b));
        a.north = Some(11.0);
        assert!(!a.approximately_equals(&b));
    }
}
