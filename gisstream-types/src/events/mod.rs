//! The typed objects a document stream is made of.
//!
//! A reader produces, and a writer consumes, a flat sequence of
//! [`GisObject`] values. Nesting is expressed with explicit
//! [`GisObject::ContainerStart`] / [`GisObject::ContainerEnd`] markers
//! rather than recursion, so arbitrarily deep documents stream in constant
//! memory.

mod common;
mod element;
mod row;
mod schema;
mod style;

pub use common::{
    is_identifier, normalize_style_url, Common, ContainerKind, ContainerStart, Feature,
    GroundOverlay, NetworkLink, APPROX_EPSILON,
};
pub use element::{Element, TaggedMap};
pub use row::{FieldType, FieldValue, Row, SimpleField};
pub use schema::{IdGenerator, Schema};
pub use style::{BalloonStyle, Color, IconStyle, LabelStyle, LineStyle, PolyStyle, Style, StyleMap};

/// One object in a document stream.
#[derive(Debug, Clone, PartialEq)]
pub enum GisObject {
    /// Marks the start of a document stream.
    DocumentStart,
    /// Opens a Document or Folder.
    ContainerStart(ContainerStart),
    /// Closes the innermost open container.
    ContainerEnd,
    /// A placemark.
    Feature(Feature),
    /// A reference to a linked document.
    NetworkLink(NetworkLink),
    /// An image draped over a geodetic box.
    GroundOverlay(GroundOverlay),
    /// A reusable style definition.
    Style(Style),
    /// A normal/highlight style pair.
    StyleMap(StyleMap),
    /// A field-set declaration.
    Schema(Schema),
}

impl GisObject {
    /// Human-readable variant name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            GisObject::DocumentStart => "DocumentStart",
            GisObject::ContainerStart(_) => "ContainerStart",
            GisObject::ContainerEnd => "ContainerEnd",
            GisObject::Feature(_) => "Feature",
            GisObject::NetworkLink(_) => "NetworkLink",
            GisObject::GroundOverlay(_) => "GroundOverlay",
            GisObject::Style(_) => "Style",
            GisObject::StyleMap(_) => "StyleMap",
            GisObject::Schema(_) => "Schema",
        }
    }
}
