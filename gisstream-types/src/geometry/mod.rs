//! Geodetic geometry variants and the topology rules that validate them.
//!
//! Every variant carries a dimensionality flag, a bounding box (absent only
//! for empty collections), a part count and a point count. Mixed 2d/3d input
//! is never an error: the containing geometry is downgraded to 2d and the
//! event is logged.

mod bag;
mod circle;
mod line;
mod model;
mod multi;
mod point;
mod polygon;
mod ring;
mod topology;

pub use bag::GeometryBag;
pub use circle::{Circle, CircleHint};
pub use line::Line;
pub use model::Model;
pub use multi::{MultiLine, MultiLinearRings, MultiPoint, MultiPolygons};
pub use point::Point;
pub use polygon::Polygon;
pub use ring::LinearRing;

use crate::geo::{GeoPoint, GeodeticBounds};
use serde::{Deserialize, Serialize};

/// Vertical interpretation of elevation values, as used by KML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AltitudeMode {
    /// Elevation is ignored; the geometry is draped on the surface.
    ClampToGround,
    /// Elevation is measured from the surface below the point.
    RelativeToGround,
    /// Elevation is measured from the vertical datum.
    Absolute,
}

impl AltitudeMode {
    /// Parses a KML altitude mode string, accepting the `gx:` sea-floor
    /// extensions as their ground equivalents. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "clampToGround" | "clampToSeaFloor" => Some(AltitudeMode::ClampToGround),
            "relativeToGround" | "relativeToSeaFloor" => Some(AltitudeMode::RelativeToGround),
            "absolute" => Some(AltitudeMode::Absolute),
            other => {
                if !other.is_empty() {
                    log::warn!("ignoring unknown altitude mode: {other:?}");
                }
                None
            }
        }
    }

    /// The KML lexical form of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            AltitudeMode::ClampToGround => "clampToGround",
            AltitudeMode::RelativeToGround => "relativeToGround",
            AltitudeMode::Absolute => "absolute",
        }
    }
}

/// Extrusion and altitude attributes common to the primitive geometries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryBase {
    /// Vertical interpretation of elevations; `None` means clampToGround.
    pub altitude_mode: Option<AltitudeMode>,
    /// Whether the geometry is extruded down to the surface.
    pub extrude: Option<bool>,
    /// Whether line segments follow the terrain.
    pub tessellate: Option<bool>,
}

/// A geometry value: one of the closed set of variants the streaming
/// codecs understand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// A single coordinate.
    Point(Point),
    /// An open polyline of two or more points.
    Line(Line),
    /// A closed ring of four or more points.
    LinearRing(LinearRing),
    /// An outer ring with optional holes.
    Polygon(Polygon),
    /// A collection of points.
    MultiPoint(MultiPoint),
    /// A collection of lines.
    MultiLine(MultiLine),
    /// A collection of rings.
    MultiLinearRings(MultiLinearRings),
    /// A collection of polygons.
    MultiPolygons(MultiPolygons),
    /// A heterogeneous collection of geometries.
    GeometryBag(GeometryBag),
    /// A circle around a center point.
    Circle(Circle),
    /// An externally referenced 3d asset anchored at a point.
    Model(Model),
}

impl Geometry {
    /// True if every constituent point carries an elevation.
    pub fn is_3d(&self) -> bool {
        match self {
            Geometry::Point(g) => g.is_3d(),
            Geometry::Line(g) => g.is_3d(),
            Geometry::LinearRing(g) => g.is_3d(),
            Geometry::Polygon(g) => g.is_3d(),
            Geometry::MultiPoint(g) => g.is_3d(),
            Geometry::MultiLine(g) => g.is_3d(),
            Geometry::MultiLinearRings(g) => g.is_3d(),
            Geometry::MultiPolygons(g) => g.is_3d(),
            Geometry::GeometryBag(g) => g.is_3d(),
            Geometry::Circle(g) => g.is_3d(),
            Geometry::Model(g) => g.is_3d(),
        }
    }

    /// Bounding box of the geometry; `None` only for an empty collection.
    pub fn bounding_box(&self) -> Option<&GeodeticBounds> {
        match self {
            Geometry::Point(g) => Some(g.bounding_box()),
            Geometry::Line(g) => Some(g.bounding_box()),
            Geometry::LinearRing(g) => Some(g.bounding_box()),
            Geometry::Polygon(g) => Some(g.bounding_box()),
            Geometry::MultiPoint(g) => Some(g.bounding_box()),
            Geometry::MultiLine(g) => Some(g.bounding_box()),
            Geometry::MultiLinearRings(g) => Some(g.bounding_box()),
            Geometry::MultiPolygons(g) => Some(g.bounding_box()),
            Geometry::GeometryBag(g) => g.bounding_box(),
            Geometry::Circle(g) => Some(g.bounding_box()),
            Geometry::Model(g) => Some(g.bounding_box()),
        }
    }

    /// Number of separate parts making up this geometry.
    pub fn num_parts(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::Line(_) => 1,
            Geometry::LinearRing(_) => 1,
            Geometry::Polygon(g) => g.num_parts(),
            Geometry::MultiPoint(g) => g.num_parts(),
            Geometry::MultiLine(g) => g.num_parts(),
            Geometry::MultiLinearRings(g) => g.num_parts(),
            Geometry::MultiPolygons(g) => g.num_parts(),
            Geometry::GeometryBag(g) => g.num_parts(),
            Geometry::Circle(_) => 1,
            Geometry::Model(_) => 1,
        }
    }

    /// Total number of points across all parts.
    pub fn num_points(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::Line(g) => g.num_points(),
            Geometry::LinearRing(g) => g.num_points(),
            Geometry::Polygon(g) => g.num_points(),
            Geometry::MultiPoint(g) => g.num_points(),
            Geometry::MultiLine(g) => g.num_points(),
            Geometry::MultiLinearRings(g) => g.num_points(),
            Geometry::MultiPolygons(g) => g.num_points(),
            Geometry::GeometryBag(g) => g.num_points(),
            Geometry::Circle(_) => 1,
            Geometry::Model(_) => 1,
        }
    }

    /// Center of the bounding box, or `None` for an empty collection.
    ///
    /// [`GeometryBag`] is the exception: its center is the unweighted mean
    /// of member centers.
    pub fn center(&self) -> Option<GeoPoint> {
        match self {
            Geometry::GeometryBag(g) => g.center(),
            other => other.bounding_box().map(GeodeticBounds::center),
        }
    }

    /// True if this geometry is a proper container for `other`.
    ///
    /// Primitive geometries always report false; each multi-container
    /// reports true only for the primitive type it holds; a
    /// [`GeometryBag`] holds anything.
    pub fn container_of(&self, other: &Geometry) -> bool {
        match self {
            Geometry::MultiPoint(_) => matches!(other, Geometry::Point(_)),
            Geometry::MultiLine(_) => matches!(other, Geometry::Line(_)),
            Geometry::MultiLinearRings(_) => matches!(other, Geometry::LinearRing(_)),
            Geometry::MultiPolygons(_) => matches!(other, Geometry::Polygon(_)),
            Geometry::GeometryBag(_) => true,
            _ => false,
        }
    }

    /// Human-readable variant name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::Line(_) => "Line",
            Geometry::LinearRing(_) => "LinearRing",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::MultiLine(_) => "MultiLine",
            Geometry::MultiLinearRings(_) => "MultiLinearRings",
            Geometry::MultiPolygons(_) => "MultiPolygons",
            Geometry::GeometryBag(_) => "GeometryBag",
            Geometry::Circle(_) => "Circle",
            Geometry::Model(_) => "Model",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lon: f64, lat: f64) -> Point {
        Point::new(GeoPoint::new(lon, lat))
    }

    #[test]
    fn container_of_is_type_specific() {
        let mp = Geometry::MultiPoint(
            MultiPoint::new(vec![pt(0.0, 0.0)]).expect("non-empty multipoint"),
        );
        let line = Geometry::Line(
            Line::new(vec![pt(0.0, 0.0), pt(1.0, 1.0)]).expect("two point line"),
        );
        assert!(mp.container_of(&Geometry::Point(pt(5.0, 5.0))));
        assert!(!mp.container_of(&line));
        assert!(!line.container_of(&Geometry::Point(pt(0.0, 0.0))));
    }

    #[test]
    fn bag_contains_anything() {
        let bag = Geometry::GeometryBag(GeometryBag::new(vec![]));
        let line = Geometry::Line(
            Line::new(vec![pt(0.0, 0.0), pt(1.0, 1.0)]).expect("two point line"),
        );
        assert!(bag.container_of(&line));
        assert!(bag.container_of(&Geometry::Point(pt(0.0, 0.0))));
    }
}
