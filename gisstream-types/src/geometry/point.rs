//! The point primitive.

use crate::geo::{GeoPoint, GeodeticBounds};
use crate::geometry::GeometryBase;
use serde::{Deserialize, Serialize};

/// A single geodetic coordinate.
///
/// Equality is coordinate equality; the extrusion attributes do not
/// participate in comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    coord: GeoPoint,
    bbox: GeodeticBounds,
    /// Extrusion and altitude attributes.
    pub base: GeometryBase,
}

impl Point {
    /// Creates a point at the given coordinate.
    pub fn new(coord: GeoPoint) -> Self {
        Self {
            coord,
            bbox: GeodeticBounds::from_point(&coord),
            base: GeometryBase::default(),
        }
    }

    /// The point's coordinate.
    pub fn coord(&self) -> &GeoPoint {
        &self.coord
    }

    /// True if the coordinate carries an elevation.
    pub fn is_3d(&self) -> bool {
        self.coord.is_3d()
    }

    /// Degenerate bounding box enclosing the single coordinate.
    pub fn bounding_box(&self) -> &GeodeticBounds {
        &self.bbox
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
    }
}

impl From<GeoPoint> for Point {
    fn from(coord: GeoPoint) -> Self {
        Point::new(coord)
    }
}
