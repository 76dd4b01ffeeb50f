//! The open polyline primitive.

use crate::error::GeometryError;
use crate::geo::GeodeticBounds;
use crate::geometry::{GeometryBase, Point};
use serde::{Deserialize, Serialize};

/// Result of one pass over a point list: dimensionality (after any
/// downgrade), the enclosing box and the date-line wrap flag.
pub(crate) struct PointScan {
    pub is_3d: bool,
    pub bbox: GeodeticBounds,
    pub idl_wrap: bool,
}

/// Single forward pass shared by [`Line`] and
/// [`LinearRing`](crate::geometry::LinearRing) construction.
///
/// A segment is flagged as wrapping the international date line when its
/// endpoints differ in longitude sign and one of them is exactly -180. This
/// is a heuristic for input that was clipped at the date line, not a general
/// antimeridian-crossing detector.
pub(crate) fn scan_points(points: &[Point], kind: &str) -> PointScan {
    let mut is_3d = points[0].is_3d();
    for p in points {
        if p.is_3d() != is_3d {
            log::info!("{kind} points have mixed dimensionality: downgrading to 2d");
            is_3d = false;
            break;
        }
    }

    let mut bbox = GeodeticBounds::from_point(points[0].coord());
    let mut idl_wrap = false;
    let mut prev = points[0].coord().lon();
    for p in points {
        bbox.extend(p.coord());
        let lon = p.coord().lon();
        if ((prev < 0.0 && lon >= 0.0) || (lon < 0.0 && prev >= 0.0))
            && (prev == -180.0 || lon == -180.0)
        {
            idl_wrap = true;
        }
        prev = lon;
    }

    PointScan {
        is_3d,
        bbox,
        idl_wrap,
    }
}

/// An ordered sequence of at least two points. The point list is an
/// immutable snapshot after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    points: Vec<Point>,
    is_3d: bool,
    bbox: GeodeticBounds,
    idl_wrap: bool,
    /// Extrusion and altitude attributes.
    pub base: GeometryBase,
}

impl Line {
    /// Creates a line from its vertices.
    ///
    /// Mixed 2d/3d input downgrades the line to 2d and logs the event.
    pub fn new(points: Vec<Point>) -> Result<Self, GeometryError> {
        if points.len() < 2 {
            return Err(GeometryError::TooFewPoints {
                kind: "Line",
                required: 2,
                actual: points.len(),
            });
        }
        let scan = scan_points(&points, "Line");
        Ok(Self {
            points,
            is_3d: scan.is_3d,
            bbox: scan.bbox,
            idl_wrap: scan.idl_wrap,
            base: GeometryBase::default(),
        })
    }

    /// The line's vertices.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// True if every vertex carries an elevation.
    pub fn is_3d(&self) -> bool {
        self.is_3d
    }

    /// Box enclosing all vertices.
    pub fn bounding_box(&self) -> &GeodeticBounds {
        &self.bbox
    }

    /// Number of vertices.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// True if a segment of this line was clipped at the international date
    /// line. Exporters use this to re-emit -180 longitudes as +180.
    pub fn clipped_at_date_line(&self) -> bool {
        self.idl_wrap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    fn pt(lon: f64, lat: f64) -> Point {
        Point::new(GeoPoint::new(lon, lat))
    }

    fn pt3(lon: f64, lat: f64, elev: f64) -> Point {
        Point::new(GeoPoint::with_elevation(lon, lat, elev))
    }

    #[test]
    fn rejects_single_point() {
        assert!(matches!(
            Line::new(vec![pt(0.0, 0.0)]),
            Err(GeometryError::TooFewPoints { required: 2, .. })
        ));
    }

    #[test]
    fn mixed_dimensionality_downgrades_to_2d() {
        let line = Line::new(vec![pt3(0.0, 0.0, 10.0), pt(1.0, 1.0)]).expect("valid line");
        assert!(!line.is_3d());
    }

    #[test]
    fn all_3d_points_stay_3d() {
        let line = Line::new(vec![pt3(0.0, 0.0, 10.0), pt3(1.0, 1.0, 20.0)]).expect("valid line");
        assert!(line.is_3d());
    }

    #[test]
    fn date_line_wrap_detected() {
        let line = Line::new(vec![pt(179.9, 10.0), pt(-180.0, 10.5)]).expect("valid line");
        assert!(line.clipped_at_date_line());
    }

    #[test]
    fn sign_change_without_exact_180_is_not_a_wrap() {
        let line = Line::new(vec![pt(-1.0, 0.0), pt(1.0, 0.0)]).expect("valid line");
        assert!(!line.clipped_at_date_line());
    }
}
