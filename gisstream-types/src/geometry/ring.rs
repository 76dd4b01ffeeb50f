//! The closed ring primitive and its topology predicates.

use crate::error::GeometryError;
use crate::geo::{GeoPoint, GeodeticBounds};
use crate::geometry::line::scan_points;
use crate::geometry::topology::{collinear_with_line, segments_intersect, PlanePoint};
use crate::geometry::{GeometryBase, Point};
use serde::{Deserialize, Serialize};

/// A closed loop of at least four points (first == last).
///
/// The topological predicates treat `(lon, lat)` in radians as plane
/// coordinates and assume the ring does not wrap around the international
/// date line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRing {
    points: Vec<Point>,
    is_3d: bool,
    bbox: GeodeticBounds,
    idl_wrap: bool,
    /// Extrusion and altitude attributes.
    pub base: GeometryBase,
}

impl LinearRing {
    /// Creates a ring from its vertices without topology validation.
    pub fn new(points: Vec<Point>) -> Result<Self, GeometryError> {
        Self::init(points, false)
    }

    /// Creates a ring, additionally checking that it is closed and does not
    /// self-intersect.
    pub fn new_validated(points: Vec<Point>) -> Result<Self, GeometryError> {
        Self::init(points, true)
    }

    /// Creates the clockwise ring tracing the given bounding box.
    pub fn from_bounds(bounds: &GeodeticBounds) -> Result<Self, GeometryError> {
        if bounds.east() == bounds.west() {
            log::warn!("bounding box not a polygon: east and west edges are the same");
        }
        if bounds.north() == bounds.south() {
            log::warn!("bounding box not a polygon: north and south edges are the same");
        }
        let points = vec![
            Point::new(GeoPoint::new(bounds.west(), bounds.south())),
            Point::new(GeoPoint::new(bounds.west(), bounds.north())),
            Point::new(GeoPoint::new(bounds.east(), bounds.north())),
            Point::new(GeoPoint::new(bounds.east(), bounds.south())),
            Point::new(GeoPoint::new(bounds.west(), bounds.south())),
        ];
        Self::init(points, false)
    }

    fn init(points: Vec<Point>, validate: bool) -> Result<Self, GeometryError> {
        if points.len() < 4 {
            return Err(GeometryError::TooFewPoints {
                kind: "LinearRing",
                required: 4,
                actual: points.len(),
            });
        }
        if validate {
            Self::validate_topology(&points)?;
        }
        let scan = scan_points(&points, "LinearRing");
        Ok(Self {
            points,
            is_3d: scan.is_3d,
            bbox: scan.bbox,
            idl_wrap: scan.idl_wrap,
            base: GeometryBase::default(),
        })
    }

    // Pairwise O(n^2) segment sweep. Segment pairs that share a vertex (the
    // two neighbors and the wrap-around pair) get a degenerate collinearity
    // check instead of the crossing test, which would always fire at the
    // shared vertex.
    fn validate_topology(points: &[Point]) -> Result<(), GeometryError> {
        let n = points.len();
        if points[0] != points[n - 1] {
            return Err(GeometryError::RingNotClosed);
        }
        let plane: Vec<PlanePoint> = points
            .iter()
            .map(|p| (p.coord().lon_rad(), p.coord().lat_rad()))
            .collect();
        for i in 0..n.saturating_sub(2) {
            for j in (i + 1)..(n - 1) {
                let bad = if j - i == 1 {
                    collinear_with_line(plane[i], plane[i + 1], plane[j + 1])
                } else if i == 0 && j == n - 2 {
                    collinear_with_line(plane[i], plane[i + 1], plane[j])
                } else {
                    segments_intersect(plane[i], plane[i + 1], plane[j], plane[j + 1])
                };
                if bad {
                    return Err(GeometryError::SelfIntersection);
                }
            }
        }
        Ok(())
    }

    /// The ring's vertices, first equal to last for a closed ring.
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

    /// Number of vertices, counting the closing point.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// True if a segment of this ring was clipped at the international date
    /// line. Exporters use this to re-emit -180 longitudes as +180.
    pub fn clipped_at_date_line(&self) -> bool {
        self.idl_wrap
    }

    /// True if the ring lists its points in clockwise order.
    ///
    /// Sign of twice the shoelace-formula area in the `(lon, lat)` radian
    /// plane; negative area means clockwise.
    pub fn clockwise(&self) -> bool {
        let mut double_area = 0.0;
        for w in self.points.windows(2) {
            let a = w[0].coord();
            let b = w[1].coord();
            double_area += a.lon_rad() * b.lat_rad();
            double_area -= a.lat_rad() * b.lon_rad();
        }
        double_area < 0.0
    }

    /// Even-odd ray-casting containment test for a single point.
    pub fn contains_point(&self, p: &GeoPoint) -> bool {
        let x = p.lon_rad();
        let y = p.lat_rad();
        let mut inside = false;
        for w in self.points.windows(2) {
            let (xi, yi) = (w[0].coord().lon_rad(), w[0].coord().lat_rad());
            let (xj, yj) = (w[1].coord().lon_rad(), w[1].coord().lat_rad());
            if ((yi <= y && y < yj) || (yj <= y && y < yi))
                && x < (xj - xi) * (y - yi) / (yj - yi) + xi
            {
                inside = !inside;
            }
        }
        inside
    }

    /// True if any segment of this ring crosses any segment of `other`.
    pub fn overlaps(&self, other: &LinearRing) -> bool {
        for a in self.points.windows(2) {
            let a1 = (a[0].coord().lon_rad(), a[0].coord().lat_rad());
            let a2 = (a[1].coord().lon_rad(), a[1].coord().lat_rad());
            for b in other.points.windows(2) {
                let b1 = (b[0].coord().lon_rad(), b[0].coord().lat_rad());
                let b2 = (b[1].coord().lon_rad(), b[1].coord().lat_rad());
                if segments_intersect(a1, a2, b1, b2) {
                    return true;
                }
            }
        }
        false
    }

    /// True if this ring completely contains `other`.
    ///
    /// With no crossing segments, all of `other` is on one side, so a single
    /// interior-point test decides.
    pub fn contains_ring(&self, other: &LinearRing) -> bool {
        !self.overlaps(other) && self.contains_point(other.points[0].coord())
    }

    /// True if the two rings have any area in common.
    pub fn intersects(&self, other: &LinearRing) -> bool {
        self.overlaps(other)
            || self.contains_point(other.points[0].coord())
            || other.contains_point(self.points[0].coord())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lon: f64, lat: f64) -> Point {
        Point::new(GeoPoint::new(lon, lat))
    }

    fn square(w: f64, s: f64, e: f64, n: f64) -> LinearRing {
        LinearRing::new(vec![pt(w, s), pt(w, n), pt(e, n), pt(e, s), pt(w, s)])
            .expect("valid square ring")
    }

    #[test]
    fn rejects_too_few_points() {
        assert!(matches!(
            LinearRing::new(vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(0.0, 0.0)]),
            Err(GeometryError::TooFewPoints { required: 4, .. })
        ));
    }

    #[test]
    fn validated_ring_must_close() {
        let open = vec![pt(0.0, 0.0), pt(0.0, 1.0), pt(1.0, 1.0), pt(1.0, 0.0)];
        assert!(matches!(
            LinearRing::new_validated(open),
            Err(GeometryError::RingNotClosed)
        ));
    }

    #[test]
    fn validated_ring_rejects_bowtie() {
        let bowtie = vec![
            pt(0.0, 0.0),
            pt(1.0, 1.0),
            pt(1.0, 0.0),
            pt(0.0, 1.0),
            pt(0.0, 0.0),
        ];
        assert!(matches!(
            LinearRing::new_validated(bowtie),
            Err(GeometryError::SelfIntersection)
        ));
    }

    #[test]
    fn validated_ring_accepts_convex_square() {
        let ring = vec![pt(0.0, 0.0), pt(0.0, 1.0), pt(1.0, 1.0), pt(1.0, 0.0), pt(0.0, 0.0)];
        assert!(LinearRing::new_validated(ring).is_ok());
    }

    #[test]
    fn ring_from_bounds_is_clockwise() {
        let ring = LinearRing::from_bounds(&GeodeticBounds::new(10.0, 40.0, 20.0, 50.0))
            .expect("ring from box");
        assert!(ring.clockwise());
        assert_eq!(ring.num_points(), 5);
        assert_eq!(ring.points()[0], ring.points()[4]);
    }

    #[test]
    fn counter_clockwise_detected() {
        // square traced the other way round
        let ring = LinearRing::new(vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(1.0, 1.0), pt(0.0, 1.0), pt(0.0, 0.0)])
            .expect("valid ring");
        assert!(!ring.clockwise());
    }

    #[test]
    fn contains_interior_point_not_exterior() {
        let ring = square(0.0, 0.0, 10.0, 10.0);
        assert!(ring.contains_point(&GeoPoint::new(5.0, 5.0)));
        assert!(!ring.contains_point(&GeoPoint::new(15.0, 5.0)));
        assert!(!ring.contains_point(&GeoPoint::new(-5.0, -5.0)));
    }

    #[test]
    fn ring_containment_and_intersection() {
        let outer = square(0.0, 0.0, 10.0, 10.0);
        let inner = square(2.0, 2.0, 4.0, 4.0);
        let crossing = square(8.0, 8.0, 12.0, 12.0);
        let disjoint = square(20.0, 20.0, 30.0, 30.0);

        assert!(outer.contains_ring(&inner));
        assert!(!outer.contains_ring(&crossing));
        assert!(outer.overlaps(&crossing));
        assert!(outer.intersects(&inner));
        assert!(!outer.intersects(&disjoint));
    }

    #[test]
    fn date_line_straddle_sets_wrap_flag() {
        let ring = LinearRing::new(vec![
            pt(179.9, 0.0),
            pt(-180.0, 0.0),
            pt(-180.0, 1.0),
            pt(179.9, 1.0),
            pt(179.9, 0.0),
        ])
        .expect("valid ring");
        assert!(ring.clipped_at_date_line());

        let local = square(5.0, 5.0, 6.0, 6.0);
        assert!(!local.clipped_at_date_line());
    }
}
