//! Polygon: an outer ring with optional holes.

use crate::error::GeometryError;
use crate::geo::GeodeticBounds;
use crate::geometry::{GeometryBase, LinearRing};
use serde::{Deserialize, Serialize};

/// An outer boundary ring with zero or more inner holes.
///
/// KML winding conventions apply: the outer ring runs clockwise, inner
/// rings counter-clockwise. The plain constructor accepts any winding;
/// [`Polygon::new_validated`] enforces the conventions along with hole
/// containment and pairwise hole disjointness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    outer: LinearRing,
    inners: Vec<LinearRing>,
    is_3d: bool,
    bbox: GeodeticBounds,
    /// Extrusion and altitude attributes.
    pub base: GeometryBase,
}

impl Polygon {
    /// Creates a polygon from its rings without topology validation.
    pub fn new(outer: LinearRing, inners: Vec<LinearRing>) -> Self {
        let mut is_3d = outer.is_3d();
        let mut bbox = *outer.bounding_box();
        for ring in &inners {
            if is_3d && !ring.is_3d() {
                log::info!("Polygon rings have mixed dimensionality: downgrading to 2d");
                is_3d = false;
            }
            bbox = bbox.merge(ring.bounding_box());
        }
        Self {
            outer,
            inners,
            is_3d,
            bbox,
            base: GeometryBase::default(),
        }
    }

    /// Creates a polygon, enforcing ring orientation, hole containment and
    /// hole disjointness.
    pub fn new_validated(
        outer: LinearRing,
        inners: Vec<LinearRing>,
    ) -> Result<Self, GeometryError> {
        if !outer.clockwise() {
            return Err(GeometryError::WrongOrientation(
                "polygon outer ring must be in clockwise point order",
            ));
        }
        for ring in &inners {
            if ring.clockwise() {
                return Err(GeometryError::WrongOrientation(
                    "polygon inner rings must be in counter-clockwise point order",
                ));
            }
            if !outer.contains_ring(ring) {
                return Err(GeometryError::InnerRingOutside);
            }
        }
        for (i, a) in inners.iter().enumerate() {
            for b in &inners[i + 1..] {
                if a.intersects(b) {
                    return Err(GeometryError::InnerRingsOverlap);
                }
            }
        }
        Ok(Self::new(outer, inners))
    }

    /// The outer boundary ring.
    pub fn outer_ring(&self) -> &LinearRing {
        &self.outer
    }

    /// The hole rings, possibly empty.
    pub fn inner_rings(&self) -> &[LinearRing] {
        &self.inners
    }

    /// True if every ring is 3d.
    pub fn is_3d(&self) -> bool {
        self.is_3d
    }

    /// Box enclosing all rings.
    pub fn bounding_box(&self) -> &GeodeticBounds {
        &self.bbox
    }

    /// One part for the outer ring plus one per hole.
    pub fn num_parts(&self) -> usize {
        1 + self.inners.len()
    }

    /// Total vertex count over all rings.
    pub fn num_points(&self) -> usize {
        self.outer.num_points() + self.inners.iter().map(LinearRing::num_points).sum::<usize>()
    }

    /// True if any ring was clipped at the international date line.
    pub fn clipped_at_date_line(&self) -> bool {
        self.outer.clipped_at_date_line()
            || self.inners.iter().any(LinearRing::clipped_at_date_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::geometry::Point;

    fn pt(lon: f64, lat: f64) -> Point {
        Point::new(GeoPoint::new(lon, lat))
    }

    // clockwise in the (lon, lat) plane
    fn cw_square(w: f64, s: f64, e: f64, n: f64) -> LinearRing {
        LinearRing::new(vec![pt(w, s), pt(w, n), pt(e, n), pt(e, s), pt(w, s)])
            .expect("valid ring")
    }

    fn ccw_square(w: f64, s: f64, e: f64, n: f64) -> LinearRing {
        LinearRing::new(vec![pt(w, s), pt(e, s), pt(e, n), pt(w, n), pt(w, s)])
            .expect("valid ring")
    }

    #[test]
    fn validated_polygon_with_hole() {
        let poly = Polygon::new_validated(
            cw_square(0.0, 0.0, 10.0, 10.0),
            vec![ccw_square(2.0, 2.0, 4.0, 4.0)],
        )
        .expect("valid polygon");
        assert_eq!(poly.num_parts(), 2);
        assert_eq!(poly.num_points(), 10);
    }

    #[test]
    fn outer_ring_must_be_clockwise() {
        assert!(matches!(
            Polygon::new_validated(ccw_square(0.0, 0.0, 10.0, 10.0), vec![]),
            Err(GeometryError::WrongOrientation(_))
        ));
    }

    #[test]
    fn inner_ring_must_be_counter_clockwise() {
        assert!(matches!(
            Polygon::new_validated(
                cw_square(0.0, 0.0, 10.0, 10.0),
                vec![cw_square(2.0, 2.0, 4.0, 4.0)],
            ),
            Err(GeometryError::WrongOrientation(_))
        ));
    }

    #[test]
    fn inner_ring_outside_outer_rejected() {
        assert!(matches!(
            Polygon::new_validated(
                cw_square(0.0, 0.0, 10.0, 10.0),
                vec![ccw_square(20.0, 20.0, 24.0, 24.0)],
            ),
            Err(GeometryError::InnerRingOutside)
        ));
    }

    #[test]
    fn overlapping_inner_rings_rejected() {
        assert!(matches!(
            Polygon::new_validated(
                cw_square(0.0, 0.0, 10.0, 10.0),
                vec![
                    ccw_square(2.0, 2.0, 5.0, 5.0),
                    ccw_square(4.0, 4.0, 7.0, 7.0),
                ],
            ),
            Err(GeometryError::InnerRingsOverlap)
        ));
    }

    #[test]
    fn plain_constructor_accepts_any_winding() {
        let poly = Polygon::new(ccw_square(0.0, 0.0, 10.0, 10.0), vec![]);
        assert_eq!(poly.num_parts(), 1);
    }

    #[test]
    fn mixed_ring_dimensionality_downgrades() {
        let outer = LinearRing::new(vec![
            Point::new(GeoPoint::with_elevation(0.0, 0.0, 5.0)),
            Point::new(GeoPoint::with_elevation(0.0, 10.0, 5.0)),
            Point::new(GeoPoint::with_elevation(10.0, 10.0, 5.0)),
            Point::new(GeoPoint::with_elevation(10.0, 0.0, 5.0)),
            Point::new(GeoPoint::with_elevation(0.0, 0.0, 5.0)),
        ])
        .expect("valid ring");
        assert!(outer.is_3d());
        let poly = Polygon::new(outer, vec![ccw_square(2.0, 2.0, 4.0, 4.0)]);
        assert!(!poly.is_3d());
    }
}
