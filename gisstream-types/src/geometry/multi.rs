//! Homogeneous geometry collections.
//!
//! All four containers require at least one member and aggregate the member
//! bounding boxes, part counts and point counts. Mixed dimensionality among
//! members downgrades the container to 2d, matching the primitive rules.

use crate::error::GeometryError;
use crate::geo::GeodeticBounds;
use crate::geometry::{Line, LinearRing, Point, Polygon};
use serde::{Deserialize, Serialize};

macro_rules! multi_geometry {
    ($(#[$doc:meta])* $name:ident, $member:ty, $kind:literal,
     parts = $parts:expr, points = $points:expr, bbox = $bbox:expr, is_3d = $is_3d:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            members: Vec<$member>,
            is_3d: bool,
            bbox: GeodeticBounds,
        }

        impl $name {
            /// Creates the collection; at least one member is required.
            pub fn new(members: Vec<$member>) -> Result<Self, GeometryError> {
                if members.is_empty() {
                    return Err(GeometryError::TooFewPoints {
                        kind: $kind,
                        required: 1,
                        actual: 0,
                    });
                }
                let mut is_3d = $is_3d(&members[0]);
                let mut bbox = $bbox(&members[0]);
                for m in &members[1..] {
                    if is_3d && !$is_3d(m) {
                        log::info!(concat!(
                            $kind,
                            " members have mixed dimensionality: downgrading to 2d"
                        ));
                        is_3d = false;
                    }
                    bbox = bbox.merge(&$bbox(m));
                }
                Ok(Self {
                    members,
                    is_3d,
                    bbox,
                })
            }

            /// The member geometries.
            pub fn members(&self) -> &[$member] {
                &self.members
            }

            /// True if every member is 3d.
            pub fn is_3d(&self) -> bool {
                self.is_3d
            }

            /// Box enclosing all members.
            pub fn bounding_box(&self) -> &GeodeticBounds {
                &self.bbox
            }

            /// Total part count over all members.
            pub fn num_parts(&self) -> usize {
                self.members.iter().map($parts).sum()
            }

            /// Total point count over all members.
            pub fn num_points(&self) -> usize {
                self.members.iter().map($points).sum()
            }
        }
    };
}

multi_geometry!(
    /// A collection of one or more points.
    MultiPoint, Point, "MultiPoint",
    parts = |_: &Point| 1,
    points = |_: &Point| 1,
    bbox = |p: &Point| *p.bounding_box(),
    is_3d = Point::is_3d
);

multi_geometry!(
    /// A collection of one or more lines.
    MultiLine, Line, "MultiLine",
    parts = |_: &Line| 1,
    points = Line::num_points,
    bbox = |l: &Line| *l.bounding_box(),
    is_3d = Line::is_3d
);

multi_geometry!(
    /// A collection of one or more closed rings.
    MultiLinearRings, LinearRing, "MultiLinearRings",
    parts = |_: &LinearRing| 1,
    points = LinearRing::num_points,
    bbox = |r: &LinearRing| *r.bounding_box(),
    is_3d = LinearRing::is_3d
);

multi_geometry!(
    /// A collection of one or more polygons.
    MultiPolygons, Polygon, "MultiPolygons",
    parts = Polygon::num_parts,
    points = Polygon::num_points,
    bbox = |p: &Polygon| *p.bounding_box(),
    is_3d = Polygon::is_3d
);

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
    fn empty_collection_rejected() {
        assert!(MultiPoint::new(vec![]).is_err());
        assert!(MultiLine::new(vec![]).is_err());
    }

    #[test]
    fn multipoint_aggregates_bounds_and_counts() {
        let mp = MultiPoint::new(vec![pt(0.0, 0.0), pt(10.0, 5.0), pt(-3.0, 8.0)])
            .expect("non-empty multipoint");
        assert_eq!(mp.num_parts(), 3);
        assert_eq!(mp.num_points(), 3);
        let b = mp.bounding_box();
        assert_eq!(b.west(), -3.0);
        assert_eq!(b.east(), 10.0);
        assert_eq!(b.south(), 0.0);
        assert_eq!(b.north(), 8.0);
    }

    #[test]
    fn mixed_members_downgrade_to_2d() {
        let mp = MultiPoint::new(vec![pt3(0.0, 0.0, 5.0), pt(1.0, 1.0)])
            .expect("non-empty multipoint");
        assert!(!mp.is_3d());

        let all_3d = MultiPoint::new(vec![pt3(0.0, 0.0, 5.0), pt3(1.0, 1.0, 6.0)])
            .expect("non-empty multipoint");
        assert!(all_3d.is_3d());
    }

    #[test]
    fn multiline_counts_points_across_members() {
        let ml = MultiLine::new(vec![
            Line::new(vec![pt(0.0, 0.0), pt(1.0, 1.0)]).expect("line"),
            Line::new(vec![pt(2.0, 2.0), pt(3.0, 3.0), pt(4.0, 4.0)]).expect("line"),
        ])
        .expect("non-empty multiline");
        assert_eq!(ml.num_parts(), 2);
        assert_eq!(ml.num_points(), 5);
    }

    #[test]
    fn multipolygons_count_holes_as_parts() {
        let outer = LinearRing::new(vec![
            pt(0.0, 0.0),
            pt(0.0, 10.0),
            pt(10.0, 10.0),
            pt(10.0, 0.0),
            pt(0.0, 0.0),
        ])
        .expect("ring");
        let hole = LinearRing::new(vec![
            pt(2.0, 2.0),
            pt(4.0, 2.0),
            pt(4.0, 4.0),
            pt(2.0, 4.0),
            pt(2.0, 2.0),
        ])
        .expect("ring");
        let mp = MultiPolygons::new(vec![Polygon::new(outer, vec![hole])])
            .expect("non-empty multipolygons");
        assert_eq!(mp.num_parts(), 2);
        assert_eq!(mp.num_points(), 10);
    }
}
