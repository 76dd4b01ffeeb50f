//! Planar topology predicates shared by the ring and polygon types.
//!
//! All tests treat `(lon, lat)` in radians as plane coordinates; rings that
//! wrap around the antimeridian are outside the domain of these predicates.

/// Relative orientation of an ordered point triplet in the plane.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Orientation {
    Clockwise,
    Counterclockwise,
    Collinear,
}

pub(crate) type PlanePoint = (f64, f64);

impl Orientation {
    /// Orientation of the triplet `(p, q, r)`.
    pub(crate) fn triplet(p: PlanePoint, q: PlanePoint, r: PlanePoint) -> Self {
        let val = (q.1 - p.1) * (r.0 - q.0) - (q.0 - p.0) * (r.1 - q.1);
        if val == 0.0 {
            Orientation::Collinear
        } else if val > 0.0 {
            Orientation::Clockwise
        } else {
            Orientation::Counterclockwise
        }
    }
}

fn on_segment(p: PlanePoint, q: PlanePoint, r: PlanePoint) -> bool {
    q.0 <= p.0.max(r.0) && q.0 >= p.0.min(r.0) && q.1 <= p.1.max(r.1) && q.1 >= p.1.min(r.1)
}

/// True if segment `a1-a2` has at least one common point with `b1-b2`.
pub(crate) fn segments_intersect(
    a1: PlanePoint,
    a2: PlanePoint,
    b1: PlanePoint,
    b2: PlanePoint,
) -> bool {
    let o1 = Orientation::triplet(a1, a2, b1);
    let o2 = Orientation::triplet(a1, a2, b2);
    let o3 = Orientation::triplet(b1, b2, a1);
    let o4 = Orientation::triplet(b1, b2, a2);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == Orientation::Collinear && on_segment(a1, b1, a2))
        || (o2 == Orientation::Collinear && on_segment(a1, b2, a2))
        || (o3 == Orientation::Collinear && on_segment(b1, a1, b2))
        || (o4 == Orientation::Collinear && on_segment(b1, a2, b2))
}

/// True if `p` lies exactly on the infinite line through `a` and `b`.
///
/// Used for the degenerate check between neighbor ring segments, where a
/// full crossing test would always report the shared vertex.
pub(crate) fn collinear_with_line(a: PlanePoint, b: PlanePoint, p: PlanePoint) -> bool {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0) == 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments_intersect() {
        assert!(segments_intersect(
            (0.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (1.0, 0.0)
        ));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(!segments_intersect(
            (0.0, 0.0),
            (1.0, 0.0),
            (0.0, 1.0),
            (1.0, 1.0)
        ));
    }

    #[test]
    fn touching_endpoint_counts_as_intersection() {
        assert!(segments_intersect(
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 0.0),
            (2.0, 1.0)
        ));
    }

    #[test]
    fn collinear_point_detection() {
        assert!(collinear_with_line((0.0, 0.0), (2.0, 2.0), (3.0, 3.0)));
        assert!(!collinear_with_line((0.0, 0.0), (2.0, 2.0), (3.0, 2.0)));
    }
}
