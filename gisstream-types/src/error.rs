//! Error type used by the crate.

use thiserror::Error;

/// Error raised when a geometry cannot be constructed from its input.
///
/// Structural rules (minimum point counts, presence of an outer ring) are
/// always enforced. Topology rules are checked only by the `new_validated`
/// constructors; each variant names the rule that failed.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Fewer points were supplied than the geometry requires.
    #[error("{kind} must contain at least {required} points, got {actual}")]
    TooFewPoints {
        /// Geometry kind being constructed.
        kind: &'static str,
        /// Minimum number of points for this kind.
        required: usize,
        /// Number of points actually supplied.
        actual: usize,
    },
    /// A ring's first and last points differ.
    #[error("linear ring must start and end with the same point")]
    RingNotClosed,
    /// Two non-adjacent ring segments cross each other.
    #[error("linear ring must not self-intersect")]
    SelfIntersection,
    /// A ring lists its points in the wrong direction for its role.
    #[error("{0}")]
    WrongOrientation(&'static str),
    /// An inner ring is not properly contained in the outer ring.
    #[error("all inner rings must be properly contained in the outer ring")]
    InnerRingOutside,
    /// Two inner rings of one polygon overlap.
    #[error("inner rings must not overlap with each other")]
    InnerRingsOverlap,
}
