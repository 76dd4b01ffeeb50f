//! Externally referenced 3d asset anchored at a point.

use crate::geo::{GeoPoint, GeodeticBounds};
use crate::geometry::AltitudeMode;
use serde::{Deserialize, Serialize};

/// A placeholder for a textured 3d asset positioned at a single location.
///
/// Only the location and altitude mode are modeled; the asset reference and
/// orientation travel with the owning feature's untyped elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    location: GeoPoint,
    bbox: GeodeticBounds,
    /// Vertical interpretation of the location's elevation.
    pub altitude_mode: Option<AltitudeMode>,
}

impl Model {
    /// Creates a model anchored at the given location.
    pub fn new(location: GeoPoint) -> Self {
        Self {
            location,
            bbox: GeodeticBounds::from_point(&location),
            altitude_mode: None,
        }
    }

    /// The anchor location.
    pub fn location(&self) -> &GeoPoint {
        &self.location
    }

    /// True if the location carries an elevation.
    pub fn is_3d(&self) -> bool {
        self.location.is_3d()
    }

    /// Degenerate box around the anchor location.
    pub fn bounding_box(&self) -> &GeodeticBounds {
        &self.bbox
    }
}
