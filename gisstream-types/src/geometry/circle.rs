//! Circle geometry with an export shape hint.

use crate::geo::{GeoPoint, GeodeticBounds};
use crate::geometry::GeometryBase;
use serde::{Deserialize, Serialize};

/// Mean earth radius in meters, used to convert the circle radius into an
/// angular extent for the bounding box.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// How a circle should be rendered by formats without a native circle
/// element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircleHint {
    /// Approximate the circumference with an open line.
    Line,
    /// Approximate the circumference with a closed ring.
    Ring,
    /// Approximate the disk with a polygon.
    #[default]
    Polygon,
}

/// A circle around a center point with a radius in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    center: GeoPoint,
    radius_m: f64,
    bbox: GeodeticBounds,
    /// Export shape for formats without a circle element.
    pub hint: CircleHint,
    /// Extrusion and altitude attributes.
    pub base: GeometryBase,
}

impl Circle {
    /// Creates a circle from its center and a radius in meters.
    pub fn new(center: GeoPoint, radius_m: f64) -> Self {
        let d_lat = (radius_m / EARTH_RADIUS_M).to_degrees();
        let d_lon = d_lat / center.lat_rad().cos().abs().max(f64::EPSILON);
        let bbox = GeodeticBounds::new(
            center.lon() - d_lon,
            center.lat() - d_lat,
            center.lon() + d_lon,
            center.lat() + d_lat,
        );
        Self {
            center,
            radius_m,
            bbox,
            hint: CircleHint::default(),
            base: GeometryBase::default(),
        }
    }

    /// The circle's center.
    pub fn center(&self) -> &GeoPoint {
        &self.center
    }

    /// The radius in meters.
    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// True if the center carries an elevation.
    pub fn is_3d(&self) -> bool {
        self.center.is_3d()
    }

    /// Box enclosing the circle, from a spherical-earth radius conversion.
    pub fn bounding_box(&self) -> &GeodeticBounds {
        &self.bbox
    }

    /// Points approximating the circumference, closed when `close` is set.
    ///
    /// Small-angle planar approximation around the center; adequate for the
    /// radii circles are used for in practice.
    pub fn boundary_points(&self, num_points: usize, close: bool) -> Vec<GeoPoint> {
        if num_points == 0 {
            return Vec::new();
        }
        let d_lat = (self.radius_m / EARTH_RADIUS_M).to_degrees();
        let d_lon = d_lat / self.center.lat_rad().cos().abs().max(f64::EPSILON);
        let mut points = Vec::with_capacity(num_points + usize::from(close));
        for i in 0..num_points {
            let angle = std::f64::consts::TAU * i as f64 / num_points as f64;
            points.push(GeoPoint::new(
                self.center.lon() + d_lon * angle.cos(),
                self.center.lat() + d_lat * angle.sin(),
            ));
        }
        if close {
            points.push(points[0]);
        }
        points
    }
}
