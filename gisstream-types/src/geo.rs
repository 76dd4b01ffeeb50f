//! Geodetic primitives: points on the surface and axis-aligned bounds.

use serde::{Deserialize, Serialize};

/// A geodetic coordinate: longitude and latitude in degrees with an optional
/// elevation in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lon: f64,
    lat: f64,
    elevation: Option<f64>,
}

impl GeoPoint {
    /// Creates a 2d point from longitude and latitude in degrees.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            elevation: None,
        }
    }

    /// Creates a 3d point with an elevation in meters.
    pub fn with_elevation(lon: f64, lat: f64, elevation: f64) -> Self {
        Self {
            lon,
            lat,
            elevation: Some(elevation),
        }
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in radians.
    pub fn lon_rad(&self) -> f64 {
        self.lon.to_radians()
    }

    /// Latitude in radians.
    pub fn lat_rad(&self) -> f64 {
        self.lat.to_radians()
    }

    /// Elevation in meters, if the point carries one.
    pub fn elevation(&self) -> Option<f64> {
        self.elevation
    }

    /// True if the point carries an elevation value.
    pub fn is_3d(&self) -> bool {
        self.elevation.is_some()
    }

    /// Returns the same location without its elevation.
    pub fn flattened(&self) -> Self {
        Self {
            lon: self.lon,
            lat: self.lat,
            elevation: None,
        }
    }
}

/// Axis-aligned geodetic bounding box, in degrees.
///
/// `east < west` is a legal state meaning the box spans the antimeridian;
/// [`GeodeticBounds::center`] accounts for it when computing the midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticBounds {
    west: f64,
    east: f64,
    south: f64,
    north: f64,
    min_elevation: Option<f64>,
    max_elevation: Option<f64>,
}

impl GeodeticBounds {
    /// Creates bounds from explicit edges in degrees.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            east,
            south,
            north,
            min_elevation: None,
            max_elevation: None,
        }
    }

    /// Creates degenerate bounds enclosing a single point.
    pub fn from_point(p: &GeoPoint) -> Self {
        Self {
            west: p.lon(),
            east: p.lon(),
            south: p.lat(),
            north: p.lat(),
            min_elevation: p.elevation(),
            max_elevation: p.elevation(),
        }
    }

    /// Western edge in degrees.
    pub fn west(&self) -> f64 {
        self.west
    }

    /// Eastern edge in degrees.
    pub fn east(&self) -> f64 {
        self.east
    }

    /// Southern edge in degrees.
    pub fn south(&self) -> f64 {
        self.south
    }

    /// Northern edge in degrees.
    pub fn north(&self) -> f64 {
        self.north
    }

    /// Minimum enclosed elevation in meters, when the bounds are 3d.
    pub fn min_elevation(&self) -> Option<f64> {
        self.min_elevation
    }

    /// Maximum enclosed elevation in meters, when the bounds are 3d.
    pub fn max_elevation(&self) -> Option<f64> {
        self.max_elevation
    }

    /// Grows the bounds to enclose the given point.
    pub fn extend(&mut self, p: &GeoPoint) {
        if p.lon() < self.west {
            self.west = p.lon();
        }
        if p.lon() > self.east {
            self.east = p.lon();
        }
        if p.lat() < self.south {
            self.south = p.lat();
        }
        if p.lat() > self.north {
            self.north = p.lat();
        }
        if let Some(e) = p.elevation() {
            self.min_elevation = Some(self.min_elevation.map_or(e, |c| c.min(e)));
            self.max_elevation = Some(self.max_elevation.map_or(e, |c| c.max(e)));
        }
    }

    /// Returns the component-wise union of two bounds.
    pub fn merge(&self, other: &Self) -> Self {
        let min_opt = |a: Option<f64>, b: Option<f64>| match (a, b) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (v, None) | (None, v) => v,
        };
        let max_opt = |a: Option<f64>, b: Option<f64>| match (a, b) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (v, None) | (None, v) => v,
        };
        Self {
            west: self.west.min(other.west),
            east: self.east.max(other.east),
            south: self.south.min(other.south),
            north: self.north.max(other.north),
            min_elevation: min_opt(self.min_elevation, other.min_elevation),
            max_elevation: max_opt(self.max_elevation, other.max_elevation),
        }
    }

    /// Midpoint of the bounds.
    ///
    /// When the box spans the antimeridian (`east < west`) the eastern edge
    /// is unwrapped by a full turn before the midpoint is taken. The center
    /// carries an elevation when the bounds do.
    pub fn center(&self) -> GeoPoint {
        let mut east = self.east;
        if east < self.west {
            east += 360.0;
        }
        let mut lon = self.west + (east - self.west) / 2.0;
        if lon > 180.0 {
            lon -= 360.0;
        }
        let lat = self.south + (self.north - self.south) / 2.0;
        match (self.min_elevation, self.max_elevation) {
            (Some(lo), Some(hi)) => GeoPoint::with_elevation(lon, lat, (lo + hi) / 2.0),
            _ => GeoPoint::new(lon, lat),
        }
    }

    /// True if every edge of `other` is within `epsilon` degrees of the
    /// corresponding edge of `self`. Elevation is ignored.
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.west - other.west).abs() < epsilon
            && (self.east - other.east).abs() < epsilon
            && (self.south - other.south).abs() < epsilon
            && (self.north - other.north).abs() < epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn extend_grows_all_edges() {
        let mut b = GeodeticBounds::from_point(&GeoPoint::new(10.0, 20.0));
        b.extend(&GeoPoint::new(-5.0, 25.0));
        assert_eq!(b.west(), -5.0);
        assert_eq!(b.east(), 10.0);
        assert_eq!(b.south(), 20.0);
        assert_eq!(b.north(), 25.0);
    }

    #[test]
    fn center_of_plain_bounds() {
        let b = GeodeticBounds::new(10.0, 40.0, 20.0, 50.0);
        let c = b.center();
        assert_abs_diff_eq!(c.lon(), 15.0);
        assert_abs_diff_eq!(c.lat(), 45.0);
        assert!(!c.is_3d());
    }

    #[test]
    fn center_unwraps_antimeridian() {
        let b = GeodeticBounds::new(170.0, -10.0, -170.0, 10.0);
        let c = b.center();
        assert_abs_diff_eq!(c.lon(), 180.0);
        assert_abs_diff_eq!(c.lat(), 0.0);
    }

    #[test]
    fn elevation_tracked_through_extend() {
        let mut b = GeodeticBounds::from_point(&GeoPoint::with_elevation(0.0, 0.0, 100.0));
        b.extend(&GeoPoint::with_elevation(1.0, 1.0, 300.0));
        assert_eq!(b.min_elevation(), Some(100.0));
        assert_eq!(b.max_elevation(), Some(300.0));
        assert_eq!(b.center().elevation(), Some(200.0));
    }
}
