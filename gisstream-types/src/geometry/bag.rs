//! Heterogeneous geometry collection.

use crate::geo::{GeoPoint, GeodeticBounds};
use crate::geometry::Geometry;
use serde::{Deserialize, Serialize};

/// An ordered collection of arbitrary geometries.
///
/// Unlike the homogeneous containers a bag may be empty, in which case it
/// has no bounding box and no center.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryBag {
    members: Vec<Geometry>,
    bbox: Option<GeodeticBounds>,
}

impl GeometryBag {
    /// Creates a bag over the given members; an empty list is allowed.
    pub fn new(members: Vec<Geometry>) -> Self {
        let mut bag = Self {
            members: Vec::new(),
            bbox: None,
        };
        for m in members {
            bag.push(m);
        }
        bag
    }

    /// The member geometries.
    pub fn members(&self) -> &[Geometry] {
        &self.members
    }

    /// Appends a geometry to the bag.
    pub fn push(&mut self, geometry: Geometry) {
        if let Some(b) = geometry.bounding_box() {
            self.bbox = Some(match self.bbox {
                Some(acc) => acc.merge(b),
                None => *b,
            });
        }
        self.members.push(geometry);
    }

    /// True if the bag has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True if the bag is non-empty and every member is 3d.
    pub fn is_3d(&self) -> bool {
        !self.members.is_empty() && self.members.iter().all(Geometry::is_3d)
    }

    /// Union of the member boxes, or `None` for an empty bag.
    pub fn bounding_box(&self) -> Option<&GeodeticBounds> {
        self.bbox.as_ref()
    }

    /// Total part count over all members.
    pub fn num_parts(&self) -> usize {
        self.members.iter().map(Geometry::num_parts).sum()
    }

    /// Total point count over all members.
    pub fn num_points(&self) -> usize {
        self.members.iter().map(Geometry::num_points).sum()
    }

    /// Unweighted mean of the member centers, or `None` for an empty bag.
    ///
    /// Note this is not the center of the combined bounding box: a bag
    /// holding a point and a large polygon is pulled toward the point.
    pub fn center(&self) -> Option<GeoPoint> {
        let centers: Vec<GeoPoint> = self.members.iter().filter_map(Geometry::center).collect();
        if centers.is_empty() {
            return None;
        }
        let n = centers.len() as f64;
        let lon = centers.iter().map(GeoPoint::lon).sum::<f64>() / n;
        let lat = centers.iter().map(GeoPoint::lat).sum::<f64>() / n;
        Some(GeoPoint::new(lon, lat))
    }
}
