//! Value model for streaming GIS data interchange.
//!
//! This crate defines the two halves of the in-memory model shared by every
//! reader and writer in the workspace:
//!
//! * the [`geometry`] module — a closed set of geodetic geometry variants
//!   (points, lines, rings, polygons, collections) together with the planar
//!   topology predicates that validate them;
//! * the [`events`] module — the typed objects a document stream is made of
//!   (features, container markers, styles, schemata).
//!
//! Readers produce a forward-only sequence of [`events::GisObject`] values;
//! writers consume the same sequence. Nothing in this crate performs I/O.

pub mod error;
pub mod events;
pub mod geo;
pub mod geometry;

pub use error::GeometryError;
pub use geo::{GeoPoint, GeodeticBounds};
pub use geometry::Geometry;
