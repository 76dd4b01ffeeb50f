//! Streaming KML and KMZ codecs over the `gisstream-types` object model.
//!
//! Reading and writing both operate on a flat [`GisObject`] sequence, so a
//! document of any size streams in constant memory:
//!
//! * [`KmlReader`] pulls objects out of a KML byte stream, emitting style
//!   and schema definitions ahead of the features that reference them;
//! * [`KmlWriter`] turns the same sequence back into KML, dropping empty
//!   containers and attaching floating styles to the next element;
//! * [`KmlImporter`] opens files, URLs and KMZ archives, resolves the
//!   links a document carries and can fetch the linked documents;
//! * [`KmzWriter`] streams a document plus supporting files into a KMZ
//!   archive.
//!
//! ```no_run
//! use gisstream_kml::KmlImporter;
//!
//! # fn main() -> Result<(), gisstream_kml::KmlError> {
//! let mut importer = KmlImporter::from_file("places.kml")?;
//! while let Some(obj) = importer.read()? {
//!     println!("{}", obj.kind());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`GisObject`]: gisstream_types::events::GisObject

pub mod consts;
pub mod error;
pub mod import;
pub mod kmz;
pub mod link;
pub mod reader;
pub mod uref;
pub mod writer;
mod xml;

pub use error::KmlError;
pub use import::KmlImporter;
pub use kmz::KmzWriter;
pub use reader::KmlReader;
pub use uref::UrlRef;
pub use writer::KmlWriter;
