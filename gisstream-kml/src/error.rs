//! Error type used by the crate.

use thiserror::Error;

/// Any failure raised while reading, writing or resolving KML resources.
#[derive(Debug, Error)]
pub enum KmlError {
    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed XML in the source document.
    #[error("xml stream error: {0}")]
    Stream(#[from] quick_xml::Error),
    /// A geometry could not be constructed from document content.
    #[error("invalid geometry: {0}")]
    Geometry(#[from] gisstream_types::GeometryError),
    /// Archive could not be read or written.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// A URL could not be parsed.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    /// An HTTP fetch failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The named entry was not found in the archive.
    #[error("entry not found in archive: {0}")]
    EntryNotFound(String),
    /// A dateTime value matched none of the accepted KML forms.
    #[error("unparseable date {value:?}: {source}")]
    DateParse {
        /// The offending lexical value.
        value: String,
        /// Failure from the last pattern tried.
        source: chrono::ParseError,
    },
    /// Anything that does not fit the other variants.
    #[error("{0}")]
    Other(String),
}
