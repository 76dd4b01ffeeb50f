//! KMZ archive output.
//!
//! A KMZ file is a zip archive whose first entry, `doc.kml`, holds the
//! document; further entries carry referenced resources such as icons and
//! linked files. [`KmzWriter`] enforces that shape as a two-phase state
//! machine: objects stream into the document entry first, then the
//! document is finalized and supporting entries are appended.

use crate::error::KmlError;
use crate::writer::KmlWriter;
use gisstream_types::events::GisObject;
use std::io::{Read, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Name of the document entry.
pub const DOC_ENTRY: &str = "doc.kml";

enum State<W: Write + Seek> {
    Doc(KmlWriter<ZipWriter<W>>),
    Entries(ZipWriter<W>),
    Done,
}

/// Writes a KMZ archive: a streamed `doc.kml` plus supporting entries.
pub struct KmzWriter<W: Write + Seek> {
    state: State<W>,
}

impl<W: Write + Seek> KmzWriter<W> {
    /// Creates an archive writer over a seekable sink.
    pub fn new(sink: W) -> Result<Self, KmlError> {
        let mut zip = ZipWriter::new(sink);
        zip.start_file(DOC_ENTRY, SimpleFileOptions::default())?;
        Ok(Self {
            state: State::Doc(KmlWriter::new(zip)),
        })
    }

    /// Writes one object into the document entry.
    ///
    /// Fails once the document has been finalized by
    /// [`KmzWriter::add_entry`] or [`KmzWriter::finish`].
    pub fn write(&mut self, obj: &GisObject) -> Result<(), KmlError> {
        match &mut self.state {
            State::Doc(writer) => writer.write(obj),
            _ => Err(KmlError::Other(
                "document entry already finalized".to_string(),
            )),
        }
    }

    /// Writes every object of an iterator into the document entry.
    pub fn write_all<'a, I>(&mut self, objects: I) -> Result<(), KmlError>
    where
        I: IntoIterator<Item = &'a GisObject>,
    {
        for obj in objects {
            self.write(obj)?;
        }
        Ok(())
    }

    /// Closes the document entry; later writes become errors.
    pub fn finish_document(&mut self) -> Result<(), KmlError> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::Doc(writer) => {
                self.state = State::Entries(writer.close()?);
                Ok(())
            }
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    /// Appends a supporting entry, finalizing the document first if
    /// needed. Returns the number of bytes copied.
    pub fn add_entry(&mut self, name: &str, content: &mut dyn Read) -> Result<u64, KmlError> {
        self.finish_document()?;
        match &mut self.state {
            State::Entries(zip) => {
                zip.start_file(name, SimpleFileOptions::default())?;
                Ok(std::io::copy(content, zip)?)
            }
            _ => Err(KmlError::Other("archive already closed".to_string())),
        }
    }

    /// Writes the archive directory and returns the sink.
    pub fn finish(mut self) -> Result<W, KmlError> {
        self.finish_document()?;
        match std::mem::replace(&mut self.state, State::Done) {
            State::Entries(zip) => Ok(zip.finish()?),
            _ => Err(KmlError::Other("archive already closed".to_string())),
        }
    }
}
