//! References to documents and resources, inside or outside archives.
//!
//! A [`UrlRef`] names either a plain URL or an entry inside a compressed
//! archive. The archived form serializes to a compound URI, `kmz` glued in
//! front of the archive URL with the entry carried in a trailing `file=`
//! query parameter, so a reference into an archive can travel through
//! string-typed link fields and come back out intact.

use crate::error::KmlError;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use url::Url;
use zip::ZipArchive;

/// MIME type of a KML document.
pub const MIME_TYPE_KML: &str = "application/vnd.google-earth.kml+xml";
/// MIME type of a KMZ archive.
pub const MIME_TYPE_KMZ: &str = "application/vnd.google-earth.kmz";
/// Accept header offered when fetching linked resources.
pub const ACCEPT: &str =
    "application/vnd.google-earth.kml+xml, application/vnd.google-earth.kmz, image/*, */*";
/// User agent offered when fetching linked resources. Servers tailor KML
/// responses to Google Earth clients, so the fetch presents itself as one.
pub const USER_AGENT: &str = "GoogleEarth/5.2.1.1547(Windows;Microsoft Windows \
     (5.1.2600.3);en-US;kml:2.2;client:Free;type:default)";

/// True for file names with the KMZ extension, case-insensitive.
pub fn is_kmz_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".kmz")
}

/// A resolved reference to a document or resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlRef {
    /// A directly fetchable URL.
    Plain(Url),
    /// An entry inside a compressed archive.
    Archived {
        /// URL of the archive itself.
        archive: Url,
        /// Normalized entry path within the archive.
        entry: String,
    },
}

impl UrlRef {
    /// Wraps a plain URL.
    pub fn plain(url: Url) -> Self {
        UrlRef::Plain(url)
    }

    /// A reference to an entry inside the archive at `archive`.
    ///
    /// The entry is normalized: a single leading `/` and any leading `../`
    /// runs are stripped. An entry that normalizes to nothing is an error.
    pub fn archived(archive: Url, entry: &str) -> Result<Self, KmlError> {
        let entry = normalize_entry(entry);
        if entry.is_empty() {
            return Err(KmlError::Other(format!(
                "empty entry for archive {archive}"
            )));
        }
        Ok(UrlRef::Archived { archive, entry })
    }

    /// Parses either a plain URL or the compound `kmz...file=` form.
    pub fn parse(uri: &str) -> Result<Self, KmlError> {
        let uri = uri.trim();
        if let Some(rest) = uri.strip_prefix("kmz") {
            // the entry follows the last file= marker; the byte before it
            // is the ? or & separator
            if let Some(idx) = rest.rfind("file=") {
                if idx > 1 {
                    let archive = Url::parse(&rest[..idx - 1])?;
                    return Self::archived(archive, &rest[idx + 5..]);
                }
            }
            return Err(KmlError::Other(format!("malformed archive uri: {uri}")));
        }
        Ok(UrlRef::Plain(Url::parse(uri)?))
    }

    /// The fetchable URL: the archive URL for archived references.
    pub fn url(&self) -> &Url {
        match self {
            UrlRef::Plain(url) => url,
            UrlRef::Archived { archive, .. } => archive,
        }
    }

    /// The entry path for archived references.
    pub fn entry(&self) -> Option<&str> {
        match self {
            UrlRef::Plain(_) => None,
            UrlRef::Archived { entry, .. } => Some(entry),
        }
    }

    /// True for references into an archive.
    pub fn is_archived(&self) -> bool {
        matches!(self, UrlRef::Archived { .. })
    }

    /// True if the reference targets a KMZ archive.
    pub fn is_kmz(&self) -> bool {
        self.is_archived() || is_kmz_name(self.url().path())
    }

    /// The string form: the URL itself, or the compound `kmz...file=` URI.
    pub fn to_uri(&self) -> String {
        match self {
            UrlRef::Plain(url) => url.as_str().to_string(),
            UrlRef::Archived { archive, entry } => {
                let sep = if archive.query().is_some() { '&' } else { '?' };
                format!("kmz{archive}{sep}file={entry}")
            }
        }
    }

    /// Opens the referenced resource for reading.
    ///
    /// Archived references fetch the whole archive and return the entry's
    /// bytes. An entry missing from the archive falls back to the sibling
    /// URL next to the archive, for archives that reference loose files
    /// alongside themselves.
    pub fn open(&self) -> Result<Box<dyn Read>, KmlError> {
        match self {
            UrlRef::Plain(url) => open_url(url),
            UrlRef::Archived { archive, entry } => {
                let mut bytes = Vec::new();
                open_url(archive)?.read_to_end(&mut bytes)?;
                let mut zip = ZipArchive::new(Cursor::new(bytes))?;
                let wanted = unescape_spaces(entry);
                let found = zip
                    .file_names()
                    .find(|name| unescape_spaces(name) == wanted)
                    .map(str::to_string);
                if let Some(name) = found {
                    let mut content = Vec::new();
                    zip.by_name(&name)?.read_to_end(&mut content)?;
                    return Ok(Box::new(Cursor::new(content)));
                }
                match archive.join(entry) {
                    Ok(sibling) => open_url(&sibling)
                        .map_err(|_| KmlError::EntryNotFound(entry.clone())),
                    Err(_) => Err(KmlError::EntryNotFound(entry.clone())),
                }
            }
        }
    }
}

impl fmt::Display for UrlRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

/// Opens a plain URL: local files directly, http(s) via a blocking fetch.
pub(crate) fn open_url(url: &Url) -> Result<Box<dyn Read>, KmlError> {
    match url.scheme() {
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| KmlError::Other(format!("not a local path: {url}")))?;
            Ok(Box::new(File::open(path)?))
        }
        "http" | "https" => {
            let client = reqwest::blocking::Client::builder()
                .user_agent(USER_AGENT)
                .build()?;
            let response = client
                .get(url.clone())
                .header(reqwest::header::ACCEPT, ACCEPT)
                .send()?
                .error_for_status()?;
            Ok(Box::new(response))
        }
        other => Err(KmlError::Other(format!("unsupported url scheme: {other}"))),
    }
}

fn normalize_entry(entry: &str) -> String {
    let mut entry = entry.strip_prefix('/').unwrap_or(entry);
    while let Some(rest) = entry.strip_prefix("../") {
        entry = rest;
    }
    entry.to_string()
}

/// Archive entry names may carry literal spaces while references escape
/// them; comparisons happen in unescaped space.
fn unescape_spaces(s: &str) -> String {
    s.replace("%20", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_uri_round_trips() {
        let archive = Url::parse("http://example.com/data.kmz").expect("url");
        let r = UrlRef::archived(archive, "images/pic.png").expect("ref");
        let uri = r.to_uri();
        assert_eq!(uri, "kmzhttp://example.com/data.kmz?file=images/pic.png");
        assert_eq!(UrlRef::parse(&uri).expect("parse"), r);
    }

    #[test]
    fn archive_url_with_query_separates_with_ampersand() {
        let archive = Url::parse("http://example.com/fetch?id=7").expect("url");
        let r = UrlRef::archived(archive, "doc.kml").expect("ref");
        let uri = r.to_uri();
        assert_eq!(uri, "kmzhttp://example.com/fetch?id=7&file=doc.kml");
        assert_eq!(UrlRef::parse(&uri).expect("parse"), r);
    }

    #[test]
    fn entry_normalization_strips_leading_segments() {
        let archive = Url::parse("file:///tmp/a.kmz").expect("url");
        let r = UrlRef::archived(archive.clone(), "/images/i.png").expect("ref");
        assert_eq!(r.entry(), Some("images/i.png"));
        let r = UrlRef::archived(archive.clone(), "../../up.kml").expect("ref");
        assert_eq!(r.entry(), Some("up.kml"));
        assert!(UrlRef::archived(archive, "/").is_err());
    }

    #[test]
    fn plain_uri_parses_as_plain() {
        let r = UrlRef::parse("http://example.com/doc.kml").expect("parse");
        assert!(!r.is_archived());
        assert_eq!(r.entry(), None);
        assert!(!r.is_kmz());
    }

    #[test]
    fn kmz_detection_by_extension() {
        let r = UrlRef::parse("http://example.com/Data.KMZ").expect("parse");
        assert!(r.is_kmz());
        assert!(is_kmz_name("a/b/C.Kmz"));
        assert!(!is_kmz_name("doc.kml"));
    }

    #[test]
    fn malformed_compound_uri_is_an_error() {
        assert!(UrlRef::parse("kmzhttp://example.com/a.kmz").is_err());
        assert!(UrlRef::parse("kmzfile=x").is_err());
    }

    #[test]
    fn open_reads_entry_from_local_archive() {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("test.kmz");
        let file = File::create(&path).expect("create");
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("doc.kml", SimpleFileOptions::default())
            .expect("entry");
        zip.write_all(b"<kml/>").expect("content");
        zip.finish().expect("finish");

        let archive = Url::from_file_path(&path).expect("file url");
        let r = UrlRef::archived(archive.clone(), "doc.kml").expect("ref");
        let mut content = String::new();
        r.open()
            .expect("open")
            .read_to_string(&mut content)
            .expect("read");
        assert_eq!(content, "<kml/>");

        let missing = UrlRef::archived(archive, "nope.kml").expect("ref");
        assert!(matches!(missing.open(), Err(KmlError::EntryNotFound(_))));
    }
}
