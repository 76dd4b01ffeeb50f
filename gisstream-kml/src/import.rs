//! Document import: opening files, URLs and archives, and following
//! network links.

use crate::error::KmlError;
use crate::link::resolve_link;
use crate::reader::KmlReader;
use crate::uref::UrlRef;
use gisstream_types::events::{GisObject, IdGenerator};
use std::collections::{HashSet, VecDeque};
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;
use url::Url;
use zip::ZipArchive;

/// Magic bytes opening a zip archive.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Reads a KML or KMZ source and resolves the references it carries.
///
/// On top of [`KmlReader`], the importer knows where the document came
/// from: relative hrefs in network links and overlay icons are rewritten
/// to absolute URIs (compound archive URIs when the document is
/// compressed), and every network-link target is collected for
/// [`KmlImporter::import_linked`].
pub struct KmlImporter {
    reader: KmlReader<Box<dyn BufRead>>,
    base: Option<UrlRef>,
    links: Vec<UrlRef>,
    ids: IdGenerator,
}

impl KmlImporter {
    /// Opens a local `.kml` or `.kmz` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KmlError> {
        let path = std::fs::canonicalize(path)?;
        let url = Url::from_file_path(&path)
            .map_err(|_| KmlError::Other(format!("not an absolute path: {}", path.display())))?;
        Self::from_ref(UrlRef::Plain(url))
    }

    /// Opens a remote document.
    pub fn from_url(url: Url) -> Result<Self, KmlError> {
        Self::from_ref(UrlRef::Plain(url))
    }

    /// Opens any resolvable reference.
    pub fn from_ref(base: UrlRef) -> Result<Self, KmlError> {
        Self::with_ids(base, IdGenerator::new())
    }

    /// Opens a reference with a shared id generator, so schema names stay
    /// unique across a tree of linked documents.
    pub fn with_ids(base: UrlRef, ids: IdGenerator) -> Result<Self, KmlError> {
        let mut buffered = BufReader::new(base.open()?);
        // archives are recognized by content, not just extension
        let is_zip = buffered.fill_buf()?.starts_with(ZIP_MAGIC);
        let (input, base): (Box<dyn BufRead>, UrlRef) = if is_zip {
            let mut bytes = Vec::new();
            buffered.read_to_end(&mut bytes)?;
            let mut zip = ZipArchive::new(Cursor::new(bytes))?;
            let entry = zip
                .file_names()
                .find(|name| name.to_ascii_lowercase().ends_with(".kml"))
                .map(str::to_string)
                .ok_or_else(|| KmlError::EntryNotFound("*.kml".to_string()))?;
            let mut content = Vec::new();
            zip.by_name(&entry)?.read_to_end(&mut content)?;
            let rebased = UrlRef::archived(base.url().clone(), &entry)?;
            (Box::new(Cursor::new(content)), rebased)
        } else {
            (Box::new(buffered), base)
        };
        Ok(Self {
            reader: KmlReader::with_ids(input, ids.clone()),
            base: Some(base),
            links: Vec::new(),
            ids,
        })
    }

    /// Wraps an already-open stream; without a base, relative hrefs cannot
    /// be resolved and are left alone.
    pub fn from_reader(input: Box<dyn BufRead>, base: Option<UrlRef>) -> Self {
        let ids = IdGenerator::new();
        Self {
            reader: KmlReader::with_ids(input, ids.clone()),
            base,
            links: Vec::new(),
            ids,
        }
    }

    /// Where the document was opened from.
    pub fn base(&self) -> Option<&UrlRef> {
        self.base.as_ref()
    }

    /// Network-link targets collected so far.
    pub fn links(&self) -> &[UrlRef] {
        &self.links
    }

    /// Pushes an object back so the next [`KmlImporter::read`] returns it.
    pub fn pushback(&mut self, obj: GisObject) {
        self.reader.pushback(obj);
    }

    /// The next object, with its references resolved.
    pub fn read(&mut self) -> Result<Option<GisObject>, KmlError> {
        let Some(mut obj) = self.reader.read()? else {
            return Ok(None);
        };
        match &mut obj {
            GisObject::NetworkLink(nl) => {
                if let Some(link) = &mut nl.link {
                    if let Some(target) = resolve_link(self.base.as_ref(), link) {
                        self.links.push(target);
                    }
                }
            }
            GisObject::GroundOverlay(go) => {
                if let Some(icon) = &mut go.icon {
                    resolve_link(self.base.as_ref(), icon);
                }
            }
            _ => {}
        }
        Ok(Some(obj))
    }

    /// Drains the stream into a vector.
    pub fn read_all(&mut self) -> Result<Vec<GisObject>, KmlError> {
        let mut out = Vec::new();
        while let Some(obj) = self.read()? {
            out.push(obj);
        }
        Ok(out)
    }

    /// Fetches every collected network-link target, breadth first,
    /// returning the concatenated object streams.
    ///
    /// Call after the main document has been read. Links discovered inside
    /// linked documents are followed too; each target is fetched once even
    /// when documents link each other in a cycle, and a target that fails
    /// to open or parse is logged and skipped rather than aborting the
    /// rest.
    pub fn import_linked(&mut self) -> Vec<GisObject> {
        let mut out = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<UrlRef> = self.links.drain(..).collect();
        while let Some(target) = queue.pop_front() {
            if !visited.insert(target.to_uri()) {
                continue;
            }
            let mut sub = match KmlImporter::with_ids(target.clone(), self.ids.clone()) {
                Ok(sub) => sub,
                Err(err) => {
                    log::error!("cannot open linked document {target}: {err}");
                    continue;
                }
            };
            match sub.read_all() {
                Ok(objects) => out.extend(objects),
                Err(err) => {
                    log::error!("cannot read linked document {target}: {err}");
                    continue;
                }
            }
            queue.extend(sub.links.drain(..));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn importer_for(doc: &str, base: Option<UrlRef>) -> KmlImporter {
        KmlImporter::from_reader(Box::new(Cursor::new(doc.as_bytes().to_vec())), base)
    }

    #[test]
    fn network_link_href_is_collected_and_rewritten() {
        let base = UrlRef::parse("http://example.com/maps/doc.kml").expect("base");
        let mut importer = importer_for(
            r#"<kml><NetworkLink><Link><href>more.kml</href></Link></NetworkLink></kml>"#,
            Some(base),
        );
        let objects = importer.read_all().expect("read");
        assert_eq!(importer.links().len(), 1);
        assert_eq!(
            importer.links()[0].to_uri(),
            "http://example.com/maps/more.kml"
        );
        let GisObject::NetworkLink(nl) = &objects[1] else {
            panic!("expected network link");
        };
        assert_eq!(
            nl.link.as_ref().and_then(|l| l.get("href")),
            Some("http://example.com/maps/more.kml")
        );
    }

    #[test]
    fn overlay_icon_resolves_into_archive() {
        let base = UrlRef::parse("http://example.com/data.kmz").expect("base");
        let mut importer = importer_for(
            r#"<kml><GroundOverlay><Icon><href>images/o.png</href></Icon></GroundOverlay></kml>"#,
            Some(base),
        );
        let objects = importer.read_all().expect("read");
        let GisObject::GroundOverlay(go) = &objects[1] else {
            panic!("expected overlay");
        };
        assert_eq!(
            go.icon.as_ref().and_then(|i| i.get("href")),
            Some("kmzhttp://example.com/data.kmz?file=images/o.png")
        );
    }

    #[test]
    fn kmz_file_opens_first_kml_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("doc.kmz");
        let file = std::fs::File::create(&path).expect("create");
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("extra.txt", SimpleFileOptions::default())
            .expect("entry");
        zip.write_all(b"notes").expect("content");
        zip.start_file("Main.KML", SimpleFileOptions::default())
            .expect("entry");
        zip.write_all(
            b"<kml><Placemark><name>zipped</name></Placemark></kml>",
        )
        .expect("content");
        zip.finish().expect("finish");

        let mut importer = KmlImporter::from_file(&path).expect("open");
        assert_eq!(importer.base().and_then(|b| b.entry()), Some("Main.KML"));
        let objects = importer.read_all().expect("read");
        let GisObject::Feature(f) = &objects[1] else {
            panic!("expected feature");
        };
        assert_eq!(f.common.name.as_deref(), Some("zipped"));
    }

    #[test]
    fn import_linked_follows_local_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let linked = dir.path().join("linked.kml");
        std::fs::write(
            &linked,
            "<kml><Placemark><name>remote</name></Placemark></kml>",
        )
        .expect("write");
        let main = dir.path().join("main.kml");
        std::fs::write(
            &main,
            "<kml><NetworkLink><Link><href>linked.kml</href></Link></NetworkLink></kml>",
        )
        .expect("write");

        let mut importer = KmlImporter::from_file(&main).expect("open");
        importer.read_all().expect("read");
        let merged = importer.import_linked();
        assert!(merged.iter().any(|obj| match obj {
            GisObject::Feature(f) => f.common.name.as_deref() == Some("remote"),
            _ => false,
        }));
    }

    #[test]
    fn broken_link_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let main = dir.path().join("main.kml");
        std::fs::write(
            &main,
            "<kml><NetworkLink><Link><href>missing.kml</href></Link></NetworkLink></kml>",
        )
        .expect("write");
        let mut importer = KmlImporter::from_file(&main).expect("open");
        importer.read_all().expect("read");
        assert!(importer.import_linked().is_empty());
    }
}
