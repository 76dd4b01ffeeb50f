//! Owned-token cursor over a `quick-xml` pull reader.
//!
//! The reader logic needs one-token lookahead and namespace-blind element
//! names; this wrapper converts borrowed events into small owned tokens,
//! expands empty-element tags into start/end pairs and hides everything the
//! KML layer does not care about (declarations, comments, processing
//! instructions).

use crate::error::KmlError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::VecDeque;
use std::io::BufRead;

/// An opening tag with its attributes, names already stripped of any
/// namespace prefix.
#[derive(Debug, Clone)]
pub(crate) struct StartTag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl StartTag {
    fn from_event(e: &BytesStart<'_>) -> Result<Self, KmlError> {
        let name = local_name(e.name().as_ref());
        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = local_name(attr.key.as_ref());
            let value = attr
                .unescape_value()
                .map_err(quick_xml::Error::from)?
                .into_owned();
            attrs.push((key, value));
        }
        Ok(Self { name, attrs })
    }

    /// Attribute value by local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// One token of the document.
#[derive(Debug, Clone)]
pub(crate) enum XmlToken {
    Start(StartTag),
    End(String),
    Text(String),
    Eof,
}

fn local_name(raw: &[u8]) -> String {
    let raw = match raw.iter().rposition(|&b| b == b':') {
        Some(idx) => &raw[idx + 1..],
        None => raw,
    };
    String::from_utf8_lossy(raw).into_owned()
}

pub(crate) struct XmlStream<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    queued: VecDeque<XmlToken>,
}

impl<R: BufRead> XmlStream<R> {
    pub fn new(input: R) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.trim_text(true);
        reader.check_end_names(false);
        Self {
            reader,
            buf: Vec::new(),
            queued: VecDeque::new(),
        }
    }

    /// The next token, consuming it.
    pub fn next(&mut self) -> Result<XmlToken, KmlError> {
        if let Some(tok) = self.queued.pop_front() {
            return Ok(tok);
        }
        self.read_token()
    }

    /// The next token without consuming it.
    pub fn peek(&mut self) -> Result<&XmlToken, KmlError> {
        if self.queued.is_empty() {
            let tok = self.read_token()?;
            self.queued.push_back(tok);
        }
        // just filled above
        Ok(self.queued.front().unwrap_or(&XmlToken::Eof))
    }

    fn read_token(&mut self) -> Result<XmlToken, KmlError> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => return Ok(XmlToken::Start(StartTag::from_event(&e)?)),
                Event::Empty(e) => {
                    let start = StartTag::from_event(&e)?;
                    self.queued.push_back(XmlToken::End(start.name.clone()));
                    return Ok(XmlToken::Start(start));
                }
                Event::End(e) => return Ok(XmlToken::End(local_name(e.name().as_ref()))),
                Event::Text(e) => {
                    let text = e.unescape()?.into_owned();
                    if !text.is_empty() {
                        return Ok(XmlToken::Text(text));
                    }
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    if !text.is_empty() {
                        return Ok(XmlToken::Text(text));
                    }
                }
                Event::Eof => return Ok(XmlToken::Eof),
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            }
        }
    }

    /// Collects the character data of the element whose start tag was just
    /// consumed, up to its end tag. Nested elements are skipped.
    pub fn element_text(&mut self, name: &str) -> Result<String, KmlError> {
        let mut text = String::new();
        loop {
            match self.next()? {
                XmlToken::Text(t) => {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&t);
                }
                XmlToken::Start(child) => self.skip_element(&child.name)?,
                XmlToken::End(n) if n == name => break,
                XmlToken::End(_) => {}
                XmlToken::Eof => break,
            }
        }
        Ok(text)
    }

    /// Like [`XmlStream::element_text`] but maps whitespace-only content to
    /// `None`.
    pub fn non_empty_text(&mut self, name: &str) -> Result<Option<String>, KmlError> {
        let text = self.element_text(name)?;
        let text = text.trim();
        Ok(if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        })
    }

    /// Consumes tokens until the end tag matching an already-consumed start
    /// tag, counting same-name nesting.
    pub fn skip_element(&mut self, name: &str) -> Result<(), KmlError> {
        let mut depth = 0usize;
        loop {
            match self.next()? {
                XmlToken::Start(child) if child.name == name => depth += 1,
                XmlToken::End(n) if n == name => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                XmlToken::Eof => return Ok(()),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(doc: &str) -> XmlStream<&[u8]> {
        XmlStream::new(doc.as_bytes())
    }

    #[test]
    fn empty_tag_expands_to_start_end() {
        let mut s = stream("<a><b/></a>");
        assert!(matches!(s.next().expect("token"), XmlToken::Start(t) if t.name == "a"));
        assert!(matches!(s.next().expect("token"), XmlToken::Start(t) if t.name == "b"));
        assert!(matches!(s.next().expect("token"), XmlToken::End(n) if n == "b"));
        assert!(matches!(s.next().expect("token"), XmlToken::End(n) if n == "a"));
        assert!(matches!(s.next().expect("token"), XmlToken::Eof));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut s = stream("<a>hi</a>");
        assert!(matches!(s.next().expect("token"), XmlToken::Start(_)));
        assert!(matches!(s.peek().expect("token"), XmlToken::Text(_)));
        assert!(matches!(s.next().expect("token"), XmlToken::Text(t) if t == "hi"));
    }

    #[test]
    fn namespace_prefixes_are_stripped() {
        let mut s = stream("<gx:Tour xmlns:gx='urn:x'></gx:Tour>");
        assert!(matches!(s.next().expect("token"), XmlToken::Start(t) if t.name == "Tour"));
    }

    #[test]
    fn element_text_skips_nested_markup() {
        let mut s = stream("<name>hello<b>skip</b> world</name>");
        assert!(matches!(s.next().expect("token"), XmlToken::Start(_)));
        assert_eq!(s.element_text("name").expect("text"), "hello world");
    }

    #[test]
    fn skip_element_counts_nesting() {
        let mut s = stream("<a><a>inner</a></a><after/>");
        assert!(matches!(s.next().expect("token"), XmlToken::Start(t) if t.name == "a"));
        s.skip_element("a").expect("skip");
        assert!(matches!(s.next().expect("token"), XmlToken::Start(t) if t.name == "after"));
    }
}
