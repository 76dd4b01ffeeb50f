//! Link href resolution and client query templating.
//!
//! Network links and overlay icons carry an `href` plus optional
//! `httpQuery` and `viewFormat` templates. Resolution turns the href into
//! an absolute [`UrlRef`] (relative to the document it came from, entering
//! the archive when the document is compressed) and expands the templates
//! the way the Google Earth client would, so servers that branch on those
//! parameters serve the same content. View-dependent parameters have no
//! meaningful value in a headless importer and expand to `0`.
//!
//! The resolved URI is stored back into the map's `href`, so a document
//! written back out carries absolute references.

use crate::consts::{HREF, HTTP_QUERY, VIEW_FORMAT};
use crate::uref::UrlRef;
use gisstream_types::events::TaggedMap;
use url::Url;

/// Client version advertised in expanded `httpQuery` templates.
const CLIENT_VERSION: &str = "4.3.7284.3916";
/// KML version advertised in expanded `httpQuery` templates.
const KML_VERSION: &str = "2.2";
/// Client name advertised in expanded `httpQuery` templates.
const CLIENT_NAME: &str = "Google+Earth";
/// Language advertised in expanded `httpQuery` templates.
const LANGUAGE: &str = "en";

/// `viewFormat` parameters that expand to `0`.
const VIEW_FORMAT_PARAMS: [&str; 17] = [
    "bboxEast",
    "bboxNorth",
    "bboxSouth",
    "bboxWest",
    "horizFov",
    "horizPixels",
    "lookatHeading",
    "lookatLat",
    "lookatLon",
    "lookatRange",
    "lookatTerrainAlt",
    "lookatTerrainLat",
    "lookatTerrainLon",
    "lookatTilt",
    "terrainEnabled",
    "vertFov",
    "vertPixels",
];

/// Resolves the `href` of a link map against the document it came from.
///
/// Returns `None` when there is no href, when a relative href has no base
/// to resolve against, or when the result is not a parseable URL. On
/// success the absolute, template-expanded URI replaces the map's `href`.
pub fn resolve_link(base: Option<&UrlRef>, links: &mut TaggedMap) -> Option<UrlRef> {
    let href = links.get(HREF)?.trim().to_string();
    if href.is_empty() {
        return None;
    }
    // literal spaces never survive URL parsing
    let href = href.replace(' ', "%20");

    let resolved = resolve_href(base, &href)?;

    // local files get no client query parameters
    if resolved.url().scheme() == "file" || resolved.is_archived() {
        links.put(HREF, resolved.to_uri());
        return Some(resolved);
    }

    let mut uri = resolved.to_uri();
    let http_query = links.get(HTTP_QUERY).map(expand_http_query);
    let view_format = links.get(VIEW_FORMAT).map(expand_view_format);
    if let Some(query) = &http_query {
        push_query(&mut uri, query);
    }
    match (&http_query, &view_format) {
        (Some(_), Some(format)) => {
            uri.push('&');
            uri.push_str(format);
        }
        (None, Some(format)) => push_query(&mut uri, format),
        _ => {}
    }

    let resolved = UrlRef::Plain(Url::parse(&uri).ok()?);
    links.put(HREF, resolved.to_uri());
    Some(resolved)
}

fn resolve_href(base: Option<&UrlRef>, href: &str) -> Option<UrlRef> {
    // compound archive references pass through as-is
    if href.starts_with("kmz") && href.contains("file=") {
        return UrlRef::parse(href).ok();
    }
    if let Ok(url) = Url::parse(href) {
        return Some(UrlRef::Plain(url));
    }
    let Some(base) = base else {
        log::warn!("cannot resolve relative href {href:?} without a base");
        return None;
    };
    if base.is_kmz() {
        UrlRef::archived(base.url().clone(), href).ok()
    } else {
        base.url().join(href).ok().map(UrlRef::Plain)
    }
}

/// Appends a query string, reusing a trailing `?` when the href already
/// ends with one.
fn push_query(uri: &mut String, query: &str) {
    if !uri.ends_with('?') {
        uri.push(if uri.contains('?') { '&' } else { '?' });
    }
    uri.push_str(query);
}

/// Expands the `httpQuery` template parameters.
pub fn expand_http_query(template: &str) -> String {
    substitute(template, |name| match name {
        "clientVersion" => Some(CLIENT_VERSION),
        "kmlVersion" => Some(KML_VERSION),
        "clientName" => Some(CLIENT_NAME),
        "language" => Some(LANGUAGE),
        _ => None,
    })
}

/// Expands the `viewFormat` template parameters.
pub fn expand_view_format(template: &str) -> String {
    substitute(template, |name| {
        VIEW_FORMAT_PARAMS.contains(&name).then_some("0")
    })
}

/// Replaces `[name]` tokens via the lookup; unknown tokens keep their name
/// with the brackets percent-escaped, and literal spaces are escaped too.
fn substitute(input: &str, lookup: impl Fn(&str) -> Option<&'static str>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '[' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                match lookup(&name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("%5B");
                        out.push_str(&name);
                        if closed {
                            out.push_str("%5D");
                        }
                    }
                }
            }
            ']' => out.push_str("%5D"),
            ' ' => out.push_str("%20"),
            _ => out.push(c),
        }
    }
    out
}
