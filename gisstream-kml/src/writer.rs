//! Streaming KML writer.
//!
//! [`KmlWriter`] consumes the same flat [`GisObject`] sequence the reader
//! produces. Two pieces of buffering smooth over the differences between
//! the stream shape and well-formed KML:
//!
//! * a container start is held back until the next object arrives, so a
//!   start/end pair with nothing inside is dropped instead of producing an
//!   empty `Document` or `Folder`;
//! * styles and style maps are held until the next container or feature
//!   and written inside it, since KML attaches style selectors to a
//!   feature rather than letting them float at top level.

use crate::consts::*;
use crate::error::KmlError;
use chrono::{DateTime, Utc};
use gisstream_types::events::{
    BalloonStyle, Common, ContainerStart, Feature, FieldValue, GisObject, GroundOverlay,
    IconStyle, LabelStyle, LineStyle, NetworkLink, PolyStyle, Row, Schema, Style, StyleMap,
    TaggedMap,
};
use gisstream_types::geometry::{
    Circle, CircleHint, Geometry, GeometryBase, Line, LinearRing, Model, Point, Polygon,
};
use gisstream_types::GeoPoint;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// Number of segments used when a circle is flattened into line work.
const CIRCLE_SEGMENTS: usize = 32;

/// Serializes a [`GisObject`] stream as a KML document.
pub struct KmlWriter<W: Write> {
    xml: Writer<W>,
    pending: Option<ContainerStart>,
    waiting: Vec<GisObject>,
    open: Vec<&'static str>,
    started: bool,
}

impl<W: Write> KmlWriter<W> {
    /// Creates a writer targeting the given sink.
    pub fn new(sink: W) -> Self {
        Self {
            xml: Writer::new_with_indent(sink, b' ', 2),
            pending: None,
            waiting: Vec::new(),
            open: Vec::new(),
            started: false,
        }
    }

    /// Writes one object.
    pub fn write(&mut self, obj: &GisObject) -> Result<(), KmlError> {
        self.ensure_preamble()?;
        match obj {
            GisObject::DocumentStart => {}
            GisObject::ContainerStart(c) => {
                self.flush_pending()?;
                self.pending = Some(c.clone());
            }
            GisObject::ContainerEnd => match self.pending.take() {
                None => self.close_container()?,
                Some(c) => {
                    // an empty pair vanishes unless styles wait for a home
                    if !self.waiting.is_empty() {
                        self.open_container(&c)?;
                        self.close_container()?;
                    }
                }
            },
            GisObject::Feature(f) => {
                self.flush_pending()?;
                self.write_placemark(f)?;
            }
            GisObject::NetworkLink(nl) => {
                self.flush_pending()?;
                self.write_network_link(nl)?;
            }
            GisObject::GroundOverlay(go) => {
                self.flush_pending()?;
                self.write_ground_overlay(go)?;
            }
            GisObject::Style(_) | GisObject::StyleMap(_) => self.waiting.push(obj.clone()),
            GisObject::Schema(s) => {
                self.flush_pending()?;
                self.write_schema(s)?;
            }
        }
        Ok(())
    }

    /// Writes every object of an iterator.
    pub fn write_all<'a, I>(&mut self, objects: I) -> Result<(), KmlError>
    where
        I: IntoIterator<Item = &'a GisObject>,
    {
        for obj in objects {
            self.write(obj)?;
        }
        Ok(())
    }

    /// Closes any open elements and returns the sink.
    pub fn close(mut self) -> Result<W, KmlError> {
        self.ensure_preamble()?;
        match self.pending.take() {
            Some(c) if !self.waiting.is_empty() => {
                self.open_container(&c)?;
                self.close_container()?;
            }
            _ => {}
        }
        while !self.open.is_empty() {
            self.close_container()?;
        }
        if !self.waiting.is_empty() {
            log::warn!(
                "dropping {} style(s) with no element to attach to",
                self.waiting.len()
            );
        }
        self.xml.write_event(Event::End(BytesEnd::new(KML)))?;
        Ok(self.xml.into_inner())
    }

    fn ensure_preamble(&mut self) -> Result<(), KmlError> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        self.xml
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut kml = BytesStart::new(KML);
        kml.push_attribute(("xmlns", KML_NS));
        self.xml.write_event(Event::Start(kml))?;
        Ok(())
    }

    fn flush_pending(&mut self) -> Result<(), KmlError> {
        if let Some(c) = self.pending.take() {
            self.open_container(&c)?;
        }
        Ok(())
    }

    fn open_container(&mut self, c: &ContainerStart) -> Result<(), KmlError> {
        let tag = c.kind.as_str();
        self.xml.write_event(Event::Start(BytesStart::new(tag)))?;
        self.open.push(tag);
        if let Some(open) = c.open {
            self.write_text_element(OPEN, bool_str(open))?;
        }
        self.write_common(&c.common)?;
        Ok(())
    }

    fn close_container(&mut self) -> Result<(), KmlError> {
        match self.open.pop() {
            Some(tag) => {
                self.xml.write_event(Event::End(BytesEnd::new(tag)))?;
                Ok(())
            }
            None => {
                log::warn!("container end with no open container");
                Ok(())
            }
        }
    }

    fn write_placemark(&mut self, f: &Feature) -> Result<(), KmlError> {
        self.xml
            .write_event(Event::Start(BytesStart::new(PLACEMARK)))?;
        self.write_common(&f.common)?;
        if let Some(geometry) = &f.geometry {
            self.write_geometry(geometry)?;
        }
        self.xml.write_event(Event::End(BytesEnd::new(PLACEMARK)))?;
        Ok(())
    }

    fn write_network_link(&mut self, nl: &NetworkLink) -> Result<(), KmlError> {
        self.xml
            .write_event(Event::Start(BytesStart::new(NETWORK_LINK)))?;
        self.write_common(&nl.common)?;
        if nl.refresh_visibility {
            self.write_text_element(REFRESH_VISIBILITY, "1")?;
        }
        if nl.fly_to_view {
            self.write_text_element(FLY_TO_VIEW, "1")?;
        }
        if let Some(link) = &nl.link {
            self.write_tagged(link)?;
        }
        self.xml
            .write_event(Event::End(BytesEnd::new(NETWORK_LINK)))?;
        Ok(())
    }

    fn write_ground_overlay(&mut self, go: &GroundOverlay) -> Result<(), KmlError> {
        self.xml
            .write_event(Event::Start(BytesStart::new(GROUND_OVERLAY)))?;
        self.write_common(&go.common)?;
        if let Some(color) = go.color {
            self.write_text_element(COLOR, &color.to_string())?;
        }
        if let Some(order) = go.draw_order {
            self.write_text_element(DRAW_ORDER, &order.to_string())?;
        }
        if let Some(icon) = &go.icon {
            self.write_tagged(icon)?;
        }
        if let Some(altitude) = go.altitude {
            self.write_text_element(ALTITUDE, &altitude.to_string())?;
        }
        if let Some(mode) = go.altitude_mode {
            self.write_text_element(ALTITUDE_MODE, mode.as_str())?;
        }
        let edges = [
            (NORTH, go.north),
            (SOUTH, go.south),
            (EAST, go.east),
            (WEST, go.west),
            (ROTATION, go.rotation),
        ];
        if edges.iter().any(|(_, v)| v.is_some()) {
            self.xml
                .write_event(Event::Start(BytesStart::new(LAT_LON_BOX)))?;
            for (name, value) in edges {
                if let Some(value) = value {
                    self.write_text_element(name, &value.to_string())?;
                }
            }
            self.xml
                .write_event(Event::End(BytesEnd::new(LAT_LON_BOX)))?;
        }
        self.xml
            .write_event(Event::End(BytesEnd::new(GROUND_OVERLAY)))?;
        Ok(())
    }

    /// Shared feature properties plus any styles waiting for an owner.
    fn write_common(&mut self, common: &Common) -> Result<(), KmlError> {
        if let Some(name) = &common.name {
            self.write_text_element(NAME, name)?;
        }
        if let Some(visibility) = common.visibility {
            self.write_text_element(VISIBILITY, bool_str(visibility))?;
        }
        if let Some(snippet) = &common.snippet {
            self.write_text_element(SNIPPET, snippet)?;
        }
        if let Some(description) = &common.description {
            self.write_description(description)?;
        }
        // KML 2.2 feature sequence: view, time primitive, styleUrl,
        // style selectors, region, extended data
        if let Some(view) = &common.view {
            self.write_tagged(view)?;
        }
        self.write_time_primitive(common.start_time, common.end_time)?;
        if let Some(url) = common.style_url() {
            self.write_text_element(STYLE_URL, url)?;
        }
        for waiting in std::mem::take(&mut self.waiting) {
            match waiting {
                GisObject::Style(style) => self.write_style(&style)?,
                GisObject::StyleMap(map) => self.write_style_map(&map)?,
                _ => {}
            }
        }
        if let Some(region) = &common.region {
            self.write_tagged(region)?;
        }
        self.write_extended_data(&common.row)?;
        Ok(())
    }

    fn write_description(&mut self, text: &str) -> Result<(), KmlError> {
        self.xml
            .write_event(Event::Start(BytesStart::new(DESCRIPTION)))?;
        // markup-bearing descriptions go out as CDATA so HTML survives
        if text.contains('<') || text.contains('&') {
            self.xml.write_event(Event::CData(BytesCData::new(text)))?;
        } else {
            self.xml.write_event(Event::Text(BytesText::new(text)))?;
        }
        self.xml
            .write_event(Event::End(BytesEnd::new(DESCRIPTION)))?;
        Ok(())
    }

    fn write_time_primitive(
        &mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<(), KmlError> {
        match (start, end) {
            (None, None) => {}
            (Some(s), Some(e)) if s == e => {
                self.xml
                    .write_event(Event::Start(BytesStart::new(TIME_STAMP)))?;
                self.write_text_element(WHEN, &format_kml_date(&s))?;
                self.xml
                    .write_event(Event::End(BytesEnd::new(TIME_STAMP)))?;
            }
            (s, e) => {
                self.xml
                    .write_event(Event::Start(BytesStart::new(TIME_SPAN)))?;
                if let Some(s) = s {
                    self.write_text_element(BEGIN, &format_kml_date(&s))?;
                }
                if let Some(e) = e {
                    self.write_text_element(END, &format_kml_date(&e))?;
                }
                self.xml
                    .write_event(Event::End(BytesEnd::new(TIME_SPAN)))?;
            }
        }
        Ok(())
    }

    fn write_extended_data(&mut self, row: &Row) -> Result<(), KmlError> {
        if !row.has_extended_data() {
            return Ok(());
        }
        self.xml
            .write_event(Event::Start(BytesStart::new(EXTENDED_DATA)))?;
        match &row.schema {
            Some(schema_url) => {
                let mut sd = BytesStart::new(SCHEMA_DATA);
                sd.push_attribute((SCHEMA_URL, schema_url.as_str()));
                self.xml.write_event(Event::Start(sd))?;
                for (field, value) in row.entries() {
                    if let Some(text) = field_text(value) {
                        let mut e = BytesStart::new(SIMPLE_DATA);
                        e.push_attribute((NAME, field.name.as_str()));
                        self.xml.write_event(Event::Start(e))?;
                        self.xml.write_event(Event::Text(BytesText::new(&text)))?;
                        self.xml
                            .write_event(Event::End(BytesEnd::new(SIMPLE_DATA)))?;
                    }
                }
                self.xml
                    .write_event(Event::End(BytesEnd::new(SCHEMA_DATA)))?;
            }
            None => {
                for (field, value) in row.entries() {
                    let Some(text) = field_text(value) else {
                        continue;
                    };
                    let mut e = BytesStart::new(DATA);
                    e.push_attribute((NAME, field.name.as_str()));
                    self.xml.write_event(Event::Start(e))?;
                    self.write_text_element(VALUE, &text)?;
                    self.xml.write_event(Event::End(BytesEnd::new(DATA)))?;
                }
            }
        }
        self.xml
            .write_event(Event::End(BytesEnd::new(EXTENDED_DATA)))?;
        Ok(())
    }

    fn write_schema(&mut self, schema: &Schema) -> Result<(), KmlError> {
        let mut e = BytesStart::new(SCHEMA);
        e.push_attribute((NAME, schema.name.as_str()));
        e.push_attribute((ID, schema.id.as_str()));
        self.xml.write_event(Event::Start(e))?;
        for field in schema.fields() {
            let mut f = BytesStart::new(SIMPLE_FIELD);
            f.push_attribute(("type", field.kind.as_str()));
            f.push_attribute((NAME, field.name.as_str()));
            match &field.display_name {
                Some(display) => {
                    self.xml.write_event(Event::Start(f))?;
                    self.write_text_element(DISPLAY_NAME, display)?;
                    self.xml
                        .write_event(Event::End(BytesEnd::new(SIMPLE_FIELD)))?;
                }
                None => self.xml.write_event(Event::Empty(f))?,
            }
        }
        self.xml.write_event(Event::End(BytesEnd::new(SCHEMA)))?;
        Ok(())
    }

    fn write_style(&mut self, style: &Style) -> Result<(), KmlError> {
        let mut e = BytesStart::new(STYLE);
        if let Some(id) = &style.id {
            e.push_attribute((ID, id.as_str()));
        }
        self.xml.write_event(Event::Start(e))?;
        if let Some(icon) = &style.icon {
            self.write_icon_style(icon)?;
        }
        if let Some(line) = &style.line {
            self.write_line_style(line)?;
        }
        if let Some(poly) = &style.poly {
            self.write_poly_style(poly)?;
        }
        if let Some(label) = &style.label {
            self.write_label_style(label)?;
        }
        if let Some(balloon) = &style.balloon {
            self.write_balloon_style(balloon)?;
        }
        self.xml.write_event(Event::End(BytesEnd::new(STYLE)))?;
        Ok(())
    }

    fn write_icon_style(&mut self, s: &IconStyle) -> Result<(), KmlError> {
        self.xml
            .write_event(Event::Start(BytesStart::new(ICON_STYLE)))?;
        if let Some(color) = s.color {
            self.write_text_element(COLOR, &color.to_string())?;
        }
        if let Some(scale) = s.scale {
            self.write_text_element(SCALE, &scale.to_string())?;
        }
        if let Some(heading) = s.heading {
            self.write_text_element(HEADING, &heading.to_string())?;
        }
        if let Some(href) = &s.href {
            self.xml.write_event(Event::Start(BytesStart::new(ICON)))?;
            self.write_text_element(HREF, href)?;
            self.xml.write_event(Event::End(BytesEnd::new(ICON)))?;
        }
        self.xml
            .write_event(Event::End(BytesEnd::new(ICON_STYLE)))?;
        Ok(())
    }

    fn write_line_style(&mut self, s: &LineStyle) -> Result<(), KmlError> {
        self.xml
            .write_event(Event::Start(BytesStart::new(LINE_STYLE)))?;
        if let Some(color) = s.color {
            self.write_text_element(COLOR, &color.to_string())?;
        }
        if let Some(width) = s.width {
            self.write_text_element(WIDTH, &width.to_string())?;
        }
        self.xml
            .write_event(Event::End(BytesEnd::new(LINE_STYLE)))?;
        Ok(())
    }

    fn write_poly_style(&mut self, s: &PolyStyle) -> Result<(), KmlError> {
        self.xml
            .write_event(Event::Start(BytesStart::new(POLY_STYLE)))?;
        if let Some(color) = s.color {
            self.write_text_element(COLOR, &color.to_string())?;
        }
        if let Some(fill) = s.fill {
            self.write_text_element(FILL, bool_str(fill))?;
        }
        if let Some(outline) = s.outline {
            self.write_text_element(OUTLINE, bool_str(outline))?;
        }
        self.xml
            .write_event(Event::End(BytesEnd::new(POLY_STYLE)))?;
        Ok(())
    }

    fn write_label_style(&mut self, s: &LabelStyle) -> Result<(), KmlError> {
        self.xml
            .write_event(Event::Start(BytesStart::new(LABEL_STYLE)))?;
        if let Some(color) = s.color {
            self.write_text_element(COLOR, &color.to_string())?;
        }
        if let Some(scale) = s.scale {
            self.write_text_element(SCALE, &scale.to_string())?;
        }
        self.xml
            .write_event(Event::End(BytesEnd::new(LABEL_STYLE)))?;
        Ok(())
    }

    fn write_balloon_style(&mut self, s: &BalloonStyle) -> Result<(), KmlError> {
        self.xml
            .write_event(Event::Start(BytesStart::new(BALLOON_STYLE)))?;
        if let Some(color) = s.bg_color {
            self.write_text_element(BG_COLOR, &color.to_string())?;
        }
        if let Some(color) = s.text_color {
            self.write_text_element(TEXT_COLOR, &color.to_string())?;
        }
        if let Some(text) = &s.text {
            self.write_text_element(TEXT, text)?;
        }
        if let Some(mode) = &s.display_mode {
            self.write_text_element(DISPLAY_MODE, mode)?;
        }
        self.xml
            .write_event(Event::End(BytesEnd::new(BALLOON_STYLE)))?;
        Ok(())
    }

    fn write_style_map(&mut self, map: &StyleMap) -> Result<(), KmlError> {
        let mut e = BytesStart::new(STYLE_MAP);
        if let Some(id) = &map.id {
            e.push_attribute((ID, id.as_str()));
        }
        self.xml.write_event(Event::Start(e))?;
        for (key, url) in [(NORMAL, map.normal()), (HIGHLIGHT, map.highlight())] {
            if let Some(url) = url {
                self.xml.write_event(Event::Start(BytesStart::new(PAIR)))?;
                self.write_text_element(KEY, key)?;
                self.write_text_element(STYLE_URL, url)?;
                self.xml.write_event(Event::End(BytesEnd::new(PAIR)))?;
            }
        }
        self.xml.write_event(Event::End(BytesEnd::new(STYLE_MAP)))?;
        Ok(())
    }

    /// Echoes a tagged map back as XML, rebuilding nesting from
    /// slash-joined keys.
    fn write_tagged(&mut self, map: &TaggedMap) -> Result<(), KmlError> {
        self.xml
            .write_event(Event::Start(BytesStart::new(map.tag())))?;
        let mut stack: Vec<&str> = Vec::new();
        for (key, value) in map.iter() {
            let mut segments: Vec<&str> = key.split('/').collect();
            let leaf = segments.pop().unwrap_or(key);
            let shared = stack
                .iter()
                .zip(&segments)
                .take_while(|(a, b)| *a == *b)
                .count();
            while stack.len() > shared {
                if let Some(tag) = stack.pop() {
                    self.xml.write_event(Event::End(BytesEnd::new(tag)))?;
                }
            }
            for segment in &segments[shared..] {
                self.xml
                    .write_event(Event::Start(BytesStart::new(*segment)))?;
                stack.push(segment);
            }
            self.write_text_element(leaf, value)?;
        }
        while let Some(tag) = stack.pop() {
            self.xml.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        self.xml
            .write_event(Event::End(BytesEnd::new(map.tag())))?;
        Ok(())
    }

    fn write_geometry(&mut self, geometry: &Geometry) -> Result<(), KmlError> {
        match geometry {
            Geometry::Point(p) => self.write_point(p),
            Geometry::Line(l) => self.write_line(l),
            Geometry::LinearRing(r) => self.write_ring(r),
            Geometry::Polygon(p) => self.write_polygon(p),
            Geometry::MultiPoint(m) => {
                self.write_multi(m.members().iter().map(|p| Geometry::Point(p.clone())))
            }
            Geometry::MultiLine(m) => {
                self.write_multi(m.members().iter().map(|l| Geometry::Line(l.clone())))
            }
            Geometry::MultiLinearRings(m) => {
                self.write_multi(m.members().iter().map(|r| Geometry::LinearRing(r.clone())))
            }
            Geometry::MultiPolygons(m) => {
                self.write_multi(m.members().iter().map(|p| Geometry::Polygon(p.clone())))
            }
            Geometry::GeometryBag(bag) => self.write_multi(bag.members().iter().cloned()),
            Geometry::Circle(c) => self.write_circle(c),
            Geometry::Model(m) => self.write_model(m),
        }
    }

    fn write_multi<I>(&mut self, members: I) -> Result<(), KmlError>
    where
        I: Iterator<Item = Geometry>,
    {
        self.xml
            .write_event(Event::Start(BytesStart::new(MULTI_GEOMETRY)))?;
        for member in members {
            self.write_geometry(&member)?;
        }
        self.xml
            .write_event(Event::End(BytesEnd::new(MULTI_GEOMETRY)))?;
        Ok(())
    }

    fn write_point(&mut self, p: &Point) -> Result<(), KmlError> {
        self.xml.write_event(Event::Start(BytesStart::new(POINT)))?;
        self.write_base(&p.base)?;
        self.write_text_element(COORDINATES, &coordinate_text(p.coord(), false))?;
        self.xml.write_event(Event::End(BytesEnd::new(POINT)))?;
        Ok(())
    }

    fn write_line(&mut self, l: &Line) -> Result<(), KmlError> {
        self.xml
            .write_event(Event::Start(BytesStart::new(LINE_STRING)))?;
        self.write_base(&l.base)?;
        self.write_text_element(
            COORDINATES,
            &coordinates_text(l.points(), l.clipped_at_date_line()),
        )?;
        self.xml
            .write_event(Event::End(BytesEnd::new(LINE_STRING)))?;
        Ok(())
    }

    fn write_ring(&mut self, r: &LinearRing) -> Result<(), KmlError> {
        self.xml
            .write_event(Event::Start(BytesStart::new(LINEAR_RING)))?;
        self.write_base(&r.base)?;
        self.write_text_element(
            COORDINATES,
            &coordinates_text(r.points(), r.clipped_at_date_line()),
        )?;
        self.xml
            .write_event(Event::End(BytesEnd::new(LINEAR_RING)))?;
        Ok(())
    }

    fn write_polygon(&mut self, p: &Polygon) -> Result<(), KmlError> {
        self.xml
            .write_event(Event::Start(BytesStart::new(POLYGON)))?;
        self.write_base(&p.base)?;
        self.xml
            .write_event(Event::Start(BytesStart::new(OUTER_BOUNDARY_IS)))?;
        self.write_ring(p.outer_ring())?;
        self.xml
            .write_event(Event::End(BytesEnd::new(OUTER_BOUNDARY_IS)))?;
        for ring in p.inner_rings() {
            self.xml
                .write_event(Event::Start(BytesStart::new(INNER_BOUNDARY_IS)))?;
            self.write_ring(ring)?;
            self.xml
                .write_event(Event::End(BytesEnd::new(INNER_BOUNDARY_IS)))?;
        }
        self.xml.write_event(Event::End(BytesEnd::new(POLYGON)))?;
        Ok(())
    }

    /// A circle has no KML element; the hint picks the line work stands in
    /// for it.
    fn write_circle(&mut self, c: &Circle) -> Result<(), KmlError> {
        let boundary = c.boundary_points(CIRCLE_SEGMENTS, true);
        let text = boundary
            .iter()
            .map(|p| coordinate_text(p, false))
            .collect::<Vec<_>>()
            .join(" ");
        match c.hint {
            CircleHint::Line => {
                self.xml
                    .write_event(Event::Start(BytesStart::new(LINE_STRING)))?;
                self.write_base(&c.base)?;
                self.write_text_element(COORDINATES, &text)?;
                self.xml
                    .write_event(Event::End(BytesEnd::new(LINE_STRING)))?;
            }
            CircleHint::Ring => {
                self.xml
                    .write_event(Event::Start(BytesStart::new(LINEAR_RING)))?;
                self.write_base(&c.base)?;
                self.write_text_element(COORDINATES, &text)?;
                self.xml
                    .write_event(Event::End(BytesEnd::new(LINEAR_RING)))?;
            }
            CircleHint::Polygon => {
                self.xml
                    .write_event(Event::Start(BytesStart::new(POLYGON)))?;
                self.write_base(&c.base)?;
                self.xml
                    .write_event(Event::Start(BytesStart::new(OUTER_BOUNDARY_IS)))?;
                self.xml
                    .write_event(Event::Start(BytesStart::new(LINEAR_RING)))?;
                self.write_text_element(COORDINATES, &text)?;
                self.xml
                    .write_event(Event::End(BytesEnd::new(LINEAR_RING)))?;
                self.xml
                    .write_event(Event::End(BytesEnd::new(OUTER_BOUNDARY_IS)))?;
                self.xml.write_event(Event::End(BytesEnd::new(POLYGON)))?;
            }
        }
        Ok(())
    }

    fn write_model(&mut self, m: &Model) -> Result<(), KmlError> {
        self.xml.write_event(Event::Start(BytesStart::new(MODEL)))?;
        if let Some(mode) = m.altitude_mode {
            self.write_text_element(ALTITUDE_MODE, mode.as_str())?;
        }
        self.xml
            .write_event(Event::Start(BytesStart::new(LOCATION)))?;
        let loc = m.location();
        self.write_text_element(LONGITUDE, &loc.lon().to_string())?;
        self.write_text_element(LATITUDE, &loc.lat().to_string())?;
        if let Some(elevation) = loc.elevation() {
            self.write_text_element(ALTITUDE, &elevation.to_string())?;
        }
        self.xml.write_event(Event::End(BytesEnd::new(LOCATION)))?;
        self.xml.write_event(Event::End(BytesEnd::new(MODEL)))?;
        Ok(())
    }

    fn write_base(&mut self, base: &GeometryBase) -> Result<(), KmlError> {
        if let Some(extrude) = base.extrude {
            self.write_text_element(EXTRUDE, bool_str(extrude))?;
        }
        if let Some(tessellate) = base.tessellate {
            self.write_text_element(TESSELLATE, bool_str(tessellate))?;
        }
        if let Some(mode) = base.altitude_mode {
            self.write_text_element(ALTITUDE_MODE, mode.as_str())?;
        }
        Ok(())
    }

    fn write_text_element(&mut self, name: &str, text: &str) -> Result<(), KmlError> {
        self.xml.write_event(Event::Start(BytesStart::new(name)))?;
        self.xml.write_event(Event::Text(BytesText::new(text)))?;
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}

fn bool_str(v: bool) -> &'static str {
    if v {
        "1"
    } else {
        "0"
    }
}

fn coordinate_text(p: &GeoPoint, rewrite_idl: bool) -> String {
    let mut lon = p.lon();
    // a -180 edge on a date-line-clipped shape goes back out as +180
    if rewrite_idl && lon == -180.0 {
        lon = 180.0;
    }
    match p.elevation() {
        Some(elevation) => format!("{},{},{}", lon, p.lat(), elevation),
        None => format!("{},{}", lon, p.lat()),
    }
}

fn coordinates_text(points: &[Point], rewrite_idl: bool) -> String {
    points
        .iter()
        .map(|p| coordinate_text(p.coord(), rewrite_idl))
        .collect::<Vec<_>>()
        .join(" ")
}

fn field_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Null => None,
        FieldValue::String(s) => Some(s.clone()),
        FieldValue::Int(v) => Some(v.to_string()),
        FieldValue::Double(v) => Some(v.to_string()),
        FieldValue::Bool(v) => Some(if *v { "true" } else { "false" }.to_string()),
        FieldValue::Date(d) => Some(format_kml_date(d)),
    }
}

/// KML dateTime form; fractional seconds appear only when present.
pub(crate) fn format_kml_date(date: &DateTime<Utc>) -> String {
    if date.timestamp_subsec_millis() == 0 {
        date.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    } else {
        date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gisstream_types::events::{ContainerKind, SimpleField};

    fn render(objects: &[GisObject]) -> String {
        let mut writer = KmlWriter::new(Vec::new());
        writer.write_all(objects).expect("write");
        String::from_utf8(writer.close().expect("close")).expect("utf8")
    }

    fn placemark(name: &str) -> GisObject {
        let mut f = Feature::default();
        f.common.name = Some(name.to_string());
        GisObject::Feature(f)
    }

    #[test]
    fn empty_container_pair_is_suppressed() {
        let out = render(&[
            GisObject::DocumentStart,
            GisObject::ContainerStart(ContainerStart::new(ContainerKind::Folder)),
            GisObject::ContainerEnd,
        ]);
        assert!(!out.contains("<Folder>"));
        assert!(out.contains("<kml"));
    }

    #[test]
    fn container_with_content_is_written() {
        let out = render(&[
            GisObject::DocumentStart,
            GisObject::ContainerStart(ContainerStart::new(ContainerKind::Folder)),
            placemark("inside"),
            GisObject::ContainerEnd,
        ]);
        assert!(out.contains("<Folder>"));
        assert!(out.contains("</Folder>"));
        assert!(out.contains("<name>inside</name>"));
    }

    #[test]
    fn waiting_style_keeps_empty_container_alive() {
        let out = render(&[
            GisObject::DocumentStart,
            GisObject::Style(Style::with_id("s")),
            GisObject::ContainerStart(ContainerStart::new(ContainerKind::Document)),
            GisObject::ContainerEnd,
        ]);
        assert!(out.contains("<Document>"));
        assert!(out.contains("<Style id=\"s\"/>") || out.contains("<Style id=\"s\">"));
    }

    #[test]
    fn style_is_deferred_into_the_next_feature() {
        let mut style = Style::with_id("deferred");
        style.line = Some(LineStyle {
            color: None,
            width: Some(3.0),
        });
        let out = render(&[
            GisObject::DocumentStart,
            GisObject::Style(style),
            placemark("owner"),
        ]);
        let style_at = out.find("<Style").expect("style written");
        let placemark_at = out.find("<Placemark>").expect("placemark written");
        let placemark_end = out.find("</Placemark>").expect("placemark closed");
        assert!(placemark_at < style_at && style_at < placemark_end);
        assert!(out.contains("<width>3</width>"));
    }

    #[test]
    fn feature_children_follow_the_kml_sequence() {
        let mut style = Style::with_id("track");
        style.line = Some(LineStyle {
            color: None,
            width: Some(2.0),
        });
        let mut look_at = TaggedMap::new("LookAt");
        look_at.put("longitude", "10");
        look_at.put("latitude", "45");
        let mut f = Feature::default();
        f.common.name = Some("ordered".to_string());
        f.common.view = Some(look_at);
        let when = parse_test_date("2012-05-01T12:00:00Z");
        f.common.start_time = Some(when);
        f.common.end_time = Some(when);
        f.common.set_style_url("#track");
        let out = render(&[
            GisObject::DocumentStart,
            GisObject::Style(style),
            GisObject::Feature(f),
        ]);
        let view_at = out.find("<LookAt>").expect("view written");
        let time_at = out.find("<TimeStamp>").expect("time written");
        let url_at = out.find("<styleUrl>").expect("styleUrl written");
        let style_at = out.find("<Style").expect("style written");
        assert!(view_at < time_at);
        assert!(time_at < url_at);
        assert!(url_at < style_at);
    }

    #[test]
    fn equal_start_and_end_become_a_timestamp() {
        let mut f = Feature::default();
        let when = parse_test_date("2012-05-01T12:00:00Z");
        f.common.start_time = Some(when);
        f.common.end_time = Some(when);
        let out = render(&[GisObject::DocumentStart, GisObject::Feature(f)]);
        assert!(out.contains("<TimeStamp>"));
        assert!(out.contains("<when>2012-05-01T12:00:00Z</when>"));
        assert!(!out.contains("TimeSpan"));
    }

    #[test]
    fn distinct_times_become_a_span() {
        let mut f = Feature::default();
        f.common.start_time = Some(parse_test_date("2012-05-01T00:00:00Z"));
        f.common.end_time = Some(parse_test_date("2012-06-01T00:00:00Z"));
        let out = render(&[GisObject::DocumentStart, GisObject::Feature(f)]);
        assert!(out.contains("<TimeSpan>"));
        assert!(out.contains("<begin>2012-05-01T00:00:00Z</begin>"));
        assert!(out.contains("<end>2012-06-01T00:00:00Z</end>"));
    }

    #[test]
    fn date_line_clipped_line_rewrites_longitude() {
        let line = Line::new(vec![
            Point::new(GeoPoint::new(179.5, 10.0)),
            Point::new(GeoPoint::new(-180.0, 10.5)),
        ])
        .expect("valid line");
        let mut f = Feature::default();
        f.geometry = Some(Geometry::Line(line));
        let out = render(&[GisObject::DocumentStart, GisObject::Feature(f)]);
        assert!(out.contains("179.5,10 180,10.5"));
        assert!(!out.contains("-180"));
    }

    #[test]
    fn untyped_extended_data_uses_data_elements() {
        let mut f = Feature::default();
        f.common
            .row
            .put(SimpleField::new("depth"), FieldValue::Double(12.5));
        let out = render(&[GisObject::DocumentStart, GisObject::Feature(f)]);
        assert!(out.contains("<Data name=\"depth\">"));
        assert!(out.contains("<value>12.5</value>"));
    }

    #[test]
    fn schema_rows_use_schema_data() {
        let mut schema = Schema::new("soundings", "s1");
        schema.put(SimpleField::new("depth"));
        let mut f = Feature::default();
        f.common.row.schema = Some("#s1".to_string());
        f.common
            .row
            .put(SimpleField::new("depth"), FieldValue::from("12"));
        let out = render(&[
            GisObject::DocumentStart,
            GisObject::ContainerStart(ContainerStart::new(ContainerKind::Document)),
            GisObject::Schema(schema),
            GisObject::Feature(f),
            GisObject::ContainerEnd,
        ]);
        assert!(out.contains("<Schema name=\"soundings\" id=\"s1\">"));
        assert!(out.contains("<SchemaData schemaUrl=\"#s1\">"));
        assert!(out.contains("<SimpleData name=\"depth\">12</SimpleData>"));
    }

    #[test]
    fn circle_polygon_hint_renders_a_polygon() {
        let circle = Circle::new(GeoPoint::new(10.0, 45.0), 1000.0);
        let mut f = Feature::default();
        f.geometry = Some(Geometry::Circle(circle));
        let out = render(&[GisObject::DocumentStart, GisObject::Feature(f)]);
        assert!(out.contains("<Polygon>"));
        assert!(out.contains("<outerBoundaryIs>"));
    }

    #[test]
    fn html_description_goes_out_as_cdata() {
        let mut f = Feature::default();
        f.common.description = Some("<b>bold</b>".to_string());
        let out = render(&[GisObject::DocumentStart, GisObject::Feature(f)]);
        assert!(out.contains("<![CDATA[<b>bold</b>]]>"));
    }

    #[test]
    fn tagged_map_rebuilds_nesting_from_slash_keys() {
        let mut region = TaggedMap::new("Region");
        region.put("LatLonAltBox/north", "10");
        region.put("LatLonAltBox/south", "0");
        region.put("Lod/minLodPixels", "128");
        let mut f = Feature::default();
        f.common.region = Some(region);
        let out = render(&[GisObject::DocumentStart, GisObject::Feature(f)]);
        assert!(out.contains("<Region>"));
        assert!(out.contains("<LatLonAltBox>"));
        assert!(out.contains("<north>10</north>"));
        assert!(out.contains("</LatLonAltBox>"));
        assert!(out.contains("<Lod>"));
        assert!(out.contains("<minLodPixels>128</minLodPixels>"));
    }

    fn parse_test_date(s: &str) -> DateTime<Utc> {
        crate::reader::parse_kml_date(s).expect("valid date")
    }
}
