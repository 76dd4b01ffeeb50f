//! Streaming KML reader.
//!
//! [`KmlReader`] turns an XML token stream into a flat sequence of
//! [`GisObject`] values, one `read()` call at a time. Style, style-map and
//! schema definitions nested inside a container or feature are emitted
//! *before* the object that textually contains them, so a consumer always
//! sees a definition before anything that references it. The reordering is
//! carried by a deque: the feature under construction is pushed to the
//! front first, each prerequisite found inside it is pushed in front of it,
//! and `read()` pops from the front.

use crate::consts::*;
use crate::error::KmlError;
use crate::xml::{StartTag, XmlStream, XmlToken};
use gisstream_types::events::{
    Color, Common, ContainerKind, ContainerStart, Feature, FieldType, FieldValue, GisObject,
    GroundOverlay, IdGenerator, NetworkLink, Schema, SimpleField, Style, StyleMap, TaggedMap,
};
use gisstream_types::events::{BalloonStyle, IconStyle, LabelStyle, LineStyle, PolyStyle};
use gisstream_types::geometry::{
    AltitudeMode, Geometry, GeometryBag, GeometryBase, Line, LinearRing, Model, MultiPoint, Point,
    Polygon,
};
use gisstream_types::GeoPoint;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::io::BufRead;

/// Pull reader producing [`GisObject`] values from a KML document.
pub struct KmlReader<R: BufRead> {
    stream: XmlStream<R>,
    buffer: VecDeque<GisObject>,
    // KML 2.0 Schema "parent" aliasing: element name -> canonical name
    schema_aliases: HashMap<String, String>,
    // schemata seen so far, by id, for typing SchemaData values
    schemata: HashMap<String, Schema>,
    ids: IdGenerator,
}

impl<R: BufRead> KmlReader<R> {
    /// Creates a reader over a KML byte stream.
    pub fn new(input: R) -> Self {
        Self::with_ids(input, IdGenerator::new())
    }

    /// Creates a reader sharing an id generator with other readers, so
    /// generated schema names stay unique across linked documents.
    pub fn with_ids(input: R, ids: IdGenerator) -> Self {
        let mut buffer = VecDeque::new();
        buffer.push_back(GisObject::DocumentStart);
        Self {
            stream: XmlStream::new(input),
            buffer,
            schema_aliases: HashMap::new(),
            schemata: HashMap::new(),
            ids,
        }
    }

    /// Pushes an object back so the next [`KmlReader::read`] returns it.
    pub fn pushback(&mut self, obj: GisObject) {
        self.buffer.push_front(obj);
    }

    /// The next object in the stream, `None` at end of document.
    pub fn read(&mut self) -> Result<Option<GisObject>, KmlError> {
        if let Some(obj) = self.buffer.pop_front() {
            return Ok(Some(obj));
        }
        loop {
            match self.stream.next()? {
                XmlToken::Start(start) => {
                    if let Some(obj) = self.handle_start(start)? {
                        return Ok(Some(obj));
                    }
                }
                XmlToken::End(name) => {
                    if is_container(&name) {
                        return Ok(Some(GisObject::ContainerEnd));
                    }
                }
                XmlToken::Text(_) => {}
                XmlToken::Eof => return Ok(None),
            }
        }
    }

    fn aliased<'a>(&'a self, name: &'a str) -> &'a str {
        self.schema_aliases
            .get(name)
            .map(String::as_str)
            .unwrap_or(name)
    }

    /// Dispatch for a start tag met at the top of the read loop. `None`
    /// means the loop should descend into the element's children.
    fn handle_start(&mut self, start: StartTag) -> Result<Option<GisObject>, KmlError> {
        let name = self.aliased(&start.name).to_string();
        if is_feature(&name) {
            self.handle_feature(&start, &name)
        } else if is_container(&name) {
            self.handle_container(&start, &name)
        } else if name == SCHEMA {
            self.handle_schema(&start)
        } else if name == STYLE || name == STYLE_MAP {
            // shared styles are handled while their container is assembled;
            // one showing up here is outside any container
            log::debug!("skipping out-of-place {name} element");
            self.stream.skip_element(&start.name)?;
            Ok(None)
        } else if name == "NetworkLinkControl" {
            self.stream.skip_element(&start.name)?;
            Ok(None)
        } else {
            // kml root or unrecognized wrapper: descend
            Ok(None)
        }
    }

    /// Assembles a container, draining its prerequisite children first.
    ///
    /// Consumption stops (without consuming) at the first child feature,
    /// container or schema; those are picked up by subsequent `read()`
    /// calls, and the container's end tag later becomes a `ContainerEnd`.
    fn handle_container(
        &mut self,
        start: &StartTag,
        name: &str,
    ) -> Result<Option<GisObject>, KmlError> {
        let kind = if name == FOLDER {
            ContainerKind::Folder
        } else {
            ContainerKind::Document
        };
        let mut cs = ContainerStart::new(kind);
        let mut prereqs: Vec<GisObject> = Vec::new();
        loop {
            let stop = match self.stream.peek()? {
                XmlToken::End(n) if n == &start.name => true,
                XmlToken::Eof => true,
                XmlToken::Start(child) => {
                    let t = self
                        .schema_aliases
                        .get(&child.name)
                        .map(String::as_str)
                        .unwrap_or(&child.name);
                    is_container(t) || is_feature(t) || t == SCHEMA
                }
                _ => false,
            };
            if stop {
                break;
            }
            if let XmlToken::Start(child) = self.stream.next()? {
                if self.handle_common(&mut cs.common, &child, &mut prereqs)? {
                    continue;
                }
                if child.name == OPEN {
                    cs.open = parse_bool(&self.stream.element_text(OPEN)?);
                } else {
                    self.stream.skip_element(&child.name)?;
                }
            }
        }
        self.buffer.push_front(GisObject::ContainerStart(cs));
        for p in prereqs {
            self.buffer.push_front(p);
        }
        Ok(self.buffer.pop_front())
    }

    /// Assembles a feature, consuming through its end tag.
    fn handle_feature(
        &mut self,
        start: &StartTag,
        name: &str,
    ) -> Result<Option<GisObject>, KmlError> {
        let mut common = Common::default();
        let mut prereqs: Vec<GisObject> = Vec::new();
        let mut geometry: Option<Geometry> = None;
        let mut link: Option<TaggedMap> = None;
        let mut refresh_visibility = false;
        let mut fly_to_view = false;
        let mut overlay = GroundOverlay::default();

        loop {
            match self.stream.next()? {
                XmlToken::End(n) if n == start.name => break,
                XmlToken::Eof => break,
                XmlToken::Start(child) => {
                    if self.handle_common(&mut common, &child, &mut prereqs)? {
                        continue;
                    }
                    match name {
                        PLACEMARK if is_geometry(&child.name) => {
                            match self.parse_geometry(&child) {
                                Ok(geo) => geometry = geo.or(geometry),
                                Err(err) => log::warn!("failed geometry: {err}"),
                            }
                        }
                        NETWORK_LINK => match child.name.as_str() {
                            REFRESH_VISIBILITY => {
                                refresh_visibility =
                                    parse_bool(&self.stream.element_text(&child.name)?)
                                        .unwrap_or(false);
                            }
                            FLY_TO_VIEW => {
                                fly_to_view = parse_bool(&self.stream.element_text(&child.name)?)
                                    .unwrap_or(false);
                            }
                            LINK | URL => link = Some(self.parse_tagged(&child.name)?),
                            _ => self.stream.skip_element(&child.name)?,
                        },
                        GROUND_OVERLAY => match child.name.as_str() {
                            COLOR => {
                                overlay.color = Color::parse(&self.stream.element_text(COLOR)?);
                            }
                            DRAW_ORDER => {
                                overlay.draw_order = self
                                    .stream
                                    .non_empty_text(DRAW_ORDER)?
                                    .and_then(|t| t.parse().ok());
                            }
                            ICON => overlay.icon = Some(self.parse_tagged(ICON)?),
                            LAT_LON_BOX => self.parse_lat_lon_box(&mut overlay)?,
                            ALTITUDE => {
                                overlay.altitude = self
                                    .stream
                                    .non_empty_text(ALTITUDE)?
                                    .and_then(|t| t.parse().ok());
                            }
                            ALTITUDE_MODE => {
                                overlay.altitude_mode =
                                    AltitudeMode::parse(&self.stream.element_text(ALTITUDE_MODE)?);
                            }
                            _ => self.stream.skip_element(&child.name)?,
                        },
                        _ => self.stream.skip_element(&child.name)?,
                    }
                }
                _ => {}
            }
        }

        let obj = match name {
            NETWORK_LINK => GisObject::NetworkLink(NetworkLink {
                common,
                link,
                refresh_visibility,
                fly_to_view,
            }),
            GROUND_OVERLAY => {
                overlay.common = common;
                GisObject::GroundOverlay(overlay)
            }
            _ => GisObject::Feature(Feature { common, geometry }),
        };
        self.buffer.push_front(obj);
        for p in prereqs {
            self.buffer.push_front(p);
        }
        Ok(self.buffer.pop_front())
    }

    /// Properties shared by features and containers. Returns whether the
    /// element was consumed.
    fn handle_common(
        &mut self,
        common: &mut Common,
        tag: &StartTag,
        prereqs: &mut Vec<GisObject>,
    ) -> Result<bool, KmlError> {
        match tag.name.as_str() {
            NAME => common.name = self.stream.non_empty_text(NAME)?,
            DESCRIPTION => common.description = self.stream.non_empty_text(DESCRIPTION)?,
            SNIPPET | "snippet" => common.snippet = self.stream.non_empty_text(&tag.name)?,
            VISIBILITY => {
                common.visibility = parse_bool(&self.stream.element_text(VISIBILITY)?);
            }
            STYLE_URL => {
                let url = self.stream.element_text(STYLE_URL)?;
                common.set_style_url(&url);
            }
            STYLE => prereqs.push(GisObject::Style(self.parse_style(tag)?)),
            STYLE_MAP => prereqs.push(GisObject::StyleMap(self.parse_style_map(tag)?)),
            REGION => common.region = Some(self.parse_tagged(REGION)?),
            LOOK_AT | CAMERA => common.view = Some(self.parse_tagged(&tag.name)?),
            TIME_SPAN => self.parse_time_span(common)?,
            TIME_STAMP => self.parse_time_stamp(common)?,
            EXTENDED_DATA | METADATA => self.parse_extended_data(common, &tag.name)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn parse_time_span(&mut self, common: &mut Common) -> Result<(), KmlError> {
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => match child.name.as_str() {
                    BEGIN => common.start_time = self.parse_date_child(BEGIN)?,
                    END => common.end_time = self.parse_date_child(END)?,
                    _ => self.stream.skip_element(&child.name)?,
                },
                XmlToken::End(n) if n == TIME_SPAN => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_time_stamp(&mut self, common: &mut Common) -> Result<(), KmlError> {
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => {
                    if child.name == WHEN {
                        let when = self.parse_date_child(WHEN)?;
                        common.start_time = when;
                        common.end_time = when;
                    } else {
                        self.stream.skip_element(&child.name)?;
                    }
                }
                XmlToken::End(n) if n == TIME_STAMP => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_date_child(&mut self, name: &str) -> Result<Option<DateTime<Utc>>, KmlError> {
        match self.stream.non_empty_text(name)? {
            Some(text) => match parse_kml_date(&text) {
                Ok(date) => Ok(Some(date)),
                Err(err) => {
                    log::warn!("{err}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn parse_extended_data(&mut self, common: &mut Common, outer: &str) -> Result<(), KmlError> {
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => match child.name.as_str() {
                    DATA => {
                        let name = child.attr(NAME).unwrap_or_default().to_string();
                        let mut value = None;
                        loop {
                            match self.stream.next()? {
                                XmlToken::Start(inner) if inner.name == VALUE => {
                                    value = Some(self.stream.element_text(VALUE)?);
                                }
                                XmlToken::Start(inner) => self.stream.skip_element(&inner.name)?,
                                XmlToken::End(n) if n == DATA => break,
                                XmlToken::Eof => break,
                                _ => {}
                            }
                        }
                        if !name.is_empty() {
                            common.row.put(
                                SimpleField::new(name),
                                FieldValue::String(value.unwrap_or_default()),
                            );
                        }
                    }
                    SCHEMA_DATA => {
                        let schema_url = child.attr(SCHEMA_URL).unwrap_or_default().trim();
                        if !schema_url.is_empty() {
                            common.row.schema = Some(schema_url.to_string());
                        }
                        let schema = common
                            .row
                            .schema
                            .as_deref()
                            .and_then(|u| self.schemata.get(u.trim_start_matches('#')))
                            .cloned();
                        self.parse_schema_data(common, schema.as_ref())?;
                    }
                    _ => self.stream.skip_element(&child.name)?,
                },
                XmlToken::End(n) if n == outer => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_schema_data(
        &mut self,
        common: &mut Common,
        schema: Option<&Schema>,
    ) -> Result<(), KmlError> {
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) if child.name == SIMPLE_DATA => {
                    let name = child.attr(NAME).unwrap_or_default().to_string();
                    let text = self.stream.element_text(SIMPLE_DATA)?;
                    if name.is_empty() {
                        continue;
                    }
                    let field = schema
                        .and_then(|s| s.get(&name))
                        .cloned()
                        .unwrap_or_else(|| SimpleField::new(name));
                    let value = typed_value(&field, &text);
                    common.row.put(field, value);
                }
                XmlToken::Start(child) => self.stream.skip_element(&child.name)?,
                XmlToken::End(n) if n == SCHEMA_DATA => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_schema(&mut self, start: &StartTag) -> Result<Option<GisObject>, KmlError> {
        let mut name = start.attr(NAME).unwrap_or_default().trim().to_string();
        let mut id = start.attr(ID).unwrap_or_default().trim().to_string();
        // KML 2.0 put the parent type in an attribute
        let mut parent = start.attr(PARENT).map(str::to_string);
        let mut fields: Vec<SimpleField> = Vec::new();
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => match child.name.as_str() {
                    SIMPLE_FIELD => {
                        if let Some(field) = self.parse_simple_field(&child)? {
                            fields.push(field);
                        }
                    }
                    NAME => {
                        // KML 2.0 form with name as a child element
                        if name.is_empty() {
                            name = self.stream.element_text(NAME)?.trim().to_string();
                        } else {
                            self.stream.skip_element(NAME)?;
                        }
                    }
                    PARENT => parent = self.stream.non_empty_text(PARENT)?,
                    _ => self.stream.skip_element(&child.name)?,
                },
                XmlToken::End(n) if n == start.name => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        if name.is_empty() {
            name = self.ids.next_schema_name();
        }
        if id.is_empty() {
            id = self.ids.next_schema_id();
        }
        if let Some(parent) = parent {
            let parent = parent.trim();
            if is_feature(parent) || is_container(parent) {
                self.schema_aliases.insert(name.clone(), parent.to_string());
            }
        }
        let mut schema = Schema::new(name, id.clone());
        for f in fields {
            schema.put(f);
        }
        self.schemata.insert(id, schema.clone());
        self.buffer.push_back(GisObject::Schema(schema));
        Ok(self.buffer.pop_front())
    }

    fn parse_simple_field(&mut self, tag: &StartTag) -> Result<Option<SimpleField>, KmlError> {
        let name = tag.attr(NAME).unwrap_or_default().trim().to_string();
        let kind = tag
            .attr("type")
            .and_then(FieldType::parse)
            .unwrap_or(FieldType::String);
        let mut display_name = None;
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) if child.name == DISPLAY_NAME => {
                    display_name = self.stream.non_empty_text(DISPLAY_NAME)?;
                }
                XmlToken::Start(child) => self.stream.skip_element(&child.name)?,
                XmlToken::End(n) if n == SIMPLE_FIELD => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        if name.is_empty() {
            log::warn!("ignoring SimpleField without a name");
            return Ok(None);
        }
        let mut field = SimpleField::typed(name, kind);
        field.display_name = display_name;
        Ok(Some(field))
    }

    fn parse_style(&mut self, tag: &StartTag) -> Result<Style, KmlError> {
        let mut style = match tag.attr(ID) {
            Some(id) => Style::with_id(id),
            None => Style::default(),
        };
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => match child.name.as_str() {
                    ICON_STYLE => style.icon = Some(self.parse_icon_style()?),
                    LINE_STYLE => style.line = Some(self.parse_line_style()?),
                    POLY_STYLE => style.poly = Some(self.parse_poly_style()?),
                    LABEL_STYLE => style.label = Some(self.parse_label_style()?),
                    BALLOON_STYLE => style.balloon = Some(self.parse_balloon_style()?),
                    _ => self.stream.skip_element(&child.name)?,
                },
                XmlToken::End(n) if n == tag.name => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok(style)
    }

    fn parse_icon_style(&mut self) -> Result<IconStyle, KmlError> {
        let mut s = IconStyle::default();
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => match child.name.as_str() {
                    COLOR => s.color = Color::parse(&self.stream.element_text(COLOR)?),
                    SCALE => s.scale = self.parse_f64_child(SCALE)?,
                    HEADING => s.heading = self.parse_f64_child(HEADING)?,
                    ICON => {
                        // nested Icon/href
                        loop {
                            match self.stream.next()? {
                                XmlToken::Start(inner) if inner.name == HREF => {
                                    s.href = self.stream.non_empty_text(HREF)?;
                                }
                                XmlToken::Start(inner) => self.stream.skip_element(&inner.name)?,
                                XmlToken::End(n) if n == ICON => break,
                                XmlToken::Eof => break,
                                _ => {}
                            }
                        }
                    }
                    _ => self.stream.skip_element(&child.name)?,
                },
                XmlToken::End(n) if n == ICON_STYLE => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok(s)
    }

    fn parse_line_style(&mut self) -> Result<LineStyle, KmlError> {
        let mut s = LineStyle::default();
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => match child.name.as_str() {
                    COLOR => s.color = Color::parse(&self.stream.element_text(COLOR)?),
                    WIDTH => s.width = self.parse_f64_child(WIDTH)?,
                    _ => self.stream.skip_element(&child.name)?,
                },
                XmlToken::End(n) if n == LINE_STYLE => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok(s)
    }

    fn parse_poly_style(&mut self) -> Result<PolyStyle, KmlError> {
        let mut s = PolyStyle::default();
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => match child.name.as_str() {
                    COLOR => s.color = Color::parse(&self.stream.element_text(COLOR)?),
                    FILL => s.fill = parse_bool(&self.stream.element_text(FILL)?),
                    OUTLINE => s.outline = parse_bool(&self.stream.element_text(OUTLINE)?),
                    _ => self.stream.skip_element(&child.name)?,
                },
                XmlToken::End(n) if n == POLY_STYLE => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok(s)
    }

    fn parse_label_style(&mut self) -> Result<LabelStyle, KmlError> {
        let mut s = LabelStyle::default();
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => match child.name.as_str() {
                    COLOR => s.color = Color::parse(&self.stream.element_text(COLOR)?),
                    SCALE => s.scale = self.parse_f64_child(SCALE)?,
                    _ => self.stream.skip_element(&child.name)?,
                },
                XmlToken::End(n) if n == LABEL_STYLE => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok(s)
    }

    fn parse_balloon_style(&mut self) -> Result<BalloonStyle, KmlError> {
        let mut s = BalloonStyle::default();
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => match child.name.as_str() {
                    BG_COLOR => s.bg_color = Color::parse(&self.stream.element_text(BG_COLOR)?),
                    TEXT_COLOR => {
                        s.text_color = Color::parse(&self.stream.element_text(TEXT_COLOR)?);
                    }
                    TEXT => s.text = self.stream.non_empty_text(TEXT)?,
                    DISPLAY_MODE => s.display_mode = self.stream.non_empty_text(DISPLAY_MODE)?,
                    _ => self.stream.skip_element(&child.name)?,
                },
                XmlToken::End(n) if n == BALLOON_STYLE => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok(s)
    }

    fn parse_style_map(&mut self, tag: &StartTag) -> Result<StyleMap, KmlError> {
        let mut map = match tag.attr(ID) {
            Some(id) => StyleMap::with_id(id),
            None => StyleMap::default(),
        };
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) if child.name == PAIR => {
                    let mut key = None;
                    let mut url = None;
                    loop {
                        match self.stream.next()? {
                            XmlToken::Start(inner) => match inner.name.as_str() {
                                KEY => key = self.stream.non_empty_text(KEY)?,
                                STYLE_URL => url = self.stream.non_empty_text(STYLE_URL)?,
                                _ => self.stream.skip_element(&inner.name)?,
                            },
                            XmlToken::End(n) if n == PAIR => break,
                            XmlToken::Eof => break,
                            _ => {}
                        }
                    }
                    if let Some(url) = url {
                        match key.as_deref() {
                            Some(HIGHLIGHT) => map.set_highlight(&url),
                            // normal is the default when the key is missing
                            Some(NORMAL) | None => map.set_normal(&url),
                            Some(other) => log::warn!("ignoring unknown style key: {other:?}"),
                        }
                    }
                }
                XmlToken::Start(child) => self.stream.skip_element(&child.name)?,
                XmlToken::End(n) if n == tag.name => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok(map)
    }

    /// Reads a one-level element tree into a tagged map; nested elements
    /// get slash-joined keys (`LatLonAltBox/north`).
    fn parse_tagged(&mut self, tag: &str) -> Result<TaggedMap, KmlError> {
        let mut map = TaggedMap::new(tag);
        let mut path: Vec<String> = Vec::new();
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => path.push(child.name),
                XmlToken::Text(text) => {
                    if !path.is_empty() {
                        map.put(path.join("/"), text.trim().to_string());
                    }
                }
                XmlToken::End(n) if path.last() == Some(&n) => {
                    path.pop();
                }
                XmlToken::End(n) if n == tag && path.is_empty() => break,
                XmlToken::End(_) => {}
                XmlToken::Eof => break,
            }
        }
        Ok(map)
    }

    fn parse_lat_lon_box(&mut self, overlay: &mut GroundOverlay) -> Result<(), KmlError> {
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => match child.name.as_str() {
                    NORTH => overlay.north = self.parse_f64_child(NORTH)?,
                    SOUTH => overlay.south = self.parse_f64_child(SOUTH)?,
                    EAST => overlay.east = self.parse_f64_child(EAST)?,
                    WEST => overlay.west = self.parse_f64_child(WEST)?,
                    ROTATION => overlay.rotation = self.parse_f64_child(ROTATION)?,
                    _ => self.stream.skip_element(&child.name)?,
                },
                XmlToken::End(n) if n == LAT_LON_BOX => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_f64_child(&mut self, name: &str) -> Result<Option<f64>, KmlError> {
        let text = self.stream.non_empty_text(name)?;
        Ok(text.and_then(|t| match t.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("ignoring bad value for {name}: {t:?}");
                None
            }
        }))
    }

    /// Parses one geometry element whose start tag was just consumed.
    fn parse_geometry(&mut self, tag: &StartTag) -> Result<Option<Geometry>, KmlError> {
        match tag.name.as_str() {
            POINT => {
                let (coords, base) = self.parse_coordinate_block(POINT)?;
                Ok(coords.first().map(|c| {
                    let mut p = Point::new(*c);
                    p.base = base;
                    Geometry::Point(p)
                }))
            }
            LINE_STRING => {
                let (coords, base) = self.parse_coordinate_block(LINE_STRING)?;
                Ok(line_from_coords(coords, base, "LineString")?)
            }
            LINEAR_RING => {
                let (coords, base) = self.parse_coordinate_block(LINEAR_RING)?;
                Ok(ring_from_coords(coords, base)?)
            }
            POLYGON => self.parse_polygon(),
            MULTI_GEOMETRY => self.parse_multi_geometry(),
            MODEL => self.parse_model(),
            other => {
                self.stream.skip_element(&tag.name)?;
                log::debug!("skipping unsupported geometry: {other}");
                Ok(None)
            }
        }
    }

    /// Coordinates plus altitude-mode/extrude/tessellate for the simple
    /// geometry elements.
    fn parse_coordinate_block(
        &mut self,
        end: &str,
    ) -> Result<(Vec<GeoPoint>, GeometryBase), KmlError> {
        let mut coords = Vec::new();
        let mut base = GeometryBase::default();
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => match child.name.as_str() {
                    COORDINATES => {
                        coords = parse_coordinates(&self.stream.element_text(COORDINATES)?);
                    }
                    ALTITUDE_MODE => {
                        base.altitude_mode =
                            AltitudeMode::parse(&self.stream.element_text(ALTITUDE_MODE)?);
                    }
                    EXTRUDE => base.extrude = parse_bool(&self.stream.element_text(EXTRUDE)?),
                    TESSELLATE => {
                        base.tessellate = parse_bool(&self.stream.element_text(TESSELLATE)?);
                    }
                    _ => self.stream.skip_element(&child.name)?,
                },
                XmlToken::End(n) if n == end => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok((coords, base))
    }

    fn parse_polygon(&mut self) -> Result<Option<Geometry>, KmlError> {
        let mut base = GeometryBase::default();
        let mut outer: Option<Vec<GeoPoint>> = None;
        let mut inners: Vec<Vec<GeoPoint>> = Vec::new();
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => match child.name.as_str() {
                    OUTER_BOUNDARY_IS => {
                        outer = self.parse_boundary(OUTER_BOUNDARY_IS)?;
                    }
                    INNER_BOUNDARY_IS => {
                        if let Some(ring) = self.parse_boundary(INNER_BOUNDARY_IS)? {
                            inners.push(ring);
                        }
                    }
                    ALTITUDE_MODE => {
                        base.altitude_mode =
                            AltitudeMode::parse(&self.stream.element_text(ALTITUDE_MODE)?);
                    }
                    EXTRUDE => base.extrude = parse_bool(&self.stream.element_text(EXTRUDE)?),
                    TESSELLATE => {
                        base.tessellate = parse_bool(&self.stream.element_text(TESSELLATE)?);
                    }
                    _ => self.stream.skip_element(&child.name)?,
                },
                XmlToken::End(n) if n == POLYGON => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        let Some(outer) = outer else {
            log::warn!("Polygon without an outer boundary");
            return Ok(None);
        };
        let outer = LinearRing::new(outer.into_iter().map(Point::new).collect())?;
        let mut rings = Vec::with_capacity(inners.len());
        for coords in inners {
            match LinearRing::new(coords.into_iter().map(Point::new).collect()) {
                Ok(ring) => rings.push(ring),
                Err(err) => log::warn!("skipping inner boundary: {err}"),
            }
        }
        let mut poly = Polygon::new(outer, rings);
        poly.base = base;
        Ok(Some(Geometry::Polygon(poly)))
    }

    /// `outerBoundaryIs`/`innerBoundaryIs` wrapper around a `LinearRing`.
    fn parse_boundary(&mut self, end: &str) -> Result<Option<Vec<GeoPoint>>, KmlError> {
        let mut coords = None;
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) if child.name == LINEAR_RING => {
                    let (c, _) = self.parse_coordinate_block(LINEAR_RING)?;
                    coords = Some(c);
                }
                XmlToken::Start(child) => self.stream.skip_element(&child.name)?,
                XmlToken::End(n) if n == end => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        Ok(coords)
    }

    fn parse_multi_geometry(&mut self) -> Result<Option<Geometry>, KmlError> {
        let mut members: Vec<Geometry> = Vec::new();
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => {
                    if is_geometry(&child.name) {
                        match self.parse_geometry(&child) {
                            Ok(Some(geo)) => members.push(geo),
                            Ok(None) => {}
                            Err(err) => log::warn!("failed geometry in MultiGeometry: {err}"),
                        }
                    } else {
                        self.stream.skip_element(&child.name)?;
                    }
                }
                XmlToken::End(n) if n == MULTI_GEOMETRY => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        // all points collapse into the dedicated container
        if !members.is_empty() && members.iter().all(|g| matches!(g, Geometry::Point(_))) {
            let points = members
                .into_iter()
                .filter_map(|g| match g {
                    Geometry::Point(p) => Some(p),
                    _ => None,
                })
                .collect();
            return Ok(Some(Geometry::MultiPoint(MultiPoint::new(points)?)));
        }
        Ok(Some(Geometry::GeometryBag(GeometryBag::new(members))))
    }

    fn parse_model(&mut self) -> Result<Option<Geometry>, KmlError> {
        let mut altitude_mode = None;
        let mut lon = None;
        let mut lat = None;
        let mut alt = None;
        loop {
            match self.stream.next()? {
                XmlToken::Start(child) => match child.name.as_str() {
                    ALTITUDE_MODE => {
                        altitude_mode =
                            AltitudeMode::parse(&self.stream.element_text(ALTITUDE_MODE)?);
                    }
                    LOCATION => loop {
                        match self.stream.next()? {
                            XmlToken::Start(inner) => match inner.name.as_str() {
                                LONGITUDE => lon = self.parse_f64_child(LONGITUDE)?,
                                LATITUDE => lat = self.parse_f64_child(LATITUDE)?,
                                ALTITUDE => alt = self.parse_f64_child(ALTITUDE)?,
                                _ => self.stream.skip_element(&inner.name)?,
                            },
                            XmlToken::End(n) if n == LOCATION => break,
                            XmlToken::Eof => break,
                            _ => {}
                        }
                    },
                    _ => self.stream.skip_element(&child.name)?,
                },
                XmlToken::End(n) if n == MODEL => break,
                XmlToken::Eof => break,
                _ => {}
            }
        }
        let (Some(lon), Some(lat)) = (lon, lat) else {
            log::warn!("Model without a Location");
            return Ok(None);
        };
        let location = match alt {
            Some(alt) => GeoPoint::with_elevation(lon, lat, alt),
            None => GeoPoint::new(lon, lat),
        };
        let mut model = Model::new(location);
        model.altitude_mode = altitude_mode;
        Ok(Some(Geometry::Model(model)))
    }
}

/// Degrades an under-populated line the way permissive consumers expect.
fn line_from_coords(
    coords: Vec<GeoPoint>,
    base: GeometryBase,
    kind: &str,
) -> Result<Option<Geometry>, KmlError> {
    match coords.len() {
        0 => {
            log::warn!("{kind} without coordinates");
            Ok(None)
        }
        1 => {
            log::info!("{kind} with one coordinate treated as a Point");
            let mut p = Point::new(coords[0]);
            p.base = base;
            Ok(Some(Geometry::Point(p)))
        }
        _ => {
            let mut line = Line::new(coords.into_iter().map(Point::new).collect())?;
            line.base = base;
            Ok(Some(Geometry::Line(line)))
        }
    }
}

/// Rings degrade further: one coordinate is a point, two or three a line.
fn ring_from_coords(coords: Vec<GeoPoint>, base: GeometryBase) -> Result<Option<Geometry>, KmlError> {
    match coords.len() {
        0 => {
            log::warn!("LinearRing without coordinates");
            Ok(None)
        }
        1 => {
            log::info!("LinearRing with one coordinate treated as a Point");
            let mut p = Point::new(coords[0]);
            p.base = base;
            Ok(Some(Geometry::Point(p)))
        }
        2 | 3 => {
            log::info!("under-populated LinearRing treated as a Line");
            let mut line = Line::new(coords.into_iter().map(Point::new).collect())?;
            line.base = base;
            Ok(Some(Geometry::Line(line)))
        }
        _ => {
            let mut ring = LinearRing::new(coords.into_iter().map(Point::new).collect())?;
            ring.base = base;
            Ok(Some(Geometry::LinearRing(ring)))
        }
    }
}

/// Converts a `SimpleData` lexical value according to its declared field
/// type, falling back to the raw string when conversion fails.
fn typed_value(field: &SimpleField, text: &str) -> FieldValue {
    let raw = text.trim();
    match field.kind {
        FieldType::Int | FieldType::Uint | FieldType::Short | FieldType::Ushort
        | FieldType::Oid => raw
            .parse()
            .map(FieldValue::Int)
            .unwrap_or_else(|_| FieldValue::String(text.to_string())),
        FieldType::Float | FieldType::Double => raw
            .parse()
            .map(FieldValue::Double)
            .unwrap_or_else(|_| FieldValue::String(text.to_string())),
        FieldType::Bool => parse_bool(raw)
            .map(FieldValue::Bool)
            .unwrap_or_else(|| FieldValue::String(text.to_string())),
        FieldType::Date => parse_kml_date(raw)
            .map(FieldValue::Date)
            .unwrap_or_else(|_| FieldValue::String(text.to_string())),
        FieldType::String | FieldType::Geometry => FieldValue::String(text.to_string()),
    }
}

/// KML boolean: `1`/`true` and `0`/`false`; anything else is absent.
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Tolerant `coordinates` tokenizer.
///
/// Tuples are whitespace-separated, components comma-separated, but
/// whitespace around commas is forgiven. A 2-component tuple makes a 2d
/// point, a 3-component tuple a 3d one; malformed tuples are skipped with
/// a warning.
pub(crate) fn parse_coordinates(text: &str) -> Vec<GeoPoint> {
    // drop whitespace runs adjacent to commas so tuples split cleanly
    let mut cleaned = String::with_capacity(text.len());
    let mut pending_ws = false;
    let mut after_comma = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_ws = true;
        } else if c == ',' {
            cleaned.push(',');
            pending_ws = false;
            after_comma = true;
        } else {
            if pending_ws && !after_comma {
                cleaned.push(' ');
            }
            pending_ws = false;
            after_comma = false;
            cleaned.push(c);
        }
    }

    let mut points = Vec::new();
    for tuple in cleaned.split(' ').filter(|t| !t.is_empty()) {
        let parts: Vec<&str> = tuple.split(',').collect();
        let parsed: Option<Vec<f64>> = parts.iter().map(|p| p.parse().ok()).collect();
        match parsed.as_deref() {
            Some([lon, lat]) => points.push(GeoPoint::new(*lon, *lat)),
            Some([lon, lat, alt]) => points.push(GeoPoint::with_elevation(*lon, *lat, *alt)),
            _ => log::warn!("ignoring malformed coordinate tuple: {tuple:?}"),
        }
    }
    points
}

/// Parses the KML dateTimeType forms, most specific first. The error of
/// the last pattern tried is surfaced when nothing matches.
pub(crate) fn parse_kml_date(value: &str) -> Result<DateTime<Utc>, KmlError> {
    let value = value.trim();
    let mut last_err = None;

    for pattern in ["%Y-%m-%dT%H:%M:%S%.3fZ", "%Y-%m-%dT%H:%M:%SZ"] {
        match NaiveDateTime::parse_from_str(value, pattern) {
            Ok(dt) => return Ok(Utc.from_utc_datetime(&dt)),
            Err(err) => last_err = Some(err),
        }
    }
    // date-only forms widen to the start of the period
    let widened: [(String, &str); 3] = [
        (value.to_string(), "%Y-%m-%d"),
        (format!("{value}-01"), "%Y-%m-%d"),
        (format!("{value}-01-01"), "%Y-%m-%d"),
    ];
    for (candidate, pattern) in widened {
        match NaiveDate::parse_from_str(&candidate, pattern) {
            Ok(date) => {
                let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
                return Ok(Utc.from_utc_datetime(&midnight));
            }
            Err(err) => last_err = Some(err),
        }
    }

    Err(KmlError::DateParse {
        value: value.to_string(),
        // loop above always runs
        source: last_err.ok_or_else(|| KmlError::Other("empty date".into()))?,
    })
}
