//! Rendering styles and the KML color encoding.

use crate::events::common::normalize_style_url;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A color in KML channel order: alpha, blue, green, red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    /// Opacity channel.
    pub alpha: u8,
    /// Blue channel.
    pub blue: u8,
    /// Green channel.
    pub green: u8,
    /// Red channel.
    pub red: u8,
}

impl Color {
    /// Fully opaque color from red/green/blue channels.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            alpha: 0xff,
            blue,
            green,
            red,
        }
    }

    /// Parses the KML `aabbggrr` hex form. Anything but exactly eight hex
    /// digits yields `None` and the caller supplies its default.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.len() != 8 {
            return None;
        }
        let chan = |range: std::ops::Range<usize>| u8::from_str_radix(&value[range], 16).ok();
        Some(Self {
            alpha: chan(0..2)?,
            blue: chan(2..4)?,
            green: chan(4..6)?,
            red: chan(6..8)?,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}",
            self.alpha, self.blue, self.green, self.red
        )
    }
}

/// Icon rendering attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconStyle {
    /// Tint color.
    pub color: Option<Color>,
    /// Scale factor.
    pub scale: Option<f64>,
    /// Heading in degrees.
    pub heading: Option<f64>,
    /// Icon image reference.
    pub href: Option<String>,
}

/// Line rendering attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    /// Stroke color.
    pub color: Option<Color>,
    /// Stroke width in pixels.
    pub width: Option<f64>,
}

/// Polygon fill attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolyStyle {
    /// Fill color.
    pub color: Option<Color>,
    /// Whether the interior is filled.
    pub fill: Option<bool>,
    /// Whether the boundary is stroked.
    pub outline: Option<bool>,
}

/// Label rendering attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    /// Text color.
    pub color: Option<Color>,
    /// Scale factor.
    pub scale: Option<f64>,
}

/// Description balloon attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalloonStyle {
    /// Background color.
    pub bg_color: Option<Color>,
    /// Text color.
    pub text_color: Option<Color>,
    /// Balloon content template.
    pub text: Option<String>,
    /// `default` or `hide`.
    pub display_mode: Option<String>,
}

/// A reusable style holding any subset of the five sub-styles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Style id, the target of `#id` references.
    pub id: Option<String>,
    /// Icon sub-style.
    pub icon: Option<IconStyle>,
    /// Line sub-style.
    pub line: Option<LineStyle>,
    /// Polygon sub-style.
    pub poly: Option<PolyStyle>,
    /// Label sub-style.
    pub label: Option<LabelStyle>,
    /// Balloon sub-style.
    pub balloon: Option<BalloonStyle>,
}

impl Style {
    /// Creates an empty style with the given id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// True if no sub-style is set.
    pub fn is_empty(&self) -> bool {
        self.icon.is_none()
            && self.line.is_none()
            && self.poly.is_none()
            && self.label.is_none()
            && self.balloon.is_none()
    }
}

/// A normal/highlight pair of style references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleMap {
    /// Map id, the target of `#id` references.
    pub id: Option<String>,
    normal: Option<String>,
    highlight: Option<String>,
}

impl StyleMap {
    /// Creates an empty map with the given id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Sets the normal-state style URL, normalizing bare identifiers to
    /// local `#id` references.
    pub fn set_normal(&mut self, url: &str) {
        self.normal = normalize_style_url(url);
    }

    /// Sets the highlight-state style URL, normalized the same way.
    pub fn set_highlight(&mut self, url: &str) {
        self.highlight = normalize_style_url(url);
    }

    /// The normal-state style URL.
    pub fn normal(&self) -> Option<&str> {
        self.normal.as_deref()
    }

    /// The highlight-state style URL.
    pub fn highlight(&self) -> Option<&str> {
        self.highlight.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_round_trips_through_hex() {
        let c = Color::parse("7f0000ff").expect("valid color");
        assert_eq!(c.alpha, 0x7f);
        assert_eq!(c.red, 0xff);
        assert_eq!(c.blue, 0);
        assert_eq!(c.to_string(), "7f0000ff");
    }

    #[test]
    fn wrong_length_color_is_none() {
        assert!(Color::parse("ff0000").is_none());
        assert!(Color::parse("").is_none());
        assert!(Color::parse("ff0000ff00").is_none());
        assert!(Color::parse("zzzzzzzz").is_none());
    }

    #[test]
    fn style_map_normalizes_bare_ids() {
        let mut map = StyleMap::with_id("pair");
        map.set_normal("plain");
        map.set_highlight("#lit");
        assert_eq!(map.normal(), Some("#plain"));
        assert_eq!(map.highlight(), Some("#lit"));
    }
}
