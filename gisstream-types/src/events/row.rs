//! Tabular extended data attached to features.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Free-form text.
    String,
    /// 32-bit signed integer.
    Int,
    /// 32-bit unsigned integer.
    Uint,
    /// 16-bit signed integer.
    Short,
    /// 16-bit unsigned integer.
    Ushort,
    /// Single-precision float.
    Float,
    /// Double-precision float.
    Double,
    /// A geometry column.
    Geometry,
    /// A timestamp.
    Date,
    /// An object identifier column.
    Oid,
    /// A boolean flag.
    Bool,
}

impl FieldType {
    /// Default storage length in bytes (characters for strings).
    pub fn default_length(&self) -> u32 {
        match self {
            FieldType::String => 255,
            FieldType::Int | FieldType::Uint | FieldType::Float => 4,
            FieldType::Short | FieldType::Ushort => 2,
            FieldType::Double => 8,
            FieldType::Geometry => 0,
            FieldType::Date | FieldType::Oid => 4,
            FieldType::Bool => 1,
        }
    }

    /// Default decimal precision.
    pub fn default_precision(&self) -> u32 {
        0
    }

    /// XML Schema datatype name, where one exists.
    pub fn xml_schema_type(&self) -> Option<&'static str> {
        match self {
            FieldType::String => Some("xs:string"),
            FieldType::Int | FieldType::Uint | FieldType::Short | FieldType::Ushort
            | FieldType::Oid => Some("xs:int"),
            FieldType::Float => Some("xs:float"),
            FieldType::Double => Some("xs:double"),
            FieldType::Date => Some("xs:dateTime"),
            FieldType::Bool => Some("xs:boolean"),
            FieldType::Geometry => None,
        }
    }

    /// Parses the KML `SimpleField` type attribute.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "string" => Some(FieldType::String),
            "int" => Some(FieldType::Int),
            "uint" => Some(FieldType::Uint),
            "short" => Some(FieldType::Short),
            "ushort" => Some(FieldType::Ushort),
            "float" => Some(FieldType::Float),
            "double" => Some(FieldType::Double),
            "date" => Some(FieldType::Date),
            "bool" => Some(FieldType::Bool),
            _ => None,
        }
    }

    /// The KML lexical form of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Uint => "uint",
            FieldType::Short => "short",
            FieldType::Ushort => "ushort",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Geometry => "geometry",
            FieldType::Date => "date",
            FieldType::Oid => "oid",
            FieldType::Bool => "bool",
        }
    }
}

/// A named, typed field descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleField {
    /// Field name, unique within its schema.
    pub name: String,
    /// Value type.
    pub kind: FieldType,
    /// Display name, when it differs from the field name.
    pub display_name: Option<String>,
    /// Storage length override.
    pub length: Option<u32>,
    /// Decimal precision override.
    pub precision: Option<u32>,
}

impl SimpleField {
    /// Creates a string field with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self::typed(name, FieldType::String)
    }

    /// Creates a field with an explicit type.
    pub fn typed(name: impl Into<String>, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            kind,
            display_name: None,
            length: None,
            precision: None,
        }
    }

    /// The storage length, defaulted from the type when unset.
    pub fn length(&self) -> u32 {
        self.length.unwrap_or_else(|| self.kind.default_length())
    }

    /// The decimal precision, defaulted from the type when unset.
    pub fn precision(&self) -> u32 {
        self.precision
            .unwrap_or_else(|| self.kind.default_precision())
    }
}

/// A field value in a row.
///
/// [`FieldValue::Null`] records an explicitly null value; a field missing
/// from the row altogether is a different state, visible to comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Explicitly null.
    Null,
    /// Text value.
    String(String),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Double(f64),
    /// Boolean value.
    Bool(bool),
    /// Timestamp value.
    Date(DateTime<Utc>),
}

impl FieldValue {
    /// Numeric view of the value, when it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Equality with numeric values compared within `epsilon`.
    pub fn approx_eq(&self, other: &FieldValue, epsilon: f64) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() < epsilon,
            _ => self == other,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

/// An ordered field-to-value mapping with an optional schema reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Reference to the schema describing the fields, usually `#id`.
    pub schema: Option<String>,
    data: Vec<(SimpleField, FieldValue)>,
}

impl Row {
    /// Creates an empty row with no schema reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field's value, replacing in place when the field is present.
    pub fn put(&mut self, field: SimpleField, value: FieldValue) {
        match self.data.iter_mut().find(|(f, _)| f.name == field.name) {
            Some(slot) => slot.1 = value,
            None => self.data.push((field, value)),
        }
    }

    /// The value of a field, `None` when the field is absent.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.data
            .iter()
            .find(|(f, _)| f.name == name)
            .map(|(_, v)| v)
    }

    /// Removes a field, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let idx = self.data.iter().position(|(f, _)| f.name == name)?;
        Some(self.data.remove(idx).1)
    }

    /// Field/value pairs in insertion order.
    pub fn entries(&self) -> &[(SimpleField, FieldValue)] {
        &self.data
    }

    /// True if the row carries any data.
    pub fn has_extended_data(&self) -> bool {
        !self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_value_differs_from_absent() {
        let mut row = Row::new();
        row.put(SimpleField::new("a"), FieldValue::Null);
        assert_eq!(row.get("a"), Some(&FieldValue::Null));
        assert_eq!(row.get("b"), None);
    }

    #[test]
    fn put_replaces_in_place() {
        let mut row = Row::new();
        row.put(SimpleField::new("a"), FieldValue::from("1"));
        row.put(SimpleField::new("b"), FieldValue::from("2"));
        row.put(SimpleField::new("a"), FieldValue::from("3"));
        let names: Vec<&str> = row.entries().iter().map(|(f, _)| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(row.get("a"), Some(&FieldValue::from("3")));
    }

    #[test]
    fn numeric_values_compare_with_epsilon() {
        let a = FieldValue::Double(1.000001);
        let b = FieldValue::Int(1);
        assert!(a.approx_eq(&b, 1e-5));
        assert!(!a.approx_eq(&FieldValue::Double(1.1), 1e-5));
        assert!(!FieldValue::from("x").approx_eq(&FieldValue::from("y"), 1e-5));
    }

    #[test]
    fn field_lengths_default_from_type() {
        let f = SimpleField::typed("count", FieldType::Short);
        assert_eq!(f.length(), 2);
        let mut s = SimpleField::new("label");
        assert_eq!(s.length(), 255);
        s.length = Some(40);
        assert_eq!(s.length(), 40);
    }
}
