//! Schema declarations and the counter that names anonymous ones.

use crate::events::row::SimpleField;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of unique suffixes for schemata that arrive without a name or id.
///
/// Readers hold one instance and share it between documents they import, so
/// generated names stay unique across linked files.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    counter: Arc<AtomicU64>,
}

impl IdGenerator {
    /// Creates a generator starting at one.
    pub fn new() -> Self {
        Self::default()
    }

    /// The next unused suffix.
    pub fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// A default schema name, `schema_N`.
    pub fn next_schema_name(&self) -> String {
        format!("schema_{}", self.next_id())
    }

    /// A default schema id, `s_N`.
    pub fn next_schema_id(&self) -> String {
        format!("s_{}", self.next_id())
    }
}

/// An ordered set of field declarations shared by rows that reference it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name as declared in the document.
    pub name: String,
    /// Schema id, the target of `#id` references.
    pub id: String,
    fields: Vec<SimpleField>,
}

impl Schema {
    /// Creates an empty schema with the given name and id.
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            fields: Vec::new(),
        }
    }

    /// Creates a schema with generated name and id.
    pub fn anonymous(ids: &IdGenerator) -> Self {
        Self::new(ids.next_schema_name(), ids.next_schema_id())
    }

    /// Adds a field, replacing any previous field of the same name in
    /// place.
    pub fn put(&mut self, field: SimpleField) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(slot) => *slot = field,
            None => self.fields.push(field),
        }
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&SimpleField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[SimpleField] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::row::FieldType;

    #[test]
    fn generated_names_are_unique() {
        let ids = IdGenerator::new();
        let a = Schema::anonymous(&ids);
        let b = Schema::anonymous(&ids);
        assert_ne!(a.name, b.name);
        assert_ne!(a.id, b.id);
        assert!(a.name.starts_with("schema_"));
        assert!(a.id.starts_with("s_"));
    }

    #[test]
    fn clones_share_the_counter() {
        let ids = IdGenerator::new();
        let other = ids.clone();
        let first = ids.next_id();
        let second = other.next_id();
        assert_ne!(first, second);
    }

    #[test]
    fn put_replaces_field_in_place() {
        let mut schema = Schema::new("roads", "roads_1");
        schema.put(SimpleField::new("name"));
        schema.put(SimpleField::new("lanes"));
        schema.put(SimpleField::typed("name", FieldType::Int));
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["name", "lanes"]);
        assert_eq!(schema.get("name").map(|f| f.kind), Some(FieldType::Int));
    }
}
