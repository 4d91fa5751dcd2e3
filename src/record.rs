//! Opaque row records returned by remote fetches.
//!
//! The scaffold never assumes more structure than "has an `id`, and the
//! fields named by the column/field specs exist or are undefined". Records
//! are JSON objects; `preserve_order` keeps key order stable, which the CSV
//! exporter relies on (header row = keys of the first record).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a remote collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON value.
    ///
    /// Non-object values produce an empty record; remote backends always
    /// return objects for rows, so this only guards malformed payloads.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    /// Builder-style field setter.
    ///
    /// # Example
    /// ```
    /// use tablero::Record;
    /// use serde_json::json;
    ///
    /// let row = Record::new()
    ///     .with_field("id", json!(1))
    ///     .with_field("nombre", json!("Uni A"));
    /// assert_eq!(row.id(), Some("1".to_string()));
    /// ```
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// The record id, rendered as a string.
    ///
    /// Remote ids are opaque strings or UUIDs, but some backends hand back
    /// numeric ids; both render to the same string form.
    pub fn id(&self) -> Option<String> {
        match self.fields.get("id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a field as a string slice, if it is a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Display form of a field value for table cells.
    ///
    /// Strings render verbatim, scalars via their JSON form, null/missing
    /// as the empty string (column specs layer their own `empty_value` on
    /// top of this).
    pub fn display_value(&self, field: &str) -> String {
        match self.fields.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// All string-typed field values, lowercased, for substring search.
    pub fn search_text(&self) -> Vec<String> {
        self.fields
            .values()
            .filter_map(Value::as_str)
            .map(str::to_lowercase)
            .collect()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Record {
        Record::new()
            .with_field("id", json!(1))
            .with_field("nombre", json!("Uni A"))
            .with_field("tipo", json!("Universidad"))
            .with_field("activo", json!(true))
    }

    #[test]
    fn test_id_from_number_and_string() {
        assert_eq!(sample().id(), Some("1".to_string()));

        let row = Record::new().with_field("id", json!("a-b-c"));
        assert_eq!(row.id(), Some("a-b-c".to_string()));

        assert_eq!(Record::new().id(), None);
    }

    #[test]
    fn test_display_value() {
        let row = sample().with_field("vacio", json!(null));
        assert_eq!(row.display_value("nombre"), "Uni A");
        assert_eq!(row.display_value("activo"), "true");
        assert_eq!(row.display_value("vacio"), "");
        assert_eq!(row.display_value("missing"), "");
    }

    #[test]
    fn test_search_text_only_strings() {
        let text = sample().search_text();
        assert!(text.contains(&"uni a".to_string()));
        assert!(text.contains(&"universidad".to_string()));
        // booleans and numbers are not searched
        assert_eq!(text.len(), 2);
    }

    #[test]
    fn test_from_value_non_object() {
        assert!(Record::from_value(json!([1, 2])).is_empty());
    }

    #[test]
    fn test_key_order_preserved() {
        let record = sample();
        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, vec!["id", "nombre", "tipo", "activo"]);
    }
}
