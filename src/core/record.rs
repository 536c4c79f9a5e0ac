//! Purpose: Field-keyed text record shared by both store variants.
//! Exports: `Record`, `parse_assignment`.
//! Role: Value type passed between the shell/CLI and the stores.
//! Invariants: Field order is insertion order and carries display meaning only.
//! Invariants: Equality ignores field order.
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, Default)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Sets `field`, keeping its original position when it already exists.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Fields whose value is empty after trimming.
    pub fn empty_fields(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (name, value) in self.iter() {
            map.insert(name.to_string(), Value::String(value.to_string()));
        }
        Value::Object(map)
    }

    /// Builds a record from a JSON object, coercing scalars to text.
    pub fn from_json_object(map: &Map<String, Value>) -> Result<Self, Error> {
        let mut record = Record::new();
        for (name, value) in map {
            let text = match value {
                Value::String(text) => text.clone(),
                Value::Null => String::new(),
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(Error::new(ErrorKind::Format)
                        .with_message(format!("field '{name}' holds a nested value"))
                        .with_hint("Record values must be strings, numbers, booleans, or null."));
                }
            };
            record.insert(name.clone(), text);
        }
        Ok(record)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(name, value)| other.get(name) == Some(value))
    }
}

impl Eq for Record {}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

/// Splits a `field=value` argument. The value may be empty or contain `=`.
pub fn parse_assignment(input: &str) -> Result<(String, String), Error> {
    let Some((field, value)) = input.split_once('=') else {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("expected field=value, got '{input}'"))
            .with_hint("Pass fields as name=value, for example: name=Ana age=30."));
    };
    let field = field.trim();
    if field.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("missing field name in '{input}'")));
    }
    Ok((field.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{Record, parse_assignment};
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn insert_keeps_position_of_existing_field() {
        let mut record = Record::new().with("name", "Ana").with("age", "30");
        record.insert("name", "Eva");
        assert_eq!(record.keys().collect::<Vec<_>>(), ["name", "age"]);
        assert_eq!(record.get("name"), Some("Eva"));
    }

    #[test]
    fn equality_ignores_field_order() {
        let a = Record::new().with("x", "1").with("y", "2");
        let b = Record::new().with("y", "2").with("x", "1");
        assert_eq!(a, b);
        assert_ne!(a, Record::new().with("x", "1"));
    }

    #[test]
    fn json_scalars_are_coerced_to_text() {
        let value = json!({"name": "Ana", "age": 30, "active": true, "note": null});
        let record = Record::from_json_object(value.as_object().unwrap()).unwrap();
        assert_eq!(record.get("age"), Some("30"));
        assert_eq!(record.get("active"), Some("true"));
        assert_eq!(record.get("note"), Some(""));
    }

    #[test]
    fn nested_json_values_are_rejected() {
        let value = json!({"tags": ["a"]});
        let err = Record::from_json_object(value.as_object().unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn serializes_in_field_order() {
        let record = Record::new().with("b", "2").with("a", "1");
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"b":"2","a":"1"}"#);
    }

    #[test]
    fn assignment_parsing() {
        assert_eq!(
            parse_assignment("url=a=b").unwrap(),
            ("url".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment("note=").unwrap(),
            ("note".to_string(), String::new())
        );
        assert_eq!(parse_assignment("novalue").unwrap_err().kind(), ErrorKind::Usage);
        assert_eq!(parse_assignment("=x").unwrap_err().kind(), ErrorKind::Usage);
    }
}
