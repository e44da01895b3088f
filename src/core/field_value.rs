//! Value model for event messages and `extra` data
//!
//! This module provides:
//! - `FieldValue`: any value a caller can attach to an event
//! - `Extra`: the insertion-ordered mapping carried as `event.extra`

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Value type for event data
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
    List(Vec<FieldValue>),
    Map(Extra),
    /// An arbitrary value: its type name, its serialized public state and,
    /// when the type has one, its string conversion
    Object {
        type_name: String,
        state: serde_json::Value,
        display: Option<String>,
    },
    /// An opaque handle such as an open stream
    Resource(String),
}

impl FieldValue {
    /// Capture a value that has no string conversion
    pub fn object<T: Serialize>(value: &T) -> Self {
        FieldValue::Object {
            type_name: std::any::type_name::<T>().to_string(),
            state: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
            display: None,
        }
    }

    /// Capture a value together with its `Display` rendering
    pub fn displayable<T: Serialize + fmt::Display>(value: &T) -> Self {
        FieldValue::Object {
            type_name: std::any::type_name::<T>().to_string(),
            state: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
            display: Some(value.to_string()),
        }
    }

    /// An opaque handle of the given kind
    pub fn resource(kind: impl Into<String>) -> Self {
        FieldValue::Resource(kind.into())
    }

    /// True for null and the scalar variants
    pub fn is_scalar_or_null(&self) -> bool {
        matches!(
            self,
            FieldValue::Null
                | FieldValue::Bool(_)
                | FieldValue::Int(_)
                | FieldValue::Float(_)
                | FieldValue::String(_)
        )
    }

    /// Generic type label (`array`, `object`, `resource`, ...)
    pub fn type_label(&self) -> &'static str {
        match self {
            FieldValue::Null => "NULL",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "double",
            FieldValue::String(_) => "string",
            FieldValue::List(_) | FieldValue::Map(_) => "array",
            FieldValue::DateTime(_) | FieldValue::Object { .. } => "object",
            FieldValue::Resource(_) => "resource",
        }
    }

    /// Name of the concrete type for object-like values
    pub fn object_type_name(&self) -> Option<&str> {
        match self {
            FieldValue::DateTime(_) => Some("DateTime"),
            FieldValue::Object { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    /// String conversion for values that have one.
    ///
    /// `true` renders as `1`, `false` and null as an empty string, and
    /// integral floats without a fractional part. Collections, date-times,
    /// resources and objects without a display rendering return `None`.
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            FieldValue::Null => Some(String::new()),
            FieldValue::Bool(true) => Some("1".to_string()),
            FieldValue::Bool(false) => Some(String::new()),
            FieldValue::Int(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::String(s) => Some(s.clone()),
            FieldValue::Object { display, .. } => display.clone(),
            _ => None,
        }
    }

    /// Export-style rendering used when a collection is logged as a message
    ///
    /// ```
    /// use rust_log_pipeline::FieldValue;
    ///
    /// let value = FieldValue::List(vec!["test".into()]);
    /// assert_eq!(value.export(), "array (\n  0 => 'test',\n)");
    /// ```
    pub fn export(&self) -> String {
        let mut out = String::new();
        self.export_into(&mut out, 0);
        out
    }

    fn export_into(&self, out: &mut String, indent: usize) {
        match self {
            FieldValue::Null | FieldValue::Resource(_) => out.push_str("NULL"),
            FieldValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            FieldValue::Int(i) => out.push_str(&i.to_string()),
            FieldValue::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 {
                    out.push_str(&format!("{:.1}", f));
                } else {
                    out.push_str(&f.to_string());
                }
            }
            FieldValue::String(s) => out.push_str(&quote_export(s)),
            FieldValue::DateTime(dt) => out.push_str(&quote_export(&dt.to_rfc3339())),
            FieldValue::Object { type_name, state, .. } => {
                out.push_str(&format!("object({}) {}", type_name, state));
            }
            FieldValue::List(items) => {
                let entries = items
                    .iter()
                    .enumerate()
                    .map(|(idx, value)| (idx.to_string(), value));
                export_array(out, indent, entries);
            }
            FieldValue::Map(map) => {
                let entries = map.iter().map(|(key, value)| (quote_export(key), value));
                export_array(out, indent, entries);
            }
        }
    }

    /// JSON view of this value; date-times render through `datetime`
    pub fn to_json_value(&self, datetime: &dyn Fn(&DateTime<Utc>) -> String) -> serde_json::Value {
        use serde_json::Value;
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::DateTime(dt) => Value::String(datetime(dt)),
            FieldValue::List(items) => {
                Value::Array(items.iter().map(|v| v.to_json_value(datetime)).collect())
            }
            FieldValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value(datetime)))
                    .collect(),
            ),
            FieldValue::Object { state, .. } => state.clone(),
            FieldValue::Resource(kind) => Value::String(format!("resource({})", kind)),
        }
    }
}

fn quote_export(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn export_array<'a>(
    out: &mut String,
    indent: usize,
    entries: impl Iterator<Item = (String, &'a FieldValue)>,
) {
    let pad = " ".repeat(indent);
    out.push_str("array (\n");
    for (key, value) in entries {
        out.push_str(&format!("{}  {} => ", pad, key));
        if matches!(value, FieldValue::List(_) | FieldValue::Map(_)) {
            out.push('\n');
            out.push_str(&format!("{}  ", pad));
            value.export_into(out, indent + 2);
        } else {
            value.export_into(out, indent + 2);
        }
        out.push_str(",\n");
    }
    out.push_str(&pad);
    out.push(')');
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(dt: DateTime<Utc>) -> Self {
        FieldValue::DateTime(dt)
    }
}

impl From<Extra> for FieldValue {
    fn from(map: Extra) -> Self {
        FieldValue::Map(map)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => FieldValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => FieldValue::Map(map.into_iter().collect()),
        }
    }
}

/// Insertion-ordered key/value mapping carried in `event.extra`
///
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extra {
    entries: Vec<(String, FieldValue)>,
}

impl Extra {
    /// Create a new empty mapping
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a field (builder version)
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.insert(key, value);
        self
    }

    /// Add or replace a field
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Merge `other` over `self`: keys of `other` win, new keys are appended
    pub fn merge(mut self, other: Extra) -> Self {
        for (key, value) in other {
            self.insert(key, value);
        }
        self
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Extra {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut extra = Extra::new();
        for (key, value) in iter {
            extra.insert(key, value);
        }
        extra
    }
}

impl IntoIterator for Extra {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
