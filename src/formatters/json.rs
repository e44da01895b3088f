//! One JSON object per event

use super::{Formatted, Formatter};
use crate::core::{Event, FieldValue, LoggerError, Result, TimestampFormat};
use serde::Deserialize;
use serde_json::{Map, Number, Value};

/// Options accepted by [`Json`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonConfig {
    #[serde(default, rename = "dateTimeFormat")]
    pub date_time_format: Option<String>,
}

/// Serializes the whole event as a single JSON object.
///
/// Slashes and non-ASCII text are written unescaped, numeric strings are
/// emitted as numbers and floats keep a zero fraction (`2.0`).
///
/// `extra` is always a JSON object: an empty extra is written as `{}`, never
/// `[]`, and an extra given as a list is keyed by position (`{"0":...}`).
#[derive(Debug, Clone, Default)]
pub struct Json {
    date_time_format: TimestampFormat,
}

impl Json {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: JsonConfig) -> Self {
        Self {
            date_time_format: config
                .date_time_format
                .map(TimestampFormat::from)
                .unwrap_or_default(),
        }
    }

    pub fn from_options(options: &Value) -> Result<Self> {
        if options.is_null() {
            return Ok(Self::new());
        }
        let config = JsonConfig::deserialize(options)
            .map_err(|e| LoggerError::invalid_options("json formatter", e))?;
        Ok(Self::from_config(config))
    }

    /// The event as a JSON value, before numeric coercion
    pub fn to_value(&self, event: &Event) -> Value {
        let render = |dt: &chrono::DateTime<chrono::Utc>| self.date_time_format.format(dt);

        let mut object = Map::new();
        object.insert(
            "timestamp".to_string(),
            Value::String(self.date_time_format.format(&event.timestamp)),
        );
        object.insert("priority".to_string(), Value::from(event.priority));
        object.insert(
            "priorityName".to_string(),
            Value::String(event.priority_name.clone()),
        );
        object.insert("message".to_string(), Value::String(event.message.clone()));
        object.insert(
            "extra".to_string(),
            FieldValue::Map(event.extra.clone()).to_json_value(&render),
        );
        Value::Object(object)
    }
}

/// Replace strings that read as numbers with the number itself
fn coerce_numeric(value: Value) -> Value {
    match value {
        Value::String(s) => match parse_numeric(&s) {
            Some(number) => Value::Number(number),
            None => Value::String(s),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(coerce_numeric).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, coerce_numeric(value)))
                .collect(),
        ),
        other => other,
    }
}

fn parse_numeric(s: &str) -> Option<Number> {
    let trimmed = s.trim();
    if trimmed.is_empty()
        || !trimmed
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
        || !trimmed.bytes().any(|b| b.is_ascii_digit())
    {
        return None;
    }

    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Number::from(int));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}

impl Formatter for Json {
    fn format(&self, event: &Event) -> Formatted {
        let value = coerce_numeric(self.to_value(event));
        Formatted::Line(value.to_string())
    }

    fn date_time_format(&self) -> &TimestampFormat {
        &self.date_time_format
    }

    fn set_date_time_format(&mut self, format: TimestampFormat) {
        self.date_time_format = format;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Extra, Severity};
    use chrono::TimeZone;

    fn fixed_event() -> Event {
        let mut event = Event::new(Severity::Info, "path /tmp/é");
        event.timestamp = chrono::Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
        event
    }

    #[test]
    fn test_full_event_line() {
        let line = Json::new().format(&fixed_event());
        assert_eq!(
            line.to_string(),
            r#"{"timestamp":"2025-01-08T10:30:45+00:00","priority":6,"priorityName":"INFO","message":"path /tmp/é","extra":{}}"#
        );
    }

    #[test]
    fn test_list_extra_is_keyed_by_position() {
        let extra = FieldValue::List(vec![FieldValue::from("a"), FieldValue::from("b")]);
        let mut event = Event::from_parts(6, "m".into(), extra).unwrap();
        event.timestamp = fixed_event().timestamp;

        let line = Json::new().format(&event).to_string();
        assert!(line.ends_with(r#""extra":{"0":"a","1":"b"}}"#));
    }

    #[test]
    fn test_numeric_strings_become_numbers() {
        let event = fixed_event().with_extra(
            Extra::new()
                .with_field("count", "42")
                .with_field("ratio", " 1.5")
                .with_field("ratio_whole", 2.0)
                .with_field("version", "1.2.3")
                .with_field("name", "e"),
        );
        let value: Value = serde_json::from_str(&Json::new().format(&event).to_string()).unwrap();

        assert_eq!(value["extra"]["count"], Value::from(42));
        assert_eq!(value["extra"]["ratio"], Value::from(1.5));
        assert_eq!(value["extra"]["version"], Value::from("1.2.3"));
        assert_eq!(value["extra"]["name"], Value::from("e"));
        assert!(Json::new().format(&event).to_string().contains(r#""ratio_whole":2.0"#));
    }

    #[test]
    fn test_custom_timestamp_format() {
        let json = Json::from_options(&serde_json::json!({"dateTimeFormat": "%Y"})).unwrap();
        let value: Value = serde_json::from_str(&json.format(&fixed_event()).to_string()).unwrap();
        assert_eq!(value["timestamp"], Value::from(2025));
    }

    #[test]
    fn test_numeric_check() {
        assert_eq!(parse_numeric("10"), Some(Number::from(10)));
        assert_eq!(parse_numeric("-3"), Some(Number::from(-3)));
        assert!(parse_numeric("1e3").is_some());
        assert_eq!(parse_numeric("."), None);
        assert_eq!(parse_numeric("12abc"), None);
        assert_eq!(parse_numeric(""), None);
    }
}
