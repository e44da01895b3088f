//! Normalizing formatter
//!
//! Produces a record with every top-level value reduced to a scalar or
//! string. `extra` keeps its mapping shape with its values normalized.

use super::{Formatted, Formatter};
use crate::core::{Event, Extra, FieldValue, LoggerError, Result, TimestampFormat};
use serde::Deserialize;

/// Options accepted by [`Base`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaseConfig {
    #[serde(default, rename = "dateTimeFormat")]
    pub date_time_format: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Base {
    date_time_format: TimestampFormat,
}

impl Base {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: BaseConfig) -> Self {
        Self {
            date_time_format: config
                .date_time_format
                .map(TimestampFormat::from)
                .unwrap_or_default(),
        }
    }

    pub fn from_options(options: &serde_json::Value) -> Result<Self> {
        if options.is_null() {
            return Ok(Self::new());
        }
        let config = BaseConfig::deserialize(options)
            .map_err(|e| LoggerError::invalid_options("base formatter", e))?;
        Ok(Self::from_config(config))
    }

    /// Reduce a value to a scalar, null or string
    pub fn normalize(&self, value: &FieldValue) -> FieldValue {
        normalize_value(value, &self.date_time_format)
    }

    /// Event fields as a record, before normalization
    pub(crate) fn event_record(event: &Event) -> Extra {
        Extra::new()
            .with_field("timestamp", event.timestamp)
            .with_field("priority", event.priority)
            .with_field("priorityName", event.priority_name.as_str())
            .with_field("message", event.message.as_str())
            .with_field("extra", event.extra.clone())
    }

    /// Normalize each value of a record, keeping a nested `extra` mapping
    pub(crate) fn normalize_record(&self, record: &Extra) -> Extra {
        record
            .iter()
            .map(|(key, value)| match value {
                FieldValue::Map(inner) if key == "extra" => {
                    (key.clone(), FieldValue::Map(self.normalize_record(inner)))
                }
                other => (key.clone(), self.normalize(other)),
            })
            .collect()
    }
}

pub(crate) fn normalize_value(value: &FieldValue, format: &TimestampFormat) -> FieldValue {
    match value {
        v if v.is_scalar_or_null() => v.clone(),
        FieldValue::DateTime(dt) => FieldValue::String(format.format(dt)),
        FieldValue::List(_) | FieldValue::Map(_) => {
            FieldValue::String(value.to_json_value(&|dt| format.format(dt)).to_string())
        }
        FieldValue::Object {
            display: Some(display),
            ..
        } => FieldValue::String(display.clone()),
        FieldValue::Object {
            type_name, state, ..
        } => FieldValue::String(format!("object({}) {}", type_name, state)),
        FieldValue::Resource(kind) => FieldValue::String(format!("resource({})", kind)),
        other => FieldValue::String(other.type_label().to_string()),
    }
}

impl Formatter for Base {
    fn format(&self, event: &Event) -> Formatted {
        Formatted::Record(self.normalize_record(&Self::event_record(event)))
    }

    fn date_time_format(&self) -> &TimestampFormat {
        &self.date_time_format
    }

    fn set_date_time_format(&mut self, format: TimestampFormat) {
        self.date_time_format = format;
    }
}
