//! Event structure

use super::error::{LoggerError, Result};
use super::field_value::{Extra, FieldValue};
use super::severity::Severity;
use chrono::{DateTime, Utc};
use std::panic::Location;

/// Source location of the code that invoked the logger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl From<&Location<'_>> for CallSite {
    fn from(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
            column: location.column(),
        }
    }
}

/// The record flowing through processors and writers
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub priority: i64,
    pub priority_name: String,
    pub message: String,
    pub extra: Extra,
    pub call_site: Option<CallSite>,
}

impl Event {
    /// Build an event for a known severity
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            priority: severity.code(),
            priority_name: severity.to_str().to_string(),
            message: message.into(),
            extra: Extra::new(),
            call_site: None,
        }
    }

    /// Validate raw log-call arguments and build the event.
    ///
    /// Rejects priorities outside 0..=7, messages without a string
    /// conversion and `extra` values that are not mappings.
    pub fn from_parts(priority: i64, message: FieldValue, extra: FieldValue) -> Result<Self> {
        let severity = Severity::from_code(priority).ok_or_else(|| {
            LoggerError::invalid_argument(format!(
                "priority must be an integer >= 0 and < {}; received {}",
                Severity::ALL.len(),
                priority
            ))
        })?;

        let message = message_to_string(message)?;
        let extra = extra_to_map(extra)?;

        Ok(Self::new(severity, message).with_extra(extra))
    }

    #[must_use]
    pub fn with_extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }

    #[must_use]
    pub fn with_call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = Some(call_site);
        self
    }

    /// Test/filter helper: an event with an arbitrary priority code
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// The severity level, if the priority code is in range
    pub fn severity(&self) -> Option<Severity> {
        Severity::from_code(self.priority)
    }
}

fn message_to_string(message: FieldValue) -> Result<String> {
    match message {
        FieldValue::String(s) => Ok(s),
        FieldValue::List(_) | FieldValue::Map(_) => Ok(message.export()),
        FieldValue::DateTime(dt) => Ok(dt.to_rfc3339()),
        FieldValue::Resource(kind) => Ok(format!("resource({})", kind)),
        FieldValue::Object { display: None, .. } => Err(LoggerError::invalid_argument(
            "message must have a string conversion",
        )),
        other => Ok(other.to_scalar_string().unwrap_or_default()),
    }
}

fn extra_to_map(extra: FieldValue) -> Result<Extra> {
    match extra {
        FieldValue::Null => Ok(Extra::new()),
        FieldValue::Map(map) => Ok(map),
        FieldValue::List(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(idx, value)| (idx.to_string(), value))
            .collect()),
        other => Err(LoggerError::invalid_argument(format!(
            "extra must be a mapping or a list; received {}",
            other.type_label()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Opaque {
        secret: u8,
    }

    #[test]
    fn test_from_parts_sets_priority_name() {
        for severity in Severity::ALL {
            let event = Event::from_parts(severity.code(), "m".into(), FieldValue::Null)
                .expect("valid event");
            assert_eq!(event.priority, severity.code());
            assert_eq!(event.priority_name, severity.to_str());
            assert!(event.extra.is_empty());
        }
    }

    #[test]
    fn test_out_of_range_priority_is_rejected() {
        for priority in [-1, 8, 244] {
            let err = Event::from_parts(priority, "m".into(), FieldValue::Null).unwrap_err();
            assert!(err.is_invalid_argument());
            assert!(err.to_string().contains(">= 0 and < 8"));
        }
    }

    #[test]
    fn test_collection_message_uses_export_rendering() {
        let event = Event::from_parts(6, vec!["test"].into(), FieldValue::Null).unwrap();
        assert_eq!(event.message, "array (\n  0 => 'test',\n)");
    }

    #[test]
    fn test_object_message_requires_string_conversion() {
        let err = Event::from_parts(6, FieldValue::object(&Opaque { secret: 1 }), FieldValue::Null)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_extra_must_be_a_mapping() {
        let err = Event::from_parts(6, "m".into(), FieldValue::Int(3)).unwrap_err();
        assert!(err.is_invalid_argument());

        let event = Event::from_parts(6, "m".into(), vec!["a", "b"].into()).unwrap();
        assert_eq!(event.extra.keys().collect::<Vec<_>>(), vec!["0", "1"]);
    }
}
