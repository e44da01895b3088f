//! Formatter implementations
//!
//! A formatter turns an event into either a finished line or a normalized
//! record that the writer renders itself.

pub mod base;
pub mod json;
pub mod simple;

pub use base::{Base, BaseConfig};
pub use json::{Json, JsonConfig};
pub use simple::{Simple, SimpleConfig, DEFAULT_FORMAT};

use crate::core::{Event, Extra, FieldValue, TimestampFormat};
use std::fmt;

/// Output of a formatter
#[derive(Debug, Clone, PartialEq)]
pub enum Formatted {
    /// A finished line
    Line(String),
    /// Normalized event data, keyed by event field name
    Record(Extra),
}

impl fmt::Display for Formatted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formatted::Line(line) => f.write_str(line),
            Formatted::Record(record) => {
                let value = FieldValue::Map(record.clone()).to_json_value(&|dt| dt.to_rfc3339());
                write!(f, "{}", value)
            }
        }
    }
}

pub trait Formatter: Send {
    fn format(&self, event: &Event) -> Formatted;

    /// Format used for the timestamp and any date-time values in event data
    fn date_time_format(&self) -> &TimestampFormat;

    fn set_date_time_format(&mut self, format: TimestampFormat);
}
