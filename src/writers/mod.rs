//! Writer implementations
//!
//! A writer owns an ordered filter chain and a formatter, and delivers
//! accepted events to its sink.

pub mod memory;
pub mod noop;
pub mod stream;

pub use memory::{MemoryHandle, MemoryWriter};
pub use noop::NoopWriter;
pub use stream::{StreamWriter, StreamWriterConfig, DEFAULT_MODE};

use crate::core::{Event, LoggerError, Registry, Result};
use crate::filters::{Filter, PriorityFilter};
use crate::formatters::Formatter;
use serde_json::Value;

pub trait Writer: Send {
    fn name(&self) -> &str;

    /// Filters in evaluation order
    fn filters(&self) -> &[Box<dyn Filter>];

    fn add_filter(&mut self, filter: Box<dyn Filter>);

    fn set_formatter(&mut self, formatter: Box<dyn Formatter>);

    /// Deliver an accepted event to the sink
    fn do_write(&mut self, event: &Event) -> Result<()>;

    /// Run the filter chain and write the event if every filter accepts it.
    ///
    /// I/O faults from the sink surface as [`LoggerError::WriteFailed`].
    fn write(&mut self, event: &Event) -> Result<()> {
        if !self.filters().iter().all(|filter| filter.filter(event)) {
            return Ok(());
        }

        self.do_write(event).map_err(|err| match err {
            LoggerError::IoError(source) => LoggerError::WriteFailed { source },
            other => other,
        })
    }

    /// Release the sink. Calling this more than once is harmless.
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Apply the shared `filters` and `formatter` options to a writer.
///
/// `filters` takes an integer (priority threshold), a filter name, a
/// `{name, options}` object, or a list or map of those. `formatter` takes a
/// name or a `{name, options}` object.
pub fn configure_writer(writer: &mut dyn Writer, options: &Value, registry: &Registry) -> Result<()> {
    match options.get("filters") {
        None | Some(Value::Null) => {}
        Some(entry @ (Value::Number(_) | Value::String(_))) => {
            writer.add_filter(filter_from_entry(entry, registry)?);
        }
        Some(entry @ Value::Object(map)) if map.contains_key("name") => {
            writer.add_filter(filter_from_entry(entry, registry)?);
        }
        Some(Value::Object(map)) => {
            for entry in map.values() {
                writer.add_filter(filter_from_entry(entry, registry)?);
            }
        }
        Some(Value::Array(entries)) => {
            for entry in entries {
                writer.add_filter(filter_from_entry(entry, registry)?);
            }
        }
        Some(other) => {
            return Err(LoggerError::invalid_argument(format!(
                "Filters must be an integer, a name or a list of filters; received \"{}\"",
                crate::core::FieldValue::from(other.clone()).type_label()
            )))
        }
    }

    match options.get("formatter") {
        None | Some(Value::Null) => {}
        Some(Value::String(name)) => {
            writer.set_formatter(registry.formatter(name, &Value::Null)?);
        }
        Some(Value::Object(spec)) => {
            let name = spec.get("name").and_then(Value::as_str).ok_or_else(|| {
                LoggerError::invalid_argument("Options must contain a name for the formatter")
            })?;
            let options = spec.get("options").unwrap_or(&Value::Null);
            writer.set_formatter(registry.formatter(name, options)?);
        }
        Some(other) => {
            return Err(LoggerError::invalid_argument(format!(
                "Formatter must be a name or an object with a name; received \"{}\"",
                crate::core::FieldValue::from(other.clone()).type_label()
            )))
        }
    }

    Ok(())
}

fn filter_from_entry(entry: &Value, registry: &Registry) -> Result<Box<dyn Filter>> {
    match entry {
        Value::Number(n) => {
            let priority = n.as_i64().ok_or_else(|| {
                LoggerError::invalid_argument(format!("Filter priority must be an integer; received {}", n))
            })?;
            Ok(Box::new(PriorityFilter::new(priority)))
        }
        Value::String(name) => registry.filter(name, &Value::Null),
        Value::Object(spec) => {
            let name = spec.get("name").and_then(Value::as_str).ok_or_else(|| {
                LoggerError::invalid_argument("Options must contain a name for the filter")
            })?;
            registry.filter(name, spec.get("options").unwrap_or(&Value::Null))
        }
        other => Err(LoggerError::invalid_argument(format!(
            "Filter must be an integer, a name or an object with a name; received \"{}\"",
            crate::core::FieldValue::from(other.clone()).type_label()
        ))),
    }
}
