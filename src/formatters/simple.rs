//! Template line formatter

use super::base::Base;
use super::{Formatted, Formatter};
use crate::core::{Event, FieldValue, LoggerError, Result, TimestampFormat};
use serde::Deserialize;

pub const DEFAULT_FORMAT: &str = "%timestamp% %priorityName% (%priority%): %message% %extra%";

/// Options accepted by [`Simple`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimpleConfig {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, rename = "dateTimeFormat")]
    pub date_time_format: Option<String>,
}

/// Renders a template by replacing each `%field%` placeholder with the
/// normalized event field.
///
/// # Example
///
/// ```
/// use rust_log_pipeline::formatters::{Formatter, Simple};
/// use rust_log_pipeline::{Event, Severity};
///
/// let formatter = Simple::with_format("%priorityName%: %message% %extra%");
/// let line = formatter.format(&Event::new(Severity::Info, "started"));
/// assert_eq!(line.to_string(), "INFO: started");
/// ```
#[derive(Debug, Clone)]
pub struct Simple {
    format: String,
    base: Base,
}

impl Simple {
    pub fn new() -> Self {
        Self::with_format(DEFAULT_FORMAT)
    }

    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            base: Base::new(),
        }
    }

    pub fn from_config(config: SimpleConfig) -> Self {
        let mut simple = Self::with_format(config.format.unwrap_or_else(|| DEFAULT_FORMAT.to_string()));
        if let Some(date_time_format) = config.date_time_format {
            simple.set_date_time_format(TimestampFormat::from(date_time_format));
        }
        simple
    }

    pub fn from_options(options: &serde_json::Value) -> Result<Self> {
        if options.is_null() {
            return Ok(Self::new());
        }
        if options.get("format").is_some_and(|f| !f.is_string() && !f.is_null()) {
            return Err(LoggerError::invalid_argument("Format must be a string"));
        }
        let config = SimpleConfig::deserialize(options)
            .map_err(|e| LoggerError::invalid_options("simple formatter", e))?;
        Ok(Self::from_config(config))
    }

    pub fn template(&self) -> &str {
        &self.format
    }
}

impl Default for Simple {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for Simple {
    fn format(&self, event: &Event) -> Formatted {
        let record = self.base.normalize_record(&Base::event_record(event));
        let mut output = self.format.clone();

        for (name, value) in record.iter() {
            let rendered = match value {
                FieldValue::Map(extra) if name == "extra" && !extra.is_empty() => self
                    .base
                    .normalize(value)
                    .to_scalar_string()
                    .unwrap_or_default(),
                _ if name == "extra" => String::new(),
                other => other.to_scalar_string().unwrap_or_default(),
            };
            output = output.replace(&format!("%{}%", name), &rendered);
        }

        if event.extra.is_empty() && self.format.contains("%extra%") {
            output.truncate(output.trim_end_matches(' ').len());
        }

        Formatted::Line(output)
    }

    fn date_time_format(&self) -> &TimestampFormat {
        self.base.date_time_format()
    }

    fn set_date_time_format(&mut self, format: TimestampFormat) {
        self.base.set_date_time_format(format);
    }
}
