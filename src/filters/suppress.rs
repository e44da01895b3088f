//! Static accept/reject switch

use super::Filter;
use crate::core::{Event, LoggerError, Result};
use serde::Deserialize;

/// Options accepted by [`SuppressFilter`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuppressFilterConfig {
    #[serde(default)]
    pub suppress: bool,
}

/// Accepts every event until `suppress(true)` is called
#[derive(Debug, Clone)]
pub struct SuppressFilter {
    accept: bool,
}

impl SuppressFilter {
    pub fn new() -> Self {
        Self { accept: true }
    }

    pub fn from_config(config: SuppressFilterConfig) -> Self {
        let mut filter = Self::new();
        filter.suppress(config.suppress);
        filter
    }

    /// Build from an options payload; `null` means the defaults and a bare
    /// boolean is the `suppress` flag itself
    pub fn from_options(options: &serde_json::Value) -> Result<Self> {
        match options {
            serde_json::Value::Null => return Ok(Self::new()),
            serde_json::Value::Bool(suppress) => {
                return Ok(Self::from_config(SuppressFilterConfig {
                    suppress: *suppress,
                }))
            }
            _ => {}
        }
        let config = SuppressFilterConfig::deserialize(options).map_err(|_| {
            LoggerError::invalid_argument(format!(
                "Suppress must be a boolean; received \"{}\"",
                options
                    .get("suppress")
                    .map(|v| crate::core::FieldValue::from(v.clone()).type_label())
                    .unwrap_or("array")
            ))
        })?;
        Ok(Self::from_config(config))
    }

    /// `true` blocks all events, `false` accepts all events
    pub fn suppress(&mut self, suppress: bool) {
        self.accept = !suppress;
    }
}

impl Default for SuppressFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for SuppressFilter {
    fn filter(&self, _event: &Event) -> bool {
        self.accept
    }
}
