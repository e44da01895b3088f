//! Logger configuration
//!
//! A [`LoggerConfig`] describes writers and processors by registry name, plus
//! which process-wide hooks the logger should be installed as.
//!
//! ```
//! use rust_log_pipeline::core::{Logger, LoggerConfig};
//! use serde_json::json;
//!
//! let config = LoggerConfig::from_value(json!({
//!     "writers": {
//!         "discard": { "name": "noop", "priority": 5 }
//!     },
//!     "processors": [
//!         { "name": "requestid" }
//!     ]
//! }))
//! .unwrap();
//!
//! let logger = Logger::from_config(config).unwrap();
//! assert_eq!(logger.writer_count(), 1);
//! ```

use super::error::{LoggerError, Result};
use super::hooks;
use super::logger::{default_registry, Logger};
use super::priority_list::DEFAULT_PIPELINE_PRIORITY;
use super::registry::Registry;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;

/// One writer or processor entry: registry name, pipeline priority and the
/// options handed to its factory
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComponentSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub options: Value,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    fn require_name(&self, kind: &str) -> Result<&str> {
        self.name.as_deref().ok_or_else(|| {
            LoggerError::invalid_argument(format!("Options must contain a name for the {}", kind))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoggerConfig {
    #[serde(default, deserialize_with = "list_or_map")]
    pub writers: Vec<ComponentSpec>,
    #[serde(default, deserialize_with = "list_or_map")]
    pub processors: Vec<ComponentSpec>,
    /// Install the logger as the panic hook
    #[serde(default)]
    pub exceptionhandler: bool,
    /// Install the logger as the host error handler
    #[serde(default)]
    pub errorhandler: bool,
    /// Install the logger as the fatal-shutdown handler
    #[serde(default)]
    pub fatal_error_shutdownfunction: bool,
}

/// Entries may be given as a list or as a map keyed by any label
fn list_or_map<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<ComponentSpec>, D::Error> {
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entries {
        List(Vec<ComponentSpec>),
        Map(serde_json::Map<String, Value>),
        Empty(()),
    }

    match Entries::deserialize(deserializer)? {
        Entries::List(entries) => Ok(entries),
        Entries::Map(map) => map
            .into_iter()
            .map(|(_, entry)| ComponentSpec::deserialize(entry).map_err(D::Error::custom))
            .collect(),
        Entries::Empty(()) => Ok(Vec::new()),
    }
}

impl LoggerConfig {
    pub fn from_value(value: Value) -> Result<Self> {
        LoggerConfig::deserialize(value).map_err(|e| LoggerError::invalid_options("logger", e))
    }
}

impl Logger {
    /// Build a logger from configuration using the built-in registry
    pub fn from_config(config: LoggerConfig) -> Result<Arc<Logger>> {
        Self::from_config_with_registry(config, default_registry())
    }

    /// Build a logger from configuration, resolving names through `registry`.
    ///
    /// Hooks named in the configuration are installed after every writer and
    /// processor has been created.
    pub fn from_config_with_registry(config: LoggerConfig, registry: Arc<Registry>) -> Result<Arc<Logger>> {
        let logger = Logger::with_registry(registry);

        for spec in &config.writers {
            let name = spec.require_name("writer")?;
            let priority = spec.priority.unwrap_or(DEFAULT_PIPELINE_PRIORITY);
            logger.add_writer_by_name(name, priority, &spec.options)?;
        }
        for spec in &config.processors {
            let name = spec.require_name("processor")?;
            let priority = spec.priority.unwrap_or(DEFAULT_PIPELINE_PRIORITY);
            logger.add_processor_by_name(name, priority, &spec.options)?;
        }

        let logger = Arc::new(logger);
        if config.exceptionhandler {
            hooks::register_exception_handler(Arc::clone(&logger));
        }
        if config.errorhandler {
            hooks::register_error_handler(Arc::clone(&logger), false);
        }
        if config.fatal_error_shutdownfunction {
            hooks::register_fatal_shutdown_handler(Arc::clone(&logger));
        }
        Ok(logger)
    }
}
