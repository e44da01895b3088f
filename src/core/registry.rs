//! Named-component resolution
//!
//! Writers, processors, filters and formatters can be created from a
//! symbolic name plus an options payload. Each kind has its own
//! [`PluginManager`]: an alias table and a factory table. Lookup is
//! case-insensitive.

use super::error::{LoggerError, Result};
use crate::filters::{self, Filter, Validator};
use crate::formatters::{self, Formatter};
use crate::processors::{self, Processor};
use crate::writers::{self, Writer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Component kinds served by a [`Registry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    Writer,
    Processor,
    Filter,
    Formatter,
}

impl PluginKind {
    pub fn to_str(&self) -> &'static str {
        match self {
            PluginKind::Writer => "writer",
            PluginKind::Processor => "processor",
            PluginKind::Filter => "filter",
            PluginKind::Formatter => "formatter",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// A component produced by a factory
pub enum Plugin {
    Writer(Box<dyn Writer>),
    Processor(Box<dyn Processor>),
    Filter(Box<dyn Filter>),
    Formatter(Box<dyn Formatter>),
}

impl Plugin {
    pub fn kind(&self) -> PluginKind {
        match self {
            Plugin::Writer(_) => PluginKind::Writer,
            Plugin::Processor(_) => PluginKind::Processor,
            Plugin::Filter(_) => PluginKind::Filter,
            Plugin::Formatter(_) => PluginKind::Formatter,
        }
    }
}

/// Builds a component from its options payload
pub type Factory = Arc<dyn Fn(&Registry, &Value) -> Result<Plugin> + Send + Sync>;

/// Alias and factory tables for one component kind
pub struct PluginManager {
    kind: PluginKind,
    aliases: HashMap<String, String>,
    factories: HashMap<String, Factory>,
}

impl PluginManager {
    pub fn new(kind: PluginKind) -> Self {
        Self {
            kind,
            aliases: HashMap::new(),
            factories: HashMap::new(),
        }
    }

    pub fn kind(&self) -> PluginKind {
        self.kind
    }

    /// Register a factory under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Registry, &Value) -> Result<Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_lowercase(), Arc::new(factory));
    }

    /// Make `alias` resolve to the factory registered as `target`
    pub fn alias(&mut self, alias: &str, target: &str) {
        self.aliases.insert(alias.to_lowercase(), target.to_lowercase());
    }

    fn canonical(&self, name: &str) -> String {
        let name = name.to_lowercase();
        self.aliases.get(&name).cloned().unwrap_or(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.factories.contains_key(&self.canonical(name))
    }

    /// Registered factory names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Run the factory for `name` and check the component kind
    pub fn create(&self, registry: &Registry, name: &str, options: &Value) -> Result<Plugin> {
        let factory = self
            .factories
            .get(&self.canonical(name))
            .ok_or_else(|| LoggerError::not_found(self.kind.to_str(), name))?;

        let plugin = factory(registry, options)?;
        if plugin.kind() != self.kind {
            return Err(LoggerError::invalid_service(
                self.kind.to_str(),
                name,
                format!("the factory produced a {}, not a {}", plugin.kind(), self.kind),
            ));
        }
        Ok(plugin)
    }
}

/// The four plugin managers plus the named validators used by the
/// validator filter.
///
/// `Registry::default()` comes with the built-in components registered.
pub struct Registry {
    writers: PluginManager,
    processors: PluginManager,
    filters: PluginManager,
    formatters: PluginManager,
    validators: HashMap<String, Arc<dyn Validator>>,
}

impl Registry {
    /// A registry with no components at all
    pub fn empty() -> Self {
        Self {
            writers: PluginManager::new(PluginKind::Writer),
            processors: PluginManager::new(PluginKind::Processor),
            filters: PluginManager::new(PluginKind::Filter),
            formatters: PluginManager::new(PluginKind::Formatter),
            validators: HashMap::new(),
        }
    }

    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        self.writers.register("noop", |registry, options| {
            Ok(Plugin::Writer(Box::new(writers::NoopWriter::from_options(options, registry)?)))
        });
        self.writers.alias("null", "noop");
        self.writers.register("stream", |registry, options| {
            Ok(Plugin::Writer(Box::new(writers::StreamWriter::from_options(options, registry)?)))
        });

        self.processors.register("backtrace", |_, options| {
            Ok(Plugin::Processor(Box::new(processors::Backtrace::from_options(options)?)))
        });
        self.processors.register("psrplaceholder", |_, _| {
            Ok(Plugin::Processor(Box::new(processors::PsrPlaceholder::new())))
        });
        self.processors.register("referenceid", |_, _| {
            Ok(Plugin::Processor(Box::new(processors::ReferenceId::new())))
        });
        self.processors.register("requestid", |_, _| {
            Ok(Plugin::Processor(Box::new(processors::RequestId::new())))
        });

        self.filters.register("priority", |_, options| {
            Ok(Plugin::Filter(Box::new(filters::PriorityFilter::from_options(options)?)))
        });
        self.filters.register("regex", |_, options| {
            Ok(Plugin::Filter(Box::new(filters::RegexFilter::from_options(options)?)))
        });
        self.filters.register("suppress", |_, options| {
            Ok(Plugin::Filter(Box::new(filters::SuppressFilter::from_options(options)?)))
        });
        self.filters.alias("suppressfilter", "suppress");
        self.filters.register("validator", |registry, options| {
            Ok(Plugin::Filter(Box::new(filters::ValidatorFilter::from_options(
                options,
                &registry.validators,
            )?)))
        });

        self.formatters.register("simple", |_, options| {
            Ok(Plugin::Formatter(Box::new(formatters::Simple::from_options(options)?)))
        });
        self.formatters.register("base", |_, options| {
            Ok(Plugin::Formatter(Box::new(formatters::Base::from_options(options)?)))
        });
        self.formatters.register("json", |_, options| {
            Ok(Plugin::Formatter(Box::new(formatters::Json::from_options(options)?)))
        });
    }

    pub fn writers(&self) -> &PluginManager {
        &self.writers
    }

    pub fn writers_mut(&mut self) -> &mut PluginManager {
        &mut self.writers
    }

    pub fn processors(&self) -> &PluginManager {
        &self.processors
    }

    pub fn processors_mut(&mut self) -> &mut PluginManager {
        &mut self.processors
    }

    pub fn filters(&self) -> &PluginManager {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut PluginManager {
        &mut self.filters
    }

    pub fn formatters(&self) -> &PluginManager {
        &self.formatters
    }

    pub fn formatters_mut(&mut self) -> &mut PluginManager {
        &mut self.formatters
    }

    /// Make a validator available to `validator` filters under `name`
    pub fn register_validator(&mut self, name: impl Into<String>, validator: Arc<dyn Validator>) {
        self.validators.insert(name.into(), validator);
    }

    pub fn validator(&self, name: &str) -> Option<Arc<dyn Validator>> {
        self.validators.get(name).cloned()
    }

    pub fn writer(&self, name: &str, options: &Value) -> Result<Box<dyn Writer>> {
        match self.writers.create(self, name, options)? {
            Plugin::Writer(writer) => Ok(writer),
            other => Err(mismatch(PluginKind::Writer, name, &other)),
        }
    }

    pub fn processor(&self, name: &str, options: &Value) -> Result<Box<dyn Processor>> {
        match self.processors.create(self, name, options)? {
            Plugin::Processor(processor) => Ok(processor),
            other => Err(mismatch(PluginKind::Processor, name, &other)),
        }
    }

    pub fn filter(&self, name: &str, options: &Value) -> Result<Box<dyn Filter>> {
        match self.filters.create(self, name, options)? {
            Plugin::Filter(filter) => Ok(filter),
            other => Err(mismatch(PluginKind::Filter, name, &other)),
        }
    }

    pub fn formatter(&self, name: &str, options: &Value) -> Result<Box<dyn Formatter>> {
        match self.formatters.create(self, name, options)? {
            Plugin::Formatter(formatter) => Ok(formatter),
            other => Err(mismatch(PluginKind::Formatter, name, &other)),
        }
    }
}

fn mismatch(kind: PluginKind, name: &str, plugin: &Plugin) -> LoggerError {
    LoggerError::invalid_service(
        kind.to_str(),
        name,
        format!("the factory produced a {}, not a {}", plugin.kind(), kind),
    )
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Event, Severity};
    use serde_json::json;

    #[test]
    fn test_builtin_names() {
        let registry = Registry::default();
        assert_eq!(registry.writers().names(), vec!["noop", "stream"]);
        assert_eq!(
            registry.processors().names(),
            vec!["backtrace", "psrplaceholder", "referenceid", "requestid"]
        );
        assert_eq!(registry.filters().names(), vec!["priority", "regex", "suppress", "validator"]);
        assert_eq!(registry.formatters().names(), vec!["base", "json", "simple"]);
        assert!(Registry::empty().writers().names().is_empty());
    }

    #[test]
    fn test_aliases_and_case_insensitive_lookup() {
        let registry = Registry::default();
        assert_eq!(registry.writer("NULL", &Value::Null).unwrap().name(), "noop");
        assert_eq!(registry.processor("RequestId", &Value::Null).unwrap().name(), "requestid");

        let filter = registry.filter("SuppressFilter", &json!({"suppress": true})).unwrap();
        assert!(!filter.filter(&Event::new(Severity::Emerg, "m")));
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let err = Registry::default().writer("mock", &Value::Null).err().expect("unknown writer");
        assert_eq!(
            err.to_string(),
            "A plugin by the name \"mock\" was not found in the writer plugin manager"
        );
    }

    #[test]
    fn test_wrong_kind_is_invalid_service() {
        let mut registry = Registry::default();
        registry.writers_mut().register("sneaky", |_, _| {
            Ok(Plugin::Processor(Box::new(crate::processors::PsrPlaceholder::new())))
        });

        let err = registry.writer("sneaky", &Value::Null).err().expect("kind mismatch");
        assert!(matches!(err, LoggerError::InvalidService { .. }));
        assert!(err.to_string().contains("produced a processor"));
    }

    #[test]
    fn test_validator_filter_resolves_named_validator() {
        let mut registry = Registry::default();
        registry.register_validator("digits", Arc::new(|v: &str| v.chars().all(|c| c.is_ascii_digit())));

        let filter = registry.filter("validator", &json!({"validator": "digits"})).unwrap();
        assert!(filter.filter(&Event::new(Severity::Info, "42")));
        assert!(!filter.filter(&Event::new(Severity::Info, "forty-two")));

        let err = registry
            .filter("validator", &json!({"validator": 7}))
            .err()
            .expect("non-string validator");
        assert!(err.is_invalid_argument());
    }
}
