//! Main logger implementation

use super::{
    error::{LoggerError, Result},
    event::{CallSite, Event},
    field_value::{Extra, FieldValue},
    priority_list::{PriorityList, DEFAULT_PIPELINE_PRIORITY},
    registry::Registry,
    severity::Severity,
};
use crate::processors::Processor;
use crate::writers::Writer;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::panic::Location;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// How long a hook waits for the pipeline before giving up on an event.
///
/// Hooks can fire while the same thread is already dispatching (a panic
/// inside a writer), so they never block indefinitely on the locks.
pub const HOOK_LOCK_TIMEOUT: Duration = Duration::from_millis(100);

pub(crate) fn default_registry() -> Arc<Registry> {
    static DEFAULT: OnceLock<Arc<Registry>> = OnceLock::new();
    Arc::clone(DEFAULT.get_or_init(|| Arc::new(Registry::new())))
}

/// Dispatches events through processors and writers.
///
/// Processors run in pipeline-priority order (higher first), then every
/// writer receives the processed event in the same order. A writer fault
/// aborts the remaining writers and is returned to the caller.
///
/// # Example
///
/// ```
/// use rust_log_pipeline::prelude::*;
///
/// let handle = MemoryHandle::new();
/// let logger = Logger::builder()
///     .writer(MemoryWriter::new(handle.clone()))
///     .processor(PsrPlaceholder::new())
///     .build();
///
/// logger
///     .info_with("user {user} signed in", Extra::new().with_field("user", "ada"))
///     .unwrap();
/// assert_eq!(handle.events()[0].message, "user ada signed in");
/// ```
pub struct Logger {
    writers: Mutex<PriorityList<Box<dyn Writer>>>,
    processors: RwLock<PriorityList<Box<dyn Processor>>>,
    registry: Arc<Registry>,
}

impl Logger {
    /// A logger with no writers, resolving names through the built-in registry
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }

    #[must_use]
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        Self {
            writers: Mutex::new(PriorityList::new()),
            processors: RwLock::new(PriorityList::new()),
            registry,
        }
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn add_writer(&self, writer: Box<dyn Writer>, priority: i32) -> &Self {
        self.writers.lock().insert(writer, priority);
        self
    }

    /// Create a writer through the registry and add it
    pub fn add_writer_by_name(&self, name: &str, priority: i32, options: &Value) -> Result<&Self> {
        let writer = self.writer_plugin(name, options)?;
        Ok(self.add_writer(writer, priority))
    }

    /// Replace the whole writer list
    pub fn set_writers(&self, writers: PriorityList<Box<dyn Writer>>) -> &Self {
        *self.writers.lock() = writers;
        self
    }

    pub fn writer_plugin(&self, name: &str, options: &Value) -> Result<Box<dyn Writer>> {
        self.registry.writer(name, options)
    }

    pub fn add_processor(&self, processor: Box<dyn Processor>, priority: i32) -> &Self {
        self.processors.write().insert(processor, priority);
        self
    }

    /// Create a processor through the registry and add it
    pub fn add_processor_by_name(&self, name: &str, priority: i32, options: &Value) -> Result<&Self> {
        let processor = self.processor_plugin(name, options)?;
        Ok(self.add_processor(processor, priority))
    }

    pub fn processor_plugin(&self, name: &str, options: &Value) -> Result<Box<dyn Processor>> {
        self.registry.processor(name, options)
    }

    /// Writer names in dispatch order
    pub fn writer_names(&self) -> Vec<String> {
        self.writers.lock().iter().map(|w| w.name().to_string()).collect()
    }

    /// Processor names in dispatch order
    pub fn processor_names(&self) -> Vec<String> {
        self.processors.read().iter().map(|p| p.name().to_string()).collect()
    }

    pub fn writer_count(&self) -> usize {
        self.writers.lock().len()
    }

    pub fn processor_count(&self) -> usize {
        self.processors.read().len()
    }

    /// Log a message with a numeric priority (0 = EMERG .. 7 = DEBUG).
    ///
    /// `extra` must be null, a mapping or a list. Fails with
    /// `InvalidArgument` on bad input, with `Runtime` when no writer is
    /// attached, and with the first writer fault otherwise.
    #[track_caller]
    pub fn log(
        &self,
        priority: i64,
        message: impl Into<FieldValue>,
        extra: impl Into<FieldValue>,
    ) -> Result<&Self> {
        let call_site = CallSite::from(Location::caller());
        let event = Event::from_parts(priority, message.into(), extra.into())?.with_call_site(call_site);
        self.dispatch(event, None)?;
        Ok(self)
    }

    /// Log from a process-wide hook: the event is already validated and the
    /// pipeline locks are only waited on for [`HOOK_LOCK_TIMEOUT`]
    pub(crate) fn log_from_hook(
        &self,
        severity: Severity,
        message: impl Into<String>,
        extra: Extra,
        call_site: Option<CallSite>,
    ) -> Result<()> {
        let mut event = Event::new(severity, message).with_extra(extra);
        event.call_site = call_site;
        self.dispatch(event, Some(HOOK_LOCK_TIMEOUT))
    }

    fn dispatch(&self, event: Event, wait: Option<Duration>) -> Result<()> {
        let busy = || LoggerError::runtime("Logger is busy; event dropped");

        let mut writers = match wait {
            None => self.writers.lock(),
            Some(timeout) => self.writers.try_lock_for(timeout).ok_or_else(busy)?,
        };
        if writers.is_empty() {
            return Err(LoggerError::runtime("No log writer specified"));
        }

        let event = {
            let processors = match wait {
                None => self.processors.read(),
                Some(timeout) => self.processors.try_read_for(timeout).ok_or_else(busy)?,
            };
            processors
                .iter()
                .fold(event, |event, processor| processor.process(event))
        };

        for writer in writers.iter_mut() {
            writer.write(&event)?;
        }
        Ok(())
    }

    #[track_caller]
    pub fn emerg(&self, message: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Emerg.code(), message, Extra::new())
    }

    #[track_caller]
    pub fn alert(&self, message: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Alert.code(), message, Extra::new())
    }

    #[track_caller]
    pub fn crit(&self, message: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Crit.code(), message, Extra::new())
    }

    #[track_caller]
    pub fn err(&self, message: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Error.code(), message, Extra::new())
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Warn.code(), message, Extra::new())
    }

    #[track_caller]
    pub fn notice(&self, message: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Notice.code(), message, Extra::new())
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Info.code(), message, Extra::new())
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Debug.code(), message, Extra::new())
    }

    #[track_caller]
    pub fn emerg_with(&self, message: impl Into<FieldValue>, extra: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Emerg.code(), message, extra)
    }

    #[track_caller]
    pub fn alert_with(&self, message: impl Into<FieldValue>, extra: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Alert.code(), message, extra)
    }

    #[track_caller]
    pub fn crit_with(&self, message: impl Into<FieldValue>, extra: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Crit.code(), message, extra)
    }

    #[track_caller]
    pub fn err_with(&self, message: impl Into<FieldValue>, extra: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Error.code(), message, extra)
    }

    #[track_caller]
    pub fn warn_with(&self, message: impl Into<FieldValue>, extra: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Warn.code(), message, extra)
    }

    #[track_caller]
    pub fn notice_with(&self, message: impl Into<FieldValue>, extra: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Notice.code(), message, extra)
    }

    #[track_caller]
    pub fn info_with(&self, message: impl Into<FieldValue>, extra: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Info.code(), message, extra)
    }

    #[track_caller]
    pub fn debug_with(&self, message: impl Into<FieldValue>, extra: impl Into<FieldValue>) -> Result<&Self> {
        self.log(Severity::Debug.code(), message, extra)
    }

    /// Shut down every writer. Failures are reported on stderr and skipped.
    pub fn shutdown(&self) {
        let mut writers = self.writers.lock();
        for writer in writers.iter_mut() {
            if let Err(e) = writer.shutdown() {
                eprintln!(
                    "[LOGGER WARNING] Writer \"{}\" failed to shut down: {}",
                    writer.name(),
                    e
                );
            }
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_log_pipeline::prelude::*;
///
/// let logger = Logger::builder()
///     .writer(NoopWriter::new())
///     .writer_with_priority(MemoryWriter::new(MemoryHandle::new()), 10)
///     .processor(RequestId::new())
///     .build();
///
/// assert_eq!(logger.writer_names(), vec!["memory", "noop"]);
/// ```
pub struct LoggerBuilder {
    writers: PriorityList<Box<dyn Writer>>,
    processors: PriorityList<Box<dyn Processor>>,
    registry: Option<Arc<Registry>>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            writers: PriorityList::new(),
            processors: PriorityList::new(),
            registry: None,
        }
    }

    /// Add a writer at the default pipeline priority
    #[must_use = "builder methods return a new value"]
    pub fn writer<W: Writer + 'static>(self, writer: W) -> Self {
        self.writer_with_priority(writer, DEFAULT_PIPELINE_PRIORITY)
    }

    #[must_use = "builder methods return a new value"]
    pub fn writer_with_priority<W: Writer + 'static>(mut self, writer: W, priority: i32) -> Self {
        self.writers.insert(Box::new(writer), priority);
        self
    }

    /// Add a processor at the default pipeline priority
    #[must_use = "builder methods return a new value"]
    pub fn processor<P: Processor + 'static>(self, processor: P) -> Self {
        self.processor_with_priority(processor, DEFAULT_PIPELINE_PRIORITY)
    }

    #[must_use = "builder methods return a new value"]
    pub fn processor_with_priority<P: Processor + 'static>(mut self, processor: P, priority: i32) -> Self {
        self.processors.insert(Box::new(processor), priority);
        self
    }

    /// Registry used for name-based writer and processor creation
    #[must_use = "builder methods return a new value"]
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            writers: Mutex::new(self.writers),
            processors: RwLock::new(self.processors),
            registry: self.registry.unwrap_or_else(default_registry),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
