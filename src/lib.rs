//! # Rust Log Pipeline
//!
//! A structured logging library. Each log call becomes an [`Event`] that
//! flows through priority-ordered processors and then to every writer;
//! each writer applies its own filter chain and formatter.
//!
//! ## Features
//!
//! - **Structured events**: priority, message and an ordered `extra` mapping
//! - **Processors**: request/reference ids, call-site origin, `{key}` interpolation
//! - **Writers**: streams (files, stdout/stderr, open handles), noop, in-memory
//! - **Formatters**: normalized records, JSON lines, templated text
//! - **Configuration**: components created by name from JSON-style options
//! - **Process hooks**: host errors, panics and fatal-shutdown reporting
//!
//! ```
//! use rust_log_pipeline::prelude::*;
//!
//! let handle = MemoryHandle::new();
//! let logger = Logger::builder()
//!     .writer(MemoryWriter::new(handle.clone()))
//!     .build();
//!
//! logger.warn_with("quota at {pct}%", Extra::new().with_field("pct", 91)).unwrap();
//! assert_eq!(handle.events()[0].priority_name, "WARN");
//! ```

pub mod core;
pub mod filters;
pub mod formatters;
pub mod macros;
pub mod processors;
pub mod writers;

pub mod prelude {
    pub use crate::core::{
        CallSite, ComponentSpec, Event, Extra, FieldValue, HookRegistration, HostSeverity, Logger,
        LoggerBuilder, LoggerConfig, LoggerError, PriorityList, Registry, Result, Severity,
        TimestampFormat,
    };
    pub use crate::filters::{Filter, PriorityFilter, RegexFilter, SuppressFilter, Validator, ValidatorFilter};
    pub use crate::formatters::{Base, Formatted, Formatter, Json, Simple};
    pub use crate::processors::{Backtrace, Processor, PsrPlaceholder, ReferenceId, RequestId};
    pub use crate::writers::{MemoryHandle, MemoryWriter, NoopWriter, StreamWriter, Writer};
}

pub use crate::core::{
    CallSite, Event, Extra, FieldValue, Logger, LoggerBuilder, LoggerConfig, LoggerError, Registry,
    Result, Severity, TimestampFormat,
};
