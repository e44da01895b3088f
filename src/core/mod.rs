//! Core logger types and traits

pub mod config;
pub mod error;
pub mod event;
pub mod field_value;
pub mod hooks;
pub mod logger;
pub mod priority_list;
pub mod registry;
pub mod severity;
pub mod timestamp;

pub use config::{ComponentSpec, LoggerConfig};
pub use error::{LoggerError, Result};
pub use event::{CallSite, Event};
pub use field_value::{Extra, FieldValue};
pub use hooks::{HookRegistration, HookStatus, HostError, HostSeverity, ERROR_PRIORITY_MAP};
pub use logger::{Logger, LoggerBuilder, HOOK_LOCK_TIMEOUT};
pub use priority_list::{PriorityList, DEFAULT_PIPELINE_PRIORITY};
pub use registry::{Factory, Plugin, PluginKind, PluginManager, Registry};
pub use severity::Severity;
pub use timestamp::TimestampFormat;
