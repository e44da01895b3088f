//! Process-wide error, panic and fatal-shutdown hooks
//!
//! A logger can be installed as:
//! - the error handler, receiving host errors reported through
//!   [`trigger_error`]
//! - the exception handler, receiving panics through a panic hook
//! - the fatal-shutdown handler, logging the last fatal-class error when
//!   [`run_shutdown`] tears the hooks down
//!
//! Each hook is installed at most once per process. The hook state is a
//! single process-wide struct set up at init and cleared at teardown.

use super::event::CallSite;
use super::field_value::Extra;
use super::logger::Logger;
use super::severity::Severity;
use parking_lot::Mutex;
use std::fmt;
use std::panic::{Location, PanicHookInfo};
use std::sync::Arc;

/// Host error classes, with their host error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostSeverity {
    Error,
    Warning,
    Parse,
    Notice,
    CoreError,
    CoreWarning,
    CompileError,
    CompileWarning,
    UserError,
    UserWarning,
    UserNotice,
    Strict,
    RecoverableError,
    Deprecated,
    UserDeprecated,
}

/// Priority each host error class is logged at
pub const ERROR_PRIORITY_MAP: &[(HostSeverity, Severity)] = &[
    (HostSeverity::Notice, Severity::Notice),
    (HostSeverity::UserNotice, Severity::Notice),
    (HostSeverity::Warning, Severity::Warn),
    (HostSeverity::CoreWarning, Severity::Warn),
    (HostSeverity::UserWarning, Severity::Warn),
    (HostSeverity::Error, Severity::Error),
    (HostSeverity::UserError, Severity::Error),
    (HostSeverity::CoreError, Severity::Error),
    (HostSeverity::RecoverableError, Severity::Error),
    (HostSeverity::Parse, Severity::Error),
    (HostSeverity::CompileError, Severity::Error),
    (HostSeverity::CompileWarning, Severity::Error),
    (HostSeverity::Strict, Severity::Debug),
    (HostSeverity::Deprecated, Severity::Debug),
    (HostSeverity::UserDeprecated, Severity::Debug),
];

impl HostSeverity {
    /// Numeric code recorded as `errno`
    pub fn code(&self) -> i64 {
        match self {
            HostSeverity::Error => 1,
            HostSeverity::Warning => 2,
            HostSeverity::Parse => 4,
            HostSeverity::Notice => 8,
            HostSeverity::CoreError => 16,
            HostSeverity::CoreWarning => 32,
            HostSeverity::CompileError => 64,
            HostSeverity::CompileWarning => 128,
            HostSeverity::UserError => 256,
            HostSeverity::UserWarning => 512,
            HostSeverity::UserNotice => 1024,
            HostSeverity::Strict => 2048,
            HostSeverity::RecoverableError => 4096,
            HostSeverity::Deprecated => 8192,
            HostSeverity::UserDeprecated => 16384,
        }
    }

    /// Log priority from [`ERROR_PRIORITY_MAP`]; unmapped classes log at INFO
    pub fn priority(&self) -> Severity {
        ERROR_PRIORITY_MAP
            .iter()
            .find(|(host, _)| host == self)
            .map(|(_, severity)| *severity)
            .unwrap_or(Severity::Info)
    }

    /// Errors that end the process and are reported by the fatal-shutdown hook
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HostSeverity::Error
                | HostSeverity::Parse
                | HostSeverity::CoreError
                | HostSeverity::CoreWarning
                | HostSeverity::CompileError
                | HostSeverity::CompileWarning
        )
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            HostSeverity::Error => "Fatal error",
            HostSeverity::Warning => "Warning",
            HostSeverity::Parse => "Parse error",
            HostSeverity::Notice => "Notice",
            HostSeverity::CoreError => "Core error",
            HostSeverity::CoreWarning => "Core warning",
            HostSeverity::CompileError => "Compile error",
            HostSeverity::CompileWarning => "Compile warning",
            HostSeverity::UserError => "User error",
            HostSeverity::UserWarning => "User warning",
            HostSeverity::UserNotice => "User notice",
            HostSeverity::Strict => "Strict standards",
            HostSeverity::RecoverableError => "Recoverable error",
            HostSeverity::Deprecated => "Deprecated",
            HostSeverity::UserDeprecated => "User deprecated",
        }
    }
}

impl fmt::Display for HostSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// A reported host error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    pub severity: HostSeverity,
    pub message: String,
    pub file: String,
    pub line: u32,
}

impl HostError {
    fn extra(&self) -> Extra {
        Extra::new()
            .with_field("file", self.file.as_str())
            .with_field("line", self.line)
    }

    fn call_site(&self) -> CallSite {
        CallSite {
            file: self.file.clone(),
            line: self.line,
            column: 0,
        }
    }
}

/// Result of a hook registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookRegistration {
    Installed,
    /// The hook was already installed; nothing changed
    AlreadyRegistered,
}

/// Which hooks are currently installed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookStatus {
    pub error_handler: bool,
    pub exception_handler: bool,
    pub fatal_shutdown_handler: bool,
}

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static>;

struct ErrorHandler {
    logger: Arc<Logger>,
    continue_native: bool,
}

struct HookState {
    error_handler: Option<ErrorHandler>,
    exception_handler: bool,
    previous_panic_hook: Option<PanicHook>,
    fatal_handler: Option<Arc<Logger>>,
    last_error: Option<HostError>,
}

static STATE: Mutex<HookState> = parking_lot::const_mutex(HookState {
    error_handler: None,
    exception_handler: false,
    previous_panic_hook: None,
    fatal_handler: None,
    last_error: None,
});

/// Route host errors to `logger`.
///
/// With `continue_native` the native reporting (stderr) still runs after
/// the event is logged.
pub fn register_error_handler(logger: Arc<Logger>, continue_native: bool) -> HookRegistration {
    let mut state = STATE.lock();
    if state.error_handler.is_some() {
        return HookRegistration::AlreadyRegistered;
    }
    state.error_handler = Some(ErrorHandler {
        logger,
        continue_native,
    });
    HookRegistration::Installed
}

pub fn unregister_error_handler() {
    STATE.lock().error_handler = None;
}

/// Log panics to `logger` at ERR, with the panic location as `file` and
/// `line`. Replaces the current panic hook until unregistered.
pub fn register_exception_handler(logger: Arc<Logger>) -> HookRegistration {
    let mut state = STATE.lock();
    if state.exception_handler {
        return HookRegistration::AlreadyRegistered;
    }

    state.previous_panic_hook = Some(std::panic::take_hook());
    std::panic::set_hook(Box::new(move |info| {
        let mut extra = Extra::new();
        let call_site = info.location().map(|location| {
            extra.insert("file", location.file());
            extra.insert("line", location.line());
            CallSite::from(location)
        });

        if let Err(e) = logger.log_from_hook(Severity::Error, panic_message(info), extra, call_site) {
            eprintln!("[LOGGER ERROR] Failed to log panic: {}", e);
        }
    }));
    state.exception_handler = true;
    HookRegistration::Installed
}

/// Remove the panic hook and restore the one it replaced
pub fn unregister_exception_handler() {
    let mut state = STATE.lock();
    if !state.exception_handler {
        return;
    }
    drop(std::panic::take_hook());
    if let Some(previous) = state.previous_panic_hook.take() {
        std::panic::set_hook(previous);
    }
    state.exception_handler = false;
}

/// Log the last fatal-class host error to `logger` when [`run_shutdown`] runs
pub fn register_fatal_shutdown_handler(logger: Arc<Logger>) -> HookRegistration {
    let mut state = STATE.lock();
    if state.fatal_handler.is_some() {
        return HookRegistration::AlreadyRegistered;
    }
    state.fatal_handler = Some(logger);
    HookRegistration::Installed
}

pub fn unregister_fatal_shutdown_handler() {
    STATE.lock().fatal_handler = None;
}

pub fn status() -> HookStatus {
    let state = STATE.lock();
    HookStatus {
        error_handler: state.error_handler.is_some(),
        exception_handler: state.exception_handler,
        fatal_shutdown_handler: state.fatal_handler.is_some(),
    }
}

/// Report a host error from the caller's location.
///
/// The error becomes the last error. With an error handler installed it is
/// logged at its mapped priority with `errno`, `file` and `line` in
/// `extra`. Returns `true` when native reporting was skipped; otherwise the
/// error is also written to stderr.
#[track_caller]
pub fn trigger_error(severity: HostSeverity, message: impl Into<String>) -> bool {
    let location = Location::caller();
    let error = HostError {
        severity,
        message: message.into(),
        file: location.file().to_string(),
        line: location.line(),
    };

    let handler = {
        let mut state = STATE.lock();
        state.last_error = Some(error.clone());
        state
            .error_handler
            .as_ref()
            .map(|h| (Arc::clone(&h.logger), h.continue_native))
    };

    let skip_native = match handler {
        Some((logger, continue_native)) => {
            let extra = Extra::new()
                .with_field("errno", severity.code())
                .merge(error.extra());
            if let Err(e) = logger.log_from_hook(
                severity.priority(),
                error.message.as_str(),
                extra,
                Some(error.call_site()),
            ) {
                eprintln!("[LOGGER ERROR] Failed to log host error: {}", e);
            }
            !continue_native
        }
        None => false,
    };

    if !skip_native {
        eprintln!(
            "[LOGGER WARNING] {}: {} in {} on line {}",
            severity, error.message, error.file, error.line
        );
    }
    skip_native
}

/// The most recent error reported through [`trigger_error`]
pub fn last_error() -> Option<HostError> {
    STATE.lock().last_error.clone()
}

pub fn clear_last_error() {
    STATE.lock().last_error = None;
}

/// Teardown: fire the fatal-shutdown handler for a fatal-class last error,
/// then remove every hook.
pub fn run_shutdown() {
    let (fatal_handler, last_error) = {
        let mut state = STATE.lock();
        (state.fatal_handler.take(), state.last_error.take())
    };

    if let (Some(logger), Some(error)) = (fatal_handler, last_error) {
        if error.severity.is_fatal() {
            if let Err(e) = logger.log_from_hook(
                error.severity.priority(),
                error.message.as_str(),
                error.extra(),
                Some(error.call_site()),
            ) {
                eprintln!("[LOGGER ERROR] Failed to log fatal error: {}", e);
            }
        }
    }

    unregister_error_handler();
    unregister_exception_handler();
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Serializes tests that touch the process-wide hook state
#[cfg(test)]
pub(crate) static TEST_LOCK: Mutex<()> = parking_lot::const_mutex(());

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldValue;
    use crate::writers::{MemoryHandle, MemoryWriter};

    fn memory_logger() -> (Arc<Logger>, MemoryHandle) {
        let handle = MemoryHandle::new();
        let logger = Logger::builder().writer(MemoryWriter::new(handle.clone())).build();
        (Arc::new(logger), handle)
    }

    #[test]
    fn test_priority_map() {
        assert_eq!(HostSeverity::UserNotice.priority(), Severity::Notice);
        assert_eq!(HostSeverity::CoreWarning.priority(), Severity::Warn);
        assert_eq!(HostSeverity::CompileWarning.priority(), Severity::Error);
        assert_eq!(HostSeverity::Deprecated.priority(), Severity::Debug);
        assert!(HostSeverity::CoreWarning.is_fatal());
        assert!(!HostSeverity::UserError.is_fatal());
    }

    #[test]
    fn test_error_handler_logs_and_registers_once() {
        let _guard = TEST_LOCK.lock();
        let (logger, handle) = memory_logger();

        assert_eq!(register_error_handler(Arc::clone(&logger), false), HookRegistration::Installed);
        assert_eq!(
            register_error_handler(Arc::clone(&logger), true),
            HookRegistration::AlreadyRegistered
        );

        assert!(trigger_error(HostSeverity::UserWarning, "disk almost full"));
        let events = handle.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].priority, Severity::Warn.code());
        assert_eq!(events[0].message, "disk almost full");
        assert_eq!(events[0].extra.get("errno"), Some(&FieldValue::Int(512)));
        assert!(matches!(events[0].extra.get("file"), Some(FieldValue::String(f)) if f.ends_with("hooks.rs")));

        unregister_error_handler();
        assert!(!status().error_handler);
        assert!(!trigger_error(HostSeverity::Notice, "unhandled"));
        assert_eq!(handle.len(), 1);

        assert_eq!(register_error_handler(logger, true), HookRegistration::Installed);
        assert!(!trigger_error(HostSeverity::Notice, "logged and printed"));
        assert_eq!(handle.len(), 2);
        run_shutdown();
    }

    #[test]
    fn test_panic_hook_logs_and_restores() {
        let _guard = TEST_LOCK.lock();
        let (logger, handle) = memory_logger();

        assert_eq!(register_exception_handler(Arc::clone(&logger)), HookRegistration::Installed);
        assert_eq!(
            register_exception_handler(Arc::clone(&logger)),
            HookRegistration::AlreadyRegistered
        );

        let result = std::panic::catch_unwind(|| panic!("worker exploded"));
        assert!(result.is_err());

        unregister_exception_handler();
        assert!(!status().exception_handler);

        let events = handle.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].priority_name, "ERR");
        assert_eq!(events[0].message, "worker exploded");
        assert!(events[0].extra.contains_key("line"));
    }

    #[test]
    fn test_fatal_shutdown_logs_only_fatal_errors() {
        let _guard = TEST_LOCK.lock();
        let (logger, handle) = memory_logger();

        assert_eq!(
            register_fatal_shutdown_handler(Arc::clone(&logger)),
            HookRegistration::Installed
        );
        assert_eq!(
            register_fatal_shutdown_handler(Arc::clone(&logger)),
            HookRegistration::AlreadyRegistered
        );
        trigger_error(HostSeverity::Warning, "not fatal");
        run_shutdown();
        assert!(handle.is_empty());
        assert!(!status().fatal_shutdown_handler);

        register_fatal_shutdown_handler(Arc::clone(&logger));
        trigger_error(HostSeverity::Parse, "unexpected end of input");
        assert_eq!(last_error().map(|e| e.severity), Some(HostSeverity::Parse));
        run_shutdown();

        let events = handle.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].priority_name, "ERR");
        assert_eq!(events[0].message, "unexpected end of input");
        assert!(events[0].extra.contains_key("file"));
        assert!(last_error().is_none());
    }
}
