//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`. Each one returns
//! the logger's `Result`.
//!
//! # Examples
//!
//! ```
//! use rust_log_pipeline::prelude::*;
//! use rust_log_pipeline::info;
//!
//! let logger = Logger::builder().writer(NoopWriter::new()).build();
//!
//! // Basic logging
//! info!(logger, "Server started").unwrap();
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port).unwrap();
//! ```

/// Log a formatted message at a severity or numeric priority.
///
/// # Examples
///
/// ```
/// # use rust_log_pipeline::prelude::*;
/// # let logger = Logger::builder().writer(NoopWriter::new()).build();
/// use rust_log_pipeline::log;
/// log!(logger, Severity::Info, "Simple message").unwrap();
/// log!(logger, 3, "Error code: {}", 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log(i64::from($level), format!($($arg)+), $crate::Extra::new())
    };
}

#[macro_export]
macro_rules! emerg {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Emerg, $($arg)+)
    };
}

#[macro_export]
macro_rules! alert {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Alert, $($arg)+)
    };
}

/// Log a critical-level message.
///
/// ```
/// # use rust_log_pipeline::prelude::*;
/// # let logger = Logger::builder().writer(NoopWriter::new()).build();
/// use rust_log_pipeline::crit;
/// crit!(logger, "Replica {} unreachable", "db-2").unwrap();
/// ```
#[macro_export]
macro_rules! crit {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Crit, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_pipeline::prelude::*;
/// # let logger = Logger::builder().writer(NoopWriter::new()).build();
/// use rust_log_pipeline::err;
/// err!(logger, "Failed to connect to database").unwrap();
/// err!(logger, "Error code: {}", 500).unwrap();
/// ```
#[macro_export]
macro_rules! err {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Error, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_pipeline::prelude::*;
/// # let logger = Logger::builder().writer(NoopWriter::new()).build();
/// use rust_log_pipeline::warn;
/// warn!(logger, "Low disk space").unwrap();
/// warn!(logger, "Retry attempt {} of {}", 3, 5).unwrap();
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! notice {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Notice, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_pipeline::prelude::*;
/// # let logger = Logger::builder().writer(NoopWriter::new()).build();
/// use rust_log_pipeline::info;
/// info!(logger, "Application started").unwrap();
/// info!(logger, "Processing {} items", 100).unwrap();
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Info, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_pipeline::prelude::*;
/// # let logger = Logger::builder().writer(NoopWriter::new()).build();
/// use rust_log_pipeline::debug;
/// debug!(logger, "Debug information").unwrap();
/// debug!(logger, "Counter value: {}", 10).unwrap();
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Debug, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::writers::{MemoryHandle, MemoryWriter};
    use crate::Logger;

    #[test]
    fn test_macros_format_and_set_priority() {
        let handle = MemoryHandle::new();
        let logger = Logger::builder().writer(MemoryWriter::new(handle.clone())).build();

        crate::emerg!(logger, "e{}", 0).unwrap();
        crate::alert!(logger, "a").unwrap();
        crate::crit!(logger, "c").unwrap();
        crate::err!(logger, "x={}", 1).unwrap();
        crate::warn!(logger, "w").unwrap();
        crate::notice!(logger, "n").unwrap();
        crate::info!(logger, "i {} {}", "a", 2).unwrap();
        crate::debug!(logger, "d").unwrap();
        crate::log!(logger, 6, "raw {}", 6).unwrap();

        let events = handle.events();
        let names: Vec<&str> = events.iter().map(|e| e.priority_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["EMERG", "ALERT", "CRIT", "ERR", "WARN", "NOTICE", "INFO", "DEBUG", "INFO"]
        );
        assert_eq!(events[0].message, "e0");
        assert_eq!(events[6].message, "i a 2");
        assert!(events[8].call_site.as_ref().unwrap().file.ends_with("macros.rs"));
    }
}
