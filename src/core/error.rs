//! Error types for the logging pipeline

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A caller-supplied argument violates a documented constraint
    #[error("{0}")]
    InvalidArgument(String),

    /// Operational failure at dispatch time
    #[error("{0}")]
    Runtime(String),

    /// A sink write surfaced a low-level fault
    #[error("Unable to write: {source}")]
    WriteFailed {
        #[source]
        source: std::io::Error,
    },

    /// A stream locator could not be opened
    #[error("\"{locator}\" cannot be opened with mode \"{mode}\"")]
    OpenFailed {
        locator: String,
        mode: String,
        #[source]
        source: std::io::Error,
    },

    /// No plugin registered under the requested name
    #[error("A plugin by the name \"{name}\" was not found in the {kind} plugin manager")]
    NotFound { kind: String, name: String },

    /// A plugin factory produced a component of the wrong kind
    #[error("The {kind} plugin manager can not create \"{name}\": {message}")]
    InvalidService {
        kind: String,
        name: String,
        message: String,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl LoggerError {
    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        LoggerError::InvalidArgument(msg.into())
    }

    /// Create a runtime error
    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        LoggerError::Runtime(msg.into())
    }

    /// Create a stream open error
    pub fn open_failed(
        locator: impl Into<String>,
        mode: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::OpenFailed {
            locator: locator.into(),
            mode: mode.into(),
            source,
        }
    }

    /// Create a plugin lookup error
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        LoggerError::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a plugin capability error
    pub fn invalid_service(
        kind: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LoggerError::InvalidService {
            kind: kind.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    /// Wrap an options payload that failed to deserialize
    pub(crate) fn invalid_options(component: &str, err: serde_json::Error) -> Self {
        LoggerError::InvalidArgument(format!("Invalid options for {}: {}", component, err))
    }

    /// True for argument validation failures
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, LoggerError::InvalidArgument(_))
    }

    /// True for dispatch-time failures (no writer, sink write or open failures)
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            LoggerError::Runtime(_) | LoggerError::WriteFailed { .. } | LoggerError::OpenFailed { .. }
        )
    }
}
