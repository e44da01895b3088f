//! Stream writer: files, process streams and caller-supplied handles

use super::{configure_writer, Writer};
use crate::core::{Event, FieldValue, LoggerError, Registry, Result};
use crate::filters::Filter;
use crate::formatters::{Formatter, Simple};
use serde::{Deserialize, Deserializer};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Mode used when none is given
pub const DEFAULT_MODE: &str = "a";

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// Options accepted by [`StreamWriter`], besides `filters` and `formatter`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamWriterConfig {
    #[serde(default)]
    pub stream: serde_json::Value,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub log_separator: Option<String>,
    /// Permission bits applied when the file is created
    #[serde(default, deserialize_with = "permission_bits")]
    pub chmod: Option<u32>,
}

fn permission_bits<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<u32>, D::Error> {
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|bits| u32::try_from(bits).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("chmod must be a permission mask; received {}", n))),
        serde_json::Value::String(s) => {
            let digits = s.trim_start_matches("0o");
            u32::from_str_radix(digits, 8)
                .map(Some)
                .map_err(|_| D::Error::custom(format!("chmod must be an octal mask; received \"{}\"", s)))
        }
        other => Err(D::Error::custom(format!(
            "chmod must be a permission mask; received \"{}\"",
            FieldValue::from(other).type_label()
        ))),
    }
}

/// Writes `format(event) + separator` to a stream.
///
/// The stream is a file path opened with a mode (`a`, `w`, `x` or `c`,
/// optionally with `+`, or `r+`), one of the locators `stdout`/`stderr`,
/// or a handle opened by the caller.
pub struct StreamWriter {
    stream: Option<Box<dyn Write + Send>>,
    locator: String,
    log_separator: String,
    filters: Vec<Box<dyn Filter>>,
    formatter: Box<dyn Formatter>,
}

impl StreamWriter {
    fn with_stream(stream: Box<dyn Write + Send>, locator: impl Into<String>) -> Self {
        Self {
            stream: Some(stream),
            locator: locator.into(),
            log_separator: LINE_ENDING.to_string(),
            filters: Vec::new(),
            formatter: Box::new(Simple::new()),
        }
    }

    /// Open `locator` in append mode
    pub fn new(locator: impl AsRef<str>) -> Result<Self> {
        Self::open(locator, DEFAULT_MODE, None)
    }

    /// Open `locator` with `mode`. `chmod` is applied only when this call
    /// creates the file.
    pub fn open(locator: impl AsRef<str>, mode: &str, chmod: Option<u32>) -> Result<Self> {
        let locator = locator.as_ref();
        let open_failed = |source| LoggerError::open_failed(locator, mode, source);
        let options = open_options(mode).map_err(open_failed)?;

        let stream: Box<dyn Write + Send> = match locator {
            "stdout" => Box::new(io::stdout()),
            "stderr" => Box::new(io::stderr()),
            path => {
                let existed = Path::new(path).exists();
                let file = options.open(path).map_err(open_failed)?;
                if let (Some(bits), false) = (chmod, existed) {
                    apply_permissions(Path::new(path), bits);
                }
                Box::new(BufWriter::new(file))
            }
        };

        Ok(Self::with_stream(stream, locator))
    }

    /// Log to a handle the caller already opened. Only mode `a` is accepted.
    pub fn from_handle<W>(handle: W, mode: Option<&str>) -> Result<Self>
    where
        W: Write + Send + 'static,
    {
        let mode = mode.unwrap_or(DEFAULT_MODE);
        if mode != DEFAULT_MODE {
            return Err(LoggerError::invalid_argument(format!(
                "Mode must be \"a\" on existing streams; received \"{}\"",
                mode
            )));
        }
        Ok(Self::with_stream(Box::new(handle), "handle"))
    }

    pub fn from_config(config: StreamWriterConfig) -> Result<Self> {
        let locator = match &config.stream {
            serde_json::Value::String(locator) => locator.clone(),
            other => {
                return Err(LoggerError::invalid_argument(format!(
                    "Resource is not a stream nor a string; received \"{}\"",
                    FieldValue::from(other.clone()).type_label()
                )))
            }
        };

        let mode = config.mode.as_deref().unwrap_or(DEFAULT_MODE);
        let mut writer = Self::open(&locator, mode, config.chmod)?;
        if let Some(separator) = config.log_separator {
            writer.set_log_separator(separator);
        }
        Ok(writer)
    }

    /// Build from an options payload: `stream`, `mode`, `log_separator`,
    /// `chmod`, `filters` and `formatter`
    pub fn from_options(options: &serde_json::Value, registry: &Registry) -> Result<Self> {
        let config = StreamWriterConfig::deserialize(options)
            .map_err(|e| LoggerError::invalid_options("stream writer", e))?;
        let mut writer = Self::from_config(config)?;
        configure_writer(&mut writer, options, registry)?;
        Ok(writer)
    }

    pub fn log_separator(&self) -> &str {
        &self.log_separator
    }

    pub fn set_log_separator(&mut self, separator: impl Into<String>) {
        self.log_separator = separator.into();
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

fn open_options(mode: &str) -> io::Result<OpenOptions> {
    let mut options = OpenOptions::new();
    let plain: String = mode.chars().filter(|c| !matches!(c, 'b' | 't')).collect();
    let (kind, plus) = match plain.strip_suffix('+') {
        Some(kind) => (kind, true),
        None => (plain.as_str(), false),
    };

    match kind {
        "a" => options.append(true).create(true),
        "w" => options.write(true).truncate(true).create(true),
        "x" => options.write(true).create_new(true),
        "c" => options.write(true).create(true),
        "r" if plus => options.write(true),
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported mode \"{}\"", mode),
            ))
        }
    };
    options.read(plus);
    Ok(options)
}

#[cfg(unix)]
fn apply_permissions(path: &Path, bits: u32) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(bits)) {
        eprintln!(
            "[LOGGER WARNING] Failed to set permissions {:o} on {}: {}",
            bits,
            path.display(),
            e
        );
    }
}

#[cfg(not(unix))]
fn apply_permissions(_path: &Path, _bits: u32) {}

impl Writer for StreamWriter {
    fn name(&self) -> &str {
        "stream"
    }

    fn filters(&self) -> &[Box<dyn Filter>] {
        &self.filters
    }

    fn add_filter(&mut self, filter: Box<dyn Filter>) {
        self.filters.push(filter);
    }

    fn set_formatter(&mut self, formatter: Box<dyn Formatter>) {
        self.formatter = formatter;
    }

    fn do_write(&mut self, event: &Event) -> Result<()> {
        let line = format!("{}{}", self.formatter.format(event), self.log_separator);
        let stream = self.stream.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "stream has been shut down")
        })?;

        stream.write_all(line.as_bytes())?;
        stream.flush()?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        match self.stream.take() {
            Some(mut stream) => Ok(stream.flush()?),
            None => Ok(()),
        }
    }
}

impl Drop for StreamWriter {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            let _ = stream.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Severity;
    use crate::formatters::Json;
    use serde_json::json;
    use std::sync::Arc;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writes_line_with_separator() {
        let buffer = SharedBuffer::default();
        let mut writer = StreamWriter::from_handle(buffer.clone(), None).unwrap();
        writer.set_log_separator("\r\n");
        writer.set_formatter(Box::new(Simple::with_format("%message%")));

        writer.write(&Event::new(Severity::Info, "first")).unwrap();
        writer.write(&Event::new(Severity::Info, "second")).unwrap();
        assert_eq!(buffer.contents(), "first\r\nsecond\r\n");
        assert_eq!(writer.log_separator(), "\r\n");
    }

    #[test]
    fn test_existing_handle_requires_append_mode() {
        let err = StreamWriter::from_handle(SharedBuffer::default(), Some("r"))
            .err()
            .expect("mode r is rejected");
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "Mode must be \"a\" on existing streams; received \"r\"");
    }

    #[test]
    fn test_io_fault_becomes_write_failed() {
        let mut writer = StreamWriter::from_handle(BrokenPipe, None).unwrap();
        let err = writer.write(&Event::new(Severity::Info, "m")).unwrap_err();
        assert!(matches!(err, LoggerError::WriteFailed { .. }));
        assert!(err.to_string().starts_with("Unable to write"));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut writer = StreamWriter::from_handle(SharedBuffer::default(), None).unwrap();
        writer.shutdown().unwrap();
        writer.shutdown().unwrap();
        assert!(!writer.is_open());
        assert!(writer.write(&Event::new(Severity::Info, "late")).is_err());
    }

    #[test]
    fn test_file_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let locator = path.to_string_lossy().into_owned();

        let err = StreamWriter::open(&locator, "r+", None).err().expect("missing file");
        assert!(matches!(err, LoggerError::OpenFailed { .. }));
        assert_eq!(err.to_string(), format!("\"{}\" cannot be opened with mode \"r+\"", locator));

        let mut writer = StreamWriter::open(&locator, "x", None).unwrap();
        writer.set_formatter(Box::new(Json::new()));
        writer.write(&Event::new(Severity::Notice, "created")).unwrap();
        writer.shutdown().unwrap();

        assert!(StreamWriter::open(&locator, "x", None).is_err());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains(r#""priorityName":"NOTICE""#));

        StreamWriter::open(&locator, "w", None).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_process_streams_check_mode() {
        let err = StreamWriter::open("stdout", "r", None).err().expect("read-only stdout");
        assert!(matches!(err, LoggerError::OpenFailed { .. }));
        assert_eq!(err.to_string(), "\"stdout\" cannot be opened with mode \"r\"");

        assert!(StreamWriter::open("stderr", "q", None).is_err());

        let writer = StreamWriter::open("stderr", "a", None).unwrap();
        assert_eq!(writer.locator(), "stderr");
        assert!(writer.is_open());
    }

    #[test]
    fn test_config_validation() {
        let registry = Registry::default();

        let err = StreamWriter::from_options(&json!({"stream": 5}), &registry)
            .err()
            .expect("integer stream");
        assert_eq!(err.to_string(), "Resource is not a stream nor a string; received \"integer\"");

        let err = StreamWriter::from_options(&json!({"stream": "/tmp/x.log", "mode": "q"}), &registry)
            .err()
            .expect("unknown mode");
        assert!(matches!(err, LoggerError::OpenFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_chmod_applies_to_new_files() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perm.log");
        let registry = Registry::default();

        let writer = StreamWriter::from_options(
            &json!({"stream": path.to_string_lossy(), "chmod": "0600", "log_separator": "|"}),
            &registry,
        )
        .unwrap();
        assert_eq!(writer.log_separator(), "|");

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
