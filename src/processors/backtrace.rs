//! Call-site origin of each log call

use super::Processor;
use crate::core::{Event, Extra, LoggerError, Result};
use serde::Deserialize;

/// Namespaces skipped when looking for the origin frame
pub const DEFAULT_IGNORED_NAMESPACES: &[&str] = &[
    env!("CARGO_CRATE_NAME"),
    "std",
    "core",
    "alloc",
    "backtrace",
    "test",
];

/// Options accepted by [`Backtrace`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BacktraceConfig {
    #[serde(default, rename = "ignoredNamespaces", deserialize_with = "one_or_many")]
    pub ignored_namespaces: Vec<String>,
}

fn one_or_many<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        None(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(namespace) => vec![namespace],
        OneOrMany::Many(namespaces) => namespaces,
        OneOrMany::None(()) => Vec::new(),
    })
}

/// One resolved stack frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub symbol: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl Frame {
    /// Path of the enclosing module or type (`my_app::Service`)
    pub fn class(&self) -> Option<&str> {
        self.symbol.rsplit_once("::").map(|(class, _)| class)
    }

    /// Final path segment (`handle`)
    pub fn function(&self) -> &str {
        self.symbol
            .rsplit_once("::")
            .map(|(_, function)| function)
            .unwrap_or(&self.symbol)
    }
}

/// Parse the rendered form of a captured `std::backtrace::Backtrace`
pub fn parse_frames(rendered: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in rendered.lines().map(str::trim) {
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut().filter(|f| f.file.is_none()) {
                let mut parts = location.rsplitn(3, ':');
                let _column = parts.next();
                frame.line = parts.next().and_then(|l| l.parse().ok());
                frame.file = parts.next().map(str::to_string);
            }
            continue;
        }

        let Some((index, symbol)) = line.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        frames.push(Frame {
            symbol: clean_symbol(symbol),
            file: None,
            line: None,
        });
    }

    frames
}

/// Drop the hash suffix and closure markers from a demangled symbol
fn clean_symbol(symbol: &str) -> String {
    let mut symbol = symbol.trim();
    if let Some((head, hash)) = symbol.rsplit_once("::h") {
        if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            symbol = head;
        }
    }
    while let Some(head) = symbol.strip_suffix("::{{closure}}") {
        symbol = head;
    }
    symbol.to_string()
}

/// Adds the origin of the log call to `extra` as `file`, `line`, `class`
/// and `function`.
///
/// The origin is the first stack frame outside the ignored namespaces. When
/// no source location can be resolved, `file` and `line` fall back to the
/// call site recorded on the event. Values already present in `extra` win.
#[derive(Debug, Clone)]
pub struct Backtrace {
    ignored_namespaces: Vec<String>,
}

impl Backtrace {
    pub fn new() -> Self {
        Self {
            ignored_namespaces: DEFAULT_IGNORED_NAMESPACES
                .iter()
                .map(|ns| ns.to_string())
                .collect(),
        }
    }

    pub fn from_config(config: BacktraceConfig) -> Self {
        let mut backtrace = Self::new();
        backtrace.ignored_namespaces.extend(config.ignored_namespaces);
        backtrace
    }

    pub fn from_options(options: &serde_json::Value) -> Result<Self> {
        if options.is_null() {
            return Ok(Self::new());
        }
        let config = BacktraceConfig::deserialize(options)
            .map_err(|e| LoggerError::invalid_options("backtrace processor", e))?;
        Ok(Self::from_config(config))
    }

    pub fn ignored_namespaces(&self) -> &[String] {
        &self.ignored_namespaces
    }

    fn is_ignored(&self, frame: &Frame) -> bool {
        let symbol = frame.symbol.trim_start_matches('<');
        symbol.is_empty()
            || symbol.starts_with("unknown>")
            || symbol.starts_with("__")
            || self.ignored_namespaces.iter().any(|ns| {
                symbol == ns.as_str()
                    || symbol
                        .strip_prefix(ns.as_str())
                        .is_some_and(|rest| rest.starts_with("::"))
            })
    }

    /// First frame outside the ignored namespaces
    pub fn select_origin<'a>(&self, frames: &'a [Frame]) -> Option<&'a Frame> {
        frames.iter().find(|frame| !self.is_ignored(frame))
    }

    /// Origin fields for an event, given the frames of the current stack
    pub fn origin(&self, frames: &[Frame], event: &Event) -> Extra {
        let frame = self.select_origin(frames);
        let call_site = event.call_site.as_ref();

        let file = frame
            .and_then(|f| f.file.clone())
            .or_else(|| call_site.map(|c| c.file.clone()));
        let line = frame
            .and_then(|f| f.line)
            .or_else(|| call_site.map(|c| c.line));

        Extra::new()
            .with_field("file", file)
            .with_field("line", line)
            .with_field("class", frame.and_then(|f| f.class().map(str::to_string)))
            .with_field("function", frame.map(|f| f.function().to_string()))
    }
}

impl Default for Backtrace {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Backtrace {
    fn process(&self, mut event: Event) -> Event {
        let captured = std::backtrace::Backtrace::force_capture().to_string();
        let frames = parse_frames(&captured);

        let extra = std::mem::take(&mut event.extra);
        event.extra = self.origin(&frames, &event).merge(extra);
        event
    }

    fn name(&self) -> &str {
        "backtrace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CallSite, FieldValue, Severity};

    const RENDERED: &str = "\
   0: rust_log_pipeline::processors::backtrace::Backtrace::process
             at ./src/processors/backtrace.rs:180:24
   1: rust_log_pipeline::core::logger::Logger::log::{{closure}}
             at ./src/core/logger.rs:120:17
   2: billing::invoice::InvoiceService::close::h0123456789abcdef
             at ./src/invoice.rs:42:9
   3: billing::main
             at ./src/main.rs:7:5
   4: core::ops::function::FnOnce::call_once
             at /rustc/library/core/src/ops/function.rs:250:5
   5: __libc_start_main
";

    fn frame(symbol: &str) -> Frame {
        Frame {
            symbol: symbol.to_string(),
            file: None,
            line: None,
        }
    }

    #[test]
    fn test_parse_frames() {
        let frames = parse_frames(RENDERED);
        assert_eq!(frames.len(), 6);
        assert_eq!(frames[1].symbol, "rust_log_pipeline::core::logger::Logger::log");
        assert_eq!(frames[2].symbol, "billing::invoice::InvoiceService::close");
        assert_eq!(frames[2].file.as_deref(), Some("./src/invoice.rs"));
        assert_eq!(frames[2].line, Some(42));
        assert_eq!(frames[5].file, None);
    }

    #[test]
    fn test_origin_skips_ignored_frames() {
        let frames = parse_frames(RENDERED);
        let event = Event::new(Severity::Info, "m");
        let origin = Backtrace::new().origin(&frames, &event);

        assert_eq!(origin.get("file"), Some(&FieldValue::from("./src/invoice.rs")));
        assert_eq!(origin.get("line"), Some(&FieldValue::Int(42)));
        assert_eq!(origin.get("class"), Some(&FieldValue::from("billing::invoice::InvoiceService")));
        assert_eq!(origin.get("function"), Some(&FieldValue::from("close")));

        let backtrace = Backtrace::from_options(&serde_json::json!({
            "ignoredNamespaces": ["billing::invoice"]
        }))
        .unwrap();
        let origin = backtrace.origin(&frames, &event);
        assert_eq!(origin.get("function"), Some(&FieldValue::from("main")));
        assert_eq!(origin.get("class"), Some(&FieldValue::from("billing")));
    }

    #[test]
    fn test_namespace_match_is_per_segment() {
        let backtrace = Backtrace::from_options(&serde_json::json!({"ignoredNamespaces": "app"})).unwrap();
        assert!(backtrace.is_ignored(&frame("app::run")));
        assert!(backtrace.is_ignored(&frame("<app::Worker as core::ops::Drop>::drop")));
        assert!(!backtrace.is_ignored(&frame("application::run")));
        assert!(backtrace.is_ignored(&frame("std::rt::lang_start")));
    }

    #[test]
    fn test_unresolved_origin_falls_back_to_call_site() {
        let event = Event::new(Severity::Info, "m").with_call_site(CallSite {
            file: "src/lib.rs".to_string(),
            line: 9,
            column: 1,
        });
        let origin = Backtrace::new().origin(&[frame("core::panicking::panic")], &event);

        assert_eq!(origin.get("file"), Some(&FieldValue::from("src/lib.rs")));
        assert_eq!(origin.get("line"), Some(&FieldValue::Int(9)));
        assert_eq!(origin.get("class"), Some(&FieldValue::Null));
        assert_eq!(origin.get("function"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_caller_extra_overrides_origin() {
        let event = Event::new(Severity::Info, "m")
            .with_extra(Extra::new().with_field("line", 1).with_field("user", "x"));
        let event = Backtrace::new().process(event);

        assert_eq!(event.extra.get("line"), Some(&FieldValue::Int(1)));
        assert_eq!(
            event.extra.keys().collect::<Vec<_>>(),
            vec!["file", "line", "class", "function", "user"]
        );
    }
}
