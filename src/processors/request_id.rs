//! Request and reference identifiers

use super::Processor;
use crate::core::{Event, FieldValue};
use chrono::Utc;
use std::sync::OnceLock;

/// Identity of the request being served, read from CGI-style environment
/// variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Request start time as fractional seconds since the epoch
    pub request_time: String,
    pub forwarded_for: Option<String>,
    pub remote_addr: Option<String>,
}

impl RequestContext {
    pub fn new(request_time: impl Into<String>) -> Self {
        Self {
            request_time: request_time.into(),
            forwarded_for: None,
            remote_addr: None,
        }
    }

    /// Read `REQUEST_TIME_FLOAT`, `HTTP_X_FORWARDED_FOR` and `REMOTE_ADDR`.
    /// Without a request time the current time is used.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let request_time = var("REQUEST_TIME_FLOAT").unwrap_or_else(|| {
            let micros = Utc::now().timestamp_micros();
            (micros as f64 / 1_000_000.0).to_string()
        });

        Self {
            request_time,
            forwarded_for: var("HTTP_X_FORWARDED_FOR"),
            remote_addr: var("REMOTE_ADDR"),
        }
    }

    #[must_use]
    pub fn with_forwarded_for(mut self, forwarded_for: impl Into<String>) -> Self {
        self.forwarded_for = Some(forwarded_for.into());
        self
    }

    #[must_use]
    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = Some(remote_addr.into());
        self
    }

    /// md5 hex digest of the request time followed by the client address.
    /// A forwarded-for header takes precedence over the remote address.
    pub fn identifier(&self) -> String {
        let mut source = self.request_time.clone();
        if let Some(client) = self.forwarded_for.as_ref().or(self.remote_addr.as_ref()) {
            source.push_str(client);
        }
        format!("{:x}", md5::compute(source.as_bytes()))
    }
}

/// Lazily computed identifier shared by [`RequestId`] and [`ReferenceId`]
#[derive(Debug)]
struct CachedIdentifier {
    context: RequestContext,
    value: OnceLock<String>,
}

impl CachedIdentifier {
    fn new(context: RequestContext) -> Self {
        Self {
            context,
            value: OnceLock::new(),
        }
    }

    fn get(&self) -> &str {
        self.value.get_or_init(|| self.context.identifier())
    }
}

fn insert_if_absent(mut event: Event, key: &str, identifier: &str) -> Event {
    let present = matches!(event.extra.get(key), Some(value) if *value != FieldValue::Null);
    if !present {
        event.extra.insert(key, identifier);
    }
    event
}

/// Adds `extra.requestId` so all events of one request can be grouped
#[derive(Debug)]
pub struct RequestId {
    identifier: CachedIdentifier,
}

impl RequestId {
    pub fn new() -> Self {
        Self::with_context(RequestContext::from_env())
    }

    pub fn with_context(context: RequestContext) -> Self {
        Self {
            identifier: CachedIdentifier::new(context),
        }
    }

    pub fn request_id(&self) -> &str {
        self.identifier.get()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for RequestId {
    fn process(&self, event: Event) -> Event {
        insert_if_absent(event, "requestId", self.identifier.get())
    }

    fn name(&self) -> &str {
        "requestid"
    }
}

/// Adds `extra.referenceId`; the identifier can also be set explicitly
#[derive(Debug)]
pub struct ReferenceId {
    identifier: CachedIdentifier,
}

impl ReferenceId {
    pub fn new() -> Self {
        Self::with_context(RequestContext::from_env())
    }

    pub fn with_context(context: RequestContext) -> Self {
        Self {
            identifier: CachedIdentifier::new(context),
        }
    }

    /// Replace the identifier used for all later events
    pub fn set_reference_id(&mut self, identifier: impl Into<String>) {
        self.identifier.value = OnceLock::from(identifier.into());
    }

    pub fn reference_id(&self) -> &str {
        self.identifier.get()
    }
}

impl Default for ReferenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for ReferenceId {
    fn process(&self, event: Event) -> Event {
        insert_if_absent(event, "referenceId", self.identifier.get())
    }

    fn name(&self) -> &str {
        "referenceid"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Extra, Severity};

    fn context() -> RequestContext {
        RequestContext::new("1736332245.5").with_remote_addr("10.0.0.1")
    }

    #[test]
    fn test_identifier_is_md5_of_time_and_client() {
        let expected = format!("{:x}", md5::compute(b"1736332245.510.0.0.1"));
        assert_eq!(context().identifier(), expected);

        let forwarded = context().with_forwarded_for("192.168.1.9");
        let expected = format!("{:x}", md5::compute(b"1736332245.5192.168.1.9"));
        assert_eq!(forwarded.identifier(), expected);
        assert_eq!(forwarded.identifier().len(), 32);
    }

    #[test]
    fn test_request_id_is_stable_and_not_overwritten() {
        let processor = RequestId::with_context(context());
        let first = processor.process(Event::new(Severity::Info, "a"));
        let second = processor.process(Event::new(Severity::Info, "b"));
        assert_eq!(first.extra.get("requestId"), second.extra.get("requestId"));

        let preset = Event::new(Severity::Info, "c")
            .with_extra(Extra::new().with_field("requestId", "mine"));
        let preset = processor.process(preset);
        assert_eq!(preset.extra.get("requestId"), Some(&FieldValue::from("mine")));
    }

    #[test]
    fn test_reference_id_can_be_set() {
        let mut processor = ReferenceId::with_context(context());
        assert_eq!(processor.reference_id(), context().identifier());

        processor.set_reference_id("ref-123");
        assert_eq!(processor.reference_id(), "ref-123");
        let event = processor.process(Event::new(Severity::Info, "m"));
        assert_eq!(event.extra.get("referenceId"), Some(&FieldValue::from("ref-123")));
        assert!(event.extra.get("requestId").is_none());
    }

    #[test]
    fn test_preset_reference_id_is_kept() {
        let mut processor = ReferenceId::with_context(context());
        processor.set_reference_id("ref-123");

        let preset = Event::new(Severity::Info, "m")
            .with_extra(Extra::new().with_field("referenceId", "caller-ref"));
        let preset = processor.process(preset);
        assert_eq!(preset.extra.get("referenceId"), Some(&FieldValue::from("caller-ref")));
        assert_eq!(preset.extra.len(), 1);

        let null = Event::new(Severity::Info, "m")
            .with_extra(Extra::new().with_field("referenceId", FieldValue::Null));
        let null = processor.process(null);
        assert_eq!(null.extra.get("referenceId"), Some(&FieldValue::from("ref-123")));
    }
}
