//! `{key}` placeholder interpolation

use super::Processor;
use crate::core::{Event, Extra, FieldValue};

/// Replaces `{key}` tokens in the message with the matching `extra` value.
///
/// Scalars use their string conversion, objects without one render as
/// `[object <type>]` and anything else as `[<type>]`. Tokens with no
/// matching key are left as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PsrPlaceholder;

impl PsrPlaceholder {
    pub fn new() -> Self {
        Self
    }
}

fn replacement(value: &FieldValue) -> String {
    if let Some(rendered) = value.to_scalar_string() {
        return rendered;
    }
    match value.object_type_name() {
        Some(type_name) => format!("[object {}]", type_name),
        None => format!("[{}]", value.type_label()),
    }
}

fn interpolate(message: &str, extra: &Extra) -> String {
    let mut output = String::with_capacity(message.len());
    let mut rest = message;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let candidate = &rest[open + 1..];
        match candidate.find(['{', '}']) {
            Some(close) if candidate.as_bytes()[close] == b'}' => {
                let key = &candidate[..close];
                match extra.get(key) {
                    Some(value) => output.push_str(&replacement(value)),
                    None => {
                        output.push('{');
                        output.push_str(key);
                        output.push('}');
                    }
                }
                rest = &candidate[close + 1..];
            }
            _ => {
                output.push('{');
                rest = candidate;
            }
        }
    }
    output.push_str(rest);
    output
}

impl Processor for PsrPlaceholder {
    fn process(&self, mut event: Event) -> Event {
        if !event.message.contains('{') {
            return event;
        }
        event.message = interpolate(&event.message, &event.extra);
        event
    }

    fn name(&self) -> &str {
        "psrplaceholder"
    }
}
