//! Filter by message pattern

use super::Filter;
use crate::core::{Event, LoggerError, Result};
use ::regex::Regex;
use serde::Deserialize;

/// Options accepted by [`RegexFilter`]
#[derive(Debug, Clone, Deserialize)]
pub struct RegexFilterConfig {
    pub regex: String,
}

/// Accepts events whose message matches a pattern
///
/// Patterns may be written bare (`[0-9]+`) or delimited with trailing flags
/// (`/error/i`). Supported flags: `i`, `m`, `s`, `x` and `U` (swap greed).
#[derive(Debug, Clone)]
pub struct RegexFilter {
    regex: Regex,
}

impl RegexFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let invalid = || LoggerError::invalid_argument(format!("Invalid regular expression \"{}\"", pattern));

        let translated = translate_pattern(pattern).ok_or_else(invalid)?;
        let regex = Regex::new(&translated).map_err(|_| invalid())?;

        Ok(Self { regex })
    }

    pub fn from_config(config: RegexFilterConfig) -> Result<Self> {
        Self::new(&config.regex)
    }

    pub fn from_options(options: &serde_json::Value) -> Result<Self> {
        let config = RegexFilterConfig::deserialize(options)
            .map_err(|e| LoggerError::invalid_options("regex filter", e))?;
        Self::from_config(config)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Delimiters that always introduce a delimited pattern
const DELIMITERS: &[char] = &['/', '#', '~', '!', '@', '%', '|', ',', ';', ':', '=', '&', '`'];

/// Turn a bare or delimited pattern into regex-crate syntax.
///
/// `/.../flags` style delimiters must be closed and followed by valid
/// flags. Bracket delimiters (`(...)`, `[...]`, `{...}`, `<...>`) are only
/// taken when the matching closing bracket is followed by nothing but
/// flags; otherwise the pattern is bare. Any other pattern is used as is.
fn translate_pattern(pattern: &str) -> Option<String> {
    let first = pattern.chars().next()?;
    let rest = &pattern[first.len_utf8()..];

    if DELIMITERS.contains(&first) {
        let end = rest.rfind(first)?;
        return with_flags(&rest[..end], &rest[end + first.len_utf8()..]);
    }

    let closing = match first {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        _ => return Some(pattern.to_string()),
    };
    let delimited = matching_bracket(rest, first, closing)
        .and_then(|end| with_flags(&rest[..end], &rest[end + closing.len_utf8()..]));
    Some(delimited.unwrap_or_else(|| pattern.to_string()))
}

/// Byte offset in `body` of the bracket closing the one already consumed
fn matching_bracket(body: &str, opening: char, closing: char) -> Option<usize> {
    let mut depth = 1usize;
    let mut escaped = false;
    for (idx, c) in body.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == opening {
            depth += 1;
        } else if c == closing {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

fn with_flags(body: &str, flags: &str) -> Option<String> {
    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' | 'x' | 'U' => inline.push(flag),
            _ => return None,
        }
    }

    if inline.is_empty() {
        Some(body.to_string())
    } else {
        Some(format!("(?{}){}", inline, body))
    }
}

impl Filter for RegexFilter {
    fn filter(&self, event: &Event) -> bool {
        self.regex.is_match(&event.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Severity;

    fn event(message: &str) -> Event {
        Event::new(Severity::Info, message)
    }

    #[test]
    fn test_delimited_pattern() {
        let filter = RegexFilter::new("/(a)(b)*(c)/").expect("valid pattern");
        assert!(filter.filter(&event("ac")));
        assert!(filter.filter(&event("abbbc")));
        assert!(!filter.filter(&event("no match here")));
    }

    #[test]
    fn test_flags_and_bare_patterns() {
        let filter = RegexFilter::new("#ERROR#i").expect("valid pattern");
        assert!(filter.filter(&event("an error occurred")));

        let filter = RegexFilter::new("[0-9]+").expect("valid pattern");
        assert!(filter.filter(&event("123")));
        assert!(!filter.filter(&event("abc")));
    }

    #[test]
    fn test_bare_patterns_starting_with_metacharacters() {
        let filter = RegexFilter::new("^error").expect("anchored pattern");
        assert!(filter.filter(&event("error: disk full")));
        assert!(!filter.filter(&event("an error")));

        let filter = RegexFilter::new(".*timeout").expect("wildcard pattern");
        assert!(filter.filter(&event("read timeout")));
        assert!(!filter.filter(&event("read ok")));

        let filter = RegexFilter::new("(a)(b)*(c)").expect("group pattern");
        assert_eq!(filter.as_str(), "(a)(b)*(c)");
        assert!(filter.filter(&event("abbc")));
        assert!(!filter.filter(&event("ab")));

        let filter = RegexFilter::new("^foo^").expect("caret is not a delimiter");
        assert_eq!(filter.as_str(), "^foo^");
        assert!(!filter.filter(&event("foo")));
    }

    #[test]
    fn test_bracket_delimiters() {
        let filter = RegexFilter::new("{warn(ing)?}i").expect("braces with flags");
        assert_eq!(filter.as_str(), "(?i)warn(ing)?");
        assert!(filter.filter(&event("WARNING: low memory")));

        let filter = RegexFilter::new("(disk|memory)").expect("single group");
        assert_eq!(filter.as_str(), "disk|memory");
        assert!(filter.filter(&event("memory pressure")));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(RegexFilter::new("").unwrap_err().is_invalid_argument());
        assert!(RegexFilter::new("/(unclosed/").unwrap_err().is_invalid_argument());
        assert!(RegexFilter::new("/missing-end").unwrap_err().is_invalid_argument());
        assert!(RegexFilter::new("/abc/q").unwrap_err().is_invalid_argument());
        assert!(RegexFilter::from_options(&serde_json::json!({})).is_err());
    }
}
