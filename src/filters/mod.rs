//! Filter implementations
//!
//! A filter decides whether a writer accepts an event. Rejection is normal
//! control flow, never an error.

pub mod priority;
pub mod regex;
pub mod suppress;
pub mod validator;

pub use self::priority::{Operator, PriorityFilter, PriorityFilterConfig};
pub use self::regex::{RegexFilter, RegexFilterConfig};
pub use self::suppress::{SuppressFilter, SuppressFilterConfig};
pub use self::validator::{Validator, ValidatorFilter, ValidatorFilterConfig};

use crate::core::Event;

/// Per-writer predicate over an event
pub trait Filter: Send {
    /// Returns `true` to accept the event, `false` to block it
    fn filter(&self, event: &Event) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&Event) -> bool + Send,
{
    fn filter(&self, event: &Event) -> bool {
        self(event)
    }
}
