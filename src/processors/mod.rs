//! Processors enrich an event before it reaches the writers

pub mod backtrace;
pub mod psr_placeholder;
pub mod request_id;

pub use backtrace::{Backtrace, BacktraceConfig};
pub use psr_placeholder::PsrPlaceholder;
pub use request_id::{ReferenceId, RequestContext, RequestId};

use crate::core::Event;

pub trait Processor: Send + Sync {
    /// Return the event with this processor's changes applied
    fn process(&self, event: Event) -> Event;

    fn name(&self) -> &str;
}
