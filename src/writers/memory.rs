//! In-memory writer for inspection and tests

use super::Writer;
use crate::core::Event;
use crate::core::Result;
use crate::filters::Filter;
use crate::formatters::{Formatter, Simple};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct Captured {
    events: Vec<Event>,
    lines: Vec<String>,
}

/// Shared view of everything a [`MemoryWriter`] accepted
#[derive(Clone, Default)]
pub struct MemoryHandle {
    inner: Arc<Mutex<Captured>>,
}

impl MemoryHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepted events, as they reached the writer
    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().events.clone()
    }

    /// Accepted events rendered by the writer's formatter
    pub fn lines(&self) -> Vec<String> {
        self.inner.lock().lines.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut captured = self.inner.lock();
        captured.events.clear();
        captured.lines.clear();
    }
}

/// Keeps accepted events in memory, shared through a [`MemoryHandle`]
///
/// # Example
///
/// ```
/// use rust_log_pipeline::writers::{MemoryHandle, MemoryWriter, Writer};
/// use rust_log_pipeline::{Event, Severity};
///
/// let handle = MemoryHandle::new();
/// let mut writer = MemoryWriter::new(handle.clone());
/// writer.write(&Event::new(Severity::Info, "hello")).unwrap();
/// assert_eq!(handle.events()[0].message, "hello");
/// ```
pub struct MemoryWriter {
    handle: MemoryHandle,
    filters: Vec<Box<dyn Filter>>,
    formatter: Box<dyn Formatter>,
}

impl MemoryWriter {
    pub fn new(handle: MemoryHandle) -> Self {
        Self {
            handle,
            filters: Vec::new(),
            formatter: Box::new(Simple::new()),
        }
    }

    pub fn handle(&self) -> MemoryHandle {
        self.handle.clone()
    }
}

impl Writer for MemoryWriter {
    fn name(&self) -> &str {
        "memory"
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
        let line = self.formatter.format(event).to_string();
        let mut captured = self.handle.inner.lock();
        captured.events.push(event.clone());
        captured.lines.push(line);
        Ok(())
    }
}
