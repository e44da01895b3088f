//! Writer that discards everything

use super::Writer;
use crate::core::{Event, Registry, Result};
use crate::filters::Filter;
use crate::formatters::Formatter;

#[derive(Default)]
pub struct NoopWriter {
    filters: Vec<Box<dyn Filter>>,
}

impl NoopWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an options payload; only `filters` and `formatter` apply
    pub fn from_options(options: &serde_json::Value, registry: &Registry) -> Result<Self> {
        let mut writer = Self::new();
        super::configure_writer(&mut writer, options, registry)?;
        Ok(writer)
    }
}

impl Writer for NoopWriter {
    fn name(&self) -> &str {
        "noop"
    }

    fn filters(&self) -> &[Box<dyn Filter>] {
        &self.filters
    }

    fn add_filter(&mut self, filter: Box<dyn Filter>) {
        self.filters.push(filter);
    }

    fn set_formatter(&mut self, _formatter: Box<dyn Formatter>) {}

    fn do_write(&mut self, _event: &Event) -> Result<()> {
        Ok(())
    }
}
