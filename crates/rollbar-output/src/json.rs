//! JSON output
//!
//! Entities are written exactly as they deserialize, one document per line.
//! The context document is the only pretty-printed one.

use crate::Formatter;
use rollbar_core::{Instance, Item, ProjectInfo};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }

    fn emit<T: Serialize + ?Sized>(&self, mut w: &mut dyn Write, value: &T) -> io::Result<()> {
        serde_json::to_writer(&mut w, value)?;
        writeln!(w)
    }
}

#[derive(Serialize)]
struct ContextDocument<'a> {
    item: &'a Item,
    instances: &'a [Instance],
}

impl Formatter for JsonFormatter {
    fn format_items(&self, w: &mut dyn Write, items: &[Item]) -> io::Result<()> {
        self.emit(w, items)
    }

    fn format_item(&self, w: &mut dyn Write, item: &Item) -> io::Result<()> {
        self.emit(w, item)
    }

    fn format_instances(&self, w: &mut dyn Write, instances: &[Instance]) -> io::Result<()> {
        self.emit(w, instances)
    }

    fn format_instance(&self, w: &mut dyn Write, instance: &Instance) -> io::Result<()> {
        self.emit(w, instance)
    }

    fn format_context(
        &self,
        mut w: &mut dyn Write,
        item: &Item,
        instances: &[Instance],
    ) -> io::Result<()> {
        let doc = ContextDocument { item, instances };
        serde_json::to_writer_pretty(&mut w, &doc)?;
        writeln!(w)
    }

    fn format_project_info(&self, w: &mut dyn Write, info: &ProjectInfo) -> io::Result<()> {
        self.emit(w, info)
    }
}
