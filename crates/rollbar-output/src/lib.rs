//! # rollbar-output
//!
//! Rendering for Rollbar items and occurrences.
//!
//! Four formatters share the [`Formatter`] contract:
//!
//! - [`TableFormatter`]: aligned columns for people, optionally colored
//! - [`JsonFormatter`]: the entities as-is, for scripts
//! - [`CompactFormatter`]: minimal text for agents with tight token budgets
//! - [`MarkdownFormatter`]: portable documents with tables and fenced traces
//!
//! Formatting never fails on its own; the only error is a failed write.

mod compact;
pub mod context;
pub mod frames;
mod json;
mod markdown;
mod table;
pub mod time;

pub use compact::CompactFormatter;
pub use context::{assemble_context, Context, FrameLimits, PrimaryOccurrence, StackSection};
pub use frames::{classify, partition, FrameKind, PartitionedFrames};
pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
pub use table::TableFormatter;

use rollbar_core::{Instance, Item, ProjectInfo};
use std::io::{self, Write};

/// Common rendering contract
pub trait Formatter: Send + Sync {
    /// Render a list of items
    fn format_items(&self, w: &mut dyn Write, items: &[Item]) -> io::Result<()>;

    /// Render a single item
    fn format_item(&self, w: &mut dyn Write, item: &Item) -> io::Result<()>;

    /// Render a list of occurrences
    fn format_instances(&self, w: &mut dyn Write, instances: &[Instance]) -> io::Result<()>;

    /// Render a single occurrence
    fn format_instance(&self, w: &mut dyn Write, instance: &Instance) -> io::Result<()>;

    /// Render the diagnostic context for an item and its recent occurrences
    fn format_context(
        &self,
        w: &mut dyn Write,
        item: &Item,
        instances: &[Instance],
    ) -> io::Result<()>;

    /// Render the authentication confirmation
    fn format_project_info(&self, w: &mut dyn Write, info: &ProjectInfo) -> io::Result<()>;
}

/// Output format identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Table,
    Json,
    Compact,
    Markdown,
}

impl Format {
    /// Parse a format name, falling back to [`Format::Table`] for anything unrecognized
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Compact => "compact",
            Self::Markdown => "markdown",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(format!("Invalid format: {}", s)),
        }
    }
}

/// Build the formatter for a format; `color` only affects the table formatter
pub fn new_formatter(format: Format, color: bool) -> Box<dyn Formatter> {
    match format {
        Format::Table => Box::new(TableFormatter::new(color)),
        Format::Json => Box::new(JsonFormatter::new()),
        Format::Compact => Box::new(CompactFormatter::new()),
        Format::Markdown => Box::new(MarkdownFormatter::new()),
    }
}

/// Shorten to at most `max` characters, ending in `...` when cut
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Fold line breaks into spaces so a value fits on one output row
pub fn single_line(s: &str) -> String {
    s.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
