//! Human-readable table output

use crate::{single_line, time, truncate, Formatter};
use chrono::{DateTime, Utc};
use colored::Colorize;
use rollbar_core::{Instance, Item, ProjectInfo};
use std::io::{self, Write};

/// Aligned columns; colors severity and status when enabled
#[derive(Debug, Clone)]
pub struct TableFormatter {
    color: bool,
    now: DateTime<Utc>,
}

impl TableFormatter {
    pub fn new(color: bool) -> Self {
        Self {
            color,
            now: Utc::now(),
        }
    }

    /// Fix the reference instant for relative times
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Pad then color, so escape codes never disturb alignment
    fn level(&self, label: &str, width: usize) -> String {
        let padded = format!("{:<width$}", label, width = width);
        if !self.color {
            return padded;
        }
        match label {
            "critical" => padded.red().bold().to_string(),
            "error" => padded.red().to_string(),
            "warning" => padded.yellow().to_string(),
            "info" => padded.blue().to_string(),
            "debug" => padded.bright_black().to_string(),
            _ => padded,
        }
    }

    fn status(&self, status: &str, width: usize) -> String {
        let padded = format!("{:<width$}", status, width = width);
        if !self.color {
            return padded;
        }
        match status {
            "active" => padded.red().to_string(),
            "resolved" => padded.green().to_string(),
            "muted" => padded.bright_black().to_string(),
            _ => padded,
        }
    }

    fn at(&self, when: Option<DateTime<Utc>>) -> String {
        format!("{} ({})", time::timestamp(when), time::verbose(when, self.now))
    }
}

impl Formatter for TableFormatter {
    fn format_items(&self, w: &mut dyn Write, items: &[Item]) -> io::Result<()> {
        if items.is_empty() {
            return writeln!(w, "No items found.");
        }

        let header = format!(
            "{:<7} {:<50} {:<10} {:<10} {:>8} {:<15}",
            "#", "TITLE", "LEVEL", "STATUS", "OCC", "LAST SEEN"
        );
        writeln!(w, "{}", header.trim_end())?;
        writeln!(w, "{}", "-".repeat(110))?;

        for item in items {
            let row = format!(
                "{:<7} {:<50} {} {} {:>8} {:<15}",
                item.counter,
                truncate(&item.title, 50),
                self.level(item.level_label(), 10),
                self.status(item.status.as_str(), 10),
                item.total_occurrences,
                time::verbose(item.last_occurrence_time(), self.now),
            );
            writeln!(w, "{}", row.trim_end())?;
        }
        Ok(())
    }

    fn format_item(&self, w: &mut dyn Write, item: &Item) -> io::Result<()> {
        writeln!(w, "Item #{}: {}", item.counter, item.title)?;
        writeln!(w)?;
        writeln!(w, "Level:       {}", self.level(item.level_label(), 0))?;
        writeln!(w, "Status:      {}", self.status(item.status.as_str(), 0))?;
        writeln!(w, "Environment: {}", item.environment)?;
        writeln!(w, "Framework:   {}", item.framework)?;
        writeln!(w, "Platform:    {}", item.platform)?;
        writeln!(w)?;
        writeln!(w, "Total Occurrences: {}", item.total_occurrences)?;
        writeln!(w, "First Seen:        {}", self.at(item.first_occurrence_time()))?;
        writeln!(w, "Last Seen:         {}", self.at(item.last_occurrence_time()))?;
        Ok(())
    }

    fn format_instances(&self, w: &mut dyn Write, instances: &[Instance]) -> io::Result<()> {
        if instances.is_empty() {
            return writeln!(w, "No occurrences found.");
        }

        let header = format!("{:<20} {:<12} {:<40} {:<20}", "ID", "LEVEL", "MESSAGE", "TIME");
        writeln!(w, "{}", header.trim_end())?;
        writeln!(w, "{}", "-".repeat(100))?;

        for inst in instances {
            let body = &inst.data.body;
            let message = match body.primary_trace() {
                Some(trace) => trace.exception.message.as_str(),
                None => body.message_body().unwrap_or_default(),
            };
            let row = format!(
                "{:<20} {} {:<40} {:<20}",
                inst.id,
                self.level(&inst.data.level, 12),
                truncate(&single_line(message), 40),
                time::verbose(inst.time(), self.now),
            );
            writeln!(w, "{}", row.trim_end())?;
        }
        Ok(())
    }

    fn format_instance(&self, w: &mut dyn Write, instance: &Instance) -> io::Result<()> {
        let data = &instance.data;

        writeln!(w, "Occurrence {}", instance.id)?;
        writeln!(w)?;
        writeln!(w, "Level:       {}", self.level(&data.level, 0))?;
        writeln!(w, "Environment: {}", data.environment)?;
        writeln!(w, "Time:        {}", self.at(instance.time()))?;

        if let Some(trace) = data.body.primary_trace() {
            writeln!(w)?;
            writeln!(w, "Exception")?;
            writeln!(w, "  Class:   {}", trace.exception.class)?;
            writeln!(w, "  Message: {}", trace.exception.message)?;

            if !trace.frames.is_empty() {
                writeln!(w)?;
                writeln!(w, "Stack Trace")?;
                for frame in trace.frames.iter().take(10) {
                    writeln!(w, "  {}:{} in {}()", frame.filename, frame.lineno, frame.method)?;
                }
                if trace.frames.len() > 10 {
                    writeln!(w, "  ... and {} more frames", trace.frames.len() - 10)?;
                }
            }
        } else if let Some(message) = data.body.message_body() {
            writeln!(w)?;
            writeln!(w, "Message")?;
            writeln!(w, "  {}", message)?;
        }

        if let Some(request) = data.request() {
            writeln!(w)?;
            writeln!(w, "Request")?;
            writeln!(w, "  {} {}", request.method, request.url)?;
            if let Some(browser) = data.browser() {
                writeln!(w, "  Browser: {}", browser)?;
            }
        }

        if let Some(person) = data.person() {
            writeln!(w)?;
            writeln!(w, "Person")?;
            match (person.email(), person.id()) {
                (Some(email), Some(id)) => writeln!(w, "  {} ({})", email, id)?,
                (Some(email), None) => writeln!(w, "  {}", email)?,
                (None, Some(id)) => writeln!(w, "  ID: {}", id)?,
                (None, None) => {}
            }
        }

        if let Some(server) = data.server() {
            writeln!(w)?;
            writeln!(w, "Server")?;
            writeln!(w, "  Host: {}", server.host)?;
        }
        Ok(())
    }

    fn format_context(
        &self,
        w: &mut dyn Write,
        item: &Item,
        instances: &[Instance],
    ) -> io::Result<()> {
        self.format_item(w, item)?;

        if instances.is_empty() {
            return Ok(());
        }

        writeln!(w)?;
        writeln!(w, "Recent Occurrences ({})", instances.len())?;
        for inst in instances {
            writeln!(w)?;
            writeln!(
                w,
                "  {} [{}]",
                time::timestamp(inst.time()),
                self.level(&inst.data.level, 0)
            )?;
            if let Some(summary) = inst.summary() {
                writeln!(w, "    {}", summary)?;
            }
        }
        Ok(())
    }

    fn format_project_info(&self, w: &mut dyn Write, info: &ProjectInfo) -> io::Result<()> {
        writeln!(w, "Project: {} (ID: {})", info.name, info.id)?;
        writeln!(w, "Authentication: OK")
    }
}
