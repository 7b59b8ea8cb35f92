//! Token-frugal text output for AI agents
//!
//! No colors or control codes, ever.

use crate::context::{assemble_context, FrameLimits, StackSection, NO_APP_FRAMES_NOTICE};
use crate::{single_line, time, truncate, Formatter};
use chrono::{DateTime, Utc};
use rollbar_core::{Frame, Instance, Item, ProjectInfo};
use std::io::{self, Write};

/// Compact instance lines cap the message at this many characters
const MESSAGE_LIMIT: usize = 80;

#[derive(Debug, Clone)]
pub struct CompactFormatter {
    now: DateTime<Utc>,
}

impl Default for CompactFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CompactFormatter {
    pub fn new() -> Self {
        Self { now: Utc::now() }
    }

    /// Fix the reference instant for relative times
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    fn instance_line(&self, w: &mut dyn Write, inst: &Instance) -> io::Result<()> {
        let message = inst.summary().unwrap_or_default();
        writeln!(
            w,
            "{} [{}] {} {}",
            inst.id,
            inst.data.level,
            time::terse(inst.time(), self.now),
            truncate(&single_line(&message), MESSAGE_LIMIT)
        )
    }
}

fn frame_line(w: &mut dyn Write, frame: &Frame) -> io::Result<()> {
    writeln!(w, "{}:{} {}()", frame.filename, frame.lineno, frame.method)
}

impl Formatter for CompactFormatter {
    fn format_items(&self, w: &mut dyn Write, items: &[Item]) -> io::Result<()> {
        for item in items {
            writeln!(
                w,
                "#{} {} [{}] {} occ",
                item.counter,
                item.title,
                item.level_label(),
                item.total_occurrences
            )?;
            writeln!(
                w,
                "  Last: {} | First: {}",
                time::terse(item.last_occurrence_time(), self.now),
                time::terse(item.first_occurrence_time(), self.now)
            )?;
        }
        Ok(())
    }

    fn format_item(&self, w: &mut dyn Write, item: &Item) -> io::Result<()> {
        writeln!(w, "#{} {}", item.counter, item.title)?;
        writeln!(
            w,
            "Level: {} | Status: {} | Occ: {}",
            item.level_label(),
            item.status,
            item.total_occurrences
        )?;
        writeln!(w, "Env: {} | Framework: {}", item.environment, item.framework)?;
        writeln!(
            w,
            "Last: {} | First: {}",
            time::terse(item.last_occurrence_time(), self.now),
            time::terse(item.first_occurrence_time(), self.now)
        )
    }

    fn format_instances(&self, w: &mut dyn Write, instances: &[Instance]) -> io::Result<()> {
        for inst in instances {
            self.instance_line(w, inst)?;
        }
        Ok(())
    }

    fn format_instance(&self, w: &mut dyn Write, instance: &Instance) -> io::Result<()> {
        let data = &instance.data;

        writeln!(w, "Occurrence {}", instance.id)?;
        writeln!(
            w,
            "Level: {} | Env: {} | Time: {}",
            data.level,
            data.environment,
            time::terse(instance.time(), self.now)
        )?;

        if let Some(trace) = data.body.primary_trace() {
            writeln!(w, "Exception: {}", trace.exception.summary())?;
            if !trace.frames.is_empty() {
                writeln!(w, "Stack:")?;
                for frame in trace.frames.iter().take(5) {
                    write!(w, "  ")?;
                    frame_line(w, frame)?;
                }
                if trace.frames.len() > 5 {
                    writeln!(w, "  ...+{} more", trace.frames.len() - 5)?;
                }
            }
        } else if let Some(message) = data.body.message_body() {
            writeln!(w, "Message: {}", message)?;
        }

        if let Some(request) = data.request() {
            writeln!(w, "Request: {} {}", request.method, request.url)?;
        }
        if let Some(browser) = data.browser() {
            writeln!(w, "Browser: {}", browser)?;
        }
        if let Some(person) = data.person() {
            let who = person.email().or(person.id()).unwrap_or_default();
            writeln!(w, "Person: {}", who)?;
        }
        if let Some(server) = data.server() {
            writeln!(w, "Server: {}", server.host)?;
        }
        Ok(())
    }

    fn format_context(
        &self,
        w: &mut dyn Write,
        item: &Item,
        instances: &[Instance],
    ) -> io::Result<()> {
        let ctx = assemble_context(item, instances, FrameLimits::ABBREVIATED);

        writeln!(w, "# Error #{}: {}", item.counter, item.title)?;
        writeln!(w)?;
        writeln!(
            w,
            "Level: {} | Status: {} | Occ: {}",
            item.level_label(),
            item.status,
            item.total_occurrences
        )?;
        writeln!(w, "Env: {} | Framework: {}", item.environment, item.framework)?;
        writeln!(
            w,
            "First: {} | Last: {}",
            time::timestamp(item.first_occurrence_time()),
            time::timestamp(item.last_occurrence_time())
        )?;

        let Some(primary) = &ctx.primary else {
            return Ok(());
        };

        if let Some(exception) = primary.exception {
            writeln!(w)?;
            writeln!(w, "## Exception")?;
            writeln!(w, "{}", exception.summary())?;
        }

        match &primary.stack {
            Some(StackSection::Application { frames, elided, .. }) => {
                writeln!(w)?;
                writeln!(w, "## App Code (source of error)")?;
                for frame in frames {
                    frame_line(w, frame)?;
                }
                if *elided > 0 {
                    writeln!(w, "  ...+{} more app frames", elided)?;
                }
            }
            Some(StackSection::VendorOnly { frames, elided }) => {
                writeln!(w)?;
                writeln!(w, "## Stack Trace")?;
                writeln!(w, "{}", NO_APP_FRAMES_NOTICE)?;
                writeln!(w)?;
                writeln!(w, "## Vendor Frames (top 5)")?;
                for frame in frames {
                    frame_line(w, frame)?;
                }
                if *elided > 0 {
                    writeln!(w, "  ...+{} more vendor frames", elided)?;
                }
            }
            None => {}
        }

        if let Some(message) = primary.message {
            writeln!(w)?;
            writeln!(w, "## Message")?;
            writeln!(w, "{}", message)?;
        }

        if let Some(request) = primary.request {
            writeln!(w)?;
            writeln!(w, "## Request")?;
            writeln!(w, "{} {}", request.method, request.url)?;
            if let Some(ip) = request.user_ip() {
                writeln!(w, "IP: {}", ip)?;
            }
            if let Some(browser) = primary.browser {
                writeln!(w, "Browser: {}", browser)?;
            }
        }

        if let Some(person) = primary.person {
            let mut parts = Vec::new();
            if let Some(id) = person.id() {
                parts.push(format!("ID: {}", id));
            }
            if let Some(email) = person.email() {
                parts.push(format!("Email: {}", email));
            }
            if let Some(username) = person.username() {
                parts.push(format!("Username: {}", username));
            }
            writeln!(w)?;
            writeln!(w, "## Person")?;
            writeln!(w, "{}", parts.join(" | "))?;
        }

        if let Some(server) = primary.server {
            writeln!(w)?;
            writeln!(w, "## Server")?;
            writeln!(w, "Host: {}", server.host)?;
            if let Some(branch) = server.branch() {
                writeln!(w, "Branch: {}", branch)?;
            }
            if let Some(version) = server.code_version() {
                writeln!(w, "Version: {}", version)?;
            }
        }

        let others = ctx.others();
        if !others.is_empty() {
            writeln!(w)?;
            writeln!(w, "## Recent ({})", others.len())?;
            for inst in others {
                self.instance_line(w, inst)?;
            }
        }
        Ok(())
    }

    fn format_project_info(&self, w: &mut dyn Write, info: &ProjectInfo) -> io::Result<()> {
        writeln!(w, "Project: {} (ID: {}) - OK", info.name, info.id)
    }
}
