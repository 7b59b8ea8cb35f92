//! Markdown output for documentation and AI context

use crate::context::{assemble_context, FrameLimits, StackSection, NO_APP_FRAMES_NOTICE};
use crate::{single_line, time, truncate, Formatter};
use chrono::{DateTime, Utc};
use rollbar_core::{Frame, Instance, Item, ProjectInfo};
use std::io::{self, Write};

/// Longest title or exception summary shown in a list table
const TITLE_LIMIT: usize = 60;

#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    now: DateTime<Utc>,
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self { now: Utc::now() }
    }

    /// Fix the reference instant for relative times
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

fn frame_line(w: &mut dyn Write, frame: &Frame, snippet: bool) -> io::Result<()> {
    writeln!(w, "{}:{} in {}()", frame.filename, frame.lineno, frame.method)?;
    if snippet {
        if let Some(code) = frame.snippet() {
            writeln!(w, "  > {}", code)?;
        }
    }
    Ok(())
}

/// Table cells cannot contain raw pipes or newlines
fn cell(s: &str) -> String {
    single_line(s).replace('|', "\\|")
}

impl Formatter for MarkdownFormatter {
    fn format_items(&self, w: &mut dyn Write, items: &[Item]) -> io::Result<()> {
        writeln!(w, "# Rollbar Items")?;
        writeln!(w)?;
        if items.is_empty() {
            return writeln!(w, "No items found.");
        }

        writeln!(w, "| # | Title | Level | Status | Occurrences | Last Seen |")?;
        writeln!(w, "|---|-------|-------|--------|-------------|-----------|")?;
        for item in items {
            writeln!(
                w,
                "| {} | {} | {} | {} | {} | {} |",
                item.counter,
                cell(&truncate(&item.title, TITLE_LIMIT)),
                item.level_label(),
                item.status,
                item.total_occurrences,
                time::terse(item.last_occurrence_time(), self.now)
            )?;
        }
        Ok(())
    }

    fn format_item(&self, w: &mut dyn Write, item: &Item) -> io::Result<()> {
        writeln!(w, "# Item #{}: {}", item.counter, item.title)?;
        writeln!(w)?;
        writeln!(w, "## Summary")?;
        writeln!(w)?;
        writeln!(w, "- **Level:** {}", item.level_label())?;
        writeln!(w, "- **Status:** {}", item.status)?;
        writeln!(w, "- **Environment:** {}", item.environment)?;
        writeln!(w, "- **Framework:** {}", item.framework)?;
        writeln!(w, "- **Platform:** {}", item.platform)?;
        writeln!(w, "- **Total Occurrences:** {}", item.total_occurrences)?;
        writeln!(
            w,
            "- **First Seen:** {}",
            time::timestamp(item.first_occurrence_time())
        )?;
        writeln!(
            w,
            "- **Last Seen:** {}",
            time::timestamp(item.last_occurrence_time())
        )
    }

    fn format_instances(&self, w: &mut dyn Write, instances: &[Instance]) -> io::Result<()> {
        writeln!(w, "# Occurrences")?;
        if instances.is_empty() {
            writeln!(w)?;
            return writeln!(w, "No occurrences found.");
        }

        writeln!(w)?;
        writeln!(w, "| # | ID | Time | Level | Environment | Exception |")?;
        writeln!(w, "|---|----|------|-------|-------------|-----------|")?;
        for (i, inst) in instances.iter().enumerate() {
            let summary = inst.summary().unwrap_or_default();
            writeln!(
                w,
                "| {} | {} | {} | {} | {} | {} |",
                i + 1,
                inst.id,
                time::timestamp(inst.time()),
                cell(&inst.data.level),
                cell(&inst.data.environment),
                cell(&truncate(&summary, TITLE_LIMIT))
            )?;
        }
        Ok(())
    }

    fn format_instance(&self, w: &mut dyn Write, instance: &Instance) -> io::Result<()> {
        let data = &instance.data;

        writeln!(w, "# Occurrence {}", instance.id)?;
        writeln!(w)?;
        writeln!(w, "## Summary")?;
        writeln!(w)?;
        writeln!(w, "- **Time:** {}", time::timestamp(instance.time()))?;
        writeln!(w, "- **Level:** {}", data.level)?;
        writeln!(w, "- **Environment:** {}", data.environment)?;

        if let Some(trace) = data.body.primary_trace() {
            writeln!(w)?;
            writeln!(w, "## Exception")?;
            writeln!(w)?;
            writeln!(w, "- **Class:** {}", trace.exception.class)?;
            writeln!(w, "- **Message:** {}", trace.exception.message)?;

            if !trace.frames.is_empty() {
                writeln!(w)?;
                writeln!(w, "## Stack Trace")?;
                writeln!(w)?;
                writeln!(w, "```")?;
                for frame in &trace.frames {
                    frame_line(w, frame, false)?;
                }
                writeln!(w, "```")?;
            }
        } else if let Some(message) = data.body.message_body() {
            writeln!(w)?;
            writeln!(w, "## Message")?;
            writeln!(w)?;
            writeln!(w, "```")?;
            writeln!(w, "{}", message)?;
            writeln!(w, "```")?;
        }

        if let Some(request) = data.request() {
            writeln!(w)?;
            writeln!(w, "## Request")?;
            writeln!(w)?;
            writeln!(w, "- **Method:** {}", request.method)?;
            writeln!(w, "- **URL:** {}", request.url)?;
            if let Some(ip) = request.user_ip() {
                writeln!(w, "- **User IP:** {}", ip)?;
            }
            if let Some(browser) = data.browser() {
                writeln!(w, "- **Browser:** {}", browser)?;
            }
        }

        if let Some(person) = data.person() {
            writeln!(w)?;
            writeln!(w, "## Person")?;
            writeln!(w)?;
            if let Some(id) = person.id() {
                writeln!(w, "- **ID:** {}", id)?;
            }
            if let Some(email) = person.email() {
                writeln!(w, "- **Email:** {}", email)?;
            }
            if let Some(username) = person.username() {
                writeln!(w, "- **Username:** {}", username)?;
            }
        }

        if let Some(server) = data.server() {
            writeln!(w)?;
            writeln!(w, "## Server")?;
            writeln!(w)?;
            writeln!(w, "- **Host:** {}", server.host)?;
            if let Some(root) = server.root() {
                writeln!(w, "- **Root:** {}", root)?;
            }
            if let Some(branch) = server.branch() {
                writeln!(w, "- **Branch:** {}", branch)?;
            }
            if let Some(version) = server.code_version() {
                writeln!(w, "- **Code Version:** {}", version)?;
            }
        }
        Ok(())
    }

    fn format_context(
        &self,
        w: &mut dyn Write,
        item: &Item,
        instances: &[Instance],
    ) -> io::Result<()> {
        let ctx = assemble_context(item, instances, FrameLimits::FULL);

        writeln!(w, "# Bug Report: {}", item.title)?;
        writeln!(w)?;
        writeln!(w, "## Summary")?;
        writeln!(w)?;
        writeln!(w, "- **Rollbar Item:** #{}", item.counter)?;
        writeln!(w, "- **Title:** {}", item.title)?;
        writeln!(w, "- **Level:** {}", item.level_label())?;
        writeln!(w, "- **Status:** {}", item.status)?;
        writeln!(w, "- **Total Occurrences:** {}", item.total_occurrences)?;
        writeln!(w, "- **Environment:** {}", item.environment)?;
        writeln!(w, "- **Framework:** {}", item.framework)?;
        writeln!(
            w,
            "- **First Seen:** {}",
            time::timestamp(item.first_occurrence_time())
        )?;
        writeln!(
            w,
            "- **Last Seen:** {}",
            time::timestamp(item.last_occurrence_time())
        )?;

        let Some(primary) = &ctx.primary else {
            return Ok(());
        };

        if let Some(exception) = primary.exception {
            writeln!(w)?;
            writeln!(w, "## Exception Details")?;
            writeln!(w)?;
            writeln!(w, "- **Type:** {}", exception.class)?;
            writeln!(w, "- **Message:** {}", exception.message)?;
            if !exception.description.is_empty() {
                writeln!(w, "- **Description:** {}", exception.description)?;
            }
        }

        match &primary.stack {
            Some(StackSection::Application {
                frames,
                elided,
                location,
            }) => {
                writeln!(w)?;
                writeln!(w, "## Stack Trace")?;
                writeln!(w)?;
                writeln!(w, "```")?;
                for frame in frames {
                    frame_line(w, frame, FrameLimits::FULL.snippets)?;
                }
                if *elided > 0 {
                    writeln!(w, "... {} more application frames", elided)?;
                }
                writeln!(w, "```")?;

                writeln!(w)?;
                writeln!(w, "## Affected Code Location")?;
                writeln!(w)?;
                writeln!(w, "- **File:** {}", location.filename)?;
                writeln!(w, "- **Line:** {}", location.lineno)?;
                writeln!(w, "- **Function:** {}()", location.method)?;
                if let Some(code) = location.snippet() {
                    writeln!(w, "- **Code:** `{}`", code)?;
                }
            }
            Some(StackSection::VendorOnly { frames, elided }) => {
                writeln!(w)?;
                writeln!(w, "## Stack Trace")?;
                writeln!(w)?;
                writeln!(w, "> {}", NO_APP_FRAMES_NOTICE)?;
                writeln!(w)?;
                writeln!(w, "Vendor frames (top {}):", FrameLimits::FULL.vendor)?;
                writeln!(w)?;
                writeln!(w, "```")?;
                for frame in frames {
                    frame_line(w, frame, false)?;
                }
                if *elided > 0 {
                    writeln!(w, "... {} more vendor frames", elided)?;
                }
                writeln!(w, "```")?;
            }
            None => {}
        }

        if let Some(message) = primary.message {
            writeln!(w)?;
            writeln!(w, "## Message")?;
            writeln!(w)?;
            writeln!(w, "```")?;
            writeln!(w, "{}", message)?;
            writeln!(w, "```")?;
        }

        if let Some(request) = primary.request {
            writeln!(w)?;
            writeln!(w, "## Request")?;
            writeln!(w)?;
            writeln!(w, "- **Method:** {}", request.method)?;
            writeln!(w, "- **URL:** {}", request.url)?;
            if let Some(ip) = request.user_ip() {
                writeln!(w, "- **User IP:** {}", ip)?;
            }
            if let Some(browser) = primary.browser {
                writeln!(w, "- **Browser:** {}", browser)?;
            }
        }

        if let Some(person) = primary.person {
            writeln!(w)?;
            writeln!(w, "## Person")?;
            writeln!(w)?;
            if let Some(id) = person.id() {
                writeln!(w, "- **ID:** {}", id)?;
            }
            if let Some(email) = person.email() {
                writeln!(w, "- **Email:** {}", email)?;
            }
            if let Some(username) = person.username() {
                writeln!(w, "- **Username:** {}", username)?;
            }
        }

        if let Some(server) = primary.server {
            writeln!(w)?;
            writeln!(w, "## Server")?;
            writeln!(w)?;
            writeln!(w, "- **Host:** {}", server.host)?;
            if let Some(branch) = server.branch() {
                writeln!(w, "- **Branch:** {}", branch)?;
            }
            if let Some(version) = server.code_version() {
                writeln!(w, "- **Code Version:** {}", version)?;
            }
        }

        writeln!(w)?;
        writeln!(w, "## Recent Occurrences ({})", ctx.occurrences.len())?;
        for (i, occ) in ctx.occurrences.iter().enumerate() {
            let data = &occ.data;
            writeln!(w)?;
            writeln!(
                w,
                "### Occurrence {} - {}",
                i + 1,
                time::timestamp(occ.time())
            )?;
            writeln!(w)?;
            writeln!(w, "- **Level:** {}", data.level)?;
            if let Some(summary) = occ.summary() {
                writeln!(w, "- **Exception:** {}", summary)?;
            }
            if let Some(request) = data.request() {
                writeln!(w, "- **Request:** {} {}", request.method, request.url)?;
            }
            if let Some(browser) = data.browser() {
                writeln!(w, "- **Browser:** {}", browser)?;
            }
            if let Some(person) = data.person() {
                match person.email() {
                    Some(email) => writeln!(w, "- **User:** {}", email)?,
                    None => writeln!(w, "- **User ID:** {}", person.id)?,
                }
            }
            if let Some(server) = data.server() {
                writeln!(w, "- **Server:** {}", server.host)?;
            }
        }
        Ok(())
    }

    fn format_project_info(&self, w: &mut dyn Write, info: &ProjectInfo) -> io::Result<()> {
        writeln!(w, "# Rollbar Project Info")?;
        writeln!(w)?;
        writeln!(w, "- **Project Name:** {}", info.name)?;
        writeln!(w, "- **Project ID:** {}", info.id)?;
        writeln!(w, "- **Authentication:** OK")
    }
}
