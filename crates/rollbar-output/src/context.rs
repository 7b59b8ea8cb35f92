//! Diagnostic context assembly
//!
//! Decides, independently of output format, what a context document shows
//! for an item and a window of its occurrences. The first instance is the
//! primary occurrence; only it contributes exception, stack, request,
//! person and server detail. Renderers walk the assembled sections and never
//! re-derive these decisions.

use crate::frames::{partition, PartitionedFrames};
use rollbar_core::{Exception, Frame, Instance, Item, Person, Request, Server};

/// Shown when a trace has frames but none of them are application code
pub const NO_APP_FRAMES_NOTICE: &str =
    "No application frames found in stack trace (only vendor/library frames)";

/// How much of a stack trace a document shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    /// Application frames shown before eliding
    pub app: usize,
    /// Vendor frames shown when there are no application frames
    pub vendor: usize,
    /// Whether source snippets are shown under frames
    pub snippets: bool,
}

impl FrameLimits {
    /// Full detail for Markdown documents
    pub const FULL: Self = Self {
        app: 10,
        vendor: 5,
        snippets: true,
    };

    /// Abbreviated stack for compact documents
    pub const ABBREVIATED: Self = Self {
        app: 5,
        vendor: 5,
        snippets: false,
    };
}

/// Stack section of a context document
#[derive(Debug, Clone, PartialEq)]
pub enum StackSection<'a> {
    /// Application frames in original order, capped at the limit
    Application {
        frames: Vec<&'a Frame>,
        /// Application frames beyond the limit
        elided: usize,
        /// Deepest application frame (closest to the raise site)
        location: &'a Frame,
    },
    /// No application frames; a capped vendor fallback
    VendorOnly {
        frames: Vec<&'a Frame>,
        elided: usize,
    },
}

/// Detail drawn from the primary occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryOccurrence<'a> {
    pub instance: &'a Instance,
    pub exception: Option<&'a Exception>,
    /// Absent when there is no trace or the trace has no frames
    pub stack: Option<StackSection<'a>>,
    /// Plain message body, only when there is no trace
    pub message: Option<&'a str>,
    pub request: Option<&'a Request>,
    pub browser: Option<&'a str>,
    pub person: Option<&'a Person>,
    pub server: Option<&'a Server>,
}

/// Assembled context for one item
#[derive(Debug, Clone, PartialEq)]
pub struct Context<'a> {
    pub item: &'a Item,
    pub primary: Option<PrimaryOccurrence<'a>>,
    /// Every supplied instance, primary first
    pub occurrences: &'a [Instance],
}

impl<'a> Context<'a> {
    /// Instances after the primary one
    pub fn others(&self) -> &'a [Instance] {
        self.occurrences.get(1..).unwrap_or_default()
    }
}

/// Assemble the context sections for an item and its occurrences
pub fn assemble_context<'a>(
    item: &'a Item,
    instances: &'a [Instance],
    limits: FrameLimits,
) -> Context<'a> {
    Context {
        item,
        primary: instances.first().map(|inst| primary_occurrence(inst, limits)),
        occurrences: instances,
    }
}

fn primary_occurrence(instance: &Instance, limits: FrameLimits) -> PrimaryOccurrence<'_> {
    let data = &instance.data;
    let trace = data.body.primary_trace();

    PrimaryOccurrence {
        instance,
        exception: trace.map(|t| &t.exception),
        stack: trace.and_then(|t| stack_section(partition(&t.frames), limits)),
        message: match trace {
            Some(_) => None,
            None => data.body.message_body(),
        },
        request: data.request(),
        browser: data.browser(),
        person: data.person(),
        server: data.server(),
    }
}

fn stack_section(parts: PartitionedFrames<'_>, limits: FrameLimits) -> Option<StackSection<'_>> {
    let PartitionedFrames { app, vendor } = parts;

    if let Some(&location) = app.last() {
        let elided = app.len().saturating_sub(limits.app);
        let frames = app.into_iter().take(limits.app).collect();
        return Some(StackSection::Application {
            frames,
            elided,
            location,
        });
    }

    if vendor.is_empty() {
        return None;
    }
    let elided = vendor.len().saturating_sub(limits.vendor);
    let frames = vendor.into_iter().take(limits.vendor).collect();
    Some(StackSection::VendorOnly { frames, elided })
}
