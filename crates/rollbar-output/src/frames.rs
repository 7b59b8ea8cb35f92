//! Stack frame classification
//!
//! Traces mix library code with the user's own code. Frames are labeled by
//! filename alone using a fixed, ordered rule list; the first match wins.

use rollbar_core::Frame;

/// Path fragments that mark dependency code
const VENDOR_MARKERS: &[&str] = &[
    "/vendor/",
    "/bundle/",
    "/gems/",
    "node_modules/",
    "/usr/lib/",
    "/usr/local/",
    ".rvm/",
    ".rbenv/",
    ".nvm/",
    ".pyenv/",
    ".asdf/",
];

/// Path fragments that mark application code
const APP_MARKERS: &[&str] = &["/app/app/", "/app/lib/", "/app/config/", "/src/", "/lib/"];

/// Bundle filenames longer than this that contain a hyphen are treated as minified
const MINIFIED_BUNDLE_LEN: usize = 100;

/// Which side of the application/dependency split a frame falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Application,
    Vendor,
}

/// Classify a frame by its filename
pub fn classify(frame: &Frame) -> FrameKind {
    classify_filename(&frame.filename)
}

pub fn classify_filename(filename: &str) -> FrameKind {
    if VENDOR_MARKERS.iter().any(|m| filename.contains(m)) {
        return FrameKind::Vendor;
    }

    if APP_MARKERS.iter().any(|m| filename.contains(m)) {
        return FrameKind::Application;
    }

    if filename.starts_with("/app/") {
        return FrameKind::Application;
    }

    if is_url(filename) && !filename.contains("node_modules") {
        if filename.contains('-') && filename.chars().count() > MINIFIED_BUNDLE_LEN {
            return FrameKind::Vendor;
        }
        return FrameKind::Application;
    }

    FrameKind::Vendor
}

fn is_url(filename: &str) -> bool {
    filename.starts_with("http://") || filename.starts_with("https://")
}

/// Frames of one trace split by kind, each side in original order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionedFrames<'a> {
    pub app: Vec<&'a Frame>,
    pub vendor: Vec<&'a Frame>,
}

/// Split frames into application and vendor sequences
///
/// Stable on both sides: no sorting and no deduplication.
pub fn partition(frames: &[Frame]) -> PartitionedFrames<'_> {
    let mut out = PartitionedFrames::default();
    for frame in frames {
        match classify(frame) {
            FrameKind::Application => out.app.push(frame),
            FrameKind::Vendor => out.vendor.push(frame),
        }
    }
    out
}
