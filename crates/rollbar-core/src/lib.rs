//! # rollbar-core
//!
//! Core types for the Rollbar command-line client.
//!
//! - Items are error groups; instances are their individual occurrences
//! - Every sub-object of an occurrence payload is optional
//! - Levels are integers with five named tiers

mod config;
pub mod de;
mod error;
mod level;
mod sort;
mod types;

pub use config::{
    ColorMode, Config, ConfigEnv, GlobalConfig, OutputConfig, Profile, ProjectBinding,
    CONFIG_KEYS, LOCAL_CONFIG_FILE, LOCAL_CONFIG_JSON, OUTPUT_FORMATS,
};
pub use error::{Result, RollbarError};
pub use level::{ItemStatus, Level, Severity};
pub use sort::ItemSort;
pub use types::*;
