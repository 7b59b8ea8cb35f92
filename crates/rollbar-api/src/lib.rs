//! # rollbar-api
//!
//! Async client for the Rollbar REST API (`https://api.rollbar.com/api/1`).
//! Produces the `rollbar-core` entities consumed by the formatters.

mod client;
mod types;

pub use client::{RollbarClient, BASE_URL};
pub use types::{InstancesOptions, ItemsOptions};
