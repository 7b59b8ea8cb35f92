//! Request options and response envelopes

use chrono::{DateTime, Utc};
use rollbar_core::{de, Instance, Item, ItemStatus};
use serde::Deserialize;

/// Filters for listing items
#[derive(Debug, Clone, Default)]
pub struct ItemsOptions {
    /// `None` means any status
    pub status: Option<ItemStatus>,
    /// Single level name, or a comma-separated list
    pub level: String,
    pub environment: String,
    /// Text search in titles
    pub query: String,
    /// Last occurrence at or after
    pub date_from: Option<DateTime<Utc>>,
    /// Last occurrence at or before
    pub date_to: Option<DateTime<Utc>>,
    /// 1-based page; 0 leaves it to the server
    pub page: u32,
}

impl ItemsOptions {
    /// Distinct level filters, trimmed, in the order given
    pub fn levels(&self) -> Vec<&str> {
        let mut levels: Vec<&str> = Vec::new();
        for level in self.level.split(',').map(str::trim) {
            if !level.is_empty() && !levels.contains(&level) {
                levels.push(level);
            }
        }
        levels
    }

    /// Query parameters for one request, with `level` overriding the list
    pub(crate) fn query(&self, level: Option<&str>) -> Vec<(&'static str, String)> {
        let mut q = Vec::new();
        if let Some(status) = &self.status {
            q.push(("status", status.as_str().to_string()));
        }
        if let Some(level) = level {
            q.push(("level", level.to_string()));
        }
        if !self.environment.is_empty() {
            q.push(("environment", self.environment.clone()));
        }
        if !self.query.is_empty() {
            q.push(("query", self.query.clone()));
        }
        if let Some(from) = self.date_from {
            q.push(("date_from", api_datetime(from)));
        }
        if let Some(to) = self.date_to {
            q.push(("date_to", api_datetime(to)));
        }
        if self.page > 0 {
            q.push(("page", self.page.to_string()));
        }
        q
    }
}

/// Which occurrences to list
#[derive(Debug, Clone, Default)]
pub struct InstancesOptions {
    /// Internal item id; `None` lists across the project
    pub item_id: Option<i64>,
    pub page: u32,
}

impl InstancesOptions {
    pub(crate) fn path(&self) -> String {
        match self.item_id {
            Some(id) => format!("/item/{}/instances", id),
            None => "/instances".to_string(),
        }
    }

    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        if self.page > 0 {
            vec![("page", self.page.to_string())]
        } else {
            Vec::new()
        }
    }
}

/// Date filter format expected by the items endpoint
fn api_datetime(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// `{ "err": 0, "result": ... }`; a non-zero `err` carries a `message` instead
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub err: i64,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub message: String,
    #[serde(default = "Option::default")]
    pub result: Option<T>,
}

/// Error body on 4xx/5xx responses
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub err: i64,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ItemsPage {
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub items: Vec<Item>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InstancesPage {
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub instances: Vec<Instance>,
}
