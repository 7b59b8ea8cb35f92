//! Rollbar REST API client
//!
//! Every call is a single request against `/api/1` authenticated with a
//! project access token. Rate-limited requests are retried with backoff;
//! everything else fails fast.

use crate::types::{
    Envelope, ErrorBody, InstancesOptions, InstancesPage, ItemsOptions, ItemsPage,
};
use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use rollbar_core::{Instance, Item, ItemStatus, ProjectInfo, Result, RollbarError};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;

pub const BASE_URL: &str = "https://api.rollbar.com/api/1";
const ACCESS_TOKEN_HEADER: &str = "X-Rollbar-Access-Token";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// Rate limit retry configuration
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_SECS: u64 = 1;
const MAX_BACKOFF_SECS: u64 = 30;

/// Client for one project's access token
#[derive(Debug, Clone)]
pub struct RollbarClient {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl RollbarClient {
    /// Create a client against the public API
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("rollbar-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RollbarError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            access_token: access_token.into(),
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at another API root (e.g. a mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List items; a comma-separated level filter is fetched level by level
    /// and merged, keeping the first copy of each item
    pub async fn list_items(&self, opts: &ItemsOptions) -> Result<Vec<Item>> {
        let levels = opts.levels();
        if levels.len() <= 1 {
            return self.list_items_page(opts, levels.first().copied()).await;
        }

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for level in levels {
            for item in self.list_items_page(opts, Some(level)).await? {
                if seen.insert(item.id) {
                    merged.push(item);
                }
            }
        }
        tracing::debug!("Merged {} items across levels", merged.len());
        Ok(merged)
    }

    async fn list_items_page(&self, opts: &ItemsOptions, level: Option<&str>) -> Result<Vec<Item>> {
        let page: ItemsPage = self
            .request(Method::GET, "/items", &opts.query(level), None)
            .await?;
        Ok(page.items)
    }

    /// Fetch an item by its internal id
    pub async fn get_item(&self, id: i64) -> Result<Item> {
        self.request(Method::GET, &format!("/item/{}", id), &[], None)
            .await
    }

    /// Fetch an item by its project-local counter (`#123`)
    pub async fn get_item_by_counter(&self, counter: i64) -> Result<Item> {
        self.request(Method::GET, &format!("/item_by_counter/{}", counter), &[], None)
            .await
    }

    /// List occurrences of one item, or of the whole project
    pub async fn list_instances(&self, opts: &InstancesOptions) -> Result<Vec<Instance>> {
        let page: InstancesPage = self
            .request(Method::GET, &opts.path(), &opts.query(), None)
            .await?;
        Ok(page.instances)
    }

    /// Fetch a single occurrence
    pub async fn get_instance(&self, id: i64) -> Result<Instance> {
        self.request(Method::GET, &format!("/instance/{}", id), &[], None)
            .await
    }

    /// Project the access token belongs to
    pub async fn get_project_info(&self) -> Result<ProjectInfo> {
        self.request(Method::GET, "/project", &[], None).await
    }

    /// Change an item's status (needs a write-scoped token)
    pub async fn update_item_status(&self, id: i64, status: &ItemStatus) -> Result<Item> {
        let payload = serde_json::json!({ "status": status.as_str() });
        let item: Item = self
            .request(Method::PATCH, &format!("/item/{}", id), &[], Some(&payload))
            .await?;
        tracing::info!("Item {} status set to {}", id, status);
        Ok(item)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let (status, text) = self.send(method, path, query, body).await?;

        let envelope: Envelope<T> = serde_json::from_str(&text)?;
        match envelope.result {
            Some(result) if envelope.err == 0 => Ok(result),
            _ => Err(RollbarError::Api {
                status: status.as_u16(),
                code: envelope.err,
                message: if envelope.message.is_empty() {
                    "response carried no result".to_string()
                } else {
                    envelope.message
                },
            }),
        }
    }

    /// Send with rate-limit retries; returns the status and body of a non-error response
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<(StatusCode, String)> {
        let url = format!("{}{}", self.base_url, path);
        let mut retries = 0;
        let mut backoff_secs = INITIAL_BACKOFF_SECS;

        loop {
            tracing::debug!("{} {} (attempt {})", method, url, retries + 1);

            let mut request = self
                .http
                .request(method.clone(), &url)
                .header(ACCESS_TOKEN_HEADER, &self.access_token)
                .header(ACCEPT, "application/json");
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .map_err(|e| RollbarError::Http(format!("Failed to send request: {}", e)))?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                retries += 1;

                if retries > MAX_RETRIES {
                    let text = response.text().await.unwrap_or_default();
                    return Err(RollbarError::RateLimited(format!(
                        "still rate limited after {} retries: {}",
                        MAX_RETRIES,
                        text.trim()
                    )));
                }

                let wait_secs = retry_after(response.headers()).unwrap_or(backoff_secs);
                tracing::warn!(
                    "Rate limited (429). Waiting {} seconds before retry {}/{}",
                    wait_secs,
                    retries,
                    MAX_RETRIES
                );

                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                continue;
            }

            let text = response
                .text()
                .await
                .map_err(|e| RollbarError::Http(format!("Failed to read response: {}", e)))?;

            if status.is_client_error() || status.is_server_error() {
                return Err(api_error(status, &text));
            }
            return Ok((status, text));
        }
    }
}

/// `Retry-After` in whole seconds
fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// Prefer the envelope's message; fall back to the raw body
fn api_error(status: StatusCode, body: &str) -> RollbarError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.message.is_empty() => RollbarError::Api {
            status: status.as_u16(),
            code: parsed.err,
            message: parsed.message,
        },
        _ => RollbarError::Api {
            status: status.as_u16(),
            code: 0,
            message: body.trim().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_api_error_prefers_message() {
        let err = api_error(
            StatusCode::UNAUTHORIZED,
            r#"{"err": 1, "message": "invalid access token"}"#,
        );
        assert!(err.is_auth_error());
        assert_eq!(
            err.to_string(),
            "rollbar API error: invalid access token (status: 401, err: 1)"
        );

        let err = api_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>\n");
        match err {
            RollbarError::Api { status, code, message } => {
                assert_eq!(status, 502);
                assert_eq!(code, 0);
                assert_eq!(message, "<html>bad gateway</html>");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(7));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_base_url_override() {
        let client = RollbarClient::new("tok")
            .unwrap()
            .with_base_url("http://127.0.0.1:9999/api/1/");
        assert_eq!(client.base_url(), "http://127.0.0.1:9999/api/1");
        assert_eq!(RollbarClient::new("tok").unwrap().base_url(), BASE_URL);
    }
}
