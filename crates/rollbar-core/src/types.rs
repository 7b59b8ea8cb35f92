//! Core type definitions for Rollbar items and occurrences
//!
//! These are read-only views over API payloads. Every sub-object of an
//! occurrence is optional, and absence is an expected state rather than an
//! error, so consumers should go through the accessor methods which fold
//! "missing" and "present but empty" into `None` where that matters.

use crate::de;
use crate::level::{ItemStatus, Level};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Convert a Unix timestamp in seconds into an instant (`<= 0` means absent)
pub fn timestamp_to_time(ts: i64) -> Option<DateTime<Utc>> {
    if ts <= 0 {
        return None;
    }
    DateTime::from_timestamp(ts, 0)
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// A Rollbar item (error group)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Service-wide internal id
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub id: i64,
    /// Project-local counter shown to users as `#123`
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub counter: i64,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub title: String,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub environment: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub framework: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub platform: String,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub total_occurrences: i64,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub last_occurrence_timestamp: i64,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub first_occurrence_timestamp: i64,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub activating_occurrence_id: i64,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub project_id: i64,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub hash: String,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub unique_occurrences: i64,
}

impl Item {
    pub fn level_label(&self) -> &'static str {
        self.level.label()
    }

    pub fn last_occurrence_time(&self) -> Option<DateTime<Utc>> {
        timestamp_to_time(self.last_occurrence_timestamp)
    }

    pub fn first_occurrence_time(&self) -> Option<DateTime<Utc>> {
        timestamp_to_time(self.first_occurrence_timestamp)
    }
}

/// A single occurrence of an item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub id: i64,
    /// Owning item's internal id (lookup only)
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub item_id: i64,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub version: i64,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub data: InstanceData,
}

impl Instance {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        timestamp_to_time(self.timestamp)
    }

    /// One-line description: `Class: message` for traces, else the message body
    pub fn summary(&self) -> Option<String> {
        if let Some(trace) = self.data.body.primary_trace() {
            return Some(trace.exception.summary());
        }
        self.data.body.message_body().map(str::to_string)
    }
}

/// Occurrence payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceData {
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub body: Body,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub level: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub environment: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub framework: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub platform: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub language: String,
    #[serde(default)]
    pub request: Option<Request>,
    #[serde(default)]
    pub server: Option<Server>,
    #[serde(default)]
    pub person: Option<Person>,
    #[serde(default)]
    pub client: Option<ClientInfo>,
    #[serde(default)]
    pub custom: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub code_version: String,
}

impl InstanceData {
    /// Request, only when it carries a URL
    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref().filter(|r| !r.url.is_empty())
    }

    /// Person, only when it carries an id or an email
    pub fn person(&self) -> Option<&Person> {
        self.person.as_ref().filter(|p| p.is_identified())
    }

    /// Server, only when it carries a host
    pub fn server(&self) -> Option<&Server> {
        self.server.as_ref().filter(|s| !s.host.is_empty())
    }

    /// Browser string: client-reported value first, then the `User-Agent` header
    pub fn browser(&self) -> Option<&str> {
        self.client
            .as_ref()
            .and_then(|c| c.javascript.as_ref())
            .and_then(|js| non_empty(&js.browser))
            .or_else(|| self.request.as_ref().and_then(Request::user_agent))
    }
}

/// Error details of an occurrence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub trace: Option<Trace>,
    #[serde(default)]
    pub trace_chain: Option<Vec<Trace>>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub crash_report: Option<CrashReport>,
}

impl Body {
    /// The trace to analyze: `trace`, else the outermost entry of `trace_chain`
    pub fn primary_trace(&self) -> Option<&Trace> {
        self.trace
            .as_ref()
            .or_else(|| self.trace_chain.as_ref().and_then(|chain| chain.first()))
    }

    /// Plain message body, if present and non-empty
    pub fn message_body(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| non_empty(&m.body))
    }
}

/// A stack trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub exception: Exception,
    /// Outermost call first
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exception {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub class: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub message: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub description: String,
}

impl Exception {
    pub fn summary(&self) -> String {
        format!("{}: {}", self.class, self.message)
    }
}

/// One entry of a stack trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub filename: String,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub lineno: i64,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub colno: i64,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub method: String,
    /// The source line at `lineno`
    #[serde(default, deserialize_with = "de::lenient_opt_string")]
    pub code: Option<String>,
    #[serde(default)]
    pub context: Option<FrameContext>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub argspec: Vec<String>,
}

impl Frame {
    /// Source snippet, trimmed, when it has any content
    pub fn snippet(&self) -> Option<&str> {
        self.code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

/// Source lines around a frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameContext {
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub pre: Vec<String>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub post: Vec<String>,
}

/// Message-type error body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrashReport {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub raw: String,
}

/// HTTP request captured with an occurrence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub method: String,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
    #[serde(default, rename = "GET")]
    pub get: Option<serde_json::Value>,
    #[serde(default, rename = "POST")]
    pub post: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub body: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub user_ip: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub query_string: String,
}

impl Request {
    /// Case-insensitive header lookup; empty values count as absent
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| non_empty(value))
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header("User-Agent")
    }

    pub fn user_ip(&self) -> Option<&str> {
        non_empty(&self.user_ip)
    }
}

/// Server that reported the occurrence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub host: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub root: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub branch: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub code_version: String,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub argv: Vec<String>,
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub pid: i64,
}

impl Server {
    pub fn root(&self) -> Option<&str> {
        non_empty(&self.root)
    }

    pub fn branch(&self) -> Option<&str> {
        non_empty(&self.branch)
    }

    pub fn code_version(&self) -> Option<&str> {
        non_empty(&self.code_version)
    }
}

/// The affected user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Normalized to a string; the API may send a number
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "de::lenient_opt_string")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_opt_string")]
    pub email: Option<String>,
}

impl Person {
    pub fn id(&self) -> Option<&str> {
        non_empty(&self.id)
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().and_then(non_empty)
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().and_then(non_empty)
    }

    pub fn is_identified(&self) -> bool {
        self.id().is_some() || self.email().is_some()
    }
}

/// Client-side context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default)]
    pub javascript: Option<ClientJavaScript>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientJavaScript {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub browser: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub code_version: String,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub source_map_enabled: bool,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub guess_uncaught_frames: bool,
}

/// Project the access token belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_deserialize_lenient() {
        let item: Item = serde_json::from_str(
            r#"{
                "id": "272505123",
                "counter": 123,
                "title": "NoMethodError",
                "level": "error",
                "status": "active",
                "framework": null,
                "total_occurrences": 42,
                "last_occurrence_timestamp": 1700000000,
                "first_occurrence_timestamp": 0
            }"#,
        )
        .unwrap();

        assert_eq!(item.id, 272505123);
        assert_eq!(item.counter, 123);
        assert_eq!(item.level_label(), "error");
        assert_eq!(item.status, ItemStatus::Active);
        assert_eq!(item.framework, "");
        assert_eq!(
            item.last_occurrence_time(),
            DateTime::from_timestamp(1_700_000_000, 0)
        );
        assert_eq!(item.first_occurrence_time(), None);
    }

    #[test]
    fn test_item_json_round_trip() {
        let item = Item {
            id: 9,
            counter: 77,
            title: "Boom".to_string(),
            level: Level(50),
            status: ItemStatus::Muted,
            environment: "staging".to_string(),
            framework: "rails".to_string(),
            platform: "linux".to_string(),
            total_occurrences: 3,
            last_occurrence_timestamp: 1_700_000_100,
            first_occurrence_timestamp: 1_700_000_000,
            activating_occurrence_id: 5,
            project_id: 1,
            hash: "abc".to_string(),
            unique_occurrences: 2,
        };
        let json = serde_json::to_string(&item).unwrap();
        let back: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_instance_time_and_summary() {
        let instance: Instance = serde_json::from_str(
            r#"{
                "id": 1,
                "timestamp": 1700000000,
                "data": {
                    "level": "error",
                    "body": {"trace": {"exception": {"class": "KeyError", "message": "missing"}, "frames": []}}
                }
            }"#,
        )
        .unwrap();
        assert!(instance.time().is_some());
        assert_eq!(instance.summary().as_deref(), Some("KeyError: missing"));

        let message: Instance =
            serde_json::from_str(r#"{"id": 2, "data": {"body": {"message": {"body": "hello"}}}}"#)
                .unwrap();
        assert_eq!(message.time(), None);
        assert_eq!(message.summary().as_deref(), Some("hello"));
    }

    #[test]
    fn test_primary_trace_falls_back_to_chain() {
        let body: Body = serde_json::from_str(
            r#"{"trace_chain": [
                {"exception": {"class": "Outer", "message": "a"}, "frames": []},
                {"exception": {"class": "Inner", "message": "b"}, "frames": []}
            ]}"#,
        )
        .unwrap();
        assert_eq!(body.primary_trace().unwrap().exception.class, "Outer");
        assert_eq!(Body::default().primary_trace(), None);
    }

    #[test]
    fn test_person_id_number() {
        let person: Person = serde_json::from_str(r#"{"id": 12345, "email": null}"#).unwrap();
        assert_eq!(person.id(), Some("12345"));
        assert_eq!(person.email(), None);
        assert!(person.is_identified());

        let empty = Person {
            email: Some(String::new()),
            ..Default::default()
        };
        assert!(!empty.is_identified());
    }

    #[test]
    fn test_section_accessors_require_identifying_field() {
        let data = InstanceData {
            request: Some(Request::default()),
            server: Some(Server {
                branch: "main".into(),
                ..Default::default()
            }),
            person: Some(Person {
                email: Some("a@b.c".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(data.request().is_none());
        assert!(data.server().is_none());
        assert_eq!(data.person().and_then(Person::email), Some("a@b.c"));
    }

    #[test]
    fn test_browser_prefers_client_report() {
        let mut headers = BTreeMap::new();
        headers.insert("user-agent".to_string(), "curl/8.0".to_string());
        let mut data = InstanceData {
            request: Some(Request {
                url: "https://example.com".into(),
                headers,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(data.browser(), Some("curl/8.0"));

        data.client = Some(ClientInfo {
            javascript: Some(ClientJavaScript {
                browser: "Firefox 120".into(),
                ..Default::default()
            }),
        });
        assert_eq!(data.browser(), Some("Firefox 120"));

        data.client = None;
        data.request = None;
        assert_eq!(data.browser(), None);
    }

    #[test]
    fn test_frame_snippet() {
        let frame = Frame {
            code: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(frame.snippet(), None);
        let frame = Frame {
            code: Some("  user.save!  ".into()),
            ..Default::default()
        };
        assert_eq!(frame.snippet(), Some("user.save!"));
    }
}
