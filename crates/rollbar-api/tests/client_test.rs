//! Client tests against an in-process mock of the Rollbar API

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use rollbar_api::{InstancesOptions, ItemsOptions, RollbarClient};
use rollbar_core::{ItemStatus, RollbarError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const TOKEN: &str = "test-token";

#[derive(Default)]
struct Recorder {
    hits: AtomicUsize,
    queries: Mutex<Vec<HashMap<String, String>>>,
    bodies: Mutex<Vec<Value>>,
}

type Shared = Arc<Recorder>;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api/1", addr)
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("x-rollbar-access-token")
        .and_then(|v| v.to_str().ok())
        == Some(TOKEN)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"err": 1, "message": "invalid access token"})),
    )
        .into_response()
}

fn item_json(id: i64, counter: i64, level: &str) -> Value {
    json!({
        "id": id,
        "counter": counter,
        "title": format!("Error {}", counter),
        "level": level,
        "status": "active",
        "total_occurrences": 3,
        "last_occurrence_timestamp": 1705320000
    })
}

async fn list_items(
    State(rec): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    rec.hits.fetch_add(1, Ordering::SeqCst);
    rec.queries.lock().unwrap().push(params.clone());

    let items = match params.get("level").map(String::as_str) {
        Some("error") => vec![item_json(1, 10, "error"), item_json(2, 11, "error")],
        Some("critical") => vec![item_json(3, 12, "critical"), item_json(2, 11, "error")],
        _ => vec![item_json(1, 10, "error")],
    };
    Json(json!({"err": 0, "result": {"items": items, "page": 1}})).into_response()
}

async fn item_by_counter(headers: HeaderMap, Path(counter): Path<i64>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if counter == 404 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"err": 1, "message": "Item not found"})),
        )
            .into_response();
    }
    Json(json!({"err": 0, "result": item_json(900 + counter, counter, "warning")})).into_response()
}

async fn patch_item(
    State(rec): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    rec.bodies.lock().unwrap().push(body.clone());
    let mut item = item_json(id, 5, "error");
    item["status"] = body["status"].clone();
    Json(json!({"err": 0, "result": item})).into_response()
}

async fn item_instances(
    State(rec): State<Shared>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    rec.queries.lock().unwrap().push(params);
    Json(json!({"err": 0, "result": {"instances": [
        {"id": 7001, "item_id": id, "timestamp": 1705320000, "data": {
            "level": "error",
            "body": {"trace": {"exception": {"class": "KeyError", "message": "missing"}, "frames": [
                {"filename": "/app/app/models/user.rb", "lineno": "12", "method": "name"}
            ]}},
            "person": {"id": 42}
        }},
        {"id": 7000, "item_id": id, "timestamp": 1705310000, "data": {"body": {"message": {"body": "hi"}}}}
    ], "page": 1}}))
    .into_response()
}

async fn project() -> Json<Value> {
    Json(json!({"err": 0, "result": {"id": 123, "name": "shop"}}))
}

fn router(rec: Shared) -> Router {
    Router::new()
        .route("/api/1/items", get(list_items))
        .route("/api/1/item_by_counter/:counter", get(item_by_counter))
        .route("/api/1/item/:id", axum::routing::patch(patch_item))
        .route("/api/1/item/:id/instances", get(item_instances))
        .route("/api/1/project", get(project))
        .with_state(rec)
}

async fn client() -> (RollbarClient, Shared) {
    let rec = Shared::default();
    let base = serve(router(rec.clone())).await;
    let client = RollbarClient::new(TOKEN).unwrap().with_base_url(base);
    (client, rec)
}

#[tokio::test]
async fn test_list_items_single_level() {
    let (client, rec) = client().await;
    let opts = ItemsOptions {
        status: Some(ItemStatus::Active),
        environment: "production".to_string(),
        ..Default::default()
    };

    let items = client.list_items(&opts).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].counter, 10);
    assert_eq!(items[0].level_label(), "error");

    let queries = rec.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].get("status").map(String::as_str), Some("active"));
    assert_eq!(
        queries[0].get("environment").map(String::as_str),
        Some("production")
    );
    assert!(!queries[0].contains_key("level"));
}

#[tokio::test]
async fn test_list_items_merges_levels() {
    let (client, rec) = client().await;
    let opts = ItemsOptions {
        level: "error,critical".to_string(),
        ..Default::default()
    };

    let items = client.list_items(&opts).await.unwrap();
    let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(rec.hits.load(Ordering::SeqCst), 2);

    let queries = rec.queries.lock().unwrap();
    assert!(queries.iter().all(|q| !q.contains_key("status")));
}

#[tokio::test]
async fn test_get_item_by_counter() {
    let (client, _) = client().await;
    let item = client.get_item_by_counter(42).await.unwrap();
    assert_eq!(item.counter, 42);
    assert_eq!(item.id, 942);
    assert_eq!(item.level_label(), "warning");
}

#[tokio::test]
async fn test_not_found_maps_to_api_error() {
    let (client, _) = client().await;
    let err = client.get_item_by_counter(404).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("Item not found"));
}

#[tokio::test]
async fn test_bad_token_is_auth_error() {
    let rec = Shared::default();
    let base = serve(router(rec)).await;
    let client = RollbarClient::new("wrong").unwrap().with_base_url(base);

    let err = client.list_items(&ItemsOptions::default()).await.unwrap_err();
    assert!(err.is_auth_error());
    match err {
        RollbarError::Api { code, message, .. } => {
            assert_eq!(code, 1);
            assert_eq!(message, "invalid access token");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_list_instances_for_item() {
    let (client, rec) = client().await;
    let opts = InstancesOptions {
        item_id: Some(55),
        page: 2,
    };

    let instances = client.list_instances(&opts).await.unwrap();
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].item_id, 55);
    assert_eq!(instances[0].data.body.primary_trace().unwrap().frames[0].lineno, 12);
    assert_eq!(instances[0].data.person().unwrap().id, "42");
    assert_eq!(instances[1].summary().as_deref(), Some("hi"));

    let queries = rec.queries.lock().unwrap();
    assert_eq!(queries[0].get("page").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn test_update_item_status() {
    let (client, rec) = client().await;
    let item = client
        .update_item_status(77, &ItemStatus::Resolved)
        .await
        .unwrap();
    assert_eq!(item.id, 77);
    assert_eq!(item.status, ItemStatus::Resolved);

    let bodies = rec.bodies.lock().unwrap();
    assert_eq!(bodies.as_slice(), &[json!({"status": "resolved"})]);
}

#[tokio::test]
async fn test_project_info() {
    let (client, _) = client().await;
    let info = client.get_project_info().await.unwrap();
    assert_eq!(info.id, 123);
    assert_eq!(info.name, "shop");
}

async fn always_limited(State(rec): State<Shared>) -> Response {
    rec.hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::TOO_MANY_REQUESTS,
        [("retry-after", "0")],
        "slow down",
    )
        .into_response()
}

async fn limited_once(State(rec): State<Shared>) -> Response {
    if rec.hits.fetch_add(1, Ordering::SeqCst) == 0 {
        return (StatusCode::TOO_MANY_REQUESTS, [("retry-after", "0")], "").into_response();
    }
    Json(json!({"err": 0, "result": {"id": 1, "name": "retried"}})).into_response()
}

#[tokio::test]
async fn test_rate_limit_retry_then_success() {
    let rec = Shared::default();
    let app = Router::new()
        .route("/api/1/project", get(limited_once))
        .with_state(rec.clone());
    let client = RollbarClient::new(TOKEN)
        .unwrap()
        .with_base_url(serve(app).await);

    let info = client.get_project_info().await.unwrap();
    assert_eq!(info.name, "retried");
    assert_eq!(rec.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_rate_limit_exhausted() {
    let rec = Shared::default();
    let app = Router::new()
        .route("/api/1/project", get(always_limited))
        .with_state(rec.clone());
    let client = RollbarClient::new(TOKEN)
        .unwrap()
        .with_base_url(serve(app).await);

    let err = client.get_project_info().await.unwrap_err();
    assert!(err.is_rate_limited());
    assert!(matches!(err, RollbarError::RateLimited(_)));
    // First attempt plus three retries
    assert_eq!(rec.hits.load(Ordering::SeqCst), 4);
}
