// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /api/dashboard (before and after a refresh)
// - POST /api/refresh, /api/language, /api/interval
// - GET /api/history

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use common::{ManualClock, Scripted, ScriptedClient, SAMPLE_TEXT};
use egypt_gold_dashboard::ai::MockClient;
use egypt_gold_dashboard::api::{self, AppState};
use egypt_gold_dashboard::market::Language;
use egypt_gold_dashboard::scheduler::Scheduler;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn mock_scheduler() -> Scheduler {
    Scheduler::new(Arc::new(MockClient), Language::En, Duration::from_secs(1800))
}

fn test_router(scheduler: Scheduler) -> Router {
    api::router(AppState::new(scheduler))
}

async fn read_json(resp: shuttle_axum::axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn post_json(uri: &str, payload: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router(mock_scheduler());
    let resp = app.oneshot(get("/health")).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    assert_eq!(String::from_utf8(bytes).unwrap().trim(), "ok");
}

#[tokio::test]
async fn dashboard_before_first_fetch_has_null_data() {
    let app = test_router(mock_scheduler());
    let resp = app.oneshot(get("/api/dashboard")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = read_json(resp).await;
    assert_eq!(v["language"], "en");
    assert_eq!(v["interval_ms"], 1_800_000);
    assert_eq!(v["state"]["is_loading"], false);
    assert!(v["state"]["last_error"].is_null());
    assert!(v["state"]["retry_label"].is_null());
    assert!(v["snapshot"].is_null());
    assert!(v["analysis"].is_null());
    assert!(v["state"]["seconds_until_next_update"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn dashboard_after_refresh_exposes_snapshot_and_analysis() {
    let scheduler = mock_scheduler();
    scheduler.request_refresh().unwrap().await.unwrap();

    let app = test_router(scheduler);
    let v = read_json(app.oneshot(get("/api/dashboard")).await.unwrap()).await;

    // Contract checks for UI consumers
    let snap = &v["snapshot"];
    assert_eq!(snap["price21k"], 3990.0);
    assert_eq!(snap["usdRate"], 48.6);
    assert_eq!(snap["workmanshipMin"], 70.0);
    assert!(snap["lastUpdated"].is_string());

    let analysis = &v["analysis"];
    assert_eq!(analysis["prediction"], "UP");
    assert_eq!(analysis["news"].as_array().unwrap().len(), 3);
    // Mock returns a duplicated citation; only distinct urls are exposed.
    assert_eq!(analysis["sources"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn refresh_is_accepted_once_while_in_flight() {
    let gate = Arc::new(tokio::sync::Notify::new());
    let client = ScriptedClient::gated(vec![Scripted::Text(SAMPLE_TEXT)], gate.clone());
    let scheduler = Scheduler::with_clock(
        client.clone(),
        Language::En,
        Duration::from_secs(1800),
        ManualClock::new(),
    );
    let app = test_router(scheduler.clone());

    let r1 = app
        .clone()
        .oneshot(post_json("/api/refresh", json!({})))
        .await
        .unwrap();
    assert_eq!(r1.status(), StatusCode::ACCEPTED);
    assert_eq!(read_json(r1).await["started"], true);

    let r2 = app
        .clone()
        .oneshot(post_json("/api/refresh", json!({})))
        .await
        .unwrap();
    assert_eq!(read_json(r2).await["started"], false);

    let v = read_json(app.oneshot(get("/api/dashboard")).await.unwrap()).await;
    assert_eq!(v["state"]["is_loading"], true);

    gate.notify_one();
    for _ in 0..100 {
        if !scheduler.state().is_loading {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(client.call_count(), 1);
    assert!(scheduler.report().is_some());
}

#[tokio::test]
async fn language_switch_validates_input() {
    let scheduler = mock_scheduler();
    let app = test_router(scheduler.clone());

    let bad = app
        .clone()
        .oneshot(post_json("/api/language", json!({"language": "fr"})))
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let ok = app
        .oneshot(post_json("/api/language", json!({"language": "ar"})))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::ACCEPTED);
    let v = read_json(ok).await;
    assert_eq!(v["language"], "ar");
    assert_eq!(v["started"], true);
    assert_eq!(scheduler.snapshot().language, Language::Ar);
}

#[tokio::test]
async fn interval_change_is_clamped_and_echoed() {
    let scheduler = mock_scheduler();
    let app = test_router(scheduler.clone());

    let v = read_json(
        app.clone()
            .oneshot(post_json("/api/interval", json!({"interval_ms": 300_000})))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(v["interval_ms"], 300_000);
    assert_eq!(scheduler.snapshot().interval, Duration::from_secs(300));

    let v = read_json(
        app.oneshot(post_json("/api/interval", json!({"interval_ms": 0})))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(v["interval_ms"], 1000);
}

#[tokio::test]
async fn history_uses_range_and_degrades_to_empty() {
    let app = test_router(mock_scheduler());
    let v = read_json(app.oneshot(get("/api/history?range=1W")).await.unwrap()).await;
    assert_eq!(v["range"], "1W");
    assert_eq!(v["history"].as_array().unwrap().len(), 7);
    assert!(v["history"][0]["usdRate"].is_number());

    // Scripted client fails history requests; unknown range falls back to 1M.
    let failing = Scheduler::new(
        ScriptedClient::new(vec![]),
        Language::En,
        Duration::from_secs(1800),
    );
    let app = test_router(failing);
    let v = read_json(app.oneshot(get("/api/history?range=5Y")).await.unwrap()).await;
    assert_eq!(v["range"], "1M");
    assert!(v["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn failed_fetch_exposes_localized_error_and_retry_label() {
    let scheduler = Scheduler::with_clock(
        ScriptedClient::new(vec![Scripted::Fail]),
        Language::Ar,
        Duration::from_secs(1800),
        ManualClock::new(),
    );
    scheduler.request_refresh().unwrap().await.unwrap();

    let app = test_router(scheduler);
    let v = read_json(app.oneshot(get("/api/dashboard")).await.unwrap()).await;
    let ar = egypt_gold_dashboard::i18n::messages(Language::Ar);
    assert_eq!(v["state"]["last_error"], ar.fetch_failed);
    assert_eq!(v["state"]["retry_label"], ar.retry);
    assert!(v["snapshot"].is_null());
}
