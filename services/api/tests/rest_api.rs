//! services/api/tests/rest_api.rs
//!
//! Integration tests driving the complete router against an in-memory SQLite
//! database and a stubbed plan-generation service.

use api_lib::adapters::DbAdapter;
use api_lib::config::Config;
use api_lib::web::dashboard::{month_start, week_start};
use api_lib::web::rest::{ModuleResponse, RecommendationResponse, SessionResponse};
use api_lib::web::state::AppState;
use api_lib::web::build_router;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use study_tracker_core::ports::{PlanGenerationService, PortError, PortResult};
use tower::ServiceExt;

//=========================================================================================
// Test Harness
//=========================================================================================

/// A stand-in for the external text-generation service. Records how often it
/// was called and returns a canned reply or error.
struct StubPlanService {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl StubPlanService {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlanGenerationService for StubPlanService {
    async fn generate_plan(&self, _prompt: &str) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(PortError::Unexpected(message.clone())),
        }
    }
}

fn test_config(api_key: Option<&str>) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().expect("valid address"),
        database_url: "sqlite::memory:".to_string(),
        log_level: tracing::Level::INFO,
        static_dir: "./static".into(),
        secret_key: "test-secret".to_string(),
        openai_api_key: api_key.map(String::from),
        plan_model: "gpt-4o-mini".to_string(),
        plan_temperature: 0.7,
        plan_max_tokens: 256,
        plan_timeout_secs: 5,
    }
}

async fn test_app(api_key: Option<&str>, plan: Arc<dyn PlanGenerationService>) -> Router {
    // A single connection keeps every request on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    let db = Arc::new(DbAdapter::new(pool));
    db.ensure_schema().await.expect("schema");

    let state = Arc::new(AppState {
        db,
        plan,
        config: Arc::new(test_config(api_key)),
    });
    build_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, value)
}

async fn create_module(app: &Router, name: &str, target_hours: f64) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/modules",
        Some(json!({ "name": name, "target_hours": target_hours })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().expect("module id")
}

async fn create_session(app: &Router, module_id: i64, duration: f64, date: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/sessions",
        Some(json!({ "module_id": module_id, "duration": duration, "date": date })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().expect("session id")
}

//=========================================================================================
// Module Endpoints
//=========================================================================================

#[tokio::test]
async fn new_module_starts_with_zero_progress() {
    let app = test_app(None, StubPlanService::replying("plan")).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/modules",
        Some(json!({ "name": "Algorithms", "target_hours": 40.0, "exam_date": "2026-09-20" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Algorithms");
    assert_eq!(body["target_hours"], 40.0);
    assert_eq!(body["exam_date"], "2026-09-20");
    assert_eq!(body["actual_hours"], 0.0);
    assert_eq!(body["progress_percentage"], 0.0);
}

#[tokio::test]
async fn module_creation_validates_input() {
    let app = test_app(None, StubPlanService::replying("plan")).await;

    let (status, body) = send(&app, "POST", "/api/modules", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/api/modules",
        Some(json!({ "name": "Algorithms", "target_hours": -1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/modules",
        Some(json!({ "name": "Algorithms", "target_hours": 10.0, "exam_date": "20.09.2026" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("YYYY-MM-DD"));

    let (_, list) = send(&app, "GET", "/api/modules", None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn zero_target_module_never_divides_by_zero() {
    let app = test_app(None, StubPlanService::replying("plan")).await;
    let module_id = create_module(&app, "Electives", 0.0).await;
    create_session(&app, module_id, 2.5, "2026-01-10").await;

    let (status, body) = send(&app, "GET", &format!("/api/modules/{}", module_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["actual_hours"], 2.5);
    assert_eq!(body["progress_percentage"], 0.0);
}

#[tokio::test]
async fn module_detail_includes_sessions_and_progress() {
    let app = test_app(None, StubPlanService::replying("plan")).await;
    let module_id = create_module(&app, "Databases", 40.0).await;
    create_session(&app, module_id, 2.0, "2026-01-10").await;
    create_session(&app, module_id, 8.0, "2026-01-12").await;

    let (status, body) = send(&app, "GET", &format!("/api/modules/{}", module_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["actual_hours"], 10.0);
    assert_eq!(body["progress_percentage"], 25.0);

    let sessions = body["sessions"].as_array().expect("sessions array");
    assert_eq!(sessions.len(), 2);
    // Most recent date first, module name resolved on every session.
    assert_eq!(sessions[0]["date"], "2026-01-12");
    assert_eq!(sessions[0]["module_name"], "Databases");
}

#[tokio::test]
async fn missing_module_is_404() {
    let app = test_app(None, StubPlanService::replying("plan")).await;

    let (status, body) = send(&app, "GET", "/api/modules/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "DELETE", "/api/modules/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_module_cascades_to_its_sessions() {
    let app = test_app(None, StubPlanService::replying("plan")).await;
    let module_id = create_module(&app, "Statistics", 30.0).await;
    let session_id = create_session(&app, module_id, 1.5, "2026-01-05").await;
    create_session(&app, module_id, 2.5, "2026-01-06").await;

    let (status, body) = send(&app, "DELETE", &format!("/api/modules/{}", module_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("Statistics"));

    let (status, _) = send(&app, "GET", &format!("/api/modules/{}", module_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, sessions) = send(&app, "GET", "/api/sessions", None).await;
    assert_eq!(sessions.as_array().unwrap().len(), 0);

    let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{}", session_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//=========================================================================================
// Session Endpoints
//=========================================================================================

#[tokio::test]
async fn session_creation_validates_input() {
    let app = test_app(None, StubPlanService::replying("plan")).await;
    let module_id = create_module(&app, "Networks", 20.0).await;

    let (status, _) = send(&app, "POST", "/api/sessions", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/sessions",
        Some(json!({ "module_id": module_id, "duration": 0.0, "date": "2026-01-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/sessions",
        Some(json!({ "module_id": 999, "duration": 1.0, "date": "2026-01-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/api/sessions",
        Some(json!({ "module_id": module_id, "duration": 1.0, "date": "Jan 10" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // None of the rejected requests left a row behind.
    let (_, sessions) = send(&app, "GET", "/api/sessions", None).await;
    assert_eq!(sessions.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn sessions_are_listed_by_date_descending_with_limit() {
    let app = test_app(None, StubPlanService::replying("plan")).await;
    let module_id = create_module(&app, "Compilers", 50.0).await;
    create_session(&app, module_id, 1.0, "2026-01-01").await;
    create_session(&app, module_id, 2.0, "2026-03-01").await;
    create_session(&app, module_id, 3.0, "2026-02-01").await;

    let (status, body) = send(&app, "GET", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2026-03-01", "2026-02-01", "2026-01-01"]);

    let (_, body) = send(&app, "GET", "/api/sessions?limit=2", None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["date"], "2026-03-01");
}

//=========================================================================================
// Dashboard
//=========================================================================================

#[tokio::test]
async fn dashboard_aggregates_inclusive_date_windows() {
    let app = test_app(None, StubPlanService::replying("plan")).await;
    let module_id = create_module(&app, "Analysis", 60.0).await;

    let today = Utc::now().date_naive();
    let monday = week_start(today);
    create_session(&app, module_id, 2.0, &today.format("%Y-%m-%d").to_string()).await;
    create_session(&app, module_id, 3.5, &monday.format("%Y-%m-%d").to_string()).await;
    // Clearly outside every window.
    create_session(&app, module_id, 10.0, "2020-01-01").await;

    let (status, body) = send(&app, "GET", "/api/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);

    let stats = &body["statistics"];
    let expected_today = if monday == today { 5.5 } else { 2.0 };
    assert_eq!(stats["hours_today"], expected_today);
    assert_eq!(stats["hours_week"], 5.5);
    // The week may have started in the previous month; the month window only
    // picks up the Monday session when it did not.
    let expected_month = if monday >= month_start(today) { 5.5 } else { 2.0 };
    assert_eq!(stats["hours_month"], expected_month);
    assert_eq!(stats["sessions_week"], 2);
    assert_eq!(stats["total_modules"], 1);
    assert_eq!(body["modules"][0]["actual_hours"], 15.5);
    assert!(body["last_recommendation"].is_null());
}

//=========================================================================================
// AI Recommendation Proxy
//=========================================================================================

#[tokio::test]
async fn recommend_requires_a_real_api_key() {
    for key in [None, Some("your-api-key-here"), Some("")] {
        let stub = StubPlanService::replying("plan");
        let app = test_app(key, stub.clone()).await;
        create_module(&app, "Databases", 10.0).await;

        let (status, body) = send(&app, "POST", "/api/recommend", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].is_string());
        assert!(body["message"].is_string());
        // The external service is never contacted on a configuration error.
        assert_eq!(stub.call_count(), 0);
    }
}

#[tokio::test]
async fn recommend_requires_at_least_one_module() {
    let stub = StubPlanService::replying("plan");
    let app = test_app(Some("sk-test"), stub.clone()).await;

    let (status, body) = send(&app, "POST", "/api/recommend", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(stub.call_count(), 0);

    // No recommendation row was created.
    let (status, body) = send(&app, "GET", "/api/recommend", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn recommend_persists_and_returns_the_generated_plan() {
    let stub = StubPlanService::replying("Day 1: Databases, 2 hours");
    let app = test_app(Some("sk-test"), stub.clone()).await;
    create_module(&app, "Databases", 10.0).await;

    let (status, body) = send(&app, "POST", "/api/recommend", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["recommendation_text"], "Day 1: Databases, 2 hours");
    assert_eq!(stub.call_count(), 1);

    let (status, body) = send(&app, "GET", "/api/recommend", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommendation_text"], "Day 1: Databases, 2 hours");

    let (_, dashboard) = send(&app, "GET", "/api/dashboard", None).await;
    assert_eq!(
        dashboard["last_recommendation"]["recommendation_text"],
        "Day 1: Databases, 2 hours"
    );
}

#[tokio::test]
async fn recommend_maps_upstream_failures_to_500() {
    let stub = StubPlanService::failing("connection reset");
    let app = test_app(Some("sk-test"), stub.clone()).await;
    create_module(&app, "Databases", 10.0).await;

    let (status, body) = send(&app, "POST", "/api/recommend", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "AI generation failed");
    assert!(body["message"].as_str().unwrap().contains("connection reset"));

    // The failed call persisted nothing.
    let (status, _) = send(&app, "GET", "/api/recommend", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//=========================================================================================
// Misc
//=========================================================================================

#[tokio::test]
async fn unknown_api_routes_return_a_json_404() {
    let app = test_app(None, StubPlanService::replying("plan")).await;
    let (status, body) = send(&app, "GET", "/api/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Resource not found");
}

#[tokio::test]
async fn serialized_entities_survive_a_round_trip() {
    let app = test_app(Some("sk-test"), StubPlanService::replying("a plan")).await;
    let module_id = create_module(&app, "Databases", 10.0).await;
    create_session(&app, module_id, 1.25, "2026-01-10").await;
    send(&app, "POST", "/api/recommend", None).await;

    let (_, module) = send(&app, "GET", &format!("/api/modules/{}", module_id), None).await;
    let parsed: ModuleResponse = serde_json::from_value(module.clone()).expect("module parses");
    assert_eq!(serde_json::to_value(&parsed).expect("module serializes"), module);

    let (_, sessions) = send(&app, "GET", "/api/sessions", None).await;
    let session = sessions[0].clone();
    let parsed: SessionResponse = serde_json::from_value(session.clone()).expect("session parses");
    assert_eq!(serde_json::to_value(&parsed).expect("session serializes"), session);

    let (_, recommendation) = send(&app, "GET", "/api/recommend", None).await;
    let parsed: RecommendationResponse =
        serde_json::from_value(recommendation.clone()).expect("recommendation parses");
    assert_eq!(
        serde_json::to_value(&parsed).expect("recommendation serializes"),
        recommendation
    );
}
