//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the module and session REST endpoints, the
//! shared response payloads, and the master definition for the OpenAPI
//! specification.

use crate::error::ApiError;
use crate::web::state::AppState;
use crate::web::{dashboard, recommend};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_tracker_core::domain::{round_hours, Module, Recommendation, StudySession};
use study_tracker_core::ports::PortError;
use tracing::info;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_module_handler,
        list_modules_handler,
        get_module_handler,
        delete_module_handler,
        create_session_handler,
        list_sessions_handler,
        delete_session_handler,
        dashboard::dashboard_handler,
        recommend::create_recommendation_handler,
        recommend::get_recommendation_handler,
    ),
    components(
        schemas(
            CreateModuleRequest,
            CreateSessionRequest,
            ModuleResponse,
            SessionResponse,
            RecommendationResponse,
            MessageResponse,
            dashboard::DashboardResponse,
            dashboard::DashboardStatistics,
        )
    ),
    tags(
        (name = "Study Tracker API", description = "API endpoints for tracking study modules, sessions and AI study plans.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The request payload for creating a module.
#[derive(Deserialize, ToSchema)]
pub struct CreateModuleRequest {
    pub name: Option<String>,
    pub target_hours: Option<f64>,
    /// Exam date as a `YYYY-MM-DD` string.
    pub exam_date: Option<String>,
}

/// The request payload for logging a study session.
#[derive(Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub module_id: Option<i64>,
    pub duration: Option<f64>,
    /// Session date as a `YYYY-MM-DD` string.
    pub date: Option<String>,
    pub notes: Option<String>,
}

/// Query parameters for listing sessions.
#[derive(Deserialize)]
pub struct SessionListQuery {
    pub limit: Option<i64>,
}

/// A module serialized for the API, including the derived progress fields.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ModuleResponse {
    pub id: i64,
    pub name: String,
    pub target_hours: f64,
    pub exam_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub actual_hours: f64,
    pub progress_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<Vec<SessionResponse>>,
}

impl ModuleResponse {
    pub fn from_domain(module: &Module) -> Self {
        Self {
            id: module.id,
            name: module.name.clone(),
            target_hours: module.target_hours,
            exam_date: module.exam_date,
            created_at: module.created_at,
            actual_hours: round_hours(module.actual_hours),
            progress_percentage: module.progress_percentage(),
            sessions: None,
        }
    }

    pub fn with_sessions(module: &Module, sessions: &[StudySession]) -> Self {
        let mut response = Self::from_domain(module);
        response.sessions = Some(sessions.iter().map(SessionResponse::from_domain).collect());
        response
    }
}

/// A study session serialized for the API. `module_name` is resolved at read
/// time and is `null` if the owning module no longer exists.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: i64,
    pub module_id: i64,
    pub module_name: Option<String>,
    pub duration: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionResponse {
    pub fn from_domain(session: &StudySession) -> Self {
        Self {
            id: session.id,
            module_id: session.module_id,
            module_name: session.module_name.clone(),
            duration: session.duration,
            date: session.date,
            notes: session.notes.clone(),
            created_at: session.created_at,
        }
    }
}

/// An AI recommendation serialized for the API.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RecommendationResponse {
    pub id: i64,
    pub recommendation_text: String,
    pub created_at: DateTime<Utc>,
}

impl RecommendationResponse {
    pub fn from_domain(recommendation: &Recommendation) -> Self {
        Self {
            id: recommendation.id,
            recommendation_text: recommendation.recommendation_text.clone(),
            created_at: recommendation.created_at,
        }
    }
}

/// A plain confirmation message.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Parses a `YYYY-MM-DD` date string; `None` for anything else.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

const INVALID_DATE: &str = "Invalid date format. Use YYYY-MM-DD";

//=========================================================================================
// Module Handlers
//=========================================================================================

/// Create a new study module.
#[utoipa::path(
    post,
    path = "/api/modules",
    request_body = CreateModuleRequest,
    responses(
        (status = 201, description = "Module created successfully", body = ModuleResponse),
        (status = 400, description = "Missing or invalid field")
    )
)]
pub async fn create_module_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateModuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let (name, target_hours) = match (name, body.target_hours) {
        (Some(name), Some(target_hours)) => (name, target_hours),
        _ => {
            return Err(ApiError::Validation(
                "name and target_hours are required".to_string(),
            ))
        }
    };

    if target_hours < 0.0 {
        return Err(ApiError::Validation(
            "target_hours must not be negative".to_string(),
        ));
    }

    let exam_date = match body.exam_date.as_deref().filter(|d| !d.is_empty()) {
        Some(raw) => Some(
            parse_date(raw).ok_or_else(|| ApiError::Validation(INVALID_DATE.to_string()))?,
        ),
        None => None,
    };

    let module = state.db.create_module(name, target_hours, exam_date).await?;
    info!("Created module: {} (ID: {})", module.name, module.id);

    Ok((StatusCode::CREATED, Json(ModuleResponse::from_domain(&module))))
}

/// List all modules with their derived progress fields.
#[utoipa::path(
    get,
    path = "/api/modules",
    responses(
        (status = 200, description = "All modules", body = [ModuleResponse])
    )
)]
pub async fn list_modules_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let modules = state.db.list_modules().await?;
    let response: Vec<ModuleResponse> = modules.iter().map(ModuleResponse::from_domain).collect();
    Ok(Json(response))
}

/// Fetch one module including its full session list.
#[utoipa::path(
    get,
    path = "/api/modules/{id}",
    params(("id" = i64, Path, description = "Module ID")),
    responses(
        (status = 200, description = "Module details", body = ModuleResponse),
        (status = 404, description = "Module not found")
    )
)]
pub async fn get_module_handler(
    State(state): State<Arc<AppState>>,
    Path(module_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let module = state.db.get_module(module_id).await?;
    let sessions = state.db.sessions_for_module(module_id).await?;
    Ok(Json(ModuleResponse::with_sessions(&module, &sessions)))
}

/// Delete a module and every session logged against it.
#[utoipa::path(
    delete,
    path = "/api/modules/{id}",
    params(("id" = i64, Path, description = "Module ID")),
    responses(
        (status = 200, description = "Module deleted", body = MessageResponse),
        (status = 404, description = "Module not found")
    )
)]
pub async fn delete_module_handler(
    State(state): State<Arc<AppState>>,
    Path(module_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let module = state.db.get_module(module_id).await?;
    let removed_sessions = state.db.delete_module(module_id).await?;
    info!(
        "Deleted module: {} (ID: {}, sessions removed: {})",
        module.name, module_id, removed_sessions
    );

    Ok(Json(MessageResponse {
        message: format!("Module \"{}\" deleted successfully", module.name),
    }))
}

//=========================================================================================
// Session Handlers
//=========================================================================================

/// Log a new study session against a module.
#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created successfully", body = SessionResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 404, description = "Module not found")
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validation order is part of the API contract: missing fields, then the
    // duration range, then module existence, then the date format.
    let module_id = body
        .module_id
        .ok_or_else(|| ApiError::Validation("module_id is required".to_string()))?;
    let duration = body
        .duration
        .ok_or_else(|| ApiError::Validation("duration is required".to_string()))?;
    let date_raw = body
        .date
        .ok_or_else(|| ApiError::Validation("date is required".to_string()))?;

    if duration <= 0.0 {
        return Err(ApiError::Validation(
            "duration must be greater than 0".to_string(),
        ));
    }

    let module = state.db.get_module(module_id).await.map_err(|e| match e {
        PortError::NotFound(_) => ApiError::NotFound("Module not found".to_string()),
        other => ApiError::Port(other),
    })?;

    let date =
        parse_date(&date_raw).ok_or_else(|| ApiError::Validation(INVALID_DATE.to_string()))?;

    let session = state
        .db
        .create_session(module_id, duration, date, body.notes.as_deref())
        .await?;
    info!(
        "Created session: {}h for module {}",
        session.duration, module.name
    );

    Ok((StatusCode::CREATED, Json(SessionResponse::from_domain(&session))))
}

/// List sessions, most recent date first.
#[utoipa::path(
    get,
    path = "/api/sessions",
    params(("limit" = Option<i64>, Query, description = "Maximum number of sessions to return")),
    responses(
        (status = 200, description = "Sessions in reverse chronological order", body = [SessionResponse])
    )
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.filter(|l| *l > 0);
    let sessions = state.db.list_sessions(limit).await?;
    let response: Vec<SessionResponse> =
        sessions.iter().map(SessionResponse::from_domain).collect();
    Ok(Json(response))
}

/// Delete a single session.
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = i64, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session deleted", body = MessageResponse),
        (status = 404, description = "Session not found")
    )
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_session(session_id).await?;
    info!("Deleted session: ID {}", session_id);

    Ok(Json(MessageResponse {
        message: "Session deleted successfully".to_string(),
    }))
}
