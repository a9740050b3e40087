//! services/api/src/web/recommend.rs
//!
//! The AI recommendation proxy: composes a progress summary prompt, forwards
//! it to the external text-generation service and persists the returned plan.

use crate::adapters::plan_llm::build_study_prompt;
use crate::error::ApiError;
use crate::web::rest::RecommendationResponse;
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::info;

/// Generate a new study plan from the current module progress.
#[utoipa::path(
    post,
    path = "/api/recommend",
    responses(
        (status = 201, description = "Recommendation created", body = RecommendationResponse),
        (status = 400, description = "No modules exist yet"),
        (status = 503, description = "No API credential configured"),
        (status = 500, description = "The text-generation call failed")
    )
)]
pub async fn create_recommendation_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    // A missing or placeholder credential is a configuration problem, not a
    // transient failure; reject before touching the network.
    if !state.config.has_api_key() {
        return Err(ApiError::NotConfigured(
            "Set the OPENAI_API_KEY environment variable".to_string(),
        ));
    }

    let modules = state.db.list_modules().await?;
    if modules.is_empty() {
        return Err(ApiError::Validation(
            "No modules exist yet. Create modules before requesting a recommendation".to_string(),
        ));
    }

    let prompt = build_study_prompt(&modules);

    info!(
        "Sending request to the text-generation service (model: {})",
        state.config.plan_model
    );

    let plan_text = timeout(
        Duration::from_secs(state.config.plan_timeout_secs),
        state.plan.generate_plan(&prompt),
    )
    .await
    .map_err(|_| {
        ApiError::Upstream(format!(
            "The text-generation service did not answer within {}s",
            state.config.plan_timeout_secs
        ))
    })?
    .map_err(|e| ApiError::Upstream(e.to_string()))?;

    let recommendation = state.db.save_recommendation(&plan_text).await?;
    info!("Created AI recommendation (ID: {})", recommendation.id);

    Ok((
        StatusCode::CREATED,
        Json(RecommendationResponse::from_domain(&recommendation)),
    ))
}

/// Fetch the most recently created recommendation.
#[utoipa::path(
    get,
    path = "/api/recommend",
    responses(
        (status = 200, description = "The latest recommendation", body = RecommendationResponse),
        (status = 404, description = "No recommendation exists yet")
    )
)]
pub async fn get_recommendation_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    match state.db.latest_recommendation().await? {
        Some(recommendation) => {
            Ok(Json(RecommendationResponse::from_domain(&recommendation)).into_response())
        }
        // The absence of a recommendation is expected state, not an error, so
        // the body carries an informational message rather than an error field.
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No recommendation available yet" })),
        )
            .into_response()),
    }
}
