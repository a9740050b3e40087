//! services/api/src/web/dashboard.rs
//!
//! Aggregated statistics for the dashboard view: studied hours for today, the
//! current week and the current month, plus module progress and the latest
//! AI recommendation.

use crate::error::ApiError;
use crate::web::rest::{ModuleResponse, RecommendationResponse};
use crate::web::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use chrono::{Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_tracker_core::domain::{round_hours, StudySession};
use utoipa::ToSchema;

/// The composite payload returned by the dashboard endpoint.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub statistics: DashboardStatistics,
    pub modules: Vec<ModuleResponse>,
    pub last_recommendation: Option<RecommendationResponse>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct DashboardStatistics {
    pub hours_today: f64,
    pub hours_week: f64,
    pub hours_month: f64,
    pub sessions_today: usize,
    pub sessions_week: usize,
    pub total_modules: usize,
}

/// Monday of the week `today` falls in. Always Monday, independent of locale.
pub fn week_start(today: NaiveDate) -> NaiveDate {
    let days_from_monday = today.weekday().num_days_from_monday() as u64;
    today
        .checked_sub_days(Days::new(days_from_monday))
        .unwrap_or(today)
}

/// First day of the month `today` falls in.
pub fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

fn total_hours(sessions: &[StudySession]) -> f64 {
    round_hours(sessions.iter().map(|s| s.duration).sum())
}

/// Dashboard overview with aggregated study statistics.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Aggregated statistics, modules and the latest recommendation", body = DashboardResponse)
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let today = Utc::now().date_naive();

    // All three windows are inclusive on both ends.
    let today_sessions = state.db.sessions_in_range(today, today).await?;
    let week_sessions = state.db.sessions_in_range(week_start(today), today).await?;
    let month_sessions = state
        .db
        .sessions_in_range(month_start(today), today)
        .await?;

    let modules = state.db.list_modules().await?;
    let last_recommendation = state.db.latest_recommendation().await?;

    let response = DashboardResponse {
        statistics: DashboardStatistics {
            hours_today: total_hours(&today_sessions),
            hours_week: total_hours(&week_sessions),
            hours_month: total_hours(&month_sessions),
            sessions_today: today_sessions.len(),
            sessions_week: week_sessions.len(),
            total_modules: modules.len(),
        },
        modules: modules.iter().map(ModuleResponse::from_domain).collect(),
        last_recommendation: last_recommendation
            .as_ref()
            .map(RecommendationResponse::from_domain),
    };

    Ok(Json(response))
}
