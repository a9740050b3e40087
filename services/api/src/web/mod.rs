pub mod dashboard;
pub mod recommend;
pub mod rest;
pub mod state;

use crate::error::api_not_found;
use crate::web::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application router: the `/api` routes, the Swagger UI
/// and the static front-end fallback. Shared between the binary and the
/// integration tests.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route(
            "/modules",
            post(rest::create_module_handler).get(rest::list_modules_handler),
        )
        .route(
            "/modules/{id}",
            get(rest::get_module_handler).delete(rest::delete_module_handler),
        )
        .route(
            "/sessions",
            post(rest::create_session_handler).get(rest::list_sessions_handler),
        )
        .route("/sessions/{id}", delete(rest::delete_session_handler))
        .route(
            "/recommend",
            post(recommend::create_recommendation_handler)
                .get(recommend::get_recommendation_handler),
        )
        .route("/dashboard", get(dashboard::dashboard_handler))
        .fallback(api_not_found);

    let static_dir = app_state.config.static_dir.clone();

    let api_router = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", rest::ApiDoc::openapi()))
        .fallback_service(ServeDir::new(static_dir).append_index_html_on_directories(true))
}
