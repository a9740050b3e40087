//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, OpenAiPlanAdapter},
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Create the Schema ---
    info!("Connecting to database...");
    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(ApiError::Database)?
        .create_if_missing(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    db_adapter.ensure_schema().await?;
    info!("Database schema ready.");

    // --- 3. Initialize the Plan-Generation Adapter ---
    // The credential is checked per request so the server still serves the
    // tracking endpoints when no key is configured.
    if !config.has_api_key() {
        warn!("OPENAI_API_KEY is not set - AI recommendations are disabled");
    }
    let openai_config = OpenAIConfig::new()
        .with_api_key(config.openai_api_key.clone().unwrap_or_default());
    let openai_client = Client::with_config(openai_config);
    let plan_adapter = Arc::new(OpenAiPlanAdapter::new(
        openai_client,
        config.plan_model.clone(),
        config.plan_temperature,
        config.plan_max_tokens,
    ));

    // --- 4. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        plan: plan_adapter,
        config: config.clone(),
    });
    let app = build_router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
