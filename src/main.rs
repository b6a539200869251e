mod config;
mod db;
mod error;
mod middleware;
mod models;
mod pipeline;
mod routes;
mod services;
mod state;

use crate::config::Config;
use crate::pipeline::coefficients::CoefficientTables;
use crate::state::AppState;
use anyhow::Context;
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sustainai=info,tower_http=info".into()),
        )
        .init();

    // Load config
    let config = Config::from_env()?;
    let port = config.port;

    tracing::info!("Starting SustainAI server on port {}", port);

    // Coefficient tables are fixed for the life of the process
    let coefficients = match &config.coefficients_path {
        Some(path) => {
            let tables = CoefficientTables::load(Path::new(path))?;
            tracing::info!("Coefficients loaded from {}", path);
            tables
        }
        None => CoefficientTables::builtin(),
    };

    // Open database
    if let Some(dir) = Path::new(&config.database_path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating database directory {}", dir.display()))?;
        }
    }
    let conn = db::open_db(&config.database_path)?;
    tracing::info!("Database initialized at {}", config.database_path);

    if config.jwt_secret.is_empty() && config.identity_url.is_empty() {
        tracing::warn!("Neither AUTH_JWT_SECRET nor IDENTITY_URL is set; /api/v1 requests will be rejected");
    }
    if config.gateway_api_key.is_empty() {
        tracing::warn!("AI_GATEWAY_API_KEY not set; optimizer and recommendations are unavailable");
    }
    if config.gemini_api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY not set; chat is unavailable");
    }

    let state = AppState::new(conn, config, coefficients);

    // Init health tracking
    routes::health::init_start_time();

    // Build router
    let app = routes::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Listening on 0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
