use crate::models::HealthResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;

static START_TIME: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();

pub fn init_start_time() {
    START_TIME.get_or_init(std::time::Instant::now);
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = {
        let db = state.db.lock().await;
        match crate::db::queries::ping(&db) {
            Ok(()) => "ok",
            Err(e) => {
                tracing::warn!("Health check database ping failed: {}", e);
                "error"
            }
        }
    };

    let uptime = START_TIME
        .get()
        .map(|t| t.elapsed().as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "ok".into(),
        database: database.into(),
        uptime_seconds: uptime,
    })
}
