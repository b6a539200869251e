use crate::db::queries;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{CalculationsQuery, EmissionsResponse};
use crate::pipeline::estimate::estimate;
use crate::pipeline::validate::validate_workload;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::{Extension, Json};

const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 100;

/// POST /api/v1/emissions: validate, estimate, then record the workload.
/// A failed insert still returns the estimate, flagged `saved: false`.
pub async fn calculate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<EmissionsResponse>, AppError> {
    let Json(payload) = payload?;
    let workload = validate_workload(&payload)?;
    let result = estimate(&state.coefficients, &workload);

    let record_id = {
        let db = state.db.lock().await;
        match queries::insert_calculation(&db, &user.user_id, &workload, &result) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Failed to save calculation for {}: {}", user.user_id, e);
                None
            }
        }
    };

    tracing::info!(
        model = %workload.model_name,
        region = %workload.cloud_region,
        tokens = workload.tokens,
        co2_kg = result.co2_kg,
        score = result.sustainability_score,
        saved = record_id.is_some(),
        "emissions calculated"
    );

    Ok(Json(EmissionsResponse::new(&result, record_id)))
}

/// GET /api/v1/calculations: caller's history, newest first.
pub async fn list_calculations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<CalculationsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let rows = {
        let db = state.db.lock().await;
        queries::get_recent_calculations(&db, &user.user_id, limit)?
    };

    Ok(Json(serde_json::json!({ "calculations": rows })))
}
