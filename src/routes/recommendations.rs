use crate::db::queries;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{RecommendationRequest, RecommendationResponse};
use crate::pipeline::recommend;
use crate::pipeline::validate::{sanitize_model_name, sanitize_region};
use crate::services::gateway;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};

/// POST /api/v1/recommendations: ask the model for ways to cut a workload's
/// emissions. An unparseable reply falls back to a fixed list.
pub async fn recommend(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    req: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, AppError> {
    let Json(req) = req?;

    let model_name = sanitize_model_name(&req.model_name);
    if model_name.is_empty() {
        return Err(AppError::BadRequest("modelName is required".into()));
    }
    let cloud_region = sanitize_region(&req.cloud_region);
    if cloud_region.is_empty() {
        return Err(AppError::BadRequest("cloudRegion is required".into()));
    }
    if !req.co2_kg.is_finite() || req.co2_kg < 0.0 {
        return Err(AppError::BadRequest("co2Kg must be a non-negative number".into()));
    }
    let calculation_id = match req.calculation_id.as_deref() {
        Some(id) => Some(
            uuid::Uuid::parse_str(id)
                .map_err(|_| AppError::BadRequest("calculationId must be a UUID".into()))?
                .to_string(),
        ),
        None => None,
    };

    let context = recommend::workload_context(&model_name, req.tokens, &cloud_region, req.co2_kg);
    let reply = gateway::recommend(&state.config, &context)
        .await
        .map_err(|e| {
            tracing::warn!("Recommendation generation failed: {}", e);
            AppError::Unavailable("AI service unavailable, please try again".into())
        })?;

    let recommendations = recommend::recommendations_or_fallback(&reply);

    {
        let db = state.db.lock().await;
        // Only the caller's own calculations may be linked.
        let link = match calculation_id.as_deref() {
            Some(id) => match queries::calculation_belongs_to(&db, id, &user.user_id) {
                Ok(true) => Some(id),
                Ok(false) => {
                    tracing::warn!("calculation {} not owned by {}, saving unlinked", id, user.user_id);
                    None
                }
                Err(e) => {
                    tracing::warn!("Failed to look up calculation {}: {}", id, e);
                    None
                }
            },
            None => None,
        };
        if let Err(e) = queries::insert_recommendations(&db, link, &recommendations) {
            tracing::warn!("Failed to save recommendations: {}", e);
        }
    }

    tracing::info!(
        user = %user.user_id,
        count = recommendations.len(),
        calculation = calculation_id.as_deref().unwrap_or("-"),
        "recommendations generated"
    );

    Ok(Json(RecommendationResponse { recommendations }))
}
