use crate::db::queries::{self, PromptRecord};
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{OptimizeRequest, OptimizeResponse};
use crate::pipeline::optimize;
use crate::services::gateway;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};

const MAX_PROMPT_CHARS: usize = 20_000;

/// POST /api/v1/optimize: rewrite a prompt more tersely and report the savings.
pub async fn optimize_prompt(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    req: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Result<Json<OptimizeResponse>, AppError> {
    let Json(req) = req?;
    if req.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("prompt cannot be empty".into()));
    }
    if req.prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(AppError::BadRequest(format!(
            "prompt too long (max {} chars)",
            MAX_PROMPT_CHARS
        )));
    }

    let optimized = gateway::optimize_prompt(&state.config, &req.prompt)
        .await
        .map_err(|e| {
            tracing::warn!("Prompt optimization failed: {}", e);
            AppError::Unavailable("AI service unavailable, please try again".into())
        })?;

    let summary = optimize::summarize(&req.prompt, &optimized);

    {
        let db = state.db.lock().await;
        let record = PromptRecord {
            original_prompt: &req.prompt,
            original_tokens: summary.original_tokens,
            optimized_prompt: &optimized,
            optimized_tokens: summary.optimized_tokens,
            tokens_saved: summary.tokens_saved,
            co2_saved_kg: summary.co2_saved_kg,
        };
        if let Err(e) = queries::insert_prompt(&db, &user.user_id, &record) {
            tracing::warn!("Failed to save optimized prompt: {}", e);
        }
    }

    tracing::info!(
        original_tokens = summary.original_tokens,
        optimized_tokens = summary.optimized_tokens,
        tokens_saved = summary.tokens_saved,
        "prompt optimized"
    );

    Ok(Json(OptimizeResponse {
        original_prompt: req.prompt,
        optimized_prompt: optimized,
        original_tokens: summary.original_tokens,
        optimized_tokens: summary.optimized_tokens,
        tokens_saved: summary.tokens_saved,
        co2_saved_kg: summary.co2_saved_kg,
    }))
}
