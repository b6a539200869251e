use crate::db::queries;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::pipeline::coefficients::CoefficientListing;
use crate::pipeline::dashboard::{self, DashboardStats};
use crate::state::AppState;
use axum::extract::State;
use axum::{Extension, Json};

const DASHBOARD_WINDOW: usize = 100;

pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardStats>, AppError> {
    let rows = {
        let db = state.db.lock().await;
        queries::get_recent_calculations(&db, &user.user_id, DASHBOARD_WINDOW)?
    };
    Ok(Json(dashboard::summarize(&rows)))
}

pub async fn coefficients(State(state): State<AppState>) -> Json<CoefficientListing> {
    Json(state.coefficients.listing())
}
