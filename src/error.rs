use crate::pipeline::validate::ValidationError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged in full but reported generically.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(%status, error = %self);
            "internal server error".to_string()
        } else {
            tracing::warn!(%status, error = %self);
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_are_bad_requests_naming_the_field() {
        let resp = AppError::from(ValidationError::InvalidTokens).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("tokens"));
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let resp = AppError::from(anyhow::anyhow!("disk /var/db is full")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await, json!({ "error": "internal server error" }));

        let db_err = rusqlite::Connection::open_in_memory()
            .unwrap()
            .execute("INSERT INTO missing_table VALUES (1)", [])
            .unwrap_err();
        let resp = AppError::from(db_err).into_response();
        assert_eq!(body_json(resp).await["error"], "internal server error");
    }

    #[tokio::test]
    async fn upstream_and_auth_statuses() {
        let resp = AppError::Unavailable("AI service unavailable".into()).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let resp = AppError::Unauthorized("missing bearer token".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"], "missing bearer token");
    }
}
