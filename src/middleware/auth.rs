use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;
use crate::state::AppState;

/// Caller identity, inserted into request extensions by [`require_user`].
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;

    let user_id = verify_token(&state.config, &token).await?;
    req.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

async fn verify_token(config: &Config, token: &str) -> Result<String, AppError> {
    if !config.jwt_secret.is_empty() {
        return verify_local(&config.jwt_secret, token);
    }
    if !config.identity_url.is_empty() {
        return verify_remote(config, token).await;
    }
    tracing::error!("no AUTH_JWT_SECRET or IDENTITY_URL configured, rejecting request");
    Err(AppError::Unauthorized("authentication is not configured".into()))
}

/// HS256 check against the shared signing secret.
pub fn verify_local(secret: &str, token: &str) -> Result<String, AppError> {
    let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_aud = false;

    let data = jsonwebtoken::decode::<Claims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        AppError::Unauthorized("invalid bearer token".into())
    })?;

    if data.claims.sub.is_empty() {
        return Err(AppError::Unauthorized("invalid bearer token".into()));
    }
    Ok(data.claims.sub)
}

/// Asks the identity service who owns the token.
async fn verify_remote(config: &Config, token: &str) -> Result<String, AppError> {
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{}/auth/v1/user", config.identity_url.trim_end_matches('/')))
        .bearer_auth(token)
        .header("apikey", &config.identity_api_key)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!("identity service unreachable: {}", e);
            AppError::Unavailable("identity service unavailable".into())
        })?;

    if !resp.status().is_success() {
        tracing::warn!("identity service rejected token ({})", resp.status());
        return Err(AppError::Unauthorized("invalid bearer token".into()));
    }

    let body: serde_json::Value = resp.json().await?;
    body.get("id")
        .and_then(|id| id.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::Unauthorized("invalid bearer token".into()))
}

#[cfg(test)]
pub(crate) fn mint_token(secret: &str, sub: &str, ttl_secs: i64) -> String {
    let claims = Claims {
        sub: sub.into(),
        exp: (chrono::Utc::now().timestamp() + ttl_secs) as usize,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn valid_token_yields_subject() {
        let token = mint_token("s3cret", "user-42", 3600);
        assert_eq!(verify_local("s3cret", &token).unwrap(), "user-42");
    }

    #[test]
    fn wrong_secret_and_expired_tokens_are_rejected() {
        let token = mint_token("s3cret", "user-42", 3600);
        assert!(matches!(verify_local("other", &token), Err(AppError::Unauthorized(_))));

        let expired = mint_token("s3cret", "user-42", -3600);
        assert!(matches!(verify_local("s3cret", &expired), Err(AppError::Unauthorized(_))));

        assert!(verify_local("s3cret", "not-a-jwt").is_err());
    }

    #[tokio::test]
    async fn unconfigured_auth_rejects() {
        let config = Config::default();
        let err = verify_token(&config, "anything").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
