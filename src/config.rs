use anyhow::{Context, Result};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub coefficients_path: Option<String>,
    pub gateway_url: String,
    pub gateway_api_key: String,
    pub gateway_model: String,
    pub gemini_base_url: String,
    pub gemini_api_key: String,
    pub gemini_chat_model: String,
    pub jwt_secret: String,
    pub identity_url: String,
    pub identity_api_key: String,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8890".into())
                .parse()
                .context("PORT must be a number")?,
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/sustainai.db".into()),
            coefficients_path: std::env::var("COEFFICIENTS_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            gateway_url: std::env::var("AI_GATEWAY_URL")
                .unwrap_or_else(|_| "https://ai.gateway.lovable.dev/v1/chat/completions".into()),
            gateway_api_key: std::env::var("AI_GATEWAY_API_KEY").unwrap_or_default(),
            gateway_model: std::env::var("AI_GATEWAY_MODEL")
                .unwrap_or_else(|_| "google/gemini-2.5-flash".into()),
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into()),
            gemini_api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_chat_model: std::env::var("GEMINI_CHAT_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".into()),
            jwt_secret: std::env::var("AUTH_JWT_SECRET").unwrap_or_default(),
            identity_url: std::env::var("IDENTITY_URL").unwrap_or_default(),
            identity_api_key: std::env::var("IDENTITY_API_KEY").unwrap_or_default(),
            cors_origins: parse_origins(&std::env::var("CORS_ORIGINS").unwrap_or_default()),
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_origins;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        let origins = parse_origins(" https://a.example , ,https://b.example,");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
        assert!(parse_origins("").is_empty());
    }
}
