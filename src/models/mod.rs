use crate::pipeline::estimate::EmissionsEstimate;
use crate::pipeline::recommend::Recommendation;
use serde::{Deserialize, Serialize};

// --- Emissions ---
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionsResponse {
    pub energy_kwh: f64,
    pub co2_kg: f64,
    pub carbon_intensity_g_per_kwh: u32,
    pub sustainability_score: u8,
    pub record_id: Option<String>,
    pub saved: bool,
}

impl EmissionsResponse {
    pub fn new(estimate: &EmissionsEstimate, record_id: Option<String>) -> Self {
        Self {
            energy_kwh: estimate.energy_kwh,
            co2_kg: estimate.co2_kg,
            carbon_intensity_g_per_kwh: estimate.carbon_intensity_g_per_kwh,
            sustainability_score: estimate.sustainability_score,
            saved: record_id.is_some(),
            record_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CalculationsQuery {
    pub limit: Option<usize>,
}

// --- Optimizer ---
#[derive(Debug, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub original_prompt: String,
    pub optimized_prompt: String,
    pub original_tokens: i64,
    pub optimized_tokens: i64,
    pub tokens_saved: i64,
    pub co2_saved_kg: f64,
}

// --- Recommendations ---
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub calculation_id: Option<String>,
    pub model_name: String,
    pub tokens: u64,
    pub cloud_region: String,
    pub co2_kg: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
}

// --- Chat ---
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

// --- Health ---
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub uptime_seconds: u64,
}
