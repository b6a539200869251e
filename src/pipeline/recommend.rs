use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "whole_percent")]
    pub estimated_reduction_percent: i64,
    pub priority: String,
}

/// Models sometimes answer `22.5`; keep the reply and store a whole number in 0..=100.
fn whole_percent<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.clamp(0.0, 100.0).round() as i64)
}

/// Context line handed to the model for one workload.
pub fn workload_context(model_name: &str, tokens: u64, cloud_region: &str, co2_kg: f64) -> String {
    format!(
        "Model: {}, Tokens: {}, Region: {}, CO2: {} kg",
        model_name, tokens, cloud_region, co2_kg
    )
}

/// Recommendations returned when the model reply cannot be parsed.
pub fn fallback_recommendations() -> Vec<Recommendation> {
    vec![
        Recommendation {
            kind: "model_optimization".into(),
            title: "Switch to Smaller Model".into(),
            description: "Use a more efficient model variant that can handle your use case with lower computational requirements.".into(),
            estimated_reduction_percent: 35,
            priority: "high".into(),
        },
        Recommendation {
            kind: "infrastructure".into(),
            title: "Move to Low-Carbon Region".into(),
            description: "Deploy your workload in regions with renewable energy sources like EU-West-1 (Ireland).".into(),
            estimated_reduction_percent: 25,
            priority: "high".into(),
        },
        Recommendation {
            kind: "batching".into(),
            title: "Implement Request Batching".into(),
            description: "Process multiple requests together to reduce overhead and improve GPU utilization.".into(),
            estimated_reduction_percent: 15,
            priority: "medium".into(),
        },
    ]
}

/// Pulls a JSON array of recommendations out of free model text. Prose or
/// code fences around the array are ignored.
pub fn parse_recommendations(text: &str) -> Option<Vec<Recommendation>> {
    let trimmed = text.trim();
    let span = match (trimmed.find('['), trimmed.rfind(']')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    };

    serde_json::from_str(span).ok()
}

pub fn recommendations_or_fallback(text: &str) -> Vec<Recommendation> {
    match parse_recommendations(text) {
        Some(recs) => recs,
        None => {
            tracing::warn!("could not parse recommendations, using fallback list");
            fallback_recommendations()
        }
    }
}
