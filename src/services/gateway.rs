use crate::config::Config;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<CompletionMessage>,
}

#[derive(Serialize)]
struct CompletionMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// One system + user exchange against the OpenAI-compatible gateway.
async fn call_gateway(config: &Config, system: &str, user_message: &str) -> Result<String> {
    if config.gateway_api_key.is_empty() {
        anyhow::bail!("AI gateway API key not configured");
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()?;
    let req = CompletionRequest {
        model: config.gateway_model.clone(),
        messages: vec![
            CompletionMessage {
                role: "system".into(),
                content: system.into(),
            },
            CompletionMessage {
                role: "user".into(),
                content: user_message.into(),
            },
        ],
    };

    let resp = client
        .post(&config.gateway_url)
        .bearer_auth(&config.gateway_api_key)
        .json(&req)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("AI gateway error {}: {}", status, body);
    }

    let data: CompletionResponse = resp.json().await?;
    let text = data
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| anyhow::anyhow!("AI gateway returned no completion"))?;

    Ok(text.trim().to_string())
}

const OPTIMIZE_SYSTEM: &str = "You are a prompt optimization expert. Rewrite the user's prompt to be more concise and efficient while preserving its exact meaning and intent. Remove redundancy, use precise language, and maintain all key information. Return ONLY the optimized prompt, nothing else.";

const RECOMMEND_SYSTEM: &str = "You are a sustainability expert for AI systems. Generate 3-5 specific, actionable recommendations to reduce carbon emissions for this AI workload. For each recommendation, provide: type (model_optimization, infrastructure, batching, or region), title (short), description (1-2 sentences), estimated_reduction_percent (realistic number 5-40), and priority (high/medium/low). Return ONLY a valid JSON array.";

pub async fn optimize_prompt(config: &Config, prompt: &str) -> Result<String> {
    call_gateway(config, OPTIMIZE_SYSTEM, prompt).await
}

/// Raw model reply; parsing is left to the caller.
pub async fn recommend(config: &Config, workload_context: &str) -> Result<String> {
    call_gateway(
        config,
        RECOMMEND_SYSTEM,
        &format!(
            "Generate carbon reduction recommendations for this AI workload: {}",
            workload_context
        ),
    )
    .await
}
