use crate::config::Config;
use crate::models::ChatMessage;
use anyhow::Result;
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;

const CHAT_SYSTEM: &str = r#"You are SustainAI's helpful assistant, an expert in AI sustainability and carbon emissions. You help users:
- Understand AI carbon footprints and how they're calculated
- Optimize their AI prompts for efficiency
- Choose more sustainable AI models and cloud regions
- Implement best practices for green AI

Keep answers clear, concise, and actionable. Use markdown formatting for better readability."#;

#[derive(Serialize)]
struct StreamRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

/// What the upstream reader hands to the SSE response.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Delta(String),
    Done,
    Failed,
}

fn to_contents(messages: &[ChatMessage]) -> Vec<GeminiContent> {
    let last = messages.len().saturating_sub(1);
    messages
        .iter()
        .enumerate()
        .map(|(i, m)| {
            // The final turn is always sent as the user's.
            let role = if i < last && m.role == "assistant" { "model" } else { "user" };
            GeminiContent {
                role: Some(role.into()),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            }
        })
        .collect()
}

/// Starts a streamed completion. Errors here happen before any byte reaches
/// the client.
pub async fn open_chat_stream(config: &Config, messages: &[ChatMessage]) -> Result<reqwest::Response> {
    if config.gemini_api_key.is_empty() {
        anyhow::bail!("GEMINI_API_KEY is not configured");
    }

    let req = StreamRequest {
        system_instruction: GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: CHAT_SYSTEM.into(),
            }],
        },
        contents: to_contents(messages),
    };

    let url = format!(
        "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
        config.gemini_base_url.trim_end_matches('/'),
        config.gemini_chat_model,
    );

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()?;
    // Key goes in a header so it never shows up in a logged request URL.
    let resp = client
        .post(&url)
        .header("x-goog-api-key", &config.gemini_api_key)
        .json(&req)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Gemini API error {}: {}", status, body);
    }

    Ok(resp)
}

/// Forwards text fragments from `resp` to `tx` in arrival order, then sends
/// [`ChatEvent::Done`]. Returns early once the receiver is gone so the
/// upstream body is no longer read.
pub async fn pump_chat_stream(resp: reqwest::Response, tx: mpsc::Sender<ChatEvent>) -> Result<usize> {
    let mut buffer: Vec<u8> = Vec::new();
    let mut fragments = 0;
    let mut byte_stream = resp.bytes_stream();

    while let Some(chunk) = byte_stream.next().await {
        let chunk = chunk?;
        // A chunk may end inside a UTF-8 sequence; bytes are only decoded
        // once their whole event has arrived.
        buffer.extend(chunk.iter().copied().filter(|&b| b != b'\r'));

        for data in take_sse_events(&mut buffer) {
            let Ok(v) = serde_json::from_str::<serde_json::Value>(&data) else {
                continue;
            };
            if let Some(text) = fragment_text(&v) {
                if tx.send(ChatEvent::Delta(text)).await.is_err() {
                    tracing::info!("chat client disconnected after {} fragments", fragments);
                    return Ok(fragments);
                }
                fragments += 1;
            }
        }
    }

    let _ = tx.send(ChatEvent::Done).await;
    Ok(fragments)
}

/// Removes every complete event (terminated by a blank line) from `buffer`
/// and returns their `data:` payloads. A trailing partial event stays put.
pub fn take_sse_events(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut events = Vec::new();
    while let Some(pos) = buffer.windows(2).position(|w| w == b"\n\n") {
        let raw: Vec<u8> = buffer.drain(..pos + 2).collect();
        let Ok(event) = std::str::from_utf8(&raw) else {
            tracing::warn!("skipping chat event that is not valid UTF-8");
            continue;
        };
        let data: Vec<&str> = event
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|d| d.strip_prefix(' ').unwrap_or(d))
            .collect();
        if !data.is_empty() {
            events.push(data.join("\n"));
        }
    }
    events
}

/// Concatenated text of the first candidate, if it carries any.
pub fn fragment_text(v: &serde_json::Value) -> Option<String> {
    let parts = v
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    (!text.is_empty()).then_some(text)
}
