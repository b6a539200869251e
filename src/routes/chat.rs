use crate::error::AppError;
use crate::models::ChatRequest;
use crate::services::gemini::{self, ChatEvent};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use tokio::sync::mpsc;

const MAX_MESSAGES: usize = 50;
const MAX_MESSAGE_CHARS: usize = 20_000;

fn check_messages(req: &ChatRequest) -> Result<(), AppError> {
    let last = req
        .messages
        .last()
        .ok_or_else(|| AppError::BadRequest("messages cannot be empty".into()))?;
    if req.messages.len() > MAX_MESSAGES {
        return Err(AppError::BadRequest(format!(
            "too many messages (max {})",
            MAX_MESSAGES
        )));
    }
    if req
        .messages
        .iter()
        .any(|m| m.content.chars().count() > MAX_MESSAGE_CHARS)
    {
        return Err(AppError::BadRequest(format!(
            "message too long (max {} chars)",
            MAX_MESSAGE_CHARS
        )));
    }
    if last.content.trim().is_empty() {
        return Err(AppError::BadRequest("last message cannot be empty".into()));
    }
    Ok(())
}

fn delta_event(text: &str) -> Event {
    Event::default().data(json!({ "choices": [{ "delta": { "content": text } }] }).to_string())
}

/// POST /api/v1/chat: stream the assistant's reply as SSE, ending in `[DONE]`.
pub async fn chat(
    State(state): State<AppState>,
    req: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let Json(req) = req?;
    check_messages(&req)?;

    let upstream = gemini::open_chat_stream(&state.config, &req.messages)
        .await
        .map_err(|e| {
            tracing::warn!("Chat stream could not start: {}", e);
            AppError::Unavailable("AI service unavailable, please try again".into())
        })?;

    let (tx, mut rx) = mpsc::channel::<ChatEvent>(32);
    let failure_tx = tx.clone();
    tokio::spawn(async move {
        match gemini::pump_chat_stream(upstream, tx).await {
            Ok(n) => tracing::info!("chat stream finished ({} fragments)", n),
            Err(e) => {
                tracing::warn!("Chat stream failed mid-way: {}", e);
                let _ = failure_tx.send(ChatEvent::Failed).await;
            }
        }
    });

    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            match event {
                ChatEvent::Delta(text) => yield Ok(delta_event(&text)),
                ChatEvent::Done => {
                    yield Ok(Event::default().data("[DONE]"));
                    break;
                }
                ChatEvent::Failed => {
                    yield Ok(Event::default().data(json!({ "error": "Stream failed" }).to_string()));
                    break;
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("ping"),
    ))
}
