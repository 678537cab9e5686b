//! Webhook ingress for Telegram updates

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::commands::{CommandRegistry, StartCommand};
use crate::pipeline::{MediaKind, Pipeline, PipelineRequest};
use crate::telegram::ChatProvider;
use crate::telegram::types::{Message, Update};

/// Fixed rejection for media over the duration cutoff
const TOO_LONG: &str = "Audio must be less than 10 minutes long.";

/// Shared state for the webhook handlers
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub chat: Arc<dyn ChatProvider>,
    pub commands: Arc<CommandRegistry>,
    pub start: Arc<StartCommand>,
    /// Media longer than this many seconds is rejected before the pipeline
    pub max_duration_secs: u32,
}

/// Webhook acknowledgement body
#[derive(Serialize)]
pub struct WebhookResponse {
    pub ok: bool,
}

/// Build the ingress router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook/telegram", post(handle_update))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Handle an incoming Telegram update.
///
/// Acknowledges immediately and runs media processing in a background task;
/// Telegram re-delivers updates whose webhook responses are slow.
async fn handle_update(
    State(state): State<Arc<AppState>>,
    Json(update): Json<Update>,
) -> (StatusCode, Json<WebhookResponse>) {
    tracing::debug!(update_id = update.update_id, "received Telegram update");

    let ok = (StatusCode::OK, Json(WebhookResponse { ok: true }));

    let Some(message) = update.message else {
        tracing::debug!(update_id = update.update_id, "update contained no message");
        return ok;
    };

    if is_bot_command(&message) {
        handle_command(&state, &message).await;
        return ok;
    }

    if let Some(request) = media_request(&message) {
        let chat_id = request.chat_id;

        if request.duration.is_some_and(|d| d > state.max_duration_secs) {
            tracing::info!(
                chat_id,
                message_id = request.message_id,
                duration = request.duration,
                "rejecting media over duration cutoff"
            );
            if let Err(err) = state.chat.send_message(chat_id, TOO_LONG).await {
                tracing::error!(chat_id, error = %err, "failed to send rejection message");
            }
            return ok;
        }

        let pipeline = state.pipeline.clone();
        tokio::spawn(async move {
            pipeline.process(request).await;
        });
        return ok;
    }

    tracing::debug!(
        chat_id = message.chat.id,
        message_id = message.message_id,
        "unsupported message type"
    );
    ok
}

/// Whether the message carries a bot command entity
fn is_bot_command(message: &Message) -> bool {
    message.text.is_some()
        && message
            .entities
            .as_ref()
            .and_then(|entities| entities.first())
            .is_some_and(|entity| entity.entity_type == "bot_command")
}

/// Route a command message through the registry
async fn handle_command(state: &AppState, message: &Message) {
    let chat_id = message.chat.id;
    let Some(text) = message.text.as_deref() else {
        return;
    };

    // "/start@NebulaBot extra args" → "/start"
    let command = text.split_whitespace().next().unwrap_or(text);
    let command = command.split('@').next().unwrap_or(command);

    let first_name = message
        .from
        .as_ref()
        .and_then(|user| user.first_name.as_deref());

    tracing::info!(chat_id, command, "processing command");

    if command == "/start" {
        if let Some(name) = first_name {
            if let Err(err) = state.start.execute_with_name(chat_id, name).await {
                tracing::error!(chat_id, error = %err, "start command failed");
            }
            return;
        }
    }

    match state.commands.handle(command, chat_id).await {
        Some(Ok(())) => {}
        Some(Err(err)) => tracing::error!(chat_id, command, error = %err, "command failed"),
        None => tracing::debug!(chat_id, command, "unknown command"),
    }
}

/// Extract a pipeline request from a voice or audio message
fn media_request(message: &Message) -> Option<PipelineRequest> {
    let (file_id, kind, duration) = if let Some(voice) = &message.voice {
        (voice.file_id.clone(), MediaKind::Voice, voice.duration)
    } else if let Some(audio) = &message.audio {
        (audio.file_id.clone(), MediaKind::Audio, audio.duration)
    } else {
        return None;
    };

    Some(PipelineRequest {
        chat_id: message.chat.id,
        message_id: message.message_id,
        user_id: message.from.as_ref().map_or(message.chat.id, |user| user.id),
        file_id,
        kind,
        duration: Some(duration),
    })
}
