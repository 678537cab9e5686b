//! Telegram Bot API wire types, simplified to the fields we consume

use serde::{Deserialize, Serialize};

/// Telegram Update object
#[derive(Debug, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// Telegram Message object
#[derive(Debug, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub entities: Option<Vec<MessageEntity>>,
    /// Voice note recorded in the chat client
    pub voice: Option<Voice>,
    /// Audio file sent as a regular attachment
    pub audio: Option<Audio>,
}

/// Telegram Chat object
#[derive(Debug, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: String,
}

/// Telegram User object
#[derive(Debug, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    pub first_name: Option<String>,
}

/// Entity annotation on a message (commands, mentions, ...)
#[derive(Debug, Deserialize, Serialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub offset: i64,
    pub length: i64,
}

/// Voice note metadata
#[derive(Debug, Deserialize, Serialize)]
pub struct Voice {
    pub file_id: String,
    /// Duration in seconds as reported by the sender's client
    pub duration: u32,
    pub mime_type: Option<String>,
}

/// Audio attachment metadata
#[derive(Debug, Deserialize, Serialize)]
pub struct Audio {
    pub file_id: String,
    /// Duration in seconds as reported by the sender's client
    pub duration: u32,
    pub title: Option<String>,
    pub mime_type: Option<String>,
}

/// Envelope every Bot API response arrives in
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

/// Message as returned from `sendMessage`/`editMessageText`
#[derive(Debug, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

/// File descriptor as returned from `getFile`
#[derive(Debug, Deserialize)]
pub struct FileInfo {
    pub file_id: String,
    pub file_path: Option<String>,
}

/// Request body for `sendMessage`
#[derive(Debug, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}

/// Request body for `editMessageText`
#[derive(Debug, Serialize)]
pub struct EditMessageTextRequest {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
}

/// Request body for `getFile`
#[derive(Debug, Serialize)]
pub struct GetFileRequest {
    pub file_id: String,
}
