//! Raw Telegram Bot API calls

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt as _;

use super::types::{
    ApiResponse, EditMessageTextRequest, FileInfo, GetFileRequest, SendMessageRequest, SentMessage,
};
use crate::retry::{classify_response, with_retry};
use crate::{Error, Result};

impl super::TelegramClient {
    /// One throttled Bot API call, no retry
    async fn call_once<T, R>(&self, method: &str, request: &R) -> Result<T>
    where
        T: DeserializeOwned,
        R: Serialize + Sync,
    {
        self.throttle.acquire().await;

        let url = format!("{}{}/{method}", self.api_base, self.token);
        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            return Err(classify_response(status, &body));
        }

        let parsed: ApiResponse<T> = serde_json::from_str(&body)?;
        if !parsed.ok {
            return Err(Error::Permanent(format!(
                "Telegram {method} error: {}",
                parsed.description.unwrap_or_default()
            )));
        }

        parsed.result.ok_or_else(|| {
            Error::Permanent(format!("Telegram {method} returned no result"))
        })
    }

    /// Bot API call under the retry policy
    async fn call<T, R>(&self, method: &str, request: &R) -> Result<T>
    where
        T: DeserializeOwned,
        R: Serialize + Sync,
    {
        with_retry(&self.retry, method, || self.call_once(method, request)).await
    }

    /// One throttled download attempt, streaming the body to `dest`
    async fn download_once(&self, url: &str, dest: &Path) -> Result<()> {
        self.throttle.acquire().await;

        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_response(status, &body));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        Ok(())
    }
}

/// Whether an edit failed only because the content was unchanged
fn is_not_modified(err: &Error) -> bool {
    matches!(
        err,
        Error::Permanent(detail) if detail.to_lowercase().contains("message is not modified")
    )
}

#[async_trait]
impl super::ChatProvider for super::TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64> {
        let request = SendMessageRequest {
            chat_id,
            text: text.to_string(),
            reply_to_message_id: None,
        };

        let message: SentMessage = self.call("sendMessage", &request).await?;
        tracing::debug!(chat_id, message_id = message.message_id, "message sent");
        Ok(message.message_id)
    }

    async fn edit_message(&self, chat_id: i64, message_id: i64, text: &str) -> Result<i64> {
        let request = EditMessageTextRequest {
            chat_id,
            message_id,
            text: text.to_string(),
        };

        match self.call::<SentMessage, _>("editMessageText", &request).await {
            Ok(edited) => Ok(edited.message_id),
            // Content unchanged: the edit is a no-op, not a failure
            Err(err) if is_not_modified(&err) => Ok(message_id),
            Err(err) => {
                tracing::warn!(
                    chat_id,
                    message_id,
                    error = %err,
                    "edit failed, falling back to a new message"
                );
                self.send_message(chat_id, text).await
            }
        }
    }

    async fn get_file_url(&self, file_id: &str) -> Result<String> {
        let request = GetFileRequest {
            file_id: file_id.to_string(),
        };

        let file: FileInfo = self.call("getFile", &request).await?;
        let file_path = file
            .file_path
            .ok_or_else(|| Error::Permanent("Telegram getFile returned no file_path".to_string()))?;

        Ok(format!("{}{}/{file_path}", self.file_base, self.token))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        with_retry(&self.retry, "download", || self.download_once(url, dest)).await?;
        tracing::debug!(dest = %dest.display(), "file downloaded");
        Ok(())
    }
}
