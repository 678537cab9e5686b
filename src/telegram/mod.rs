//! Telegram Bot API client with retry, backoff, and request spacing

mod api;
pub mod types;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::retry::RetryPolicy;
use crate::throttle::RequestThrottle;
use crate::Result;

/// Default Bot API endpoint prefix
const API_BASE: &str = "https://api.telegram.org/bot";

/// Default file download endpoint prefix
const FILE_BASE: &str = "https://api.telegram.org/file/bot";

/// Capability to post to and fetch from the originating chat.
///
/// The orchestrator and the command handlers talk to the chat service only
/// through this trait; implementations hold no conversation-specific state.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a message, returning the created message id
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after retries
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64>;

    /// Edit a message in place, returning the id the caller should keep
    /// following.
    ///
    /// A "not modified" outcome is success and returns `message_id`
    /// unchanged. Any other edit failure falls back to sending a new
    /// message (one hop at most) and returns the new id.
    ///
    /// # Errors
    ///
    /// Returns an error only when the fallback send fails as well
    async fn edit_message(&self, chat_id: i64, message_id: i64, text: &str) -> Result<i64>;

    /// Resolve a downloadable URL for a provider file id
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after retries
    async fn get_file_url(&self, file_id: &str) -> Result<String>;

    /// Stream a file at `url` to the local path `dest`
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails after retries
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Telegram Bot API client.
///
/// Every outbound call goes through the shared [`RequestThrottle`] and the
/// retry policy; the underlying `reqwest` client carries a per-call timeout
/// so a hung request surfaces as a transient failure.
pub struct TelegramClient {
    token: String,
    client: Client,
    throttle: Arc<RequestThrottle>,
    retry: RetryPolicy,
    api_base: String,
    file_base: String,
}

impl TelegramClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(
        token: impl Into<String>,
        throttle: Arc<RequestThrottle>,
        retry: RetryPolicy,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            token: token.into(),
            client,
            throttle,
            retry,
            api_base: API_BASE.to_string(),
            file_base: FILE_BASE.to_string(),
        })
    }

    /// Point the client at a different API endpoint (tests)
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>, file_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.file_base = file_base.into();
        self
    }
}
