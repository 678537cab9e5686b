//! OpenAI client for transcription, summarization, and response generation

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::retry::{RetryPolicy, classify_response, with_retry};
use crate::{Error, Result};

/// Default API endpoint prefix
const API_BASE: &str = "https://api.openai.com/v1";

/// A transcription result: the text plus the detected language code
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    pub language: String,
}

/// Capability to transcribe, summarize, and respond.
///
/// Every operation is value-or-absent: the implementation retries transient
/// failures internally and absorbs whatever remains, so callers never see a
/// transport error, only a missing result.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Transcribe an audio file, detecting its language
    async fn transcribe(&self, path: &Path) -> Option<Transcription>;

    /// Summarize a transcript, keeping the speaker's language
    async fn summarize(&self, transcript: &str, language: &str) -> Option<String>;

    /// Generate a response to a summary, given prior transcriptions
    /// (oldest first) as conversational context
    async fn respond(&self, summary: &str, context: &[String]) -> Option<String>;
}

/// Model and endpoint configuration for the OpenAI client
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Transcription model (default whisper-1)
    pub transcription_model: String,
    /// Summarization model (default gpt-4o-mini)
    pub summary_model: String,
    /// Response generation model (default gpt-4-turbo-preview)
    pub response_model: String,
    /// Per-call HTTP timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            transcription_model: "whisper-1".to_string(),
            summary_model: "gpt-4o-mini".to_string(),
            response_model: "gpt-4-turbo-preview".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// OpenAI API client with retry and backoff
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    config: OpenAiConfig,
    retry: RetryPolicy,
    api_base: String,
}

impl OpenAiClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or the HTTP client cannot
    /// be constructed
    pub fn new(api_key: impl Into<String>, config: OpenAiConfig, retry: RetryPolicy) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key cannot be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            config,
            retry,
            api_base: API_BASE.to_string(),
        })
    }

    /// Point the client at a different API endpoint (tests)
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn transcribe_once(&self, path: &Path) -> Result<Transcription> {
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map_or_else(|| "audio.m4a".to_string(), |n| n.to_string_lossy().into_owned());

        let part = Part::bytes(data).file_name(filename).mime_str("audio/m4a")?;
        let form = Form::new()
            .text("model", self.config.transcription_model.clone())
            .text("response_format", "verbose_json")
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.api_base))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(classify_response(status, &body));
        }

        let parsed: VerboseTranscription = serde_json::from_str(&body)?;
        Ok(Transcription {
            text: parsed.text,
            language: parsed.language.unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn complete_once(&self, request: &ChatCompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(classify_response(status, &body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Permanent("chat completion returned no content".to_string()))
    }

    async fn complete(&self, operation: &str, request: &ChatCompletionRequest) -> Result<String> {
        with_retry(&self.retry, operation, || self.complete_once(request)).await
    }
}

#[async_trait]
impl AiProvider for OpenAiClient {
    async fn transcribe(&self, path: &Path) -> Option<Transcription> {
        let result = with_retry(&self.retry, "transcribe", || self.transcribe_once(path)).await;

        match result {
            Ok(transcription) => {
                tracing::info!(
                    path = %path.display(),
                    language = %transcription.language,
                    "audio transcribed"
                );
                Some(transcription)
            }
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "transcription failed");
                None
            }
        }
    }

    async fn summarize(&self, transcript: &str, language: &str) -> Option<String> {
        let request = ChatCompletionRequest {
            model: self.config.summary_model.clone(),
            messages: summary_messages(transcript, language),
            temperature: 0.2,
            max_tokens: None,
        };

        match self.complete("summarize", &request).await {
            Ok(summary) => {
                tracing::info!(language, "summary generated");
                Some(summary)
            }
            Err(err) => {
                tracing::error!(error = %err, "summarization failed");
                None
            }
        }
    }

    async fn respond(&self, summary: &str, context: &[String]) -> Option<String> {
        let request = ChatCompletionRequest {
            model: self.config.response_model.clone(),
            messages: response_messages(summary, context),
            temperature: 0.7,
            max_tokens: None,
        };

        match self.complete("respond", &request).await {
            Ok(response) => {
                tracing::info!("response generated");
                Some(response)
            }
            Err(err) => {
                tracing::error!(error = %err, "response generation failed");
                None
            }
        }
    }
}

/// Build the chat messages for the summarize operation
fn summary_messages(transcript: &str, language: &str) -> Vec<ChatMessage> {
    let system = format!(
        "You are an expert at summarizing spoken conversations. Create a clear, \
         concise summary of the audio transcript while:\n\n\
         1. Capturing the essential meaning and key points\n\
         2. Maintaining the original tone and language of the speaker\n\
         3. Preserving important details, numbers, or specific references\n\
         4. Keeping the summary to 2-3 sentences maximum\n\
         5. Using natural, conversational language that reflects spoken communication\n\n\
         Remember this is transcribed speech, so focus on the core message rather than \
         exact wording. If the transcript contains filler words or speech artifacts, \
         distill the actual meaning.\n\
         The detected language of this audio is: {language}"
    );

    vec![
        ChatMessage {
            role: "system".to_string(),
            content: system,
        },
        ChatMessage {
            role: "user".to_string(),
            content: transcript.to_string(),
        },
    ]
}

/// Build the chat messages for the respond operation
fn response_messages(summary: &str, context: &[String]) -> Vec<ChatMessage> {
    let system = "Generate an unordered list of topics included in the summary you will \
                  have been provided. Your answer must be in the language used in the \
                  summary. Focus on key points and maintain the original language style \
                  and tone. Each topic should be meaningful and provide valuable insight \
                  into the content."
        .to_string();

    let content = if context.is_empty() {
        format!("Current message summary:\n{summary}")
    } else {
        let previous = context
            .iter()
            .map(|entry| format!("user: {entry}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Previous context:\n{previous}\n\nCurrent message summary:\n{summary}")
    };

    vec![
        ChatMessage {
            role: "system".to_string(),
            content: system,
        },
        ChatMessage {
            role: "user".to_string(),
            content,
        },
    ]
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    language: Option<String>,
}
