//! Staged processing pipeline for incoming voice and audio messages
//!
//! Drives one media item through download → normalize → transcribe →
//! summarize → respond while editing a single status message in place.

pub mod language;

use std::path::PathBuf;
use std::sync::Arc;

use crate::audio::{AudioNormalizer, MediaStore};
use crate::buffer::AudioBuffer;
use crate::openai::AiProvider;
use crate::telegram::ChatProvider;
use crate::Result;

use self::language::language_name;

/// Initial status posted when processing starts
const PROCESSING: &str = "🎧 Processing your audio message...";

/// Status while the transcription call is in flight
const TRANSCRIBING: &str = "🔍 Transcribing your message...";

const DOWNLOAD_FAILED: &str =
    "❌ Sorry, I couldn't process your audio message. Please try again.";
const CONVERSION_FAILED: &str =
    "❌ Sorry, I couldn't convert your audio message. Please try again.";
const TRANSCRIBE_FAILED: &str =
    "❌ Sorry, I couldn't transcribe your message. Please try again.";
const ANALYZE_FAILED: &str = "❌ Sorry, I couldn't analyze your message. Please try again.";
const RESPOND_FAILED: &str =
    "❌ Sorry, I couldn't generate a response. Please try again.";
const GENERIC_FAILED: &str = "❌ Sorry, something went wrong. Please try again later.";

/// Kind of inbound media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Voice note (OGG/Opus), needs normalization
    Voice,
    /// Audio attachment (already M4A-compatible), used as-is
    Audio,
}

/// One media item to process, constructed by the ingress layer and
/// consumed exactly once
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub chat_id: i64,
    pub message_id: i64,
    pub user_id: i64,
    /// Provider file id to download
    pub file_id: String,
    pub kind: MediaKind,
    /// Reported duration in seconds
    pub duration: Option<u32>,
}

/// Tuning knobs for the orchestrator
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Transcripts below this many whitespace-delimited words skip
    /// summarization
    pub short_message_words: usize,
    /// How many prior buffer entries feed the response as context
    pub context_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            short_message_words: 100,
            context_window: 3,
        }
    }
}

/// How a pipeline run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Full transcription + summary + response delivered
    Completed,
    /// Transcript was short; transcription-only reply delivered
    TranscriptOnly,
    /// A stage produced no usable result; the user saw a stage-specific error
    Failed(&'static str),
}

/// Files created during a run, removed on every exit path
#[derive(Debug, Default)]
struct Artifacts {
    downloaded: Option<PathBuf>,
    converted: Option<PathBuf>,
}

/// Orchestrates the processing pipeline over injected capabilities
pub struct Pipeline {
    chat: Arc<dyn ChatProvider>,
    ai: Arc<dyn AiProvider>,
    normalizer: Arc<dyn AudioNormalizer>,
    buffer: Arc<AudioBuffer>,
    store: MediaStore,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline over the given capabilities
    #[must_use]
    pub fn new(
        chat: Arc<dyn ChatProvider>,
        ai: Arc<dyn AiProvider>,
        normalizer: Arc<dyn AudioNormalizer>,
        buffer: Arc<AudioBuffer>,
        store: MediaStore,
        config: PipelineConfig,
    ) -> Self {
        Self {
            chat,
            ai,
            normalizer,
            buffer,
            store,
            config,
        }
    }

    /// Process one media item, observable only through chat side effects.
    ///
    /// Every failure path ends in exactly one user-facing error edit; the
    /// conversation is never left on a stale "processing" message. Temporary
    /// artifacts are removed on every exit path.
    pub async fn process(&self, request: PipelineRequest) {
        let chat_id = request.chat_id;

        // Without a status message there is no user-visible way to report
        // anything, so a failure here aborts the whole run.
        let status = match self.chat.send_message(chat_id, PROCESSING).await {
            Ok(message_id) => message_id,
            Err(err) => {
                tracing::error!(
                    chat_id,
                    message_id = request.message_id,
                    error = %err,
                    "could not post status message, aborting pipeline"
                );
                return;
            }
        };

        let mut artifacts = Artifacts::default();
        match self.run(&request, status, &mut artifacts).await {
            Ok(Outcome::Completed) => {
                tracing::info!(chat_id, message_id = request.message_id, "pipeline completed");
            }
            Ok(Outcome::TranscriptOnly) => {
                tracing::info!(
                    chat_id,
                    message_id = request.message_id,
                    "pipeline completed with transcription only"
                );
            }
            Ok(Outcome::Failed(stage)) => {
                tracing::warn!(chat_id, message_id = request.message_id, stage, "pipeline stage failed");
            }
            Err(err) => {
                tracing::error!(
                    chat_id,
                    message_id = request.message_id,
                    error = %err,
                    "pipeline failed unexpectedly"
                );
                let mut cursor = status;
                self.edit_status(chat_id, &mut cursor, GENERIC_FAILED).await;
            }
        }

        self.cleanup(&artifacts);
    }

    /// Drive the stages; stage failures edit the status themselves and end
    /// the run, unexpected errors bubble to `process`
    async fn run(
        &self,
        request: &PipelineRequest,
        mut status: i64,
        artifacts: &mut Artifacts,
    ) -> Result<Outcome> {
        let chat_id = request.chat_id;

        // Voice notes land in temp/ and get normalized; audio attachments
        // are downloaded straight to their final path.
        let download_path = match request.kind {
            MediaKind::Voice => self.store.temp_path(request.message_id, "oga"),
            MediaKind::Audio => self.store.final_path(request.message_id),
        };

        let url = match self.chat.get_file_url(&request.file_id).await {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(chat_id, file_id = %request.file_id, error = %err, "file URL lookup failed");
                self.edit_status(chat_id, &mut status, DOWNLOAD_FAILED).await;
                return Ok(Outcome::Failed("download"));
            }
        };

        artifacts.downloaded = Some(download_path.clone());
        if let Err(err) = self.chat.download(&url, &download_path).await {
            tracing::warn!(chat_id, error = %err, "media download failed");
            self.edit_status(chat_id, &mut status, DOWNLOAD_FAILED).await;
            return Ok(Outcome::Failed("download"));
        }

        let media_path = match request.kind {
            MediaKind::Voice => {
                let converted = self.store.final_path(request.message_id);
                artifacts.converted = Some(converted.clone());
                match self.normalizer.convert(&download_path, &converted).await {
                    Ok(()) => converted,
                    Err(err) => {
                        tracing::warn!(chat_id, error = %err, "audio conversion failed");
                        self.edit_status(chat_id, &mut status, CONVERSION_FAILED).await;
                        return Ok(Outcome::Failed("convert"));
                    }
                }
            }
            MediaKind::Audio => download_path.clone(),
        };

        let key = self.buffer.add_entry(
            chat_id,
            request.message_id,
            request.user_id,
            media_path.clone(),
            request.duration,
        );

        self.edit_status(chat_id, &mut status, TRANSCRIBING).await;

        let Some(transcription) = self.ai.transcribe(&media_path).await else {
            self.edit_status(chat_id, &mut status, TRANSCRIBE_FAILED).await;
            return Ok(Outcome::Failed("transcribe"));
        };

        let language = language_name(&transcription.language);
        let word_count = transcription.text.split_whitespace().count();

        if word_count < self.config.short_message_words {
            let text = format!(
                "📝 Transcription ({language}):\n{}\n\nℹ️ This message is under {} words, \
                 so here is the transcription without a summary.",
                transcription.text, self.config.short_message_words
            );
            self.edit_status(chat_id, &mut status, &text).await;
            return Ok(Outcome::TranscriptOnly);
        }

        let analyzing = format!("🌐 Analyzing your message in {language}...");
        self.edit_status(chat_id, &mut status, &analyzing).await;

        let Some(summary) = self
            .ai
            .summarize(&transcription.text, &transcription.language)
            .await
        else {
            self.edit_status(chat_id, &mut status, ANALYZE_FAILED).await;
            return Ok(Outcome::Failed("summarize"));
        };

        // Most recent entries first from the buffer; the prompt wants them
        // oldest first. The current entry has no transcription yet and
        // drops out of the filter.
        let context: Vec<String> = self
            .buffer
            .get_chat_history(chat_id, self.config.context_window)
            .into_iter()
            .rev()
            .filter_map(|entry| entry.transcription)
            .collect();

        let Some(response) = self.ai.respond(&summary, &context).await else {
            self.edit_status(chat_id, &mut status, RESPOND_FAILED).await;
            return Ok(Outcome::Failed("respond"));
        };

        self.buffer
            .update_transcription(key, transcription.text.clone());

        let final_text = format!(
            "📝 Transcription ({language}):\n{}\n\n📋 Summary:\n{summary}\n\n💬 Response:\n{response}",
            transcription.text
        );
        self.edit_status(chat_id, &mut status, &final_text).await;

        Ok(Outcome::Completed)
    }

    /// Edit the live status message, following a fallback-created message id
    /// if the edit had to post a new one
    async fn edit_status(&self, chat_id: i64, status: &mut i64, text: &str) {
        match self.chat.edit_message(chat_id, *status, text).await {
            Ok(message_id) => *status = message_id,
            Err(err) => {
                tracing::error!(
                    chat_id,
                    message_id = *status,
                    error = %err,
                    "failed to update status message"
                );
            }
        }
    }

    /// Remove run artifacts; failures are logged and swallowed
    fn cleanup(&self, artifacts: &Artifacts) {
        let distinct_converted = match (&artifacts.converted, &artifacts.downloaded) {
            (Some(converted), Some(downloaded)) if converted == downloaded => None,
            (converted, _) => converted.as_ref(),
        };

        for path in artifacts.downloaded.iter().chain(distinct_converted) {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed audio artifact"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to remove audio artifact");
                }
            }
        }
    }
}
