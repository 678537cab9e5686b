//! Nebula - Telegram voice message transcription and summarization bot
//!
//! Ingests voice and audio messages through a Telegram webhook and runs them
//! through a staged pipeline (download → normalize → transcribe → summarize →
//! respond), streaming progress back to the chat by editing one status
//! message in place.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              Webhook ingress (axum)          │
//! │     commands  │  duration guard  │  media    │
//! └──────────────────────┬───────────────────────┘
//!                        │
//! ┌──────────────────────▼───────────────────────┐
//! │              Pipeline orchestrator           │
//! │  status edits │ stages │ context buffer      │
//! └──────┬────────────────────────────┬──────────┘
//!        │                            │
//! ┌──────▼──────────┐       ┌─────────▼──────────┐
//! │ Telegram client │       │   OpenAI client    │
//! │ throttle+retry  │       │   retry+backoff    │
//! └─────────────────┘       └────────────────────┘
//! ```

pub mod api;
pub mod audio;
pub mod buffer;
pub mod commands;
pub mod config;
pub mod error;
pub mod openai;
pub mod pipeline;
pub mod retry;
pub mod telegram;
pub mod throttle;

pub use audio::{AudioNormalizer, FfmpegNormalizer, MediaStore};
pub use buffer::{AudioBuffer, EntryKey, MediaEntry};
pub use config::Config;
pub use error::{Error, Result};
pub use openai::{AiProvider, OpenAiClient, Transcription};
pub use pipeline::{MediaKind, Pipeline, PipelineConfig, PipelineRequest};
pub use retry::RetryPolicy;
pub use telegram::{ChatProvider, TelegramClient};
pub use throttle::RequestThrottle;
