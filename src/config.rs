//! Configuration for the Nebula bot

use std::path::PathBuf;
use std::str::FromStr;

use crate::openai::OpenAiConfig;
use crate::pipeline::PipelineConfig;
use crate::{Error, Result};

/// Nebula bot configuration
///
/// Secrets are required; everything else has a default and can be overridden
/// through `NEBULA_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token from BotFather
    pub telegram_bot_token: String,

    /// OpenAI API key
    pub openai_api_key: String,

    /// Webhook server configuration
    pub server: ServerConfig,

    /// Context buffer configuration
    pub buffer: BufferConfig,

    /// Orchestrator tuning
    pub pipeline: PipelineConfig,

    /// OpenAI model selection and timeouts
    pub openai: OpenAiConfig,

    /// Telegram client tuning
    pub telegram: TelegramConfig,

    /// Directory for downloaded audio artifacts
    pub download_dir: PathBuf,
}

/// Webhook server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Context buffer configuration
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Maximum number of entries held
    pub max_size: usize,
    /// Entry time-to-live in hours, enforced by the maintenance sweep
    pub ttl_hours: u64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            ttl_hours: 24,
        }
    }
}

/// Telegram client tuning
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Minimum spacing between outbound requests in milliseconds
    pub min_request_interval_ms: u64,
    /// Maximum attempts per request
    pub max_attempts: u32,
    /// Per-call HTTP timeout in seconds
    pub request_timeout_secs: u64,
    /// Media longer than this many seconds is rejected up front
    pub max_duration_secs: u32,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            min_request_interval_ms: 100,
            max_attempts: 3,
            request_timeout_secs: 60,
            max_duration_secs: 600,
        }
    }
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required secret is missing
    pub fn from_env() -> Result<Self> {
        let telegram_bot_token = require_env("TELEGRAM_BOT_TOKEN")?;
        let openai_api_key = require_env("OPENAI_API_KEY")?;

        let server = ServerConfig {
            port: env_or("NEBULA_PORT", ServerConfig::default().port),
        };

        let buffer_defaults = BufferConfig::default();
        let buffer = BufferConfig {
            max_size: env_or("NEBULA_BUFFER_MAX_SIZE", buffer_defaults.max_size),
            ttl_hours: env_or("NEBULA_BUFFER_TTL_HOURS", buffer_defaults.ttl_hours),
        };

        let pipeline_defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            short_message_words: env_or(
                "NEBULA_SHORT_MESSAGE_WORDS",
                pipeline_defaults.short_message_words,
            ),
            context_window: env_or("NEBULA_CONTEXT_WINDOW", pipeline_defaults.context_window),
        };

        let openai_defaults = OpenAiConfig::default();
        let openai = OpenAiConfig {
            transcription_model: env_or_string(
                "NEBULA_TRANSCRIPTION_MODEL",
                openai_defaults.transcription_model,
            ),
            summary_model: env_or_string("NEBULA_SUMMARY_MODEL", openai_defaults.summary_model),
            response_model: env_or_string("NEBULA_RESPONSE_MODEL", openai_defaults.response_model),
            request_timeout_secs: env_or(
                "NEBULA_OPENAI_TIMEOUT_SECS",
                openai_defaults.request_timeout_secs,
            ),
        };

        let telegram_defaults = TelegramConfig::default();
        let telegram = TelegramConfig {
            min_request_interval_ms: env_or(
                "NEBULA_MIN_REQUEST_INTERVAL_MS",
                telegram_defaults.min_request_interval_ms,
            ),
            max_attempts: env_or("NEBULA_MAX_ATTEMPTS", telegram_defaults.max_attempts),
            request_timeout_secs: env_or(
                "NEBULA_TELEGRAM_TIMEOUT_SECS",
                telegram_defaults.request_timeout_secs,
            ),
            max_duration_secs: env_or(
                "NEBULA_MAX_DURATION_SECS",
                telegram_defaults.max_duration_secs,
            ),
        };

        let download_dir = env_or_string("NEBULA_DOWNLOAD_DIR", "downloads".to_string()).into();

        Ok(Self {
            telegram_bot_token,
            openai_api_key,
            server,
            buffer,
            pipeline,
            openai,
            telegram,
            download_dir,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::Config(format!("{key} not found in environment")))
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_or_string(key: &str, default: String) -> String {
    std::env::var(key).ok().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_surface() {
        assert_eq!(ServerConfig::default().port, 8080);

        let buffer = BufferConfig::default();
        assert_eq!(buffer.max_size, 100);
        assert_eq!(buffer.ttl_hours, 24);

        let telegram = TelegramConfig::default();
        assert_eq!(telegram.min_request_interval_ms, 100);
        assert_eq!(telegram.max_attempts, 3);
        assert_eq!(telegram.max_duration_secs, 600);

        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.short_message_words, 100);
        assert_eq!(pipeline.context_window, 3);
    }
}
