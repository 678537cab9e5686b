//! Nebula bot entry point

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use nebula_bot::api::{self, AppState};
use nebula_bot::commands::{CommandRegistry, HelpCommand, StartCommand};
use nebula_bot::{
    AudioBuffer, ChatProvider, Config, FfmpegNormalizer, MediaStore, OpenAiClient, Pipeline,
    RequestThrottle, RetryPolicy, TelegramClient,
};

/// Nebula - Telegram voice transcription and summarization bot
#[derive(Parser)]
#[command(name = "nebula", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "NEBULA_PORT")]
    port: Option<u16>,

    /// Directory for downloaded audio artifacts
    #[arg(long, env = "NEBULA_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Interval between maintenance sweeps
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = Config::from_env().context("loading configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.download_dir {
        config.download_dir = dir;
    }

    // Service graph: explicitly constructed and injected, shared by Arc
    let throttle = Arc::new(RequestThrottle::new(Duration::from_millis(
        config.telegram.min_request_interval_ms,
    )));
    let retry = RetryPolicy {
        max_attempts: config.telegram.max_attempts,
        ..RetryPolicy::default()
    };

    let chat: Arc<dyn ChatProvider> = Arc::new(
        TelegramClient::new(
            &config.telegram_bot_token,
            throttle,
            retry.clone(),
            Duration::from_secs(config.telegram.request_timeout_secs),
        )
        .context("building Telegram client")?,
    );

    let ai = Arc::new(
        OpenAiClient::new(&config.openai_api_key, config.openai.clone(), retry)
            .context("building OpenAI client")?,
    );

    let buffer = Arc::new(AudioBuffer::new(config.buffer.max_size));
    let store = MediaStore::new(&config.download_dir).context("preparing download directory")?;
    let normalizer = Arc::new(FfmpegNormalizer::new());

    let pipeline = Arc::new(Pipeline::new(
        chat.clone(),
        ai,
        normalizer,
        buffer.clone(),
        store.clone(),
        config.pipeline.clone(),
    ));

    let start = Arc::new(StartCommand::new(chat.clone()));
    let help = Arc::new(HelpCommand::new(chat.clone()));
    let mut commands = CommandRegistry::default();
    commands.register(
        "start",
        start.clone(),
        "Start the bot",
        "Initialize the bot and see the welcome message",
    );
    commands.register("help", help, "Help", "Tips on how to use Nebula");

    spawn_maintenance(
        buffer,
        store,
        Duration::from_secs(config.buffer.ttl_hours * 3600),
    );

    let state = Arc::new(AppState {
        pipeline,
        chat,
        commands: Arc::new(commands),
        start,
        max_duration_secs: config.telegram.max_duration_secs,
    });

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "webhook server listening");

    axum::serve(listener, api::router(state))
        .await
        .context("serving webhook")?;

    Ok(())
}

/// Hourly sweep of expired buffer entries and stale audio files
fn spawn_maintenance(buffer: Arc<AudioBuffer>, store: MediaStore, ttl: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(MAINTENANCE_INTERVAL);
        // The first tick fires immediately; skip it
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let entries = buffer.cleanup_expired(ttl);
            let files = store.cleanup_old_files(ttl);
            if entries > 0 || files > 0 {
                tracing::info!(entries, files, "maintenance sweep complete");
            }
        }
    });
}
