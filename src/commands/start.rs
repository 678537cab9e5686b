//! `/start` welcome command

use std::sync::Arc;

use async_trait::async_trait;

use super::CommandHandler;
use crate::telegram::ChatProvider;
use crate::Result;

const WELCOME_TITLE: &str = "👋 Hi! I'm Nebula.";
const BOT_DESCRIPTION: &str = "I'm a voice processing assistant that helps you with audio \
                               messages sent from chats on WhatsApp and Telegram.";
const CAPABILITIES: &str = "• Convert voice messages to text\n\
                            • Provide summaries for longer messages (over 100 words)\n\
                            • Process audio in multiple languages\n\
                            • Generate insightful responses";
const USAGE: &str = "1. Send or forward any voice/audio message (up to 10 minutes)\n\
                     2. Wait while I process it\n\
                     3. Get your transcription, summary, and response!";
const PRIVACY_NOTICE: &str =
    "🔒 Your messages are processed securely and deleted immediately after processing.";
const TRY_NOW: &str = "Try it now by sending a voice message! 🎤";

/// Sends the welcome message when a user starts the bot
pub struct StartCommand {
    chat: Arc<dyn ChatProvider>,
}

impl StartCommand {
    /// Create the command over the given chat capability
    #[must_use]
    pub fn new(chat: Arc<dyn ChatProvider>) -> Self {
        Self { chat }
    }

    /// Run the command with a personalized greeting
    ///
    /// # Errors
    ///
    /// Returns an error if the welcome message could not be sent
    pub async fn execute_with_name(&self, chat_id: i64, first_name: &str) -> Result<()> {
        let message = format!("Hello, {first_name}! 👋\n\n{}", welcome_message());
        self.chat.send_message(chat_id, &message).await?;
        tracing::info!(chat_id, "sent personalized welcome message");
        Ok(())
    }
}

#[async_trait]
impl CommandHandler for StartCommand {
    async fn execute(&self, chat_id: i64) -> Result<()> {
        self.chat.send_message(chat_id, &welcome_message()).await?;
        tracing::info!(chat_id, "sent welcome message");
        Ok(())
    }
}

fn welcome_message() -> String {
    format!(
        "{WELCOME_TITLE} {BOT_DESCRIPTION}\n\n\
         🎯 Here's what I can do:\n{CAPABILITIES}\n\n\
         📱 To use me, simply:\n{USAGE}\n\n\
         {PRIVACY_NOTICE}\n\n\
         {TRY_NOW}"
    )
}
