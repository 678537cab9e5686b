//! `/help` usage guide command

use std::sync::Arc;

use async_trait::async_trait;

use super::CommandHandler;
use crate::telegram::ChatProvider;
use crate::Result;

const GENERAL_HELP: &str = "🤖 Nebula Bot Help Guide\n\n\
    I'm your voice processing assistant for messages from Telegram and WhatsApp chats.\n\n\
    🎯 Main Features:\n\
    • Voice message transcription\n\
    • Automatic language detection\n\
    • Smart summarization for longer messages\n\
    • Contextual responses\n\n\
    📱 Supported Messages:\n\
    • Voice messages (up to 10 minutes)\n\
    • Audio files (m4a and ogg format)\n\n\
    💡 Tips:\n\
    • Forward messages from WhatsApp or Telegram!\n\
    • Messages under 100 words get transcription only\n\
    • Longer messages receive summaries and responses\n\
    • All audio is processed securely and deleted after analysis";

/// Sends the feature guide
pub struct HelpCommand {
    chat: Arc<dyn ChatProvider>,
}

impl HelpCommand {
    /// Create the command over the given chat capability
    #[must_use]
    pub fn new(chat: Arc<dyn ChatProvider>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn execute(&self, chat_id: i64) -> Result<()> {
        let message = format!("{GENERAL_HELP}\n\nType /start to begin using the bot!");
        self.chat.send_message(chat_id, &message).await?;
        tracing::info!(chat_id, "sent help message");
        Ok(())
    }
}
