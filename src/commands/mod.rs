//! Bot command registry and handlers

mod help;
mod start;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;

pub use self::help::HelpCommand;
pub use self::start::StartCommand;

/// A registered command handler
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the command for the given chat
    ///
    /// # Errors
    ///
    /// Returns an error if the handler could not post its reply
    async fn execute(&self, chat_id: i64) -> Result<()>;
}

/// A command with its user-facing metadata
struct Command {
    handler: Arc<dyn CommandHandler>,
    description: String,
    help_text: String,
}

/// Name → handler mapping for fixed-text bot commands.
///
/// Command names are normalized to carry a leading `/`; unknown names
/// resolve to `None`, never an error.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    /// Register a command under `name`
    pub fn register(
        &mut self,
        name: &str,
        handler: Arc<dyn CommandHandler>,
        description: &str,
        help_text: &str,
    ) {
        let name = normalize(name);
        tracing::info!(command = %name, "registered command");
        self.commands.insert(
            name,
            Command {
                handler,
                description: description.to_string(),
                help_text: help_text.to_string(),
            },
        );
    }

    /// Dispatch a command by name; `None` when the name is unknown
    pub async fn handle(&self, name: &str, chat_id: i64) -> Option<Result<()>> {
        let command = self.commands.get(&normalize(name))?;
        Some(command.handler.execute(chat_id).await)
    }

    /// One line per command: name and description
    #[must_use]
    pub fn available_commands(&self) -> String {
        let mut lines: Vec<String> = self
            .commands
            .iter()
            .map(|(name, command)| format!("{name}: {}", command.description))
            .collect();
        lines.sort();
        lines.join("\n")
    }

    /// Help text for a specific command, if registered
    #[must_use]
    pub fn command_help(&self, name: &str) -> Option<&str> {
        self.commands
            .get(&normalize(name))
            .map(|command| command.help_text.as_str())
    }
}

/// Enforce the leading `/` marker
fn normalize(name: &str) -> String {
    if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{name}")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct CountingHandler {
        calls: AtomicU32,
    }

    #[async_trait]
    impl CommandHandler for CountingHandler {
        async fn execute(&self, _chat_id: i64) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn registry_with_ping() -> (CommandRegistry, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler {
            calls: AtomicU32::new(0),
        });
        let mut registry = CommandRegistry::default();
        registry.register(
            "ping",
            handler.clone(),
            "Ping the bot",
            "Use /ping to check the bot is alive",
        );
        (registry, handler)
    }

    #[tokio::test]
    async fn registered_name_gains_leading_slash() {
        let (registry, handler) = registry_with_ping();

        assert!(registry.handle("/ping", 1).await.is_some());
        assert!(registry.handle("ping", 1).await.is_some());
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_command_resolves_to_none() {
        let (registry, _) = registry_with_ping();
        assert!(registry.handle("/missing", 1).await.is_none());
    }

    #[test]
    fn available_commands_lists_descriptions() {
        let (registry, _) = registry_with_ping();
        assert_eq!(registry.available_commands(), "/ping: Ping the bot");
    }

    #[test]
    fn command_help_lookup() {
        let (registry, _) = registry_with_ping();
        assert_eq!(
            registry.command_help("ping"),
            Some("Use /ping to check the bot is alive")
        );
        assert_eq!(registry.command_help("/other"), None);
    }
}
