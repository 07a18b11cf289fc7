//! Console adapter for development/testing

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::errors::BotError;
use crate::application::messaging::{Dispatcher, Outcome};
use crate::domain::entities::{Conversation, Message, User};
use crate::domain::traits::{Adapter, AdapterInfo, Sender};
use crate::infrastructure::config::ConsoleConfig;

/// Prints replies to stdout
pub struct ConsoleSender {
    service_id: String,
}

impl ConsoleSender {
    pub fn new(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
        }
    }
}

impl Sender for ConsoleSender {
    fn id(&self) -> &str {
        &self.service_id
    }

    fn send_message(&self, _conversation: &Conversation, message: &Message) -> Result<(), BotError> {
        println!("[BOT] {}", message);
        Ok(())
    }
}

/// Reads stdin lines as messages from a single local user
pub struct ConsoleAdapter {
    dispatcher: Arc<Dispatcher>,
    config: ConsoleConfig,
}

impl ConsoleAdapter {
    pub fn new(dispatcher: Arc<Dispatcher>, config: ConsoleConfig) -> Self {
        Self { dispatcher, config }
    }

    fn user(&self) -> User {
        User::new(self.config.service_id.clone(), self.config.user.clone())
    }

    /// Direct conversations, configured owners and stored admins get admin
    /// rights
    fn conversation(&self, user: &User) -> Result<Conversation, BotError> {
        let conversation = Conversation::new(
            self.config.service_id.clone(),
            "console",
            self.config.guild_id.clone(),
        );
        let guild = conversation.guild();
        let is_admin = guild.is_direct()
            || self.config.owners.contains(&user.name)
            || self.dispatcher.storage().is_admin(&guild, &user.name)?;
        Ok(conversation.with_admin(is_admin))
    }

    /// Dispatch one input line
    pub fn handle_line(&self, line: &str) -> Result<Outcome, BotError> {
        let user = self.user();
        let conversation = self.conversation(&user)?;
        self.dispatcher.on_message(&conversation, &user, line)
    }
}

#[async_trait]
impl Adapter for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!(
            "Starting console adapter as {} in guild '{}'",
            self.config.user,
            self.config.guild_id
        );
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| BotError::Internal(format!("stdin: {}", e)))?
        {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match self.handle_line(line) {
                Ok(outcome) => tracing::debug!("console: {:?}", outcome),
                Err(e) if e.is_corruption() => return Err(e),
                Err(e) => tracing::warn!("console: {}", e),
            }
        }

        tracing::info!("Console input closed");
        Ok(())
    }

    fn info(&self) -> AdapterInfo {
        AdapterInfo {
            service_id: self.config.service_id.clone(),
            name: "console".to_string(),
        }
    }
}
