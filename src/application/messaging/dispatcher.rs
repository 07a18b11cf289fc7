//! Message dispatcher - Routes raw messages to commands and replies to senders

use std::cell::Cell;
use std::sync::Arc;

use uuid::Uuid;

use super::parser::{tokenize, ArgumentParser, Arguments};
use super::rate_limit::Admission;
use crate::application::errors::{BotError, CommandError};
use crate::domain::entities::{Command, CommandRegistry, Conversation, Guild, Message, User};
use crate::domain::traits::{Clock, Storage, SystemClock, PREFIX_KEY};

/// Terminal state of one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A command body ran
    Delivered,
    /// Not addressed to any command
    Dropped,
    /// Addressed to a command but refused (bad arguments or rate limited)
    Rejected,
}

/// Everything a command body can see and use
pub struct CommandContext<'a> {
    pub conversation: &'a Conversation,
    pub user: &'a User,
    pub args: Arguments,
    pub storage: &'a dyn Storage,
    prefix: &'a str,
    registry: &'a CommandRegistry,
    sent: Cell<usize>,
}

impl<'a> CommandContext<'a> {
    pub fn guild(&self) -> Guild {
        self.conversation.guild()
    }

    /// Prefix in effect for this conversation
    pub fn prefix(&self) -> &str {
        self.prefix
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.registry.all()
    }

    /// Deliver a reply to every sender of the conversation's service
    pub fn reply(&self, message: Message) {
        let delivered = route(self.registry, self.conversation, &message);
        self.sent.set(self.sent.get() + delivered);
    }

    pub fn reply_text(&self, text: impl Into<String>) {
        self.reply(Message::from_text(text));
    }

    /// Replies "not authorized" and returns false unless the conversation
    /// carries admin rights
    pub fn ensure_admin(&self) -> bool {
        if self.conversation.is_admin {
            return true;
        }
        self.reply_text("You are not authorized to use this command.");
        false
    }
}

/// Send `message` to every sender registered for the conversation's service.
/// Returns how many senders accepted it.
fn route(registry: &CommandRegistry, conversation: &Conversation, message: &Message) -> usize {
    let mut delivered = 0;
    for sender in registry.senders_for(&conversation.service_id) {
        match sender.send_message(conversation, message) {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(
                "[{}] sender '{}' failed: {}",
                conversation.conversation_id,
                sender.id(),
                e
            ),
        }
    }
    if delivered == 0 {
        tracing::debug!(
            "[{}] no sender accepted reply for service '{}'",
            conversation.conversation_id,
            conversation.service_id
        );
    }
    delivered
}

/// Message dispatcher: prefix, trigger, arguments, rate limit, execute, reply
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    storage: Arc<dyn Storage>,
    parser: ArgumentParser,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CommandRegistry>, storage: Arc<dyn Storage>) -> Self {
        Self {
            registry,
            storage,
            parser: ArgumentParser::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Guild prefix, falling back to the default; empty when neither is set
    pub fn resolve_prefix(&self, guild: &Guild) -> String {
        self.storage
            .get_guild_value(guild, PREFIX_KEY)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    /// Handle one inbound message
    ///
    /// User mistakes never surface as errors. `Err` means a store invariant
    /// is broken (or the body failed in a way that is not the user's fault).
    pub fn on_message(
        &self,
        conversation: &Conversation,
        user: &User,
        text: &str,
    ) -> Result<Outcome, BotError> {
        let trace_id = Uuid::new_v4();
        let prefix = self.resolve_prefix(&conversation.guild());

        let Some(body) = text.strip_prefix(prefix.as_str()) else {
            tracing::debug!("[{}] dropped: no prefix '{}'", trace_id, prefix);
            return Ok(Outcome::Dropped);
        };

        let Some((command, rest)) = self.registry.find(body) else {
            tracing::debug!("[{}] dropped: no trigger matches", trace_id);
            return Ok(Outcome::Dropped);
        };
        tracing::debug!(
            "[{}] {} -> '{}' in {}",
            trace_id,
            user,
            command.name(),
            conversation.guild()
        );

        let tokens = tokenize(rest);
        let args = match self.parser.parse(&tokens, &command.parameters) {
            Ok(args) => args,
            Err(e) => {
                tracing::debug!("[{}] rejected: {}", trace_id, e);
                return Ok(Outcome::Rejected);
            }
        };

        if let Some(limiter) = &command.rate_limit {
            let now = self.clock.now();
            match limiter.check(self.storage.as_ref(), user, now) {
                Ok(Admission::Admitted) => {}
                Ok(Admission::Limited { remaining }) => {
                    tracing::debug!("[{}] rate limited for {}s", trace_id, remaining);
                    let reply = Message::from_text(limiter.limit_message(remaining));
                    route(&self.registry, conversation, &reply);
                    return Ok(Outcome::Rejected);
                }
                Err(e) => {
                    tracing::error!("[{}] {}", trace_id, e);
                    return Err(e.into());
                }
            }
        }

        let ctx = CommandContext {
            conversation,
            user,
            args,
            storage: self.storage.as_ref(),
            prefix: &prefix,
            registry: &self.registry,
            sent: Cell::new(0),
        };

        let Some(handler) = &command.handler else {
            ctx.reply_text(format!("Command {} not implemented", command.name()));
            return Ok(Outcome::Delivered);
        };

        match handler(&ctx) {
            Ok(()) => {}
            Err(CommandError::Storage(e)) if e.is_corruption() => {
                tracing::error!("[{}] {}", trace_id, e);
                return Err(BotError::Command(CommandError::Storage(e)));
            }
            Err(CommandError::Storage(e)) => {
                tracing::warn!("[{}] '{}' could not persist: {}", trace_id, command.name(), e);
            }
            Err(e) => {
                tracing::warn!("[{}] '{}' failed: {}", trace_id, command.name(), e);
                ctx.reply_text(e.to_string());
            }
        }

        tracing::debug!("[{}] delivered {} replies", trace_id, ctx.sent.get());
        Ok(Outcome::Delivered)
    }
}
