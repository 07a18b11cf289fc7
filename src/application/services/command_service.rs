use std::collections::HashMap;
use std::sync::Arc;

use crate::application::errors::{ConfigError, StorageError};
use crate::application::messaging::{CommandContext, RateLimitConfig};
use crate::domain::entities::{Command, CommandRegistry, Message, Value};
use crate::domain::traits::{Sender, PREFIX_KEY};

/// Default policy for `repeat`
const REPEAT_TIMES: u32 = 5;
const REPEAT_SECONDS: i64 = 60;

/// Builds the command registry: built-ins, custom commands, config
/// rate-limit overrides and reply senders
pub struct CommandService {
    registry: CommandRegistry,
    rate_limits: HashMap<String, RateLimitConfig>,
}

impl CommandService {
    pub fn new() -> Self {
        Self {
            registry: CommandRegistry::new(),
            rate_limits: HashMap::new(),
        }
    }

    /// Per-trigger rate-limit overrides, keyed by trigger name without
    /// trailing delimiter
    pub fn with_rate_limits(mut self, rate_limits: HashMap<String, RateLimitConfig>) -> Self {
        self.rate_limits = rate_limits;
        self
    }

    pub fn register(&mut self, command: Command) -> Result<(), ConfigError> {
        let command = match self.rate_limits.get(command.name()) {
            Some(config) => {
                tracing::info!("Rate limit override for '{}'", command.name());
                command.with_rate_limit(config.clone())
            }
            None => command,
        };
        self.registry.register(command)
    }

    pub fn add_sender(&mut self, sender: Arc<dyn Sender>) {
        self.registry.add_sender(sender);
    }

    pub fn register_defaults(&mut self) -> Result<(), ConfigError> {
        self.register(
            Command::new("help")
                .with_help("Show this message")
                .with_handler(|ctx| {
                    ctx.reply(help_message(ctx));
                    Ok(())
                }),
        )?;

        self.register(
            Command::new("prefix ")
                .with_parameters(&["string"])
                .with_help("Change the command prefix for this server")
                .admin_only()
                .with_handler(|ctx| {
                    if !ctx.ensure_admin() {
                        return Ok(());
                    }
                    let prefix = ctx.args.text(0).unwrap_or_default();
                    ctx.storage
                        .set_guild_value(&ctx.guild(), PREFIX_KEY, Value::from(prefix))
                        .or_else(keep_in_memory)?;
                    ctx.reply_text(format!("Prefix set to `{}`", prefix));
                    Ok(())
                }),
        )?;

        self.register(
            Command::new("admin ")
                .with_parameters(&["string"])
                .with_help("Grant admin rights on this server")
                .admin_only()
                .with_handler(|ctx| {
                    if !ctx.ensure_admin() {
                        return Ok(());
                    }
                    let id = ctx.args.text(0).unwrap_or_default();
                    let guild = ctx.guild();
                    if ctx.storage.is_admin(&guild, id)? {
                        ctx.reply_text(format!("{} is already an admin", id));
                        return Ok(());
                    }
                    ctx.storage.set_admin(&guild, id).or_else(keep_in_memory)?;
                    ctx.reply_text(format!("{} is now an admin", id));
                    Ok(())
                }),
        )?;

        self.register(
            Command::new("unadmin ")
                .with_parameters(&["string"])
                .with_help("Revoke admin rights on this server")
                .admin_only()
                .with_handler(|ctx| {
                    if !ctx.ensure_admin() {
                        return Ok(());
                    }
                    let id = ctx.args.text(0).unwrap_or_default();
                    let guild = ctx.guild();
                    if !ctx.storage.is_admin(&guild, id)? {
                        ctx.reply_text(format!("{} is not an admin", id));
                        return Ok(());
                    }
                    ctx.storage.unset_admin(&guild, id).or_else(keep_in_memory)?;
                    ctx.reply_text(format!("{} is no longer an admin", id));
                    Ok(())
                }),
        )?;

        self.register(
            Command::new("repeat ")
                .with_parameters(&["string"])
                .with_help("Repeat the given text")
                .with_rate_limit(RateLimitConfig::per_user("repeat", REPEAT_TIMES, REPEAT_SECONDS))
                .with_handler(|ctx| {
                    ctx.reply_text(ctx.args.text(0).unwrap_or_default());
                    Ok(())
                }),
        )?;

        Ok(())
    }

    pub fn into_registry(self) -> CommandRegistry {
        self.registry
    }
}

impl Default for CommandService {
    fn default() -> Self {
        Self::new()
    }
}

/// A failed flush leaves the change in memory, which is authoritative;
/// only corruption aborts the command.
fn keep_in_memory(e: StorageError) -> Result<(), StorageError> {
    if e.is_corruption() {
        return Err(e);
    }
    tracing::warn!("Store flush failed, change kept in memory: {}", e);
    Ok(())
}

/// Command listing, sorted by trigger
fn help_message(ctx: &CommandContext<'_>) -> Message {
    let mut commands: Vec<&Command> = ctx.commands().collect();
    commands.sort_by(|a, b| a.name().cmp(b.name()));

    let mut message = Message::new("Available commands");
    for cmd in commands {
        let mut usage = format!("{}{}", ctx.prefix(), cmd.name());
        for param in &cmd.parameters {
            usage.push_str(&format!(" <{}>", param));
        }
        let mut text = cmd.help.clone().unwrap_or_default();
        if cmd.admin_only {
            text.push_str(" (admin)");
        }
        message = message.with_field(usage, text.trim().to_string());
    }
    message
}
