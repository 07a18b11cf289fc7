use std::sync::Arc;

use crate::application::errors::{CommandError, ConfigError};
use crate::application::messaging::{CommandContext, RateLimitConfig, RateLimiter};
use crate::domain::traits::Sender;

/// Command body: receives the invocation context, emits replies through it
pub type CommandHandler =
    Box<dyn Fn(&CommandContext<'_>) -> Result<(), CommandError> + Send + Sync>;

/// Represents a registered bot command
pub struct Command {
    pub trigger: String,
    pub parameters: Vec<String>,
    pub help: Option<String>,
    pub admin_only: bool,
    pub rate_limit: Option<RateLimiter>,
    pub handler: Option<CommandHandler>,
}

impl Command {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            parameters: Vec::new(),
            help: None,
            admin_only: false,
            rate_limit: None,
            handler: None,
        }
    }

    /// Parameter type names, in order (`string`, `int`, `float`, `bool`, ...)
    pub fn with_parameters(mut self, parameters: &[&str]) -> Self {
        self.parameters = parameters.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Mark the command as admin-gated. The body still performs the check;
    /// the flag is surfaced in help output.
    pub fn admin_only(mut self) -> Self {
        self.admin_only = true;
        self
    }

    /// Attach a rate-limit policy. A disabled policy (zero times or zero
    /// seconds) leaves the command unwrapped.
    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = if config.is_disabled() {
            None
        } else {
            Some(RateLimiter::new(config))
        };
        self
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CommandContext<'_>) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Returns the text after the trigger when `body` invokes this command
    ///
    /// Matching is a literal prefix test: a trigger ending in a space needs
    /// that separator, a bare trigger does not.
    pub fn strip_trigger<'a>(&self, body: &'a str) -> Option<&'a str> {
        body.strip_prefix(self.trigger.as_str())
    }

    /// Trigger without its trailing delimiter, for display
    pub fn name(&self) -> &str {
        self.trigger.trim_end()
    }
}

/// Commands and reply senders, built once at startup
///
/// Commands are kept ordered by descending trigger length so the first match
/// is the longest trigger; equal lengths keep registration order.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
    senders: Vec<Arc<dyn Sender>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Command) -> Result<(), ConfigError> {
        if command.trigger.trim().is_empty() {
            return Err(ConfigError::InvalidValue("empty command trigger".to_string()));
        }
        if self.get(&command.trigger).is_some() {
            return Err(ConfigError::InvalidValue(format!(
                "trigger '{}' already registered",
                command.trigger
            )));
        }

        let len = command.trigger.len();
        let pos = self
            .commands
            .iter()
            .position(|c| c.trigger.len() < len)
            .unwrap_or(self.commands.len());
        tracing::debug!("Registered command '{}'", command.trigger);
        self.commands.insert(pos, command);
        Ok(())
    }

    pub fn add_sender(&mut self, sender: Arc<dyn Sender>) {
        tracing::debug!("Registered sender '{}'", sender.id());
        self.senders.push(sender);
    }

    pub fn get(&self, trigger: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.trigger == trigger)
    }

    /// Find the command invoked by `body` (prefix already stripped)
    pub fn find<'a>(&self, body: &'a str) -> Option<(&Command, &'a str)> {
        self.commands
            .iter()
            .find_map(|c| c.strip_trigger(body).map(|rest| (c, rest)))
    }

    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Senders whose identity matches the service
    pub fn senders_for<'a>(&'a self, service_id: &'a str) -> impl Iterator<Item = &'a Arc<dyn Sender>> {
        self.senders.iter().filter(move |s| s.id() == service_id)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_trigger_wins() {
        let mut registry = CommandRegistry::new();
        registry.register(Command::new("help")).unwrap();
        registry.register(Command::new("helpadmin")).unwrap();

        let (cmd, rest) = registry.find("helpadmin now").unwrap();
        assert_eq!(cmd.trigger, "helpadmin");
        assert_eq!(rest, " now");

        let (cmd, rest) = registry.find("help me").unwrap();
        assert_eq!(cmd.trigger, "help");
        assert_eq!(rest, " me");
    }

    #[test]
    fn test_trailing_space_trigger_needs_separator() {
        let mut registry = CommandRegistry::new();
        registry.register(Command::new("say ")).unwrap();

        assert!(registry.find("say hi").is_some());
        assert!(registry.find("say").is_none());
        assert!(registry.find("sayhi").is_none());
    }

    #[test]
    fn test_bare_trigger_matches_without_separator() {
        let mut registry = CommandRegistry::new();
        registry.register(Command::new("roll")).unwrap();

        let (_, rest) = registry.find("roll20").unwrap();
        assert_eq!(rest, "20");
    }

    #[test]
    fn test_duplicate_and_empty_triggers_rejected() {
        let mut registry = CommandRegistry::new();
        registry.register(Command::new("ping")).unwrap();
        assert!(registry.register(Command::new("ping")).is_err());
        assert!(registry.register(Command::new("  ")).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_disabled_rate_limit_leaves_command_unwrapped() {
        let cmd = Command::new("ping").with_rate_limit(RateLimitConfig::per_user("ping", 0, 60));
        assert!(cmd.rate_limit.is_none());

        let cmd = Command::new("ping").with_rate_limit(RateLimitConfig::per_user("ping", 3, 0));
        assert!(cmd.rate_limit.is_none());

        let cmd = Command::new("ping").with_rate_limit(RateLimitConfig::per_user("ping", 3, 60));
        assert!(cmd.rate_limit.is_some());
    }
}
