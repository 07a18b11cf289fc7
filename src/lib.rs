//! Multi-tenant chat command core
//!
//! Raw text from a messaging service goes through prefix resolution,
//! trigger matching, typed argument parsing and a sliding-window rate limit
//! before a command body runs; its replies are routed back to the senders of
//! the originating service.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::errors::{BotError, CommandError, CorruptionError, StorageError};
pub use application::messaging::{CommandContext, Dispatcher, Outcome};
pub use domain::entities::{Command, CommandRegistry, Conversation, Guild, Message, User, Value};
pub use domain::traits::{Sender, Storage};
