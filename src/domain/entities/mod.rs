//! Domain entities - Core business objects

pub mod command;
pub mod conversation;
pub mod message;
pub mod user;
pub mod value;

pub use command::{Command, CommandHandler, CommandRegistry};
pub use conversation::{Conversation, Guild};
pub use message::{Field, Message};
pub use user::User;
pub use value::Value;
