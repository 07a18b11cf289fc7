//! Domain layer - Core business objects and abstractions
//!
//! This layer contains:
//! - Entities: Conversation, User, Message, Command, stored values
//! - Traits: Abstractions for infrastructure (Storage, Sender, Adapter, Clock)

pub mod entities;
pub mod traits;
