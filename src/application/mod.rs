//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Errors: Error taxonomy shared by every layer
//! - Messaging: Argument parsing, rate limiting, dispatching
//! - Services: Built-in commands

pub mod errors;
pub mod messaging;
pub mod services;
