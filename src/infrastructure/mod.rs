//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: In-memory and persisted scoped stores
//! - Adapters: Platform integrations (console)

pub mod adapters;
pub mod config;
pub mod storage;
