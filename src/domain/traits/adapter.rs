use async_trait::async_trait;

use crate::application::errors::BotError;

/// Adapter trait - inbound side of a messaging platform
///
/// An adapter turns platform events into `Conversation`/`User` values and
/// feeds them to the dispatcher until the platform stream ends.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Start listening and dispatching; returns when the source is exhausted
    async fn start(&self) -> Result<(), BotError>;

    fn info(&self) -> AdapterInfo;
}

/// Adapter information
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    pub service_id: String,
    pub name: String,
}
