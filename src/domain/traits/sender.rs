use crate::application::errors::BotError;
use crate::domain::entities::{Conversation, Message};

/// Outbound side of a service integration
///
/// Replies are routed to every sender whose `id` equals the conversation's
/// service id.
pub trait Sender: Send + Sync {
    fn id(&self) -> &str;

    fn send_message(&self, conversation: &Conversation, message: &Message) -> Result<(), BotError>;
}
