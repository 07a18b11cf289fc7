use std::fmt;

/// Tenant scope under a service: the unit for prefix, admin list and
/// per-community settings.
///
/// An empty `guild_id` is a direct (ungrouped) conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Guild {
    pub service_id: String,
    pub guild_id: String,
}

impl Guild {
    pub fn new(service_id: impl Into<String>, guild_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            guild_id: guild_id.into(),
        }
    }

    pub fn is_direct(&self) -> bool {
        self.guild_id.is_empty()
    }
}

impl fmt::Display for Guild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_direct() {
            write!(f, "{}/direct", self.service_id)
        } else {
            write!(f, "{}/{}", self.service_id, self.guild_id)
        }
    }
}

/// Where a reply must be delivered
///
/// `is_admin` is resolved by the service adapter before dispatch; the core
/// only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub service_id: String,
    pub conversation_id: String,
    pub guild_id: String,
    pub is_admin: bool,
}

impl Conversation {
    pub fn new(
        service_id: impl Into<String>,
        conversation_id: impl Into<String>,
        guild_id: impl Into<String>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            conversation_id: conversation_id.into(),
            guild_id: guild_id.into(),
            is_admin: false,
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn guild(&self) -> Guild {
        Guild::new(self.service_id.clone(), self.guild_id.clone())
    }
}
