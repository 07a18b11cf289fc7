use std::fmt;

/// Represents the author of an inbound message
///
/// Users are scoping keys only; the store persists values derived from a
/// user, never the user itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub name: String,
    pub service_id: String,
}

impl User {
    pub fn new(service_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service_id: service_id.into(),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.service_id)
    }
}
