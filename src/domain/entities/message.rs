use std::fmt;

/// Named field attached to a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// Outgoing reply produced by a command body
///
/// Adapters decide how to render it (embed, plain text, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub description: String,
    pub url: Option<String>,
    pub fields: Vec<Field>,
}

impl Message {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Reply with a body only
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            description: text.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

impl fmt::Display for Message {
    /// Plain-text rendering for adapters without rich formatting
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        if !self.title.is_empty() {
            lines.push(self.title.clone());
        }
        if !self.description.is_empty() {
            lines.push(self.description.clone());
        }
        if let Some(url) = &self.url {
            lines.push(url.clone());
        }
        for field in &self.fields {
            lines.push(format!("{}: {}", field.name, field.value));
        }
        write!(f, "{}", lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_rendering() {
        let msg = Message::new("Weather")
            .with_description("Sunny")
            .with_url("https://example.com")
            .with_field("High", "24C");
        assert_eq!(msg.to_string(), "Weather\nSunny\nhttps://example.com\nHigh: 24C");
    }

    #[test]
    fn test_text_only() {
        assert_eq!(Message::from_text("pong").to_string(), "pong");
    }
}
