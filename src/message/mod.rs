//! Outbound message model.
//!
//! Two channels are supported: [`Sms`] and [`Email`]. Both carry a [`Content`]
//! that may still be a template when submitted; the content translation layer
//! resolves it to text before any transport sees it.

use serde::Serialize;
use serde_json::{Map, Value};

mod email;
mod sms;

pub use email::Email;
pub use sms::{PhoneNumber, Sms};

// ---------------------------------------------------------------------------
// Message trait
// ---------------------------------------------------------------------------

/// Behaviour shared by every message type that flows through a pipeline.
pub trait Message: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Channel name (`"sms"`, `"email"`).
    fn kind(&self) -> &'static str;

    /// Short human-readable description used in diagnostics.
    fn summary(&self) -> String;

    /// The message body.
    fn content(&self) -> &Content;

    /// Mutable access to the message body.
    fn content_mut(&mut self) -> &mut Content;

    /// Message fields exposed to templates under the `message` key.
    fn fields(&self) -> Map<String, Value>;
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Message body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    /// Final text, ready for delivery.
    Text {
        /// The text.
        text: String,
    },
    /// A template still to be resolved.
    Template(TemplateContent),
}

impl Content {
    /// Plain text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Returns the text when the content has been resolved.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Template(_) => None,
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text { text }
    }
}

/// Where a template body comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TemplateSource {
    /// Template text given directly.
    Inline(String),
    /// Template name resolved against the configured prefix and suffix.
    Path(String),
}

/// A template plus the variables used to render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateContent {
    /// Template body or location.
    pub source: TemplateSource,
    /// Caller-supplied variables.
    pub variables: Map<String, Value>,
}

impl TemplateContent {
    /// Inline template.
    pub fn inline(source: impl Into<String>) -> Self {
        Self {
            source: TemplateSource::Inline(source.into()),
            variables: Map::new(),
        }
    }

    /// Template loaded by name.
    pub fn path(name: impl Into<String>) -> Self {
        Self {
            source: TemplateSource::Path(name.into()),
            variables: Map::new(),
        }
    }

    /// Add a variable.
    #[must_use]
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }
}

impl From<TemplateContent> for Content {
    fn from(template: TemplateContent) -> Self {
        Self::Template(template)
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Any message accepted by [`crate::builder::MessagingService`].
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Text message.
    Sms(Sms),
    /// Email message.
    Email(Email),
}

impl Outbound {
    /// Channel name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sms(sms) => sms.kind(),
            Self::Email(email) => email.kind(),
        }
    }
}

impl From<Sms> for Outbound {
    fn from(sms: Sms) -> Self {
        Self::Sms(sms)
    }
}

impl From<Email> for Outbound {
    fn from(email: Email) -> Self {
        Self::Email(email)
    }
}

fn content_summary(content: &Content) -> String {
    const MAX_SUMMARY_CHARS: usize = 40;
    match content {
        Content::Text { text } => {
            if text.chars().count() > MAX_SUMMARY_CHARS {
                let shortened: String = text.chars().take(MAX_SUMMARY_CHARS).collect();
                format!("\"{shortened}...\"")
            } else {
                format!("\"{text}\"")
            }
        }
        Content::Template(template) => match &template.source {
            TemplateSource::Inline(_) => "<inline template>".to_owned(),
            TemplateSource::Path(name) => format!("<template {name}>"),
        },
    }
}
