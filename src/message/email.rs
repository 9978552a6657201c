//! Email message.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{content_summary, Content, Message};

/// Email message. Addresses are kept as plain strings; no addressing layer
/// applies to email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    /// Message body.
    pub content: Content,
    /// Subject line; filled from configuration when unset.
    pub subject: Option<String>,
    /// Sender address; filled from configuration when unset.
    pub from: Option<String>,
    /// Primary recipients.
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    pub cc: Vec<String>,
    /// Blind carbon-copy recipients.
    pub bcc: Vec<String>,
}

impl Email {
    /// Create an email to a single recipient.
    pub fn new(
        subject: impl Into<String>,
        content: impl Into<Content>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            subject: Some(subject.into()),
            from: None,
            to: vec![to.into()],
            cc: Vec::new(),
            bcc: Vec::new(),
        }
    }

    /// Set the sender.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Add a primary recipient.
    #[must_use]
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to.push(to.into());
        self
    }

    /// Add a carbon-copy recipient.
    #[must_use]
    pub fn cc(mut self, cc: impl Into<String>) -> Self {
        self.cc.push(cc.into());
        self
    }

    /// Add a blind carbon-copy recipient.
    #[must_use]
    pub fn bcc(mut self, bcc: impl Into<String>) -> Self {
        self.bcc.push(bcc.into());
        self
    }
}

impl Message for Email {
    fn kind(&self) -> &'static str {
        "email"
    }

    fn summary(&self) -> String {
        format!(
            "email from {} to [{}] subject {:?}: {}",
            self.from.as_deref().unwrap_or("<unset>"),
            self.to.join(", "),
            self.subject.as_deref().unwrap_or(""),
            content_summary(&self.content)
        )
    }

    fn content(&self) -> &Content {
        &self.content
    }

    fn content_mut(&mut self) -> &mut Content {
        &mut self.content
    }

    fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(from) = &self.from {
            fields.insert("from".to_owned(), Value::String(from.clone()));
        }
        if let Some(subject) = &self.subject {
            fields.insert("subject".to_owned(), Value::String(subject.clone()));
        }
        let list = |values: &[String]| {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        };
        fields.insert("to".to_owned(), list(&self.to));
        fields.insert("cc".to_owned(), list(&self.cc));
        fields.insert("bcc".to_owned(), list(&self.bcc));
        fields
    }
}
