//! SMS message.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::addressing::AddressedPhoneNumber;

use super::{content_summary, Content, Message};

/// A phone number before or after addressing classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PhoneNumber {
    /// Number as given by the caller or the filler.
    Raw(String),
    /// Number classified into a protocol addressing tuple.
    Addressed(AddressedPhoneNumber),
}

impl PhoneNumber {
    /// Raw, unclassified number.
    pub fn raw(value: impl Into<String>) -> Self {
        Self::Raw(value.into())
    }

    /// The classified address, if classification already happened.
    pub fn addressed(&self) -> Option<&AddressedPhoneNumber> {
        match self {
            Self::Raw(_) => None,
            Self::Addressed(addressed) => Some(addressed),
        }
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw(raw) => f.write_str(raw),
            Self::Addressed(addressed) => write!(f, "{addressed}"),
        }
    }
}

impl From<&str> for PhoneNumber {
    fn from(value: &str) -> Self {
        Self::raw(value)
    }
}

impl From<String> for PhoneNumber {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

impl From<AddressedPhoneNumber> for PhoneNumber {
    fn from(value: AddressedPhoneNumber) -> Self {
        Self::Addressed(value)
    }
}

/// Text message with an optional sender and one or more recipients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sms {
    /// Message body.
    pub content: Content,
    /// Sender address; filled from configuration when unset.
    pub from: Option<PhoneNumber>,
    /// Recipient addresses.
    pub to: Vec<PhoneNumber>,
}

impl Sms {
    /// Create an SMS to a single recipient with no sender.
    pub fn new(content: impl Into<Content>, to: impl Into<PhoneNumber>) -> Self {
        Self {
            content: content.into(),
            from: None,
            to: vec![to.into()],
        }
    }

    /// Set the sender.
    #[must_use]
    pub fn from(mut self, from: impl Into<PhoneNumber>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Add a recipient.
    #[must_use]
    pub fn to(mut self, to: impl Into<PhoneNumber>) -> Self {
        self.to.push(to.into());
        self
    }
}

impl Message for Sms {
    fn kind(&self) -> &'static str {
        "sms"
    }

    fn summary(&self) -> String {
        let from = self
            .from
            .as_ref()
            .map_or_else(|| "<unset>".to_owned(), ToString::to_string);
        let to = self
            .to
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "sms from {from} to [{to}]: {}",
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
            fields.insert("from".to_owned(), Value::String(from.to_string()));
        }
        fields.insert(
            "to".to_owned(),
            Value::Array(
                self.to
                    .iter()
                    .map(|number| Value::String(number.to_string()))
                    .collect(),
            ),
        );
        fields
    }
}
