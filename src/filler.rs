//! Automatic filling of unset message fields.
//!
//! Fillers are total: a missing source value simply leaves the field unset.
//! They never overwrite a field the caller already set.

use std::sync::Arc;

use crate::environment::PropertySource;
use crate::message::{Email, PhoneNumber, Sms};

/// Default property prefixes for SMS values, most specific first.
pub const SMS_FILL_PREFIXES: &[&str] = &["herald.sms", "sms"];

/// Default property prefixes for email values, most specific first.
pub const EMAIL_FILL_PREFIXES: &[&str] = &["herald.email", "email"];

/// Fills unset fields of a message.
pub trait MessageFiller<M>: Send + Sync {
    /// Fill `message` in place.
    fn fill(&self, message: &mut M);
}

/// Fills fields from configuration properties.
///
/// For each field the first prefix with a value wins: with prefixes
/// `["herald.sms", "sms"]` the sender comes from `herald.sms.from`, falling
/// back to `sms.from`. Recipient lists are comma separated.
pub struct PropertyFiller {
    properties: Arc<dyn PropertySource>,
    prefixes: Vec<String>,
}

impl std::fmt::Debug for PropertyFiller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyFiller")
            .field("prefixes", &self.prefixes)
            .finish_non_exhaustive()
    }
}

impl PropertyFiller {
    /// Filler reading `properties` under `prefixes`.
    pub fn new<I, S>(properties: Arc<dyn PropertySource>, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties,
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    fn lookup(&self, field: &str) -> Option<String> {
        self.prefixes.iter().find_map(|prefix| {
            self.properties
                .get(&format!("{prefix}.{field}"))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        })
    }

    fn lookup_list(&self, field: &str) -> Vec<String> {
        self.lookup(field)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl MessageFiller<Sms> for PropertyFiller {
    fn fill(&self, message: &mut Sms) {
        if message.from.is_none() {
            message.from = self.lookup("from").map(PhoneNumber::Raw);
        }
        if message.to.is_empty() {
            message.to = self
                .lookup_list("to")
                .into_iter()
                .map(PhoneNumber::Raw)
                .collect();
        }
    }
}

impl MessageFiller<Email> for PropertyFiller {
    fn fill(&self, message: &mut Email) {
        if message.from.is_none() {
            message.from = self.lookup("from");
        }
        if message.subject.is_none() {
            message.subject = self.lookup("subject");
        }
        if message.to.is_empty() {
            message.to = self.lookup_list("to");
        }
    }
}

/// Fills the SMS sender with a fixed value.
#[derive(Debug, Clone)]
pub struct FixedSenderFiller {
    from: String,
}

impl FixedSenderFiller {
    /// Filler setting the sender to `from` when unset.
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

impl MessageFiller<Sms> for FixedSenderFiller {
    fn fill(&self, message: &mut Sms) {
        if message.from.is_none() {
            message.from = Some(PhoneNumber::raw(self.from.clone()));
        }
    }
}

impl MessageFiller<Email> for FixedSenderFiller {
    fn fill(&self, message: &mut Email) {
        if message.from.is_none() {
            message.from = Some(self.from.clone());
        }
    }
}
