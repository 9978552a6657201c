//! Dry-run transport.

use async_trait::async_trait;
use tracing::info;

use crate::message::{Email, Message, Sms};
use crate::sender::{SendError, Sender};

use super::{final_text, WireAddress};

/// Writes every message to the log instead of delivering it.
#[derive(Debug, Clone)]
pub struct LogSender {
    name: String,
}

impl LogSender {
    /// Transport reported under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogSender {
    fn default() -> Self {
        Self::new("log")
    }
}

#[async_trait]
impl Sender<Sms> for LogSender {
    async fn send(&self, message: Sms) -> Result<(), SendError> {
        let text = final_text(&self.name, &message.content)?;
        let from = message.from.as_ref().map(WireAddress::from);
        let to: Vec<WireAddress> = message.to.iter().map(WireAddress::from).collect();
        info!(
            transport = %self.name,
            from = ?from,
            to = ?to,
            text,
            "sms dry-run delivery"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Sender<Email> for LogSender {
    async fn send(&self, message: Email) -> Result<(), SendError> {
        let text = final_text(&self.name, &message.content)?;
        info!(
            transport = %self.name,
            summary = %message.summary(),
            chars = text.chars().count(),
            "email dry-run delivery"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
