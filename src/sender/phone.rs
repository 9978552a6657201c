//! Phone number translation decorator.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::addressing::{AddressingError, PhoneNumberTranslator};
use crate::message::{PhoneNumber, Sms};

use super::{SendError, Sender};

/// Classifies sender and recipient addresses, then delegates.
///
/// Sender and recipients use independent translators. A message without
/// recipients, or with any rejected address, fails the send before the inner
/// sender runs.
pub struct PhoneNumberTranslatorSender {
    sender_translator: PhoneNumberTranslator,
    recipient_translator: PhoneNumberTranslator,
    inner: Arc<dyn Sender<Sms>>,
}

impl PhoneNumberTranslatorSender {
    /// Wrap `inner`.
    pub fn new(
        sender_translator: PhoneNumberTranslator,
        recipient_translator: PhoneNumberTranslator,
        inner: Arc<dyn Sender<Sms>>,
    ) -> Self {
        Self {
            sender_translator,
            recipient_translator,
            inner,
        }
    }

    fn translate(&self, mut sms: Sms) -> Result<Sms, SendError> {
        if sms.to.is_empty() {
            return Err(AddressingError::NoRecipients.into());
        }
        if let Some(from) = &sms.from {
            let addressed = self.sender_translator.translate(from)?;
            sms.from = Some(PhoneNumber::Addressed(addressed));
        }
        sms.to = sms
            .to
            .iter()
            .map(|to| {
                self.recipient_translator
                    .translate(to)
                    .map(PhoneNumber::Addressed)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sms)
    }
}

#[async_trait]
impl Sender<Sms> for PhoneNumberTranslatorSender {
    async fn send(&self, message: Sms) -> Result<(), SendError> {
        let translated = match self.translate(message) {
            Ok(translated) => translated,
            Err(err) => {
                warn!(error = %err, "phone number translation rejected message");
                return Err(err);
            }
        };
        self.inner.send(translated).await
    }

    fn name(&self) -> &str {
        "phone-number-translator"
    }
}
