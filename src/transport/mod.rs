//! Transports: the innermost senders that actually deliver messages.
//!
//! - [`log::LogSender`]: dry-run transport writing each message to the log
//! - [`webhook::WebhookSender`]: JSON over HTTP (feature `webhook`)

use serde::Serialize;

use crate::message::{Content, PhoneNumber};
use crate::sender::DeliveryError;

pub mod log;
#[cfg(feature = "webhook")]
pub mod webhook;

/// Address as seen by a transport: digits plus SMPP TON/NPI values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireAddress {
    /// Stored number or alphanumeric ID.
    pub number: String,
    /// SMPP type of number.
    pub ton: u8,
    /// SMPP numbering plan indicator.
    pub npi: u8,
}

impl From<&PhoneNumber> for WireAddress {
    fn from(number: &PhoneNumber) -> Self {
        match number {
            PhoneNumber::Raw(raw) => Self {
                number: raw.clone(),
                ton: 0,
                npi: 0,
            },
            PhoneNumber::Addressed(addressed) => Self {
                number: addressed.number.clone(),
                ton: addressed.type_of_number.smpp_value(),
                npi: addressed.npi.smpp_value(),
            },
        }
    }
}

/// Final text of `content`, or a delivery error naming `transport` when the
/// content was never translated.
///
/// # Errors
///
/// Returns [`DeliveryError`] for template content.
pub fn final_text<'a>(transport: &str, content: &'a Content) -> Result<&'a str, DeliveryError> {
    content.as_text().ok_or_else(|| {
        DeliveryError::new(
            transport,
            "content is an unresolved template; enable template translation",
        )
    })
}
