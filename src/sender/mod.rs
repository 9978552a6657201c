//! The sending contract and the layers composed around it.
//!
//! Every piece of a pipeline implements [`Sender`]: transports deliver,
//! decorators adjust the message and delegate to exactly one inner sender,
//! and [`ImplementationResolver`] picks a transport per message.
//!
//! Pipeline order, outermost first:
//! [`FillerSender`] → [`ContentTranslatorSender`] → [`PhoneNumberTranslatorSender`]
//! → [`ImplementationResolver`].

use async_trait::async_trait;

use crate::addressing::AddressingError;
use crate::message::Message;
use crate::translator::TranslationError;

mod content;
mod filler;
mod phone;
mod resolver;

pub use content::{ContentTranslatorSender, MESSAGE_VARIABLE};
pub use filler::FillerSender;
pub use phone::PhoneNumberTranslatorSender;
pub use resolver::{Implementation, ImplementationResolver};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Opaque failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("delivery through '{transport}' failed: {reason}")]
pub struct DeliveryError {
    /// Name of the failing transport.
    pub transport: String,
    /// Transport-provided description.
    pub reason: String,
}

impl DeliveryError {
    /// Create a delivery error.
    pub fn new(transport: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            transport: transport.into(),
            reason: reason.into(),
        }
    }
}

/// Errors returned by [`Sender::send`].
///
/// A layer that fails never invokes the next one.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// No registered implementation accepts the message.
    #[error("no implementation available to send {kind}: {summary}")]
    NoMatchingImplementation {
        /// Channel of the rejected message.
        kind: &'static str,
        /// Summary of the rejected message.
        summary: String,
    },
    /// Content could not be translated; nothing was sent.
    #[error("content translation failed: {0}")]
    ContentTranslation(#[from] TranslationError),
    /// An address is not valid for its role; nothing was sent.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressingError),
    /// The transport failed.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    /// The messaging service has no pipeline for this channel.
    #[error("no {kind} pipeline configured")]
    ChannelNotConfigured {
        /// Channel of the rejected message.
        kind: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Anything that can send a message of type `M`.
///
/// Implementations must be `Send + Sync`: an assembled pipeline is shared
/// across tasks and invoked concurrently. Transports are responsible for
/// serializing access to any shared connection they hold.
#[async_trait]
pub trait Sender<M: Message>: Send + Sync {
    /// Send `message`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] when this layer or any inner layer fails.
    async fn send(&self, message: M) -> Result<(), SendError>;

    /// Name used in logs and assembly reports.
    fn name(&self) -> &str;
}
