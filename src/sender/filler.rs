//! Filling decorator.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::filler::MessageFiller;
use crate::message::Message;

use super::{SendError, Sender};

/// Fills unset message fields, then delegates unconditionally.
pub struct FillerSender<M: Message> {
    filler: Arc<dyn MessageFiller<M>>,
    inner: Arc<dyn Sender<M>>,
}

impl<M: Message> FillerSender<M> {
    /// Wrap `inner`.
    pub fn new(filler: Arc<dyn MessageFiller<M>>, inner: Arc<dyn Sender<M>>) -> Self {
        Self { filler, inner }
    }
}

#[async_trait]
impl<M: Message> Sender<M> for FillerSender<M> {
    async fn send(&self, mut message: M) -> Result<(), SendError> {
        self.filler.fill(&mut message);
        trace!(kind = message.kind(), summary = %message.summary(), "message filled");
        self.inner.send(message).await
    }

    fn name(&self) -> &str {
        "filler"
    }
}
