//! Content translation decorator.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::message::{Content, Message};
use crate::translator::ContentTranslator;

use super::{SendError, Sender};

/// Template variable holding the message fields.
pub const MESSAGE_VARIABLE: &str = "message";

/// Translates the message content, then delegates.
///
/// Before translation, template content receives the message fields under the
/// `message` variable unless the caller already defined that variable. A
/// translation failure is returned without calling the inner sender.
pub struct ContentTranslatorSender<M: Message> {
    translator: Arc<dyn ContentTranslator>,
    inner: Arc<dyn Sender<M>>,
}

impl<M: Message> ContentTranslatorSender<M> {
    /// Wrap `inner`.
    pub fn new(translator: Arc<dyn ContentTranslator>, inner: Arc<dyn Sender<M>>) -> Self {
        Self { translator, inner }
    }
}

#[async_trait]
impl<M: Message> Sender<M> for ContentTranslatorSender<M> {
    async fn send(&self, mut message: M) -> Result<(), SendError> {
        let fields = message.fields();
        let mut content = std::mem::replace(message.content_mut(), Content::text(""));
        if let Content::Template(template) = &mut content {
            template
                .variables
                .entry(MESSAGE_VARIABLE)
                .or_insert_with(|| Value::Object(fields));
        }

        let translated = match self.translator.translate(content) {
            Ok(translated) => translated,
            Err(err) => {
                warn!(kind = message.kind(), error = %err, "content translation failed");
                return Err(err.into());
            }
        };
        *message.content_mut() = translated;
        self.inner.send(message).await
    }

    fn name(&self) -> &str {
        "content-translator"
    }
}
