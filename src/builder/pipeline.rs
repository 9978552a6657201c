//! Pipeline layer sets.
//!
//! Layers are collected as a set keyed by [`LayerKind`] and composed once at
//! the end of assembly. The composed order depends only on which kinds are
//! present, never on the order the `with_*` calls were made.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::addressing::PhoneNumberTranslator;
use crate::filler::MessageFiller;
use crate::message::{Message, Sms};
use crate::sender::{
    ContentTranslatorSender, FillerSender, PhoneNumberTranslatorSender, Sender,
};
use crate::translator::ContentTranslator;

/// Decorator kinds, declared outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Fills unset fields.
    Filler,
    /// Resolves templates into text.
    ContentTranslator,
    /// Classifies sender and recipient addresses.
    PhoneNumberTranslator,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filler => f.write_str("filler"),
            Self::ContentTranslator => f.write_str("content-translator"),
            Self::PhoneNumberTranslator => f.write_str("phone-number-translator"),
        }
    }
}

type Wrap<M> = Box<dyn FnOnce(Arc<dyn Sender<M>>) -> Arc<dyn Sender<M>> + Send>;

/// At most one layer per [`LayerKind`]; setting a kind again replaces it.
pub struct PipelineLayers<M: Message> {
    layers: BTreeMap<LayerKind, Wrap<M>>,
}

impl<M: Message> Default for PipelineLayers<M> {
    fn default() -> Self {
        Self {
            layers: BTreeMap::new(),
        }
    }
}

impl<M: Message> std::fmt::Debug for PipelineLayers<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineLayers")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl<M: Message> PipelineLayers<M> {
    /// No layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filling layer.
    pub fn set_filler(&mut self, filler: Arc<dyn MessageFiller<M>>) {
        let wrap: Wrap<M> = Box::new(move |inner: Arc<dyn Sender<M>>| -> Arc<dyn Sender<M>> {
            Arc::new(FillerSender::new(filler, inner))
        });
        self.layers.insert(LayerKind::Filler, wrap);
    }

    /// Set the content translation layer.
    pub fn set_content_translator(&mut self, translator: Arc<dyn ContentTranslator>) {
        let wrap: Wrap<M> = Box::new(move |inner: Arc<dyn Sender<M>>| -> Arc<dyn Sender<M>> {
            Arc::new(ContentTranslatorSender::new(translator, inner))
        });
        self.layers.insert(LayerKind::ContentTranslator, wrap);
    }

    /// Drop a layer.
    pub fn remove(&mut self, kind: LayerKind) {
        self.layers.remove(&kind);
    }

    /// Configured kinds, outermost first.
    pub fn kinds(&self) -> Vec<LayerKind> {
        self.layers.keys().copied().collect()
    }

    /// Wrap `base` with every configured layer.
    pub fn compose(self, base: Arc<dyn Sender<M>>) -> Arc<dyn Sender<M>> {
        self.layers
            .into_values()
            .rev()
            .fold(base, |inner, wrap| wrap(inner))
    }
}

impl PipelineLayers<Sms> {
    /// Set the phone number translation layer.
    pub fn set_phone_number_translation(
        &mut self,
        sender: PhoneNumberTranslator,
        recipient: PhoneNumberTranslator,
    ) {
        let wrap: Wrap<Sms> =
            Box::new(move |inner: Arc<dyn Sender<Sms>>| -> Arc<dyn Sender<Sms>> {
                Arc::new(PhoneNumberTranslatorSender::new(sender, recipient, inner))
            });
        self.layers.insert(LayerKind::PhoneNumberTranslator, wrap);
    }
}
