//! Condition-gated implementation selection.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::condition::Condition;
use crate::environment::Environment;
use crate::message::Message;

use super::{SendError, Sender};

/// A registered transport and the condition that enables it.
pub struct Implementation<M: Message> {
    /// Enabling condition.
    pub condition: Condition<M>,
    /// The transport.
    pub sender: Arc<dyn Sender<M>>,
}

impl<M: Message> std::fmt::Debug for Implementation<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Implementation")
            .field("name", &self.sender.name())
            .field("condition", &self.condition)
            .finish()
    }
}

/// Ordered registry of implementations with first-match-wins selection.
///
/// Registration order is the only tie-break. Registering the same condition
/// twice adds a second entry; the earlier one still wins whenever both match.
pub struct ImplementationResolver<M: Message> {
    implementations: Vec<Implementation<M>>,
    env: Environment,
}

impl<M: Message> std::fmt::Debug for ImplementationResolver<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImplementationResolver")
            .field("implementations", &self.implementations)
            .finish_non_exhaustive()
    }
}

impl<M: Message> ImplementationResolver<M> {
    /// Empty resolver evaluating conditions against `env`.
    pub fn new(env: Environment) -> Self {
        Self {
            implementations: Vec::new(),
            env,
        }
    }

    /// Append an implementation.
    pub fn register(&mut self, condition: Condition<M>, sender: Arc<dyn Sender<M>>) {
        debug!(
            implementation = sender.name(),
            properties = ?condition.required_properties(),
            capabilities = ?condition.required_capabilities(),
            "implementation registered"
        );
        self.implementations.push(Implementation { condition, sender });
    }

    /// Builder-style [`ImplementationResolver::register`].
    #[must_use]
    pub fn with(mut self, condition: Condition<M>, sender: Arc<dyn Sender<M>>) -> Self {
        self.register(condition, sender);
        self
    }

    /// Select the first implementation whose condition holds for `message`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::NoMatchingImplementation`] when the registry is
    /// empty or no condition holds.
    pub fn resolve(&self, message: &M) -> Result<Arc<dyn Sender<M>>, SendError> {
        self.implementations
            .iter()
            .find(|implementation| implementation.condition.evaluate(message, &self.env))
            .map(|implementation| Arc::clone(&implementation.sender))
            .ok_or_else(|| SendError::NoMatchingImplementation {
                kind: message.kind(),
                summary: message.summary(),
            })
    }

    /// Registered implementations in evaluation order.
    pub fn implementations(&self) -> &[Implementation<M>] {
        &self.implementations
    }

    /// Number of registered implementations.
    pub fn len(&self) -> usize {
        self.implementations.len()
    }

    /// Returns true when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.implementations.is_empty()
    }
}

#[async_trait]
impl<M: Message> Sender<M> for ImplementationResolver<M> {
    async fn send(&self, message: M) -> Result<(), SendError> {
        let sender = match self.resolve(&message) {
            Ok(sender) => sender,
            Err(err) => {
                warn!(
                    kind = message.kind(),
                    registered = self.implementations.len(),
                    "no implementation matches message"
                );
                return Err(err);
            }
        };
        debug!(
            kind = message.kind(),
            implementation = sender.name(),
            "implementation selected"
        );
        sender.send(message).await
    }

    fn name(&self) -> &str {
        "implementation-resolver"
    }
}
