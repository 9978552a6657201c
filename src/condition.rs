//! Condition expressions gating transport implementations.
//!
//! A [`Condition`] is evaluated against a candidate message and the
//! [`Environment`] captured at assembly time. Evaluation is total: a missing
//! property or capability is `false`, never an error.

use std::fmt::Debug;
use std::sync::Arc;

use crate::environment::Environment;

/// Predicate over a message, used by [`Condition::Matches`].
pub type MessagePredicate<M> = Arc<dyn Fn(&M) -> bool + Send + Sync>;

/// Boolean condition over a message and the runtime environment.
pub enum Condition<M> {
    /// Constant result.
    Fixed(bool),
    /// True iff the property key is present.
    RequiredProperty(String),
    /// True iff the named capability is available.
    RequiredCapability(String),
    /// True iff every child is true. Children are evaluated in order and
    /// evaluation stops at the first `false`. Empty is true.
    And(Vec<Condition<M>>),
    /// True iff the predicate accepts the message.
    Matches(MessagePredicate<M>),
}

impl<M> Condition<M> {
    /// Always true.
    pub fn always() -> Self {
        Self::Fixed(true)
    }

    /// Always false.
    pub fn never() -> Self {
        Self::Fixed(false)
    }

    /// Requires a property.
    pub fn property(key: impl Into<String>) -> Self {
        Self::RequiredProperty(key.into())
    }

    /// Requires a capability.
    pub fn capability(name: impl Into<String>) -> Self {
        Self::RequiredCapability(name.into())
    }

    /// Conjunction of `conditions`.
    pub fn all(conditions: impl IntoIterator<Item = Condition<M>>) -> Self {
        Self::And(conditions.into_iter().collect())
    }

    /// Condition on the message itself.
    pub fn matches(predicate: impl Fn(&M) -> bool + Send + Sync + 'static) -> Self {
        Self::Matches(Arc::new(predicate))
    }

    /// `self AND other`, flattening when `self` is already a conjunction.
    #[must_use]
    pub fn and(self, other: Condition<M>) -> Self {
        match self {
            Self::And(mut children) => {
                children.push(other);
                Self::And(children)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Evaluate against `message` and `env`.
    pub fn evaluate(&self, message: &M, env: &Environment) -> bool {
        match self {
            Self::Fixed(value) => *value,
            Self::RequiredProperty(key) => env.properties().has(key),
            Self::RequiredCapability(name) => env.capabilities().is_available(name),
            Self::And(children) => children.iter().all(|c| c.evaluate(message, env)),
            Self::Matches(predicate) => predicate(message),
        }
    }

    /// Property keys this condition requires, in evaluation order.
    pub fn required_properties(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.collect(&mut keys, &mut Vec::new());
        keys
    }

    /// Capability names this condition requires, in evaluation order.
    pub fn required_capabilities(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect(&mut Vec::new(), &mut names);
        names
    }

    fn collect<'a>(&'a self, properties: &mut Vec<&'a str>, capabilities: &mut Vec<&'a str>) {
        match self {
            Self::RequiredProperty(key) => properties.push(key),
            Self::RequiredCapability(name) => capabilities.push(name),
            Self::And(children) => {
                for child in children {
                    child.collect(properties, capabilities);
                }
            }
            Self::Fixed(_) | Self::Matches(_) => {}
        }
    }
}

impl<M> Clone for Condition<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed(value) => Self::Fixed(*value),
            Self::RequiredProperty(key) => Self::RequiredProperty(key.clone()),
            Self::RequiredCapability(name) => Self::RequiredCapability(name.clone()),
            Self::And(children) => Self::And(children.clone()),
            Self::Matches(predicate) => Self::Matches(Arc::clone(predicate)),
        }
    }
}

impl<M> Debug for Condition<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::RequiredProperty(key) => f.debug_tuple("RequiredProperty").field(key).finish(),
            Self::RequiredCapability(name) => {
                f.debug_tuple("RequiredCapability").field(name).finish()
            }
            Self::And(children) => f.debug_tuple("And").field(children).finish(),
            Self::Matches(_) => f.write_str("Matches(<predicate>)"),
        }
    }
}
