//! Pipeline assembly.
//!
//! A [`PipelineBuilder`] collects implementation registrations and decorator
//! layers for one channel, then composes them into a single [`Sender`]. The
//! layer order is fixed by [`LayerKind`]:
//!
//! ```text
//! Filler -> ContentTranslator -> PhoneNumberTranslator -> ImplementationResolver
//! ```
//!
//! Optional default transports are attempted during assembly and each attempt
//! is recorded in an [`AssemblyReport`] instead of being silently dropped.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::addressing::{AddressRole, ClassifierRules, PhoneNumberTranslator};
use crate::condition::Condition;
use crate::environment::{Environment, CAPABILITY_HTTP, CAPABILITY_TEMPLATES};
use crate::filler::{MessageFiller, PropertyFiller, EMAIL_FILL_PREFIXES, SMS_FILL_PREFIXES};
use crate::message::{Email, Message, Sms};
use crate::sender::{ImplementationResolver, Sender};
use crate::translator::{ContentTranslator, TemplateLocation};
use crate::transport::log::LogSender;

mod pipeline;
mod report;
mod service;

pub use pipeline::{LayerKind, PipelineLayers};
pub use report::{AssemblyReport, ChannelReport, RegistrationOutcome, RegistrationStatus};
pub use service::{MessagingBuilder, MessagingService};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal assembly errors. Startup must abort on any of these.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// Classifier rules are inconsistent.
    #[error("invalid {role} addressing rules: {reason}")]
    InvalidRules {
        /// Role the rules apply to.
        role: AddressRole,
        /// Validation failure.
        reason: String,
    },
    /// A transport URL property is present but malformed.
    #[error("property '{key}' is not a valid URL ('{value}'): {reason}")]
    InvalidUrl {
        /// Property key.
        key: String,
        /// Raw value.
        value: String,
        /// Parse failure.
        reason: String,
    },
    /// Templates were requested but the template engine is unavailable.
    #[error("template translation requested but the 'templates' capability is unavailable")]
    TemplatesUnavailable,
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Per-channel defaults used during assembly.
pub trait Channel: Message {
    /// Channel name, also the middle segment of its property keys.
    const NAME: &'static str;

    /// Property prefixes read by automatic filling.
    const FILL_PREFIXES: &'static [&'static str];

    /// Filler reading channel fields from properties under `prefixes`.
    fn property_filler(filler: PropertyFiller) -> Arc<dyn MessageFiller<Self>>;

    /// Dry-run transport.
    fn log_transport(sender: LogSender) -> Arc<dyn Sender<Self>>;

    /// HTTP transport.
    #[cfg(feature = "webhook")]
    fn webhook_transport(
        sender: crate::transport::webhook::WebhookSender,
    ) -> Arc<dyn Sender<Self>>;
}

impl Channel for Sms {
    const NAME: &'static str = "sms";
    const FILL_PREFIXES: &'static [&'static str] = SMS_FILL_PREFIXES;

    fn property_filler(filler: PropertyFiller) -> Arc<dyn MessageFiller<Self>> {
        Arc::new(filler)
    }

    fn log_transport(sender: LogSender) -> Arc<dyn Sender<Self>> {
        Arc::new(sender)
    }

    #[cfg(feature = "webhook")]
    fn webhook_transport(
        sender: crate::transport::webhook::WebhookSender,
    ) -> Arc<dyn Sender<Self>> {
        Arc::new(sender)
    }
}

impl Channel for Email {
    const NAME: &'static str = "email";
    const FILL_PREFIXES: &'static [&'static str] = EMAIL_FILL_PREFIXES;

    fn property_filler(filler: PropertyFiller) -> Arc<dyn MessageFiller<Self>> {
        Arc::new(filler)
    }

    fn log_transport(sender: LogSender) -> Arc<dyn Sender<Self>> {
        Arc::new(sender)
    }

    #[cfg(feature = "webhook")]
    fn webhook_transport(
        sender: crate::transport::webhook::WebhookSender,
    ) -> Arc<dyn Sender<Self>> {
        Arc::new(sender)
    }
}

/// Property key holding the webhook URL of a channel.
pub fn webhook_url_key(channel: &str) -> String {
    format!("herald.{channel}.webhook.url")
}

/// Property key holding the webhook bearer token of a channel.
pub fn webhook_token_key(channel: &str) -> String {
    format!("herald.{channel}.webhook.token")
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Assembles the pipeline of one channel.
pub struct PipelineBuilder<M: Channel> {
    env: Environment,
    resolver: ImplementationResolver<M>,
    layers: PipelineLayers<M>,
    registrations: Vec<RegistrationOutcome>,
}

/// SMS pipeline builder.
pub type SmsBuilder = PipelineBuilder<Sms>;

/// Email pipeline builder.
pub type EmailBuilder = PipelineBuilder<Email>;

impl<M: Channel> std::fmt::Debug for PipelineBuilder<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("channel", &M::NAME)
            .field("resolver", &self.resolver)
            .field("layers", &self.layers)
            .finish()
    }
}

impl<M: Channel> PipelineBuilder<M> {
    /// Empty builder evaluating conditions against `env`.
    pub fn new(env: Environment) -> Self {
        Self {
            resolver: ImplementationResolver::new(env.clone()),
            env,
            layers: PipelineLayers::new(),
            registrations: Vec::new(),
        }
    }

    /// Append an implementation. Earlier registrations win.
    #[must_use]
    pub fn register(mut self, condition: Condition<M>, sender: Arc<dyn Sender<M>>) -> Self {
        self.register_implementation(condition, sender);
        self
    }

    /// Append an implementation in place.
    pub fn register_implementation(&mut self, condition: Condition<M>, sender: Arc<dyn Sender<M>>) {
        self.registrations.push(RegistrationOutcome {
            channel: M::NAME,
            implementation: sender.name().to_owned(),
            status: RegistrationStatus::Registered,
        });
        self.resolver.register(condition, sender);
    }

    /// Attempt the built-in transports for this channel.
    ///
    /// The webhook transport is registered when the `http` capability is
    /// available and `herald.<channel>.webhook.url` is set; otherwise the
    /// skip is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidUrl`] when the URL property is set
    /// but cannot be parsed.
    pub fn register_default_implementations(&mut self) -> Result<(), ConfigurationError> {
        let implementation = format!("{}-webhook", M::NAME);
        let url_key = webhook_url_key(M::NAME);

        if !self.env.capabilities().is_available(CAPABILITY_HTTP) {
            self.skip(
                implementation,
                RegistrationStatus::SkippedMissingCapability {
                    capability: CAPABILITY_HTTP.to_owned(),
                },
            );
            return Ok(());
        }

        let Some(raw_url) = self.env.properties().get(&url_key).map(str::to_owned) else {
            self.skip(
                implementation,
                RegistrationStatus::SkippedMissingConfig { property: url_key },
            );
            return Ok(());
        };
        let url = Url::parse(&raw_url).map_err(|e| ConfigurationError::InvalidUrl {
            key: url_key.clone(),
            value: raw_url.clone(),
            reason: e.to_string(),
        })?;
        let token = self
            .env
            .properties()
            .get(&webhook_token_key(M::NAME))
            .map(str::to_owned);

        match webhook_transport::<M>(implementation.clone(), url, token) {
            Some(sender) => {
                let condition = Condition::all([
                    Condition::capability(CAPABILITY_HTTP),
                    Condition::property(url_key),
                ]);
                self.register_implementation(condition, sender);
            }
            None => self.skip(
                implementation,
                RegistrationStatus::SkippedMissingCapability {
                    capability: CAPABILITY_HTTP.to_owned(),
                },
            ),
        }
        Ok(())
    }

    /// Register the logging transport as an unconditional last resort.
    pub fn register_dry_run(&mut self) {
        let sender = M::log_transport(LogSender::new(format!("{}-log", M::NAME)));
        self.register_implementation(Condition::always(), sender);
    }

    /// Fill unset fields with `filler`.
    #[must_use]
    pub fn with_filler(mut self, filler: Arc<dyn MessageFiller<M>>) -> Self {
        self.layers.set_filler(filler);
        self
    }

    /// Fill unset fields from properties under the channel's default prefixes.
    #[must_use]
    pub fn with_auto_filling(self) -> Self {
        self.with_property_filling(M::FILL_PREFIXES.iter().copied())
    }

    /// Fill unset fields from properties under `prefixes`, most specific first.
    #[must_use]
    pub fn with_property_filling<I, S>(self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let filler = PropertyFiller::new(self.env.properties_handle(), prefixes);
        self.with_filler(M::property_filler(filler))
    }

    /// Translate content with `translator`.
    #[must_use]
    pub fn with_content_translator(mut self, translator: Arc<dyn ContentTranslator>) -> Self {
        self.layers.set_content_translator(translator);
        self
    }

    /// Render template content, resolving template names through `location`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::TemplatesUnavailable`] when the
    /// `templates` capability is unavailable.
    pub fn with_templates(self, location: TemplateLocation) -> Result<Self, ConfigurationError> {
        if !self.env.capabilities().is_available(CAPABILITY_TEMPLATES) {
            return Err(ConfigurationError::TemplatesUnavailable);
        }
        let translator =
            template_translator(location).ok_or(ConfigurationError::TemplatesUnavailable)?;
        Ok(self.with_content_translator(translator))
    }

    /// Drop a previously configured layer.
    #[must_use]
    pub fn without_layer(mut self, kind: LayerKind) -> Self {
        self.layers.remove(kind);
        self
    }

    /// Compose the pipeline.
    pub fn build(self) -> (Arc<dyn Sender<M>>, ChannelReport, Vec<RegistrationOutcome>) {
        let report = ChannelReport {
            layers: self.layers.kinds(),
            implementations: self
                .resolver
                .implementations()
                .iter()
                .map(|implementation| implementation.sender.name().to_owned())
                .collect(),
        };
        info!(
            channel = M::NAME,
            layers = ?report.layers,
            implementations = ?report.implementations,
            "pipeline assembled"
        );
        let sender = self.layers.compose(Arc::new(self.resolver));
        (sender, report, self.registrations)
    }

    fn skip(&mut self, implementation: String, status: RegistrationStatus) {
        debug!(channel = M::NAME, %implementation, %status, "default implementation skipped");
        self.registrations.push(RegistrationOutcome {
            channel: M::NAME,
            implementation,
            status,
        });
    }
}

impl PipelineBuilder<Sms> {
    /// Classify sender and recipient numbers with independent rule sets.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidRules`] when either rule set is
    /// inconsistent, e.g. international normalization without a country code.
    pub fn with_phone_number_translation(
        mut self,
        sender: ClassifierRules,
        recipient: ClassifierRules,
    ) -> Result<Self, ConfigurationError> {
        for (role, rules) in [
            (AddressRole::Sender, &sender),
            (AddressRole::Recipient, &recipient),
        ] {
            rules
                .validate()
                .map_err(|reason| ConfigurationError::InvalidRules { role, reason })?;
        }
        self.layers.set_phone_number_translation(
            PhoneNumberTranslator::new(AddressRole::Sender, sender),
            PhoneNumberTranslator::new(AddressRole::Recipient, recipient),
        );
        Ok(self)
    }
}

#[cfg(feature = "webhook")]
fn webhook_transport<M: Channel>(
    name: String,
    url: Url,
    token: Option<String>,
) -> Option<Arc<dyn Sender<M>>> {
    let sender = crate::transport::webhook::WebhookSender::new(name, url, token);
    Some(M::webhook_transport(sender))
}

#[cfg(not(feature = "webhook"))]
fn webhook_transport<M: Channel>(
    _name: String,
    _url: Url,
    _token: Option<String>,
) -> Option<Arc<dyn Sender<M>>> {
    None
}

#[cfg(feature = "templates")]
fn template_translator(location: TemplateLocation) -> Option<Arc<dyn ContentTranslator>> {
    Some(Arc::new(crate::translator::TemplateTranslator::new(location)))
}

#[cfg(not(feature = "templates"))]
fn template_translator(_location: TemplateLocation) -> Option<Arc<dyn ContentTranslator>> {
    None
}
