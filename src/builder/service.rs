//! Configuration-driven assembly of both channels.

use std::sync::Arc;

use tracing::{info, warn};

use crate::condition::Condition;
use crate::config::{HeraldConfig, TemplatesConfig};
use crate::environment::Environment;
use crate::message::{Email, Outbound, Sms};
use crate::sender::{SendError, Sender};
use crate::translator::TemplateLocation;

use super::{
    AssemblyReport, ConfigurationError, EmailBuilder, PipelineBuilder, SmsBuilder,
};

/// Assembled pipelines, shareable across tasks.
#[derive(Clone, Default)]
pub struct MessagingService {
    sms: Option<Arc<dyn Sender<Sms>>>,
    email: Option<Arc<dyn Sender<Email>>>,
}

impl std::fmt::Debug for MessagingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingService")
            .field("sms", &self.sms.as_ref().map(|s| s.name().to_owned()))
            .field("email", &self.email.as_ref().map(|s| s.name().to_owned()))
            .finish()
    }
}

impl MessagingService {
    /// Service over already composed pipelines.
    pub fn new(sms: Option<Arc<dyn Sender<Sms>>>, email: Option<Arc<dyn Sender<Email>>>) -> Self {
        Self { sms, email }
    }

    /// Send a message on its channel.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::ChannelNotConfigured`] when the channel has no
    /// pipeline, otherwise whatever the pipeline returns.
    pub async fn send(&self, message: impl Into<Outbound>) -> Result<(), SendError> {
        match message.into() {
            Outbound::Sms(sms) => self.send_sms(sms).await,
            Outbound::Email(email) => self.send_email(email).await,
        }
    }

    /// Send an SMS.
    ///
    /// # Errors
    ///
    /// See [`MessagingService::send`].
    pub async fn send_sms(&self, sms: Sms) -> Result<(), SendError> {
        let sender = self
            .sms
            .as_ref()
            .ok_or(SendError::ChannelNotConfigured { kind: "sms" })?;
        sender.send(sms).await
    }

    /// Send an email.
    ///
    /// # Errors
    ///
    /// See [`MessagingService::send`].
    pub async fn send_email(&self, email: Email) -> Result<(), SendError> {
        let sender = self
            .email
            .as_ref()
            .ok_or(SendError::ChannelNotConfigured { kind: "email" })?;
        sender.send(email).await
    }

    /// Returns true when an SMS pipeline is configured.
    pub fn has_sms(&self) -> bool {
        self.sms.is_some()
    }

    /// Returns true when an email pipeline is configured.
    pub fn has_email(&self) -> bool {
        self.email.is_some()
    }
}

/// Builds a [`MessagingService`] from [`HeraldConfig`].
///
/// Layers are configured by [`MessagingBuilder::from_config`]. Custom
/// implementations registered afterwards are evaluated before the built-in
/// transports, which are appended by [`MessagingBuilder::build`].
#[derive(Debug)]
pub struct MessagingBuilder {
    sms: Option<SmsBuilder>,
    email: Option<EmailBuilder>,
    dry_run: bool,
}

impl MessagingBuilder {
    /// Configure layers for every enabled channel.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when addressing rules are invalid or
    /// templates are enabled without the template engine.
    pub fn from_config(
        config: &HeraldConfig,
        env: Environment,
    ) -> Result<Self, ConfigurationError> {
        let sms = if config.sms.enabled {
            let mut builder = SmsBuilder::new(env.clone());
            if config.sms.fill {
                builder = builder.with_auto_filling();
            }
            if config.templates.enabled {
                builder = builder.with_templates(template_location(&config.templates, "sms"))?;
            }
            if config.sms.addressing {
                builder = builder.with_phone_number_translation(
                    config.sms.sender_rules(),
                    config.sms.recipient_rules(),
                )?;
            }
            Some(builder)
        } else {
            None
        };

        let email = if config.email.enabled {
            let mut builder = EmailBuilder::new(env);
            if config.email.fill {
                builder = builder.with_auto_filling();
            }
            if config.templates.enabled {
                builder =
                    builder.with_templates(template_location(&config.templates, "email"))?;
            }
            Some(builder)
        } else {
            None
        };

        Ok(Self {
            sms,
            email,
            dry_run: config.dry_run,
        })
    }

    /// Register a custom SMS implementation. Ignored when SMS is disabled.
    #[must_use]
    pub fn register_sms(mut self, condition: Condition<Sms>, sender: Arc<dyn Sender<Sms>>) -> Self {
        match self.sms.as_mut() {
            Some(builder) => builder.register_implementation(condition, sender),
            None => warn!(implementation = sender.name(), "sms disabled, registration ignored"),
        }
        self
    }

    /// Register a custom email implementation. Ignored when email is disabled.
    #[must_use]
    pub fn register_email(
        mut self,
        condition: Condition<Email>,
        sender: Arc<dyn Sender<Email>>,
    ) -> Self {
        match self.email.as_mut() {
            Some(builder) => builder.register_implementation(condition, sender),
            None => warn!(implementation = sender.name(), "email disabled, registration ignored"),
        }
        self
    }

    /// Append the built-in transports and compose both pipelines.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidUrl`] when a webhook URL is
    /// malformed.
    pub fn build(self) -> Result<(MessagingService, AssemblyReport), ConfigurationError> {
        let mut report = AssemblyReport::default();
        let dry_run = self.dry_run;

        let sms = self
            .sms
            .map(|builder| finish(builder, dry_run))
            .transpose()?
            .map(|(sender, channel, registrations)| {
                report.registrations.extend(registrations);
                report.sms = Some(channel);
                sender
            });
        let email = self
            .email
            .map(|builder| finish(builder, dry_run))
            .transpose()?
            .map(|(sender, channel, registrations)| {
                report.registrations.extend(registrations);
                report.email = Some(channel);
                sender
            });

        info!(
            sms = sms.is_some(),
            email = email.is_some(),
            skipped = report.skipped().count(),
            dry_run,
            "messaging service assembled"
        );
        Ok((MessagingService::new(sms, email), report))
    }
}

type Finished<M> = (
    Arc<dyn Sender<M>>,
    super::ChannelReport,
    Vec<super::RegistrationOutcome>,
);

fn finish<M: super::Channel>(
    mut builder: PipelineBuilder<M>,
    dry_run: bool,
) -> Result<Finished<M>, ConfigurationError> {
    builder.register_default_implementations()?;
    if dry_run {
        builder.register_dry_run();
    }
    Ok(builder.build())
}

fn template_location(templates: &TemplatesConfig, channel: &str) -> TemplateLocation {
    let channel_override = match channel {
        "sms" => templates.sms.as_ref(),
        _ => templates.email.as_ref(),
    };
    TemplateLocation {
        prefix: channel_override
            .and_then(|o| o.prefix.clone())
            .unwrap_or_else(|| templates.prefix.clone()),
        suffix: channel_override
            .and_then(|o| o.suffix.clone())
            .unwrap_or_else(|| templates.suffix.clone()),
    }
}
