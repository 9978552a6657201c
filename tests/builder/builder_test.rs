//! Per-channel assembly and registration outcomes.

use std::sync::Arc;

use herald::addressing::{AddressRole, ClassifierRules};
use herald::builder::{
    ConfigurationError, EmailBuilder, RegistrationOutcome, RegistrationStatus, SmsBuilder,
};
use herald::condition::Condition;
use herald::environment::{
    Capabilities, Environment, Properties, CAPABILITY_HTTP, CAPABILITY_TEMPLATES,
};
use herald::message::{Email, Sms};
use herald::sender::{SendError, Sender};
use herald::translator::TemplateLocation;

use crate::support::RecordingSender;

fn env(properties: Properties, capabilities: Capabilities) -> Environment {
    Environment::new(Arc::new(properties), Arc::new(capabilities))
}

fn only(registrations: &[RegistrationOutcome]) -> &RegistrationOutcome {
    assert_eq!(registrations.len(), 1, "{registrations:?}");
    &registrations[0]
}

#[test]
fn webhook_is_skipped_without_http_capability() {
    let mut builder = SmsBuilder::new(env(
        Properties::from([("herald.sms.webhook.url", "http://127.0.0.1:9/sms")]),
        Capabilities::none(),
    ));
    assert!(builder.register_default_implementations().is_ok());
    let (_, report, registrations) = builder.build();

    assert!(report.implementations.is_empty());
    let outcome = only(&registrations);
    assert_eq!(outcome.channel, "sms");
    assert_eq!(outcome.implementation, "sms-webhook");
    assert_eq!(
        outcome.status,
        RegistrationStatus::SkippedMissingCapability {
            capability: CAPABILITY_HTTP.to_owned()
        }
    );
}

#[test]
fn webhook_is_skipped_without_url_property() {
    let mut builder = EmailBuilder::new(env(
        Properties::default(),
        Capabilities::none().with(CAPABILITY_HTTP),
    ));
    assert!(builder.register_default_implementations().is_ok());
    let (_, _, registrations) = builder.build();

    assert_eq!(
        only(&registrations).status,
        RegistrationStatus::SkippedMissingConfig {
            property: "herald.email.webhook.url".to_owned()
        }
    );
}

#[cfg(feature = "webhook")]
#[test]
fn webhook_is_registered_when_capability_and_url_are_present() {
    let mut builder = SmsBuilder::new(env(
        Properties::from([
            ("herald.sms.webhook.url", "http://127.0.0.1:9/sms"),
            ("herald.sms.webhook.token", "secret"),
        ]),
        Capabilities::none().with(CAPABILITY_HTTP),
    ));
    assert!(builder.register_default_implementations().is_ok());
    let (_, report, registrations) = builder.build();

    assert!(only(&registrations).is_registered());
    assert_eq!(report.implementations, vec!["sms-webhook"]);
}

#[test]
fn malformed_webhook_url_is_fatal() {
    let mut builder = SmsBuilder::new(env(
        Properties::from([("herald.sms.webhook.url", "not a url")]),
        Capabilities::none().with(CAPABILITY_HTTP),
    ));
    match builder.register_default_implementations() {
        Err(ConfigurationError::InvalidUrl { key, value, .. }) => {
            assert_eq!(key, "herald.sms.webhook.url");
            assert_eq!(value, "not a url");
        }
        other => panic!("expected InvalidUrl, got {other:?}"),
    }
}

#[tokio::test]
async fn custom_registrations_precede_defaults_and_dry_run() {
    let custom = RecordingSender::<Sms>::new("custom");
    let mut builder = SmsBuilder::new(env(Properties::default(), Capabilities::none()))
        .register(Condition::property("custom.enabled"), custom.handle());
    assert!(builder.register_default_implementations().is_ok());
    builder.register_dry_run();
    let (pipeline, report, registrations) = builder.build();

    assert_eq!(report.implementations, vec!["custom", "sms-log"]);
    let statuses: Vec<_> = registrations
        .iter()
        .map(|r| (r.implementation.as_str(), r.is_registered()))
        .collect();
    assert_eq!(
        statuses,
        vec![("custom", true), ("sms-webhook", false), ("sms-log", true)]
    );

    // custom.enabled is unset, so the dry-run transport takes the message.
    assert!(pipeline.send(Sms::new("hi", "+33203040506")).await.is_ok());
    assert_eq!(custom.count(), 0);
}

#[tokio::test]
async fn dry_run_transport_rejects_untranslated_templates() {
    let mut builder = EmailBuilder::new(env(Properties::default(), Capabilities::none()));
    builder.register_dry_run();
    let (pipeline, _, _) = builder.build();

    let email = Email::new(
        "subject",
        herald::message::TemplateContent::inline("{{ name }}"),
        "user@example.com",
    );
    match pipeline.send(email).await {
        Err(SendError::Delivery(err)) => assert_eq!(err.transport, "email-log"),
        other => panic!("expected delivery error, got {other:?}"),
    }
}

#[test]
fn templates_require_capability() {
    let builder = SmsBuilder::new(env(Properties::default(), Capabilities::none()));
    assert!(matches!(
        builder.with_templates(TemplateLocation::default()),
        Err(ConfigurationError::TemplatesUnavailable)
    ));
}

#[cfg(feature = "templates")]
#[test]
fn templates_are_added_when_available() {
    let builder = SmsBuilder::new(env(
        Properties::default(),
        Capabilities::none().with(CAPABILITY_TEMPLATES),
    ));
    let builder = builder
        .with_templates(TemplateLocation::default())
        .expect("templates should be available");
    let (_, report, _) = builder.build();
    assert_eq!(
        report.layers,
        vec![herald::builder::LayerKind::ContentTranslator]
    );
}

#[test]
fn recipient_normalization_without_country_code_is_rejected() {
    let builder = SmsBuilder::new(Environment::default());
    let recipient = ClassifierRules::default().with_international(true);
    match builder.with_phone_number_translation(ClassifierRules::sender(), recipient) {
        Err(ConfigurationError::InvalidRules { role, reason }) => {
            assert_eq!(role, AddressRole::Recipient);
            assert!(reason.contains("country code"), "{reason}");
        }
        Err(other) => panic!("expected InvalidRules, got {other}"),
        Ok(_) => panic!("rules without country code should be rejected"),
    }
}

#[test]
fn sender_rules_are_validated_too() {
    let builder = SmsBuilder::new(Environment::default());
    let sender = ClassifierRules::sender()
        .with_international(true)
        .with_country_code("+33");
    assert!(matches!(
        builder.with_phone_number_translation(sender, ClassifierRules::recipient("33")),
        Err(ConfigurationError::InvalidRules {
            role: AddressRole::Sender,
            ..
        })
    ));
}
