//! Composed pipelines: layer order and fail-fast propagation.

use std::sync::Arc;

use serde_json::Value;

use herald::addressing::{AddressingError, ClassifierRules, TypeOfNumber};
use herald::builder::{LayerKind, PipelineLayers, SmsBuilder};
use herald::condition::Condition;
use herald::environment::{Capabilities, Environment, Properties};
use herald::filler::FixedSenderFiller;
use herald::message::{Content, PhoneNumber, Sms, TemplateContent};
use herald::sender::{SendError, Sender, MESSAGE_VARIABLE};
use herald::translator::{ContentTranslator, TranslationError};

use crate::support::RecordingSender;

/// Renders the fields visible to templates as JSON.
struct EchoMessageFields;

impl ContentTranslator for EchoMessageFields {
    fn translate(&self, content: Content) -> Result<Content, TranslationError> {
        match content {
            Content::Template(mut template) => Ok(Content::text(
                template
                    .variables
                    .remove(MESSAGE_VARIABLE)
                    .unwrap_or(Value::Null)
                    .to_string(),
            )),
            text => Ok(text),
        }
    }
}

fn env(properties: Properties) -> Environment {
    Environment::new(Arc::new(properties), Arc::new(Capabilities::detect()))
}

fn delivered(recorder: &RecordingSender<Sms>) -> Sms {
    let mut sent = recorder.sent();
    assert_eq!(sent.len(), 1, "expected one delivery: {sent:?}");
    sent.pop().expect("recorder should hold a message")
}

fn recipient_numbers(sms: &Sms) -> Vec<(String, TypeOfNumber)> {
    sms.to
        .iter()
        .map(|to| match to {
            PhoneNumber::Addressed(addressed) => {
                (addressed.number.clone(), addressed.type_of_number)
            }
            PhoneNumber::Raw(raw) => panic!("recipient '{raw}' reached the resolver unclassified"),
        })
        .collect()
}

#[tokio::test]
async fn layers_run_filler_then_content_then_phone_regardless_of_call_order() {
    let recorder = RecordingSender::<Sms>::new("recorder");

    // Configured innermost-first on purpose.
    let builder = SmsBuilder::new(env(Properties::default()));
    let builder = builder
        .with_phone_number_translation(ClassifierRules::sender(), ClassifierRules::recipient("33"))
        .expect("rules should be valid");
    let (pipeline, report, _) = builder
        .with_content_translator(Arc::new(EchoMessageFields))
        .with_filler(Arc::new(FixedSenderFiller::new("MYBRAND")))
        .register(Condition::always(), recorder.handle())
        .build();

    assert_eq!(
        report.layers,
        vec![
            LayerKind::Filler,
            LayerKind::ContentTranslator,
            LayerKind::PhoneNumberTranslator
        ]
    );

    let sms = Sms::new(TemplateContent::inline("unused"), "0203040506");
    let result = pipeline.send(sms).await;
    assert!(result.is_ok(), "send should succeed: {result:?}");

    let sms = delivered(&recorder);
    let text = sms.content.as_text().expect("content should be translated");
    let seen_by_translator: Value =
        serde_json::from_str(text).expect("translated content should be JSON");
    // Filled before translation; recipient still raw when translated.
    assert_eq!(seen_by_translator["from"], "MYBRAND");
    assert_eq!(seen_by_translator["to"][0], "0203040506");
    assert_eq!(
        recipient_numbers(&sms),
        vec![("33203040506".to_owned(), TypeOfNumber::International)]
    );
}

#[cfg(feature = "templates")]
#[tokio::test]
async fn filled_field_reaches_template_and_recipient_is_international() {
    let recorder = RecordingSender::<Sms>::new("recorder");
    let properties = Properties::from([("herald.sms.from", "MYBRAND")]);

    let builder = SmsBuilder::new(env(properties)).with_auto_filling();
    let builder = builder
        .with_templates(Default::default())
        .expect("templates should be available");
    let builder = builder
        .with_phone_number_translation(ClassifierRules::sender(), ClassifierRules::recipient("33"))
        .expect("rules should be valid");
    let (pipeline, _, _) = builder.register(Condition::always(), recorder.handle()).build();

    let template = TemplateContent::inline("{{ message.from }}: your code is {{ code }}")
        .with_variable("code", "4821");
    let result = pipeline.send(Sms::new(template, "0203040506")).await;
    assert!(result.is_ok(), "send should succeed: {result:?}");

    let sms = delivered(&recorder);
    assert_eq!(sms.content.as_text(), Some("MYBRAND: your code is 4821"));
    assert_eq!(
        recipient_numbers(&sms),
        vec![("33203040506".to_owned(), TypeOfNumber::International)]
    );
    assert_eq!(
        sms.from.as_ref().and_then(PhoneNumber::addressed).map(|a| a.type_of_number),
        Some(TypeOfNumber::Alphanumeric)
    );
}

#[tokio::test]
async fn resolver_conditions_see_classified_addresses() {
    let international = RecordingSender::<Sms>::new("international");
    let fallback = RecordingSender::<Sms>::new("fallback");

    let builder = SmsBuilder::new(env(Properties::default()))
        .with_phone_number_translation(ClassifierRules::sender(), ClassifierRules::recipient("33"))
        .expect("rules should be valid");
    let all_international = Condition::matches(|sms: &Sms| {
        sms.to.iter().all(|to| {
            to.addressed()
                .is_some_and(|a| a.type_of_number == TypeOfNumber::International)
        })
    });
    let (pipeline, _, _) = builder
        .register(all_international, international.handle())
        .register(Condition::always(), fallback.handle())
        .build();

    assert!(pipeline.send(Sms::new("hi", "0203040506")).await.is_ok());
    assert_eq!(international.count(), 1);
    assert_eq!(fallback.count(), 0);
}

#[tokio::test]
async fn invalid_recipient_never_reaches_the_resolver() {
    let recorder = RecordingSender::<Sms>::new("recorder");
    let builder = SmsBuilder::new(env(Properties::default()))
        .with_phone_number_translation(ClassifierRules::sender(), ClassifierRules::recipient("33"))
        .expect("rules should be valid");
    let (pipeline, _, _) = builder
        .with_filler(Arc::new(FixedSenderFiller::new("MYBRAND")))
        .register(Condition::always(), recorder.handle())
        .build();

    let sms = Sms::new("hi", "0203040506").to("MYBRAND");
    match pipeline.send(sms).await {
        Err(SendError::InvalidAddress(_)) => {}
        other => panic!("expected invalid address, got {other:?}"),
    }
    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn unfilled_recipient_list_fails_the_send() {
    let recorder = RecordingSender::<Sms>::new("recorder");
    let properties = Properties::from([("herald.sms.from", "MYBRAND")]);
    let builder = SmsBuilder::new(env(properties))
        .with_auto_filling()
        .with_phone_number_translation(ClassifierRules::sender(), ClassifierRules::recipient("33"))
        .expect("rules should be valid");
    let (pipeline, _, _) = builder.register(Condition::always(), recorder.handle()).build();

    let sms = Sms {
        content: Content::text("hi"),
        from: None,
        to: Vec::new(),
    };
    match pipeline.send(sms).await {
        Err(SendError::InvalidAddress(AddressingError::NoRecipients)) => {}
        other => panic!("expected missing recipients, got {other:?}"),
    }
    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn omitted_layers_keep_remaining_order() {
    let recorder = RecordingSender::<Sms>::new("recorder");
    let builder = SmsBuilder::new(env(Properties::default()))
        .with_phone_number_translation(ClassifierRules::sender(), ClassifierRules::recipient("33"))
        .expect("rules should be valid");
    let (pipeline, report, _) = builder
        .with_filler(Arc::new(FixedSenderFiller::new("0203040506")))
        .with_content_translator(Arc::new(EchoMessageFields))
        .without_layer(LayerKind::ContentTranslator)
        .register(Condition::always(), recorder.handle())
        .build();

    assert_eq!(
        report.layers,
        vec![LayerKind::Filler, LayerKind::PhoneNumberTranslator]
    );
    assert!(pipeline.send(Sms::new("hi", "0611223344")).await.is_ok());

    // The filled sender was classified, so filling ran first.
    let sms = delivered(&recorder);
    assert_eq!(sms.content.as_text(), Some("hi"));
    assert_eq!(
        sms.from.as_ref().and_then(PhoneNumber::addressed).map(|a| a.type_of_number),
        Some(TypeOfNumber::National)
    );
}

#[tokio::test]
async fn empty_pipeline_fails_with_no_matching_implementation() {
    let (pipeline, report, registrations) = SmsBuilder::new(env(Properties::default())).build();
    assert!(report.layers.is_empty());
    assert!(report.implementations.is_empty());
    assert!(registrations.is_empty());

    match pipeline.send(Sms::new("hi", "+33203040506")).await {
        Err(SendError::NoMatchingImplementation { kind, .. }) => assert_eq!(kind, "sms"),
        other => panic!("expected NoMatchingImplementation, got {other:?}"),
    }
}

#[test]
fn setting_a_layer_twice_replaces_it() {
    let mut layers = PipelineLayers::<Sms>::new();
    layers.set_filler(Arc::new(FixedSenderFiller::new("A")));
    layers.set_filler(Arc::new(FixedSenderFiller::new("B")));
    layers.set_content_translator(Arc::new(EchoMessageFields));
    assert_eq!(
        layers.kinds(),
        vec![LayerKind::Filler, LayerKind::ContentTranslator]
    );
    layers.remove(LayerKind::Filler);
    assert_eq!(layers.kinds(), vec![LayerKind::ContentTranslator]);
}
