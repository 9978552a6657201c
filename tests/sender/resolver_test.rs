//! First-match-wins implementation resolution.

use std::sync::Arc;

use herald::condition::Condition;
use herald::environment::{Capabilities, Environment, Properties};
use herald::message::Sms;
use herald::sender::{ImplementationResolver, SendError, Sender};

use crate::support::{FailingSender, PanickingProbe, RecordingSender};

fn sms() -> Sms {
    Sms::new("hello", "+33203040506")
}

fn resolved_name(resolver: &ImplementationResolver<Sms>, message: &Sms) -> String {
    resolver
        .resolve(message)
        .expect("resolution should succeed")
        .name()
        .to_owned()
}

#[test]
fn first_matching_registration_wins() {
    let resolver = ImplementationResolver::new(Environment::default())
        .with(Condition::always(), Arc::new(RecordingSender::<Sms>::new("first")))
        .with(Condition::never(), Arc::new(RecordingSender::<Sms>::new("second")))
        .with(Condition::always(), Arc::new(RecordingSender::<Sms>::new("third")));
    assert_eq!(resolved_name(&resolver, &sms()), "first");
}

#[test]
fn earlier_non_matching_entries_are_skipped() {
    let env = Environment::new(
        Arc::new(Properties::from([("vendor.b.key", "x")])),
        Arc::new(Capabilities::none()),
    );
    let resolver = ImplementationResolver::new(env)
        .with(
            Condition::property("vendor.a.key"),
            Arc::new(RecordingSender::<Sms>::new("vendor-a")),
        )
        .with(
            Condition::property("vendor.b.key"),
            Arc::new(RecordingSender::<Sms>::new("vendor-b")),
        )
        .with(Condition::always(), Arc::new(RecordingSender::<Sms>::new("fallback")));
    assert_eq!(resolved_name(&resolver, &sms()), "vendor-b");
}

#[test]
fn duplicate_registration_keeps_both_entries_and_earlier_wins() {
    let mut resolver = ImplementationResolver::new(Environment::default());
    resolver.register(Condition::always(), Arc::new(RecordingSender::<Sms>::new("a")));
    resolver.register(Condition::always(), Arc::new(RecordingSender::<Sms>::new("b")));
    assert_eq!(resolver.len(), 2);
    assert_eq!(resolved_name(&resolver, &sms()), "a");
}

#[test]
fn empty_registry_never_resolves() {
    let resolver = ImplementationResolver::<Sms>::new(Environment::default());
    assert!(resolver.is_empty());
    for message in [sms(), Sms::new("", "MYBRAND"), Sms::new("x", "")] {
        match resolver.resolve(&message) {
            Err(SendError::NoMatchingImplementation { kind, summary }) => {
                assert_eq!(kind, "sms");
                assert!(summary.starts_with("sms from <unset>"));
            }
            Err(other) => panic!("expected NoMatchingImplementation, got {other}"),
            Ok(sender) => panic!("empty registry resolved to {}", sender.name()),
        }
    }
}

#[test]
fn no_match_error_carries_message_summary() {
    let resolver = ImplementationResolver::new(Environment::default())
        .with(Condition::never(), Arc::new(RecordingSender::<Sms>::new("never")));
    let message = Sms::new("ping", "+33203040506").from("MYBRAND");
    let err = match resolver.resolve(&message) {
        Ok(sender) => panic!("should not resolve, got {}", sender.name()),
        Err(err) => err,
    };
    let rendered = err.to_string();
    assert!(rendered.contains("MYBRAND"), "{rendered}");
    assert!(rendered.contains("+33203040506"), "{rendered}");
    assert!(rendered.contains("ping"), "{rendered}");
}

#[test]
fn conditions_may_inspect_the_message() {
    let resolver = ImplementationResolver::new(Environment::default())
        .with(
            Condition::matches(|sms: &Sms| sms.to.len() > 1),
            Arc::new(RecordingSender::<Sms>::new("bulk")),
        )
        .with(Condition::always(), Arc::new(RecordingSender::<Sms>::new("single")));
    assert_eq!(resolved_name(&resolver, &sms()), "single");
    assert_eq!(resolved_name(&resolver, &sms().to("+33600000000")), "bulk");
}

#[test]
fn later_conditions_are_not_evaluated_after_a_match() {
    let env = Environment::new(Arc::new(Properties::default()), Arc::new(PanickingProbe));
    let resolver = ImplementationResolver::new(env)
        .with(Condition::always(), Arc::new(RecordingSender::<Sms>::new("first")))
        .with(
            Condition::capability("http"),
            Arc::new(RecordingSender::<Sms>::new("second")),
        );
    assert_eq!(resolved_name(&resolver, &sms()), "first");
}

#[tokio::test]
async fn send_delegates_to_selected_implementation() {
    let selected = RecordingSender::<Sms>::new("selected");
    let other = RecordingSender::<Sms>::new("other");
    let resolver = ImplementationResolver::new(Environment::default())
        .with(Condition::never(), other.handle())
        .with(Condition::always(), selected.handle());

    let result = resolver.send(sms()).await;
    assert!(result.is_ok(), "send should succeed: {result:?}");
    assert_eq!(selected.sent(), vec![sms()]);
    assert_eq!(other.count(), 0);
}

#[tokio::test]
async fn delivery_error_is_not_retried_on_other_implementations() {
    let fallback = RecordingSender::<Sms>::new("fallback");
    let resolver = ImplementationResolver::new(Environment::default())
        .with(
            Condition::always(),
            Arc::new(FailingSender {
                name: "flaky".to_owned(),
            }),
        )
        .with(Condition::always(), fallback.handle());

    match resolver.send(sms()).await {
        Err(SendError::Delivery(err)) => assert_eq!(err.transport, "flaky"),
        other => panic!("expected delivery error, got {other:?}"),
    }
    assert_eq!(fallback.count(), 0);
}

#[tokio::test]
async fn resolver_is_shareable_across_tasks() {
    let recorder = RecordingSender::<Sms>::new("shared");
    let resolver: Arc<dyn Sender<Sms>> = Arc::new(
        ImplementationResolver::new(Environment::default())
            .with(Condition::always(), recorder.handle()),
    );

    let mut handles = Vec::new();
    for index in 0..8 {
        let resolver = Arc::clone(&resolver);
        handles.push(tokio::spawn(async move {
            resolver
                .send(Sms::new(format!("message {index}"), "+33203040506"))
                .await
        }));
    }
    for handle in handles {
        let result = handle.await.expect("task should join");
        assert!(result.is_ok());
    }
    assert_eq!(recorder.count(), 8);
}
