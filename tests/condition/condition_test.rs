//! Condition evaluation semantics.

use std::sync::Arc;

use herald::condition::Condition;
use herald::environment::{Capabilities, Environment, Properties};
use herald::message::Sms;

use crate::support::{CountingProbe, PanickingProbe};

fn sms() -> Sms {
    Sms::new("hello", "0203040506")
}

fn env_with(properties: Properties, capabilities: Capabilities) -> Environment {
    Environment::new(Arc::new(properties), Arc::new(capabilities))
}

#[test]
fn fixed_returns_its_value() {
    let env = Environment::default();
    assert!(Condition::<Sms>::always().evaluate(&sms(), &env));
    assert!(!Condition::<Sms>::never().evaluate(&sms(), &env));
}

#[test]
fn required_property_checks_presence() {
    let env = env_with(
        Properties::from([("herald.sms.webhook.url", "")]),
        Capabilities::none(),
    );
    assert!(Condition::<Sms>::property("herald.sms.webhook.url").evaluate(&sms(), &env));
    assert!(!Condition::<Sms>::property("herald.email.webhook.url").evaluate(&sms(), &env));
}

#[test]
fn missing_capability_is_false_not_an_error() {
    let env = env_with(Properties::default(), Capabilities::none().with("http"));
    assert!(Condition::<Sms>::capability("http").evaluate(&sms(), &env));
    assert!(!Condition::<Sms>::capability("smpp").evaluate(&sms(), &env));
}

#[test]
fn empty_and_is_true() {
    let env = Environment::default();
    assert!(Condition::<Sms>::all([]).evaluate(&sms(), &env));
}

#[test]
fn single_child_and_equals_child() {
    let env = env_with(Properties::from([("present", "1")]), Capabilities::none());
    for child in [
        Condition::<Sms>::always(),
        Condition::never(),
        Condition::property("present"),
        Condition::property("absent"),
    ] {
        let expected = child.evaluate(&sms(), &env);
        assert_eq!(Condition::all([child]).evaluate(&sms(), &env), expected);
    }
}

#[test]
fn and_short_circuits_on_first_false() {
    let env = Environment::new(Arc::new(Properties::default()), Arc::new(PanickingProbe));
    let condition = Condition::<Sms>::all([Condition::never(), Condition::capability("http")]);
    assert!(!condition.evaluate(&sms(), &env));

    let condition = Condition::<Sms>::all([
        Condition::property("missing"),
        Condition::capability("http"),
    ]);
    assert!(!condition.evaluate(&sms(), &env));
}

#[test]
fn and_evaluates_children_in_order() {
    let probe = Arc::new(CountingProbe::default());
    let env = Environment::new(Arc::new(Properties::default()), probe.clone());
    let condition = Condition::<Sms>::all([
        Condition::capability("first"),
        Condition::capability("second"),
        Condition::capability("third"),
    ]);
    assert!(condition.evaluate(&sms(), &env));

    let calls = probe.calls.lock().expect("lock should not be poisoned").clone();
    assert_eq!(calls, vec!["first", "second", "third"]);
}

#[test]
fn probe_is_consulted_on_every_evaluation() {
    let probe = Arc::new(CountingProbe::default());
    let env = Environment::new(Arc::new(Properties::default()), probe.clone());
    let condition = Condition::<Sms>::capability("http");
    assert!(condition.evaluate(&sms(), &env));
    assert!(condition.evaluate(&sms(), &env));
    let count = probe.calls.lock().expect("lock should not be poisoned").len();
    assert_eq!(count, 2);
}

#[test]
fn matches_inspects_the_message() {
    let env = Environment::default();
    let condition = Condition::<Sms>::matches(|sms: &Sms| {
        sms.to
            .iter()
            .any(|to| to.to_string().starts_with('+'))
    });
    assert!(!condition.evaluate(&sms(), &env));
    assert!(condition.evaluate(&Sms::new("hi", "+447700900123"), &env));
}

#[test]
fn nested_conjunctions_combine() {
    let env = env_with(
        Properties::from([("a", "1"), ("b", "2")]),
        Capabilities::none().with("http"),
    );
    let condition = Condition::<Sms>::property("a")
        .and(Condition::all([Condition::property("b"), Condition::capability("http")]));
    assert!(condition.evaluate(&sms(), &env));

    let condition = condition.and(Condition::property("c"));
    assert!(!condition.evaluate(&sms(), &env));
}

#[test]
fn debug_hides_predicates() {
    let condition = Condition::<Sms>::matches(|_| true).and(Condition::property("key"));
    let rendered = format!("{condition:?}");
    assert!(rendered.contains("Matches(<predicate>)"));
    assert!(rendered.contains("RequiredProperty(\"key\")"));
}
