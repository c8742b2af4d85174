//! End-to-end tests for the rule language: parse, evaluate, describe.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use abac_engine_core::access::expression::{
    AccessExpression, AccessRule, AndExpression, ConstantExpression, NotExpression, OrExpression,
    ParseError,
};
use abac_engine_core::access::{AccessContext, AccessResult, Decision};
use abac_engine_test::{reader_context, weekend_time};

/// Marker expression recording how often it was evaluated; only possible
/// because the expression seam is a public trait.
struct Marker {
    decision: Decision,
    evaluations: Arc<AtomicUsize>,
}

impl AccessExpression for Marker {
    fn evaluate(&self, _context: &AccessContext) -> AccessResult {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        AccessResult::new(self.decision, "marker")
    }

    fn describe(&self) -> String {
        "marker".to_string()
    }
}

fn marker(decision: Decision, counter: &Arc<AtomicUsize>) -> Box<dyn AccessExpression> {
    Box::new(Marker {
        decision,
        evaluations: Arc::clone(counter),
    })
}

#[test]
fn parse_and_evaluate_admin_document_rule() {
    let rule = AccessRule::parse("subject.role = admin AND object.type = document").unwrap();

    let admin = reader_context("u-1", &["admin"]);
    assert_eq!(
        rule.expression().evaluate(&admin).decision(),
        Decision::Permit
    );

    let user = reader_context("u-2", &["user"]);
    let result = rule.expression().evaluate(&user);
    assert_eq!(result.decision(), Decision::NotApplicable);
    assert_eq!(result.reason(), "subject.role = admin not satisfied");
}

#[test]
fn and_never_evaluates_past_first_non_permit() {
    let context = reader_context("u-1", &["admin"]);
    let counter = Arc::new(AtomicUsize::new(0));

    let and = AndExpression::new(vec![
        Box::new(ConstantExpression::new(Decision::Deny, "denied")),
        marker(Decision::Permit, &counter),
    ]);

    assert_eq!(and.evaluate(&context).decision(), Decision::Deny);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn or_never_evaluates_past_first_permit() {
    let context = reader_context("u-1", &["admin"]);
    let counter = Arc::new(AtomicUsize::new(0));

    let or = OrExpression::new(vec![
        Box::new(ConstantExpression::new(Decision::Permit, "permitted")),
        marker(Decision::Deny, &counter),
    ]);

    assert_eq!(or.evaluate(&context).decision(), Decision::Permit);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn and_evaluates_all_children_when_all_permit() {
    let context = reader_context("u-1", &["admin"]);
    let counter = Arc::new(AtomicUsize::new(0));

    let and = AndExpression::new(vec![
        marker(Decision::Permit, &counter),
        marker(Decision::Permit, &counter),
        marker(Decision::Permit, &counter),
    ]);

    assert_eq!(and.evaluate(&context).decision(), Decision::Permit);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[test]
fn not_inversion_table() {
    let context = reader_context("u-1", &[]);
    let table = [
        (Decision::Permit, Decision::Deny),
        (Decision::Deny, Decision::Permit),
        (Decision::NotApplicable, Decision::NotApplicable),
        (Decision::Indeterminate, Decision::Indeterminate),
    ];
    for (inner, expected) in &table {
        let not = NotExpression::new(Box::new(ConstantExpression::new(*inner, "inner")));
        assert_eq!(not.evaluate(&context).decision(), *expected);
    }
}

#[test]
fn missing_attribute_is_never_permit() {
    let context = reader_context("u-1", &["admin"]);
    let rule = AccessRule::parse("subject.badge = blue").unwrap();
    assert_eq!(
        rule.expression().evaluate(&context).decision(),
        Decision::NotApplicable
    );
}

#[test]
fn describe_is_canonical_and_exact() {
    let rule = AccessRule::parse(
        "IF env.time = business_hours THEN (subject.role = admin OR object.owner = $self)",
    )
    .unwrap();
    assert_eq!(
        rule.expression().describe(),
        "IF (env.time = business_hours) THEN ((subject.role = admin OR object.owner = $self))"
    );
}

#[test]
fn parse_failure_names_offending_token() {
    match AccessRule::parse("subject.role ~ admin") {
        Err(ParseError::UnknownOperator(token)) => assert_eq!(token, "~"),
        other => panic!("expected UnknownOperator, got {:?}", other.err()),
    }

    match AccessRule::parse("context.role = admin") {
        Err(ParseError::UnknownScope(token)) => assert_eq!(token, "context.role"),
        other => panic!("expected UnknownScope, got {:?}", other.err()),
    }
}

#[test]
fn business_hours_rule_depends_on_request_time() {
    let rule = AccessRule::parse("env.time = business_hours").unwrap();

    let weekday = reader_context("u-1", &[]);
    assert_eq!(
        rule.expression().evaluate(&weekday).decision(),
        Decision::Permit
    );

    let weekend = AccessContext::new(
        weekday.subject().clone(),
        weekday.object().clone(),
        weekday.action().clone(),
        abac_engine_core::access::Environment::at(weekend_time()).client_ip("192.168.1.20"),
    );
    assert_eq!(
        rule.expression().evaluate(&weekend).decision(),
        Decision::NotApplicable
    );
}

#[test]
fn owner_self_rule() {
    let rule = AccessRule::parse("object.owner = $self").unwrap();

    // reader_context objects are owned by "u-owner".
    let owner = reader_context("u-owner", &[]);
    assert_eq!(
        rule.expression().evaluate(&owner).decision(),
        Decision::Permit
    );

    let stranger = reader_context("u-9", &[]);
    assert_eq!(
        rule.expression().evaluate(&stranger).decision(),
        Decision::NotApplicable
    );
}
