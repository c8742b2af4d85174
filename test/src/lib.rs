//! Shared fixtures for the integration test suite.

use abac_engine_core::access::{
    AccessContext, AccessObject, Action, CombiningAlgorithm, Effect, Environment, PolicyEvaluator,
    Subject,
};
use chrono::{DateTime, Local, TimeZone};

/// Monday 2025-03-03, 10:00 local — a business-hours weekday.
pub fn business_hours_time() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 3, 3, 10, 0, 0).unwrap()
}

/// Saturday 2025-03-08, 22:30 local — weekend, after hours.
pub fn weekend_time() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 3, 8, 22, 30, 0).unwrap()
}

/// A subject with the given roles reading a document it does not own.
pub fn reader_context(subject_id: &str, roles: &[&str]) -> AccessContext {
    AccessContext::new(
        Subject::new(subject_id, "test-user")
            .roles(roles)
            .clearance_level(1),
        AccessObject::new("doc-1", "document")
            .path("/srv/docs/doc-1")
            .owner("u-owner")
            .classification_level(1),
        Action::new("crud", "read"),
        Environment::at(business_hours_time())
            .client_ip("192.168.1.20")
            .user_agent("test-suite/1.0")
            .location("berlin"),
    )
}

/// Same identity tuple as [`reader_context`], different time of day and
/// client — collides with it in the decision cache.
pub fn evening_reader_context(subject_id: &str, roles: &[&str]) -> AccessContext {
    let base = reader_context(subject_id, roles);
    AccessContext::new(
        base.subject().clone(),
        base.object().clone(),
        base.action().clone(),
        Environment::at(Local.with_ymd_and_hms(2025, 3, 3, 23, 0, 0).unwrap())
            .client_ip("192.168.1.20")
            .user_agent("other-agent/2.0"),
    )
}

/// An evaluator with one permit rule for admins and one deny rule for
/// contractors.
pub fn standard_evaluator(algorithm: CombiningAlgorithm) -> PolicyEvaluator {
    let mut evaluator = PolicyEvaluator::new(algorithm);
    evaluator
        .add_policy("allow-admins", "subject.role = admin", Effect::Permit)
        .unwrap();
    evaluator
        .add_policy(
            "block-contractors",
            "subject.role = contractor",
            Effect::Deny,
        )
        .unwrap();
    evaluator
}
