//! Leaf expressions: one attribute compared against one expected value.
//!
//! Each leaf dispatches on its attribute name against a fixed accessor set;
//! any other name falls through to the scope's free-form attribute map.
//! Leaves decide PERMIT on match and NOT_APPLICABLE otherwise — DENY and
//! INDETERMINATE only ever arise from composition or from a policy effect.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Local, Timelike, Weekday};
use derive_more::Display;

use super::AccessExpression;
use crate::access::context::AccessContext;
use crate::access::result::AccessResult;

/// Comparison operator of a leaf expression.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    #[display(fmt = "=")]
    Eq,
    /// `!=`
    #[display(fmt = "!=")]
    Ne,
    /// `>`
    #[display(fmt = ">")]
    Gt,
    /// `<`
    #[display(fmt = "<")]
    Lt,
    /// `>=`
    #[display(fmt = ">=")]
    Ge,
    /// `<=`
    #[display(fmt = "<=")]
    Le,
    /// `contains`
    #[display(fmt = "contains")]
    Contains,
}

impl CompareOp {
    /// Maps an operator token to its `CompareOp`, if it is one.
    pub fn parse(token: &str) -> Option<CompareOp> {
        match token {
            "=" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            ">" => Some(CompareOp::Gt),
            "<" => Some(CompareOp::Lt),
            ">=" => Some(CompareOp::Ge),
            "<=" => Some(CompareOp::Le),
            _ if token.eq_ignore_ascii_case("contains") => Some(CompareOp::Contains),
            _ => None,
        }
    }
}

// =============================================================================
// Comparison helpers
// =============================================================================

fn compare_numbers(actual: i64, op: CompareOp, expected: i64) -> bool {
    match op {
        CompareOp::Eq => actual == expected,
        CompareOp::Ne => actual != expected,
        CompareOp::Gt => actual > expected,
        CompareOp::Lt => actual < expected,
        CompareOp::Ge => actual >= expected,
        CompareOp::Le => actual <= expected,
        CompareOp::Contains => false,
    }
}

/// String comparison; ordering operators apply only when both sides parse
/// as integers.
fn compare_strings(actual: &str, op: CompareOp, expected: &str) -> bool {
    match op {
        CompareOp::Eq => actual == expected,
        CompareOp::Ne => actual != expected,
        CompareOp::Contains => actual.contains(expected),
        _ => match (actual.parse::<i64>(), expected.parse::<i64>()) {
            (Ok(a), Ok(e)) => compare_numbers(a, op, e),
            _ => false,
        },
    }
}

/// Set membership; `=` and `contains` test membership, `!=` tests
/// non-membership, ordering operators never match.
fn compare_set(set: &HashSet<String>, op: CompareOp, expected: &str) -> bool {
    match op {
        CompareOp::Eq | CompareOp::Contains => set.contains(expected),
        CompareOp::Ne => !set.contains(expected),
        _ => false,
    }
}

/// Numeric attribute against a textual expected value; an unparsable
/// expected value never matches.
fn compare_numeric(actual: i64, op: CompareOp, expected: &str) -> bool {
    match expected.parse::<i64>() {
        Ok(e) => compare_numbers(actual, op, e),
        Err(_) => false,
    }
}

fn leaf_result(matched: bool, description: &str) -> AccessResult {
    if matched {
        AccessResult::permit(format!("{} satisfied", description))
    } else {
        AccessResult::not_applicable(format!("{} not satisfied", description))
    }
}

// =============================================================================
// Subject
// =============================================================================

/// Compares one subject attribute against an expected value.
///
/// Fixed accessors: `role`, `group`, `clearance` (numeric), `id`. Any other
/// attribute name is looked up in the subject's free-form attribute map; a
/// missing key never matches.
pub struct SubjectExpression {
    attribute: String,
    operator: CompareOp,
    value: String,
}

impl SubjectExpression {
    /// Creates a subject comparison leaf.
    pub fn new(attribute: impl Into<String>, operator: CompareOp, value: impl Into<String>) -> Self {
        SubjectExpression {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        }
    }

    fn matches(&self, context: &AccessContext) -> bool {
        let subject = context.subject();
        match self.attribute.as_str() {
            "role" => compare_set(subject.get_roles(), self.operator, &self.value),
            "group" => compare_set(subject.get_groups(), self.operator, &self.value),
            "clearance" => {
                compare_numeric(subject.get_clearance_level(), self.operator, &self.value)
            }
            "id" => compare_strings(subject.get_id(), self.operator, &self.value),
            other => subject
                .get_attributes()
                .get(other)
                .map_or(false, |actual| {
                    compare_strings(actual, self.operator, &self.value)
                }),
        }
    }
}

impl AccessExpression for SubjectExpression {
    fn evaluate(&self, context: &AccessContext) -> AccessResult {
        leaf_result(self.matches(context), &self.describe())
    }

    fn describe(&self) -> String {
        format!("subject.{} {} {}", self.attribute, self.operator, self.value)
    }
}

// =============================================================================
// Object
// =============================================================================

/// Compares one object attribute against an expected value.
///
/// Fixed accessors: `type`, `path`, `owner`, `tag`, `classification`
/// (numeric); anything else is looked up in the object's property map.
/// The expected value `$self` on `owner` compares the owner against the
/// requesting subject's id.
pub struct ObjectExpression {
    attribute: String,
    operator: CompareOp,
    value: String,
}

impl ObjectExpression {
    /// Creates an object comparison leaf.
    pub fn new(attribute: impl Into<String>, operator: CompareOp, value: impl Into<String>) -> Self {
        ObjectExpression {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        }
    }

    fn matches(&self, context: &AccessContext) -> bool {
        let object = context.object();
        match self.attribute.as_str() {
            "type" => compare_strings(object.get_type(), self.operator, &self.value),
            "path" => compare_strings(object.get_path(), self.operator, &self.value),
            "owner" => {
                if self.value == "$self" {
                    compare_strings(object.get_owner(), self.operator, context.subject().get_id())
                } else {
                    compare_strings(object.get_owner(), self.operator, &self.value)
                }
            }
            "tag" => compare_set(object.get_tags(), self.operator, &self.value),
            "classification" => {
                compare_numeric(object.get_classification_level(), self.operator, &self.value)
            }
            other => object
                .get_properties()
                .get(other)
                .map_or(false, |actual| {
                    compare_strings(actual, self.operator, &self.value)
                }),
        }
    }
}

impl AccessExpression for ObjectExpression {
    fn evaluate(&self, context: &AccessContext) -> AccessResult {
        leaf_result(self.matches(context), &self.describe())
    }

    fn describe(&self) -> String {
        format!("object.{} {} {}", self.attribute, self.operator, self.value)
    }
}

// =============================================================================
// Action
// =============================================================================

/// Compares one action attribute against an expected value.
///
/// Fixed accessors: `type`, `verb`, `category` (derived from the verb);
/// anything else is looked up in the action parameter map.
pub struct ActionExpression {
    attribute: String,
    operator: CompareOp,
    value: String,
}

impl ActionExpression {
    /// Creates an action comparison leaf.
    pub fn new(attribute: impl Into<String>, operator: CompareOp, value: impl Into<String>) -> Self {
        ActionExpression {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        }
    }

    fn matches(&self, context: &AccessContext) -> bool {
        let action = context.action();
        match self.attribute.as_str() {
            "type" => compare_strings(action.get_type(), self.operator, &self.value),
            "verb" => compare_strings(action.get_verb(), self.operator, &self.value),
            "category" => compare_strings(action.category(), self.operator, &self.value),
            other => action
                .get_parameters()
                .get(other)
                .map_or(false, |actual| {
                    compare_strings(actual, self.operator, &self.value)
                }),
        }
    }
}

impl AccessExpression for ActionExpression {
    fn evaluate(&self, context: &AccessContext) -> AccessResult {
        leaf_result(self.matches(context), &self.describe())
    }

    fn describe(&self) -> String {
        format!("action.{} {} {}", self.attribute, self.operator, self.value)
    }
}

// =============================================================================
// Environment
// =============================================================================

/// Trusted network prefixes for `env.network = trusted`.
const TRUSTED_PREFIXES: [&str; 3] = ["192.168.", "10.", "172.16."];

/// Compares one environment attribute against an expected value.
///
/// Fixed accessors: `time` (symbolic `business_hours`, `after_hours`,
/// `weekend`, `weekday`, or a literal Unix timestamp), `day` (lowercase
/// weekday name), `location`, `network` (`trusted`), `ip`, `useragent`;
/// anything else is looked up in the context attribute map.
pub struct EnvironmentExpression {
    attribute: String,
    operator: CompareOp,
    value: String,
}

impl EnvironmentExpression {
    /// Creates an environment comparison leaf.
    pub fn new(attribute: impl Into<String>, operator: CompareOp, value: impl Into<String>) -> Self {
        EnvironmentExpression {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        }
    }

    fn matches(&self, context: &AccessContext) -> bool {
        let env = context.environment();
        match self.attribute.as_str() {
            "time" => self.matches_time(env.get_request_time()),
            "day" => compare_strings(
                weekday_name(env.get_request_time().weekday()),
                self.operator,
                &self.value.to_lowercase(),
            ),
            "location" => compare_strings(env.get_location(), self.operator, &self.value),
            "network" => self.matches_network(env.get_client_ip()),
            "ip" => compare_strings(env.get_client_ip(), self.operator, &self.value),
            "useragent" => compare_strings(env.get_user_agent(), self.operator, &self.value),
            other => env
                .get_context_attributes()
                .get(other)
                .map_or(false, |actual| {
                    compare_strings(actual, self.operator, &self.value)
                }),
        }
    }

    fn matches_time(&self, request_time: DateTime<Local>) -> bool {
        let symbolic = match self.value.as_str() {
            "business_hours" => Some(is_business_hours(request_time)),
            "after_hours" => Some(!is_business_hours(request_time)),
            "weekend" => Some(is_weekend(request_time)),
            "weekday" => Some(!is_weekend(request_time)),
            _ => None,
        };
        match symbolic {
            Some(predicate) => match self.operator {
                CompareOp::Eq => predicate,
                CompareOp::Ne => !predicate,
                _ => false,
            },
            // Literal comparison against a Unix timestamp.
            None => compare_numeric(request_time.timestamp(), self.operator, &self.value),
        }
    }

    fn matches_network(&self, client_ip: &str) -> bool {
        if self.value != "trusted" {
            return false;
        }
        let trusted = TRUSTED_PREFIXES
            .iter()
            .any(|prefix| client_ip.starts_with(prefix));
        match self.operator {
            CompareOp::Eq => trusted,
            CompareOp::Ne => !trusted,
            _ => false,
        }
    }
}

impl AccessExpression for EnvironmentExpression {
    fn evaluate(&self, context: &AccessContext) -> AccessResult {
        leaf_result(self.matches(context), &self.describe())
    }

    fn describe(&self) -> String {
        format!("env.{} {} {}", self.attribute, self.operator, self.value)
    }
}

/// Business hours are Monday through Friday, local hour in `[9, 18)`.
fn is_business_hours(time: DateTime<Local>) -> bool {
    !is_weekend(time) && (9..18).contains(&time.hour())
}

fn is_weekend(time: DateTime<Local>) -> bool {
    matches!(time.weekday(), Weekday::Sat | Weekday::Sun)
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}
