//! Four-valued decisions and the result type every evaluation produces.

use derive_more::Display;
use serde::Serialize;

/// Outcome of evaluating an expression or a policy set.
///
/// This is a four-valued domain, not a boolean: an expression that simply
/// does not apply to a request is distinct from one that denies it, and a
/// failed evaluation is distinct from both.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Serialize)]
pub enum Decision {
    /// The request is allowed.
    #[display(fmt = "PERMIT")]
    Permit,
    /// The request is refused.
    #[display(fmt = "DENY")]
    Deny,
    /// The expression or policy set does not apply to the request.
    #[display(fmt = "NOT_APPLICABLE")]
    NotApplicable,
    /// Evaluation could not produce a usable answer.
    #[display(fmt = "INDETERMINATE")]
    Indeterminate,
}

/// The result of one expression evaluation or one combining step.
///
/// `granted` is derived strictly from `decision == Permit`; the
/// constructors are the only way to build a result, so the two can never
/// disagree.
#[derive(Clone, Debug, Serialize)]
pub struct AccessResult {
    granted: bool,
    reason: String,
    rule_name: String,
    decision: Decision,
}

impl AccessResult {
    /// Builds a result for an arbitrary decision.
    pub fn new(decision: Decision, reason: impl Into<String>) -> Self {
        AccessResult {
            granted: decision == Decision::Permit,
            reason: reason.into(),
            rule_name: String::new(),
            decision,
        }
    }

    /// Builds a PERMIT result.
    pub fn permit(reason: impl Into<String>) -> Self {
        Self::new(Decision::Permit, reason)
    }

    /// Builds a DENY result.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::new(Decision::Deny, reason)
    }

    /// Builds a NOT_APPLICABLE result.
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        Self::new(Decision::NotApplicable, reason)
    }

    /// Builds an INDETERMINATE result.
    pub fn indeterminate(reason: impl Into<String>) -> Self {
        Self::new(Decision::Indeterminate, reason)
    }

    /// Attaches the name of the rule or policy that produced this result.
    pub fn with_rule_name(mut self, rule_name: impl Into<String>) -> Self {
        self.rule_name = rule_name.into();
        self
    }

    /// Whether access is granted (`decision == Permit`).
    pub fn is_granted(&self) -> bool {
        self.granted
    }

    /// The human-readable explanation for the decision.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// The rule or policy name the decision is attributed to, if any.
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// The four-valued decision.
    pub fn decision(&self) -> Decision {
        self.decision
    }
}
