//! Policies and the multi-policy combining evaluator.
//!
//! A [`Policy`] pairs a parsed rule with an effect and a name. A
//! [`PolicyEvaluator`] owns an ordered policy list and one
//! [`CombiningAlgorithm`]; evaluating a context runs **every** policy's
//! expression (no short-circuit across policies — each decision is wanted
//! for the audit trail) and reduces the per-policy decisions to one
//! [`AccessResult`].
//!
//! # XACML Equivalent
//! The combining algorithms mirror the classic XACML set: deny-overrides,
//! permit-overrides, first-applicable, deny-unless-permit and
//! permit-unless-deny.
//!
//! # Example
//! ```
//! use abac_engine_core::access::{CombiningAlgorithm, Effect, PolicyEvaluator};
//!
//! let mut evaluator = PolicyEvaluator::new(CombiningAlgorithm::DenyOverrides);
//! evaluator.add_policy(
//!     "admins-read",
//!     "subject.role = admin AND action.category = read",
//!     Effect::Permit,
//! )?;
//! # Ok::<(), abac_engine_core::access::expression::ParseError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use derive_more::Display;
use tracing::warn;

use super::context::AccessContext;
use super::expression::{AccessExpression, AccessRule, ParseError};
use super::result::{AccessResult, Decision};

/// What a matching policy grants.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Effect {
    /// A matching expression grants access.
    #[display(fmt = "PERMIT")]
    Permit,
    /// A matching expression refuses access.
    #[display(fmt = "DENY")]
    Deny,
}

/// How per-policy decisions reduce to one overall decision.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum CombiningAlgorithm {
    /// Any deny wins, no matter what else matched.
    #[display(fmt = "DENY_OVERRIDES")]
    DenyOverrides,
    /// Any permit wins, no matter what else matched.
    #[display(fmt = "PERMIT_OVERRIDES")]
    PermitOverrides,
    /// The first applicable policy, in registration order, decides.
    #[display(fmt = "FIRST_APPLICABLE")]
    FirstApplicable,
    /// Default-deny: permit only on an explicit permit.
    #[display(fmt = "DENY_UNLESS_PERMIT")]
    DenyUnlessPermit,
    /// Default-permit: deny only on an explicit deny.
    #[display(fmt = "PERMIT_UNLESS_DENY")]
    PermitUnlessDeny,
}

/// A named rule with an effect.
///
/// The rule text is parsed exactly once, at construction; the resulting
/// tree is pure and shared by every subsequent evaluation.
pub struct Policy {
    name: String,
    rule_text: String,
    expression: Arc<dyn AccessExpression>,
    effect: Effect,
}

impl Policy {
    /// Parses the rule text and builds the policy.
    ///
    /// Fails without side effects when the rule does not parse — no
    /// partial policy is ever observable.
    pub fn new(name: &str, rule_text: &str, effect: Effect) -> Result<Self, ParseError> {
        let rule = AccessRule::parse(rule_text).map_err(|err| {
            warn!(policy = name, error = %err, "rejecting unparsable policy rule");
            err
        })?;
        Ok(Policy {
            name: name.to_string(),
            rule_text: rule_text.to_string(),
            expression: Arc::from(rule.into_expression()),
            effect,
        })
    }

    /// Returns the policy name.
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Returns the original rule text.
    pub fn get_rule_text(&self) -> &str {
        &self.rule_text
    }

    /// Returns the policy effect.
    pub fn get_effect(&self) -> Effect {
        self.effect
    }

    /// Returns the canonical debug form of the parsed rule.
    pub fn expression_description(&self) -> String {
        self.expression.describe()
    }

    fn evaluate(&self, context: &AccessContext) -> AccessResult {
        self.expression
            .evaluate(context)
            .with_rule_name(self.name.clone())
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("name", &self.name)
            .field("rule_text", &self.rule_text)
            .field("effect", &self.effect)
            .finish()
    }
}

/// One policy's contribution to an evaluation.
#[derive(Clone, Debug)]
pub struct PolicyDecision {
    policy_name: String,
    effect: Effect,
    result: AccessResult,
}

impl PolicyDecision {
    /// Returns the policy name.
    pub fn policy_name(&self) -> &str {
        &self.policy_name
    }

    /// Returns the policy effect.
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Returns the expression's evaluation result.
    pub fn result(&self) -> &AccessResult {
        &self.result
    }

    /// Whether this policy counts as a deny: its expression decided DENY,
    /// or decided PERMIT under a DENY effect.
    fn is_deny_equivalent(&self) -> bool {
        self.result.decision() == Decision::Deny
            || (self.result.decision() == Decision::Permit && self.effect == Effect::Deny)
    }

    /// Whether this policy explicitly permits: a PERMIT-effect policy
    /// whose expression decided PERMIT.
    fn is_explicit_permit(&self) -> bool {
        self.result.decision() == Decision::Permit && self.effect == Effect::Permit
    }
}

/// The combined result plus the full per-policy trail.
#[derive(Debug)]
pub struct PolicyOutcome {
    result: AccessResult,
    decisions: Vec<PolicyDecision>,
}

impl PolicyOutcome {
    /// Returns the combined result.
    pub fn result(&self) -> &AccessResult {
        &self.result
    }

    /// Returns every policy's individual decision, in registration order.
    pub fn decisions(&self) -> &[PolicyDecision] {
        &self.decisions
    }

    /// Splits the outcome into its parts.
    pub fn into_parts(self) -> (AccessResult, Vec<PolicyDecision>) {
        (self.result, self.decisions)
    }
}

/// Evaluates an ordered policy set under one combining algorithm.
pub struct PolicyEvaluator {
    policies: Vec<Policy>,
    algorithm: CombiningAlgorithm,
}

impl PolicyEvaluator {
    /// Creates an evaluator with no policies.
    pub fn new(algorithm: CombiningAlgorithm) -> Self {
        PolicyEvaluator {
            policies: Vec::new(),
            algorithm,
        }
    }

    /// Parses and appends a policy.
    ///
    /// On a parse error nothing is registered.
    pub fn add_policy(
        &mut self,
        name: &str,
        rule_text: &str,
        effect: Effect,
    ) -> Result<&mut Self, ParseError> {
        let policy = Policy::new(name, rule_text, effect)?;
        self.policies.push(policy);
        Ok(self)
    }

    /// Returns the registered policies in registration order.
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Returns the combining algorithm.
    pub fn algorithm(&self) -> CombiningAlgorithm {
        self.algorithm
    }

    /// Evaluates every policy against the context and combines the
    /// decisions.
    pub fn evaluate(&self, context: &AccessContext) -> PolicyOutcome {
        // Every policy always evaluates; the trail is kept for audit and
        // debugging even when an early decision would already be final.
        let decisions: Vec<PolicyDecision> = self
            .policies
            .iter()
            .map(|policy| PolicyDecision {
                policy_name: policy.get_name().to_string(),
                effect: policy.get_effect(),
                result: policy.evaluate(context),
            })
            .collect();

        let result = match self.algorithm {
            CombiningAlgorithm::DenyOverrides => Self::combine_deny_overrides(&decisions),
            CombiningAlgorithm::PermitOverrides => Self::combine_permit_overrides(&decisions),
            CombiningAlgorithm::FirstApplicable => Self::combine_first_applicable(&decisions),
            CombiningAlgorithm::DenyUnlessPermit => Self::combine_deny_unless_permit(&decisions),
            CombiningAlgorithm::PermitUnlessDeny => Self::combine_permit_unless_deny(&decisions),
        };

        PolicyOutcome { result, decisions }
    }

    fn combine_deny_overrides(decisions: &[PolicyDecision]) -> AccessResult {
        if let Some(deny) = decisions.iter().find(|d| d.is_deny_equivalent()) {
            return AccessResult::deny(format!(
                "denied by policy '{}': {}",
                deny.policy_name,
                deny.result.reason()
            ))
            .with_rule_name(deny.policy_name.clone());
        }
        if let Some(permit) = decisions.iter().find(|d| d.is_explicit_permit()) {
            return AccessResult::permit(format!(
                "permitted by policy '{}': {}",
                permit.policy_name,
                permit.result.reason()
            ))
            .with_rule_name(permit.policy_name.clone());
        }
        Self::combine_remainder(decisions)
    }

    fn combine_permit_overrides(decisions: &[PolicyDecision]) -> AccessResult {
        if let Some(permit) = decisions.iter().find(|d| d.is_explicit_permit()) {
            return AccessResult::permit(format!(
                "permitted by policy '{}': {}",
                permit.policy_name,
                permit.result.reason()
            ))
            .with_rule_name(permit.policy_name.clone());
        }
        if let Some(deny) = decisions.iter().find(|d| d.is_deny_equivalent()) {
            return AccessResult::deny(format!(
                "denied by policy '{}': {}",
                deny.policy_name,
                deny.result.reason()
            ))
            .with_rule_name(deny.policy_name.clone());
        }
        Self::combine_remainder(decisions)
    }

    fn combine_first_applicable(decisions: &[PolicyDecision]) -> AccessResult {
        let applicable = decisions
            .iter()
            .find(|d| d.result.decision() != Decision::NotApplicable);

        match applicable {
            Some(first) => {
                let expression = first.result.decision();
                let permits = (expression == Decision::Permit && first.effect == Effect::Permit)
                    || (expression != Decision::Permit && expression != Decision::Deny);
                if permits {
                    AccessResult::permit(format!(
                        "first applicable policy '{}': {}",
                        first.policy_name,
                        first.result.reason()
                    ))
                    .with_rule_name(first.policy_name.clone())
                } else {
                    AccessResult::deny(format!(
                        "first applicable policy '{}': {}",
                        first.policy_name,
                        first.result.reason()
                    ))
                    .with_rule_name(first.policy_name.clone())
                }
            }
            None => AccessResult::not_applicable("no applicable policy"),
        }
    }

    fn combine_deny_unless_permit(decisions: &[PolicyDecision]) -> AccessResult {
        match decisions.iter().find(|d| d.is_explicit_permit()) {
            Some(permit) => AccessResult::permit(format!(
                "permitted by policy '{}': {}",
                permit.policy_name,
                permit.result.reason()
            ))
            .with_rule_name(permit.policy_name.clone()),
            None => AccessResult::deny("no policy explicitly permitted the request"),
        }
    }

    fn combine_permit_unless_deny(decisions: &[PolicyDecision]) -> AccessResult {
        match decisions.iter().find(|d| d.is_deny_equivalent()) {
            Some(deny) => AccessResult::deny(format!(
                "denied by policy '{}': {}",
                deny.policy_name,
                deny.result.reason()
            ))
            .with_rule_name(deny.policy_name.clone()),
            None => AccessResult::permit("no policy denied the request"),
        }
    }

    /// Shared tail for the override algorithms: nothing permitted and
    /// nothing denied, so indeterminate outranks not-applicable.
    fn combine_remainder(decisions: &[PolicyDecision]) -> AccessResult {
        match decisions
            .iter()
            .find(|d| d.result.decision() == Decision::Indeterminate)
        {
            Some(error) => AccessResult::indeterminate(format!(
                "policy '{}' was indeterminate: {}",
                error.policy_name,
                error.result.reason()
            ))
            .with_rule_name(error.policy_name.clone()),
            None => AccessResult::not_applicable("no applicable policy"),
        }
    }
}
