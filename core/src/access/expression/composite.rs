//! Composite expressions: four-valued AND, OR, NOT, and IF/THEN/ELSE.
//!
//! The combining rules here are deliberately non-classical. AND returns the
//! first non-PERMIT child verbatim; OR prefers INDETERMINATE over
//! NOT_APPLICABLE over DENY when nothing permits; NOT only inverts
//! PERMIT/DENY and passes the other two decisions through untouched.

use super::AccessExpression;
use crate::access::context::AccessContext;
use crate::access::result::{AccessResult, Decision};

// =============================================================================
// AND
// =============================================================================

/// PERMIT only if every child permits.
///
/// Children are evaluated left to right; the first child whose decision is
/// not PERMIT short-circuits the evaluation and its result is returned
/// verbatim — the remaining children are never evaluated.
pub struct AndExpression {
    children: Vec<Box<dyn AccessExpression>>,
}

impl AndExpression {
    /// Creates an AND over the given children.
    pub fn new(children: Vec<Box<dyn AccessExpression>>) -> Self {
        AndExpression { children }
    }
}

impl AccessExpression for AndExpression {
    fn evaluate(&self, context: &AccessContext) -> AccessResult {
        let mut reasons = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let result = child.evaluate(context);
            if result.decision() != Decision::Permit {
                return result;
            }
            reasons.push(result.reason().to_string());
        }
        AccessResult::permit(reasons.join("; "))
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.children.iter().map(|c| c.describe()).collect();
        format!("({})", parts.join(" AND "))
    }
}

// =============================================================================
// OR
// =============================================================================

/// PERMIT as soon as any child permits.
///
/// Children are evaluated left to right; the first PERMIT short-circuits
/// and is returned verbatim. If no child permits, the first child result
/// with the highest-priority decision wins: INDETERMINATE over
/// NOT_APPLICABLE over DENY.
pub struct OrExpression {
    children: Vec<Box<dyn AccessExpression>>,
}

impl OrExpression {
    /// Creates an OR over the given children.
    pub fn new(children: Vec<Box<dyn AccessExpression>>) -> Self {
        OrExpression { children }
    }
}

impl AccessExpression for OrExpression {
    fn evaluate(&self, context: &AccessContext) -> AccessResult {
        let mut results = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let result = child.evaluate(context);
            if result.decision() == Decision::Permit {
                return result;
            }
            results.push(result);
        }
        for wanted in &[
            Decision::Indeterminate,
            Decision::NotApplicable,
            Decision::Deny,
        ] {
            if let Some(result) = results.iter().find(|r| r.decision() == *wanted) {
                return result.clone();
            }
        }
        AccessResult::not_applicable("OR expression has no children")
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.children.iter().map(|c| c.describe()).collect();
        format!("({})", parts.join(" OR "))
    }
}

// =============================================================================
// NOT
// =============================================================================

/// Inverts PERMIT and DENY; NOT_APPLICABLE and INDETERMINATE pass through
/// unchanged.
pub struct NotExpression {
    inner: Box<dyn AccessExpression>,
}

impl NotExpression {
    /// Creates a NOT around the given expression.
    pub fn new(inner: Box<dyn AccessExpression>) -> Self {
        NotExpression { inner }
    }
}

impl AccessExpression for NotExpression {
    fn evaluate(&self, context: &AccessContext) -> AccessResult {
        let result = self.inner.evaluate(context);
        match result.decision() {
            Decision::Permit => AccessResult::deny(format!("negation of: {}", result.reason())),
            Decision::Deny => AccessResult::permit(format!("negation of: {}", result.reason())),
            Decision::NotApplicable | Decision::Indeterminate => result,
        }
    }

    fn describe(&self) -> String {
        format!("NOT ({})", self.inner.describe())
    }
}

// =============================================================================
// Conditional
// =============================================================================

/// `IF cond THEN t [ELSE e]`.
///
/// If the condition decides PERMIT, the THEN branch decides; otherwise the
/// ELSE branch decides (a constant NOT_APPLICABLE expression when the rule
/// had no ELSE). The returned reason composes both sub-reasons.
pub struct ConditionalExpression {
    condition: Box<dyn AccessExpression>,
    then_branch: Box<dyn AccessExpression>,
    else_branch: Box<dyn AccessExpression>,
    has_else: bool,
}

impl ConditionalExpression {
    /// Creates a conditional; `else_branch` may be omitted.
    pub fn new(
        condition: Box<dyn AccessExpression>,
        then_branch: Box<dyn AccessExpression>,
        else_branch: Option<Box<dyn AccessExpression>>,
    ) -> Self {
        let has_else = else_branch.is_some();
        ConditionalExpression {
            condition,
            then_branch,
            else_branch: else_branch.unwrap_or_else(|| {
                Box::new(ConstantExpression::new(
                    Decision::NotApplicable,
                    "no ELSE branch",
                ))
            }),
            has_else,
        }
    }
}

impl AccessExpression for ConditionalExpression {
    fn evaluate(&self, context: &AccessContext) -> AccessResult {
        let condition = self.condition.evaluate(context);
        if condition.decision() == Decision::Permit {
            let taken = self.then_branch.evaluate(context);
            AccessResult::new(
                taken.decision(),
                format!("condition held ({}); {}", condition.reason(), taken.reason()),
            )
        } else {
            let taken = self.else_branch.evaluate(context);
            AccessResult::new(
                taken.decision(),
                format!(
                    "condition did not hold ({}); {}",
                    condition.reason(),
                    taken.reason()
                ),
            )
        }
    }

    fn describe(&self) -> String {
        if self.has_else {
            format!(
                "IF ({}) THEN ({}) ELSE ({})",
                self.condition.describe(),
                self.then_branch.describe(),
                self.else_branch.describe()
            )
        } else {
            format!(
                "IF ({}) THEN ({})",
                self.condition.describe(),
                self.then_branch.describe()
            )
        }
    }
}

// =============================================================================
// Constant
// =============================================================================

/// Always evaluates to a fixed decision.
///
/// The parser never produces one directly; it stands in for an omitted
/// ELSE branch and is handy as a fixture in tests.
pub struct ConstantExpression {
    decision: Decision,
    reason: String,
}

impl ConstantExpression {
    /// Creates a constant expression.
    pub fn new(decision: Decision, reason: impl Into<String>) -> Self {
        ConstantExpression {
            decision,
            reason: reason.into(),
        }
    }
}

impl AccessExpression for ConstantExpression {
    fn evaluate(&self, _context: &AccessContext) -> AccessResult {
        AccessResult::new(self.decision, self.reason.clone())
    }

    fn describe(&self) -> String {
        self.decision.to_string()
    }
}
