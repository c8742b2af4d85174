//! Rule expression language for access decisions.
//!
//! # Overview
//! Rules are written as text and parsed into a tree of expressions that
//! evaluate an [`AccessContext`](crate::access::AccessContext) to one of
//! four decisions (PERMIT, DENY, NOT_APPLICABLE, INDETERMINATE).
//!
//! # Rule Language
//!
//! ## Comparisons
//! `<scope>.<attribute> <op> <value>` where scope is one of `subject`,
//! `object`, `action`, `env` and op is one of `=`, `!=`, `>`, `<`, `>=`,
//! `<=`, `contains`:
//!
//! - `subject.role = admin`
//! - `object.classification <= 2`
//! - `object.owner = $self`
//! - `env.time = business_hours`
//!
//! ## Combinators
//! - `AND` / `OR` — uniform precedence, grouped left to right
//! - `NOT <term>`
//! - `IF <expr> THEN <expr> [ELSE <expr>]`
//! - `(` `)` — grouping
//!
//! # Example
//! ```
//! use abac_engine_core::access::expression::AccessRule;
//!
//! let rule = AccessRule::parse("subject.role = admin AND object.type = document")?;
//! assert_eq!(
//!     rule.expression().describe(),
//!     "(subject.role = admin AND object.type = document)"
//! );
//! # Ok::<(), abac_engine_core::access::expression::ParseError>(())
//! ```
//!
//! # Extensibility
//! The evaluation seam is the [`AccessExpression`] trait with a fixed
//! implementation list (four leaves, four combinators, one constant).
//! Custom expressions can implement the trait for testing or embedding,
//! but the parser only ever produces the built-in set.

use crate::access::context::AccessContext;
use crate::access::result::AccessResult;

mod composite;
mod leaf;
mod parser;

pub use composite::{
    AndExpression, ConditionalExpression, ConstantExpression, NotExpression, OrExpression,
};
pub use leaf::{
    ActionExpression, CompareOp, EnvironmentExpression, ObjectExpression, SubjectExpression,
};
pub use parser::{AccessRule, ParseError};

/// A node in a parsed rule tree.
///
/// Evaluation is a pure function of the context: implementations must not
/// mutate shared state, so a parsed tree can be reused by any number of
/// concurrent evaluations.
pub trait AccessExpression: Send + Sync {
    /// Evaluates this expression against a request context.
    fn evaluate(&self, context: &AccessContext) -> AccessResult;

    /// Returns the canonical, deterministic debug form of this expression.
    fn describe(&self) -> String;
}
