//! Attribute-based access control engine.
//!
//! # Module Structure
//!
//! - `context` - Request attributes (Subject, AccessObject, Action, Environment)
//! - `result` - Four-valued decisions and the AccessResult type
//! - `expression` - Rule language: parser, leaf and composite expressions
//! - `policy` - Policies, combining algorithms, PolicyEvaluator
//! - `cache` - Bounded TTL decision cache
//! - `audit` - Bounded audit trail with running counters
//! - `manager` - AccessControlManager facade
//!
//! # Overview
//!
//! Rule text flows through the parser into a pure expression tree; a
//! policy pairs a tree with an effect; an evaluator reduces a policy set
//! over one [`AccessContext`] to a single [`AccessResult`]; the manager
//! fronts it all with a decision cache and an audit trail.
//!
//! ```
//! use abac_engine_core::access::{
//!     AccessContext, AccessControlManager, AccessObject, Action,
//!     CombiningAlgorithm, Effect, Environment, PolicyEvaluator, Subject,
//! };
//!
//! let manager = AccessControlManager::new();
//!
//! let mut evaluator = PolicyEvaluator::new(CombiningAlgorithm::DenyOverrides);
//! evaluator.add_policy(
//!     "owners-and-admins",
//!     "subject.role = admin OR object.owner = $self",
//!     Effect::Permit,
//! )?;
//! manager.register_evaluator("documents", evaluator);
//!
//! let context = AccessContext::new(
//!     Subject::new("u-7", "bob"),
//!     AccessObject::new("doc-1", "document").owner("u-7"),
//!     Action::new("crud", "read"),
//!     Environment::now().client_ip("192.168.0.4"),
//! );
//! assert!(manager.is_access_allowed("documents", &context));
//! # Ok::<(), abac_engine_core::access::expression::ParseError>(())
//! ```

// Re-exports for convenience
pub use audit::{AuditEntry, AuditLog};
pub use cache::{AccessCache, CacheStats};
pub use context::{AccessContext, AccessObject, Action, Environment, Subject};
pub use expression::{AccessExpression, AccessRule, ParseError};
pub use manager::{AccessControlManager, AccessControlResult, AccessControlStats};
pub use policy::{CombiningAlgorithm, Effect, Policy, PolicyDecision, PolicyEvaluator, PolicyOutcome};
pub use result::{AccessResult, Decision};

pub mod audit;
pub mod cache;
pub mod context;
pub mod expression;
pub mod manager;
pub mod policy;
pub mod result;
