//! Access control manager: the facade callers talk to.
//!
//! Routes a domain name to its registered [`PolicyEvaluator`], consults
//! the decision cache, records audit entries, and reports statistics.
//! Evaluation faults never escape this boundary — they surface as
//! INDETERMINATE results.
//!
//! # Example
//! ```
//! use abac_engine_core::access::{
//!     AccessContext, AccessControlManager, AccessObject, Action,
//!     CombiningAlgorithm, Effect, Environment, PolicyEvaluator, Subject,
//! };
//!
//! let manager = AccessControlManager::new();
//! let mut evaluator = PolicyEvaluator::new(CombiningAlgorithm::DenyOverrides);
//! evaluator.add_policy("admins", "subject.role = admin", Effect::Permit)?;
//! manager.register_evaluator("docs", evaluator);
//!
//! let context = AccessContext::new(
//!     Subject::new("u-1", "alice").roles(&["admin"]),
//!     AccessObject::new("doc-1", "document"),
//!     Action::new("crud", "read"),
//!     Environment::now().client_ip("10.0.0.1"),
//! );
//! assert!(manager.is_access_allowed("docs", &context));
//! # Ok::<(), abac_engine_core::access::expression::ParseError>(())
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, warn};

use super::audit::{AuditEntry, AuditLog};
use super::cache::{fingerprint, AccessCache, CacheStats};
use super::context::AccessContext;
use super::policy::{PolicyDecision, PolicyEvaluator};
use super::result::AccessResult;

/// The manager's answer to one access check.
#[derive(Debug)]
pub struct AccessControlResult {
    result: AccessResult,
    decisions: Vec<PolicyDecision>,
    from_cache: bool,
    evaluation_time_ms: u64,
}

impl AccessControlResult {
    /// Returns the combined access result.
    pub fn result(&self) -> &AccessResult {
        &self.result
    }

    /// Returns the per-policy decision trail.
    ///
    /// Empty for cache hits and for checks that never reached an
    /// evaluator.
    pub fn decisions(&self) -> &[PolicyDecision] {
        &self.decisions
    }

    /// Whether the decision was served from the cache.
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// Measured evaluation wall time; zero for cache hits.
    pub fn evaluation_time_ms(&self) -> u64 {
        self.evaluation_time_ms
    }

    /// Whether access is granted.
    pub fn is_granted(&self) -> bool {
        self.result.is_granted()
    }
}

/// Aggregated engine statistics for the reporting layer.
#[derive(Clone, Debug, Serialize)]
pub struct AccessControlStats {
    /// Registered policy evaluators
    pub evaluator_count: usize,
    /// Audited checks since construction
    pub total_access_attempts: u64,
    /// Audited checks that granted access
    pub granted_count: u64,
    /// Audited checks that did not grant access
    pub denied_count: u64,
    /// Audit entries currently retained
    pub audit_entries: usize,
    /// Cache counters, absent when caching is disabled
    pub cache: Option<CacheStats>,
}

/// Facade over the evaluator registry, the decision cache, and the audit
/// log.
///
/// Registration and checks may race: an evaluator is fully constructed
/// before it is published into the registry, so a concurrent check sees
/// either the complete policy set or none of it.
pub struct AccessControlManager {
    evaluators: DashMap<String, Arc<PolicyEvaluator>>,
    cache: Option<AccessCache>,
    audit: AuditLog,
}

impl Default for AccessControlManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessControlManager {
    /// Creates a manager with a default cache and audit log.
    pub fn new() -> Self {
        AccessControlManager {
            evaluators: DashMap::new(),
            cache: Some(AccessCache::new()),
            audit: AuditLog::new(),
        }
    }

    /// Replaces the cache configuration (builder pattern).
    pub fn cache(mut self, cache: AccessCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Disables decision caching (builder pattern).
    pub fn no_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Replaces the audit log configuration (builder pattern).
    pub fn audit_log(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    /// Publishes an evaluator for a domain, replacing any previous one.
    pub fn register_evaluator(&self, domain: &str, evaluator: PolicyEvaluator) {
        debug!(
            domain,
            policies = evaluator.policies().len(),
            "registering policy evaluator"
        );
        self.evaluators.insert(domain.to_string(), Arc::new(evaluator));
    }

    /// Removes a domain's evaluator; checks against it become
    /// INDETERMINATE.
    pub fn unregister_evaluator(&self, domain: &str) {
        self.evaluators.remove(domain);
    }

    /// Number of registered evaluators.
    pub fn evaluator_count(&self) -> usize {
        self.evaluators.len()
    }

    /// Registered domain names.
    pub fn domains(&self) -> Vec<String> {
        self.evaluators
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Runs one access check.
    ///
    /// A fresh cached decision is returned immediately and is **not**
    /// audited; everything else — including checks against unregistered
    /// domains and evaluations that fault — produces an audit entry.
    pub fn check_access(&self, domain: &str, context: &AccessContext) -> AccessControlResult {
        if let Some(cache) = &self.cache {
            let key = fingerprint(domain, context);
            if let Some(result) = cache.get(&key) {
                debug!(domain, "access decision served from cache");
                return AccessControlResult {
                    result,
                    decisions: Vec::new(),
                    from_cache: true,
                    evaluation_time_ms: 0,
                };
            }
        }

        let started = Instant::now();
        let evaluator = self
            .evaluators
            .get(domain)
            .map(|entry| Arc::clone(entry.value()));

        let (result, decisions) = match evaluator {
            Some(evaluator) => {
                match catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(context))) {
                    Ok(outcome) => outcome.into_parts(),
                    Err(_) => {
                        warn!(domain, "policy evaluation panicked");
                        (
                            AccessResult::indeterminate(format!(
                                "policy evaluation failed for domain '{}'",
                                domain
                            )),
                            Vec::new(),
                        )
                    }
                }
            }
            None => {
                warn!(domain, "access check against unregistered domain");
                (
                    AccessResult::indeterminate(format!(
                        "no policy evaluator registered for domain '{}'",
                        domain
                    )),
                    Vec::new(),
                )
            }
        };
        let evaluation_time_ms = started.elapsed().as_millis() as u64;

        if let Some(cache) = &self.cache {
            cache.put(fingerprint(domain, context), result.clone());
        }
        self.audit
            .record(AuditEntry::new(domain, context, &result, evaluation_time_ms));
        debug!(
            domain,
            decision = %result.decision(),
            evaluation_time_ms,
            "access check completed"
        );

        AccessControlResult {
            result,
            decisions,
            from_cache: false,
            evaluation_time_ms,
        }
    }

    /// Convenience boolean form of [`check_access`](Self::check_access).
    pub fn is_access_allowed(&self, domain: &str, context: &AccessContext) -> bool {
        self.check_access(domain, context).is_granted()
    }

    /// Drops every cached decision.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Returns the audit log for reporting.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Returns the cache, when caching is enabled.
    pub fn decision_cache(&self) -> Option<&AccessCache> {
        self.cache.as_ref()
    }

    /// Aggregates evaluator, audit, and cache statistics.
    pub fn stats(&self) -> AccessControlStats {
        AccessControlStats {
            evaluator_count: self.evaluators.len(),
            total_access_attempts: self.audit.total_access_attempts(),
            granted_count: self.audit.granted_count(),
            denied_count: self.audit.denied_count(),
            audit_entries: self.audit.len(),
            cache: self.cache.as_ref().map(AccessCache::stats),
        }
    }
}
