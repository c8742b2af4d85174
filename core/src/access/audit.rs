//! Access audit trail.
//!
//! A bounded, append-only record of every completed access check that was
//! not served from the cache, plus running counters for reporting. The log
//! is an in-memory domain object — pushing entries to an external sink is
//! a reporting-layer concern, not handled here.
//!
//! # Example
//! ```
//! use abac_engine_core::access::AuditLog;
//!
//! let log = AuditLog::new().max_entries(5000);
//! assert_eq!(log.total_access_attempts(), 0);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::context::AccessContext;
use super::result::AccessResult;

/// Immutable snapshot of one audited access check.
#[derive(Clone, Debug, Serialize)]
pub struct AuditEntry {
    /// Unique entry id
    pub id: String,
    /// When the check completed
    pub timestamp: DateTime<Utc>,
    /// Domain the check was routed to
    pub domain: String,
    /// Requesting subject id
    pub subject_id: String,
    /// Requesting subject display name
    pub subject_name: String,
    /// Target object id
    pub object_id: String,
    /// Target object type
    pub object_type: String,
    /// Action verb
    pub action_verb: String,
    /// Whether access was granted
    pub granted: bool,
    /// Explanation for the decision
    pub reason: String,
    /// Evaluation wall time in milliseconds
    pub evaluation_time_ms: u64,
    /// Client IP address
    pub client_ip: String,
    /// Client user agent
    pub user_agent: String,
}

impl AuditEntry {
    /// Builds an entry from a completed check.
    pub fn new(
        domain: &str,
        context: &AccessContext,
        result: &AccessResult,
        evaluation_time_ms: u64,
    ) -> Self {
        AuditEntry {
            id: generate_entry_id(),
            timestamp: Utc::now(),
            domain: domain.to_string(),
            subject_id: context.subject().get_id().to_string(),
            subject_name: context.subject().get_name().to_string(),
            object_id: context.object().get_id().to_string(),
            object_type: context.object().get_type().to_string(),
            action_verb: context.action().get_verb().to_string(),
            granted: result.is_granted(),
            reason: result.reason().to_string(),
            evaluation_time_ms,
            client_ip: context.environment().get_client_ip().to_string(),
            user_agent: context.environment().get_user_agent().to_string(),
        }
    }

    /// Formats the entry as a single log line.
    pub fn to_log_line(&self) -> String {
        format!(
            "[{}] domain={} subject={} object={}/{} verb={} granted={} took={}ms ip={} reason=\"{}\"",
            self.timestamp.to_rfc3339(),
            self.domain,
            self.subject_id,
            self.object_type,
            self.object_id,
            self.action_verb,
            self.granted,
            self.evaluation_time_ms,
            self.client_ip,
            self.reason,
        )
    }

    /// Formats the entry as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_log_line())
    }
}

/// Generates a unique audit entry id.
fn generate_entry_id() -> String {
    use rand::Rng;
    let micros = Utc::now().timestamp_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", micros, random)
}

/// Bounded append-only audit log with running counters.
///
/// Appends and reads may race freely: the queue is guarded for the short
/// push/trim critical section and the counters are atomic.
pub struct AuditLog {
    entries: Mutex<VecDeque<AuditEntry>>,
    max_entries: usize,
    total_attempts: AtomicU64,
    granted_count: AtomicU64,
    denied_count: AtomicU64,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    /// Creates a log keeping the default maximum of 10,000 entries.
    pub fn new() -> Self {
        AuditLog {
            entries: Mutex::new(VecDeque::new()),
            max_entries: 10_000,
            total_attempts: AtomicU64::new(0),
            granted_count: AtomicU64::new(0),
            denied_count: AtomicU64::new(0),
        }
    }

    /// Sets the maximum number of retained entries (builder pattern).
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Appends an entry, dropping the oldest ones past the bound.
    pub fn record(&self, entry: AuditEntry) {
        self.total_attempts.fetch_add(1, Ordering::Relaxed);
        if entry.granted {
            self.granted_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.denied_count.fetch_add(1, Ordering::Relaxed);
        }

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push_back(entry);
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }

    /// Total checks recorded since construction (not reduced by trimming).
    pub fn total_access_attempts(&self) -> u64 {
        self.total_attempts.load(Ordering::Relaxed)
    }

    /// Recorded checks that granted access.
    pub fn granted_count(&self) -> u64 {
        self.granted_count.load(Ordering::Relaxed)
    }

    /// Recorded checks that did not grant access.
    pub fn denied_count(&self) -> u64 {
        self.denied_count.load(Ordering::Relaxed)
    }

    /// Number of entries currently retained.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the log holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every retained entry, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Snapshot of the most recent `count` entries, oldest first.
    pub fn recent(&self, count: usize) -> Vec<AuditEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let skip = entries.len().saturating_sub(count);
        entries.iter().skip(skip).cloned().collect()
    }
}
