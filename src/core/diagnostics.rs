//! Counters for evaluation-time absence events.
//!
//! The evaluator never fails for business-level absence of data; it degrades
//! to 0 and records the event here. These counters are the observable trace
//! of that fail-soft behavior.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters shared by all evaluations in one engine.
#[derive(Debug, Default)]
pub struct EvalDiagnostics {
    /// Lookups of aliases absent from the catalog.
    missing_alias: AtomicU64,
    /// Leaf queries the provider could not answer.
    missing_leaf: AtomicU64,
    /// Recursion depth exceeded (suspected cyclic derived definitions).
    depth_exceeded: AtomicU64,
}

/// Point-in-time copy of the diagnostics counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    /// Lookups of aliases absent from the catalog.
    pub missing_alias: u64,
    /// Leaf queries the provider could not answer.
    pub missing_leaf: u64,
    /// Recursion depth exceeded (suspected cyclic derived definitions).
    pub depth_exceeded: u64,
}

impl EvalDiagnostics {
    /// Create a new zeroed diagnostics collector.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_missing_alias(&self) {
        self.missing_alias.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_missing_leaf(&self) {
        self.missing_leaf.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_depth_exceeded(&self) {
        self.depth_exceeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            missing_alias: self.missing_alias.load(Ordering::Relaxed),
            missing_leaf: self.missing_leaf.load(Ordering::Relaxed),
            depth_exceeded: self.depth_exceeded.load(Ordering::Relaxed),
        }
    }
}

impl DiagnosticsSnapshot {
    /// Total number of absence events recorded.
    pub fn total(&self) -> u64 {
        self.missing_alias + self.missing_leaf + self.depth_exceeded
    }
}
