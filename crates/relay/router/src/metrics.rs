//! Router counters.
//!
//! Counters are plain atomics shared between the submit side and the consumer
//! loop. They are observational only; no routing decision reads them.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RouterMetrics {
    submitted: AtomicU64,
    rejected_full: AtomicU64,
    messages_dispatched: AtomicU64,
    messages_dropped: AtomicU64,
    deliveries: AtomicU64,
    failed_deliveries: AtomicU64,
    registrations: AtomicU64,
    unregistrations: AtomicU64,
    route_changes: AtomicU64,
    failed_operations: AtomicU64,
}

/// Point-in-time copy of [`RouterMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub rejected_full: u64,
    pub messages_dispatched: u64,
    pub messages_dropped: u64,
    pub deliveries: u64,
    pub failed_deliveries: u64,
    pub registrations: u64,
    pub unregistrations: u64,
    pub route_changes: u64,
    pub failed_operations: u64,
}

fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

impl RouterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn submitted(&self) {
        bump(&self.submitted, 1);
    }

    pub(crate) fn rejected_full(&self) {
        bump(&self.rejected_full, 1);
    }

    pub(crate) fn message_dispatched(&self) {
        bump(&self.messages_dispatched, 1);
    }

    pub(crate) fn message_dropped(&self) {
        bump(&self.messages_dropped, 1);
    }

    pub(crate) fn delivered(&self, delivered: u64, failed: u64) {
        bump(&self.deliveries, delivered);
        bump(&self.failed_deliveries, failed);
    }

    pub(crate) fn registered(&self) {
        bump(&self.registrations, 1);
    }

    pub(crate) fn unregistered(&self) {
        bump(&self.unregistrations, 1);
    }

    pub(crate) fn route_changed(&self) {
        bump(&self.route_changes, 1);
    }

    pub(crate) fn operation_failed(&self) {
        bump(&self.failed_operations, 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            submitted: load(&self.submitted),
            rejected_full: load(&self.rejected_full),
            messages_dispatched: load(&self.messages_dispatched),
            messages_dropped: load(&self.messages_dropped),
            deliveries: load(&self.deliveries),
            failed_deliveries: load(&self.failed_deliveries),
            registrations: load(&self.registrations),
            unregistrations: load(&self.unregistrations),
            route_changes: load(&self.route_changes),
            failed_operations: load(&self.failed_operations),
        }
    }
}
