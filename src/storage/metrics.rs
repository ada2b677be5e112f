use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cursor::CursorKind;

use super::record::RecordKind;

/// Trait for tracking cursor activity against the record store.
///
/// Implementations receive one call per pool transition and per resolved
/// record, so they must stay cheap. A [`Statement`](crate::cursor::Statement)
/// is single-threaded but the same metrics sink is usually shared by every
/// statement of a database, hence the `Send + Sync` bound.
pub trait CursorMetrics: Send + Sync {
    /// A pooled cursor was handed out.
    fn cursor_acquired(&self, kind: CursorKind);

    /// A pooled cursor was returned to its pool.
    fn cursor_released(&self, kind: CursorKind);

    /// A record was resolved through the backing store.
    fn record_resolved(&self, kind: RecordKind);

    /// A cursor produced a row.
    fn row_yielded(&self, kind: CursorKind);

    /// A record was read but rejected by a direction or type filter.
    fn row_filtered(&self, kind: CursorKind);

    /// A dense node's relationship group was passed over by the type filter
    /// without walking its members.
    fn group_skipped(&self);

    /// A chain walk exceeded its traversal-step budget.
    fn chain_budget_exceeded(&self, kind: CursorKind);

    /// An outstanding cursor was re-acquired under the shared pool policy.
    fn pool_alias(&self, kind: CursorKind);
}

/// A no-op implementation of [`CursorMetrics`] that discards all recorded metrics.
#[derive(Default)]
pub struct NoopMetrics;

impl CursorMetrics for NoopMetrics {
    fn cursor_acquired(&self, _kind: CursorKind) {}
    fn cursor_released(&self, _kind: CursorKind) {}
    fn record_resolved(&self, _kind: RecordKind) {}
    fn row_yielded(&self, _kind: CursorKind) {}
    fn row_filtered(&self, _kind: CursorKind) {}
    fn group_skipped(&self) {}
    fn chain_budget_exceeded(&self, _kind: CursorKind) {}
    fn pool_alias(&self, _kind: CursorKind) {}
}

/// A thread-safe counter-based implementation of [`CursorMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Label cursor acquisitions.
    pub label_acquisitions: AtomicU64,
    /// Property cursor acquisitions.
    pub property_acquisitions: AtomicU64,
    /// Relationship cursor acquisitions.
    pub relationship_acquisitions: AtomicU64,
    /// Cursors returned to their pool.
    pub releases: AtomicU64,
    /// Node records resolved.
    pub node_records: AtomicU64,
    /// Relationship records resolved.
    pub relationship_records: AtomicU64,
    /// Relationship-group records resolved.
    pub group_records: AtomicU64,
    /// Property records resolved.
    pub property_records: AtomicU64,
    /// Dynamic record chains resolved.
    pub dynamic_records: AtomicU64,
    /// Rows produced by any cursor.
    pub rows_yielded: AtomicU64,
    /// Records skipped by filters.
    pub rows_filtered: AtomicU64,
    /// Relationship groups skipped by type filters.
    pub groups_skipped: AtomicU64,
    /// Chain walks aborted by the step budget.
    pub budget_violations: AtomicU64,
    /// Shared-policy re-acquisitions of an outstanding cursor.
    pub alias_events: AtomicU64,
}

impl CounterMetrics {
    /// Total records resolved across every record kind.
    pub fn records_resolved(&self) -> u64 {
        [
            &self.node_records,
            &self.relationship_records,
            &self.group_records,
            &self.property_records,
            &self.dynamic_records,
        ]
        .iter()
        .map(|counter| counter.load(Ordering::Relaxed))
        .sum()
    }

    /// Total acquisitions across every cursor kind.
    pub fn acquisitions(&self) -> u64 {
        self.label_acquisitions.load(Ordering::Relaxed)
            + self.property_acquisitions.load(Ordering::Relaxed)
            + self.relationship_acquisitions.load(Ordering::Relaxed)
    }
}

impl CursorMetrics for CounterMetrics {
    fn cursor_acquired(&self, kind: CursorKind) {
        let counter = match kind {
            CursorKind::Label => &self.label_acquisitions,
            CursorKind::Property => &self.property_acquisitions,
            CursorKind::Relationship => &self.relationship_acquisitions,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn cursor_released(&self, _kind: CursorKind) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    fn record_resolved(&self, kind: RecordKind) {
        let counter = match kind {
            RecordKind::Node => &self.node_records,
            RecordKind::Relationship => &self.relationship_records,
            RecordKind::RelationshipGroup => &self.group_records,
            RecordKind::Property => &self.property_records,
            RecordKind::Dynamic => &self.dynamic_records,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn row_yielded(&self, _kind: CursorKind) {
        self.rows_yielded.fetch_add(1, Ordering::Relaxed);
    }

    fn row_filtered(&self, _kind: CursorKind) {
        self.rows_filtered.fetch_add(1, Ordering::Relaxed);
    }

    fn group_skipped(&self) {
        self.groups_skipped.fetch_add(1, Ordering::Relaxed);
    }

    fn chain_budget_exceeded(&self, _kind: CursorKind) {
        self.budget_violations.fetch_add(1, Ordering::Relaxed);
    }

    fn pool_alias(&self, _kind: CursorKind) {
        self.alias_events.fetch_add(1, Ordering::Relaxed);
    }
}

/// Returns the default metrics sink, which discards everything.
pub fn default_metrics() -> Arc<dyn CursorMetrics> {
    Arc::new(NoopMetrics)
}
