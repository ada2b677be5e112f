use std::cell::{Cell, Ref, RefCell, RefMut};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::storage::{
    default_metrics, CursorMetrics, CursorOptions, PoolPolicy, RecordKind, RecordStore,
};
use crate::types::{NodeId, Result, SombraError};

use super::label::LabelState;
use super::node::NodeCursor;
use super::property::PropertyState;
use super::relationship::RelationshipState;
use super::CursorKind;

/// Iteration state owned by a pool slot.
pub(crate) trait PooledState {
    const KIND: CursorKind;

    /// Drops the current position and row; buffers keep their capacity.
    fn reset(&mut self);
}

pub(crate) struct Slot<T> {
    state: RefCell<T>,
    leased: Cell<bool>,
    generation: Cell<u64>,
}

impl<T> Slot<T> {
    fn new(state: T) -> Self {
        Self {
            state: RefCell::new(state),
            leased: Cell::new(false),
            generation: Cell::new(0),
        }
    }
}

/// Everything a cursor needs to resolve records while it advances.
pub(crate) struct StoreCtx<'a> {
    pub(crate) store: &'a dyn RecordStore,
    pub(crate) metrics: &'a dyn CursorMetrics,
    pub(crate) max_chain_steps: u64,
}

/// Acquisition context of one read operation.
///
/// Owns exactly one label, one property and one relationship cursor. The
/// instances are created once and re-initialized on every acquisition, so a
/// traversal that visits many nodes allocates nothing per step once the
/// buffers have grown to fit.
///
/// A statement is confined to a single thread (`!Sync`). Parallel reads use one
/// statement each over a shared `Arc<dyn RecordStore>`.
pub struct Statement {
    store: Arc<dyn RecordStore>,
    metrics: Arc<dyn CursorMetrics>,
    policy: PoolPolicy,
    max_chain_steps: u64,
    labels: Slot<LabelState>,
    props: Slot<PropertyState>,
    rels: Slot<RelationshipState>,
}

/// Outstanding acquisitions of a [`Statement`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PoolStatus {
    /// Whether the label cursor is leased.
    pub label: bool,
    /// Whether the property cursor is leased.
    pub property: bool,
    /// Whether the relationship cursor is leased.
    pub relationship: bool,
}

impl PoolStatus {
    /// Whether `kind` is currently leased.
    pub fn outstanding(&self, kind: CursorKind) -> bool {
        match kind {
            CursorKind::Label => self.label,
            CursorKind::Property => self.property,
            CursorKind::Relationship => self.relationship,
        }
    }

    /// Whether nothing is leased.
    pub fn is_idle(&self) -> bool {
        !(self.label || self.property || self.relationship)
    }
}

impl Statement {
    /// Creates a statement reading from `store`.
    pub fn new(store: Arc<dyn RecordStore>, opts: CursorOptions) -> Self {
        let metrics = opts.metrics.clone().unwrap_or_else(default_metrics);
        trace!(
            policy = ?opts.pool_policy,
            max_chain_steps = opts.max_chain_steps,
            "cursor.statement.open"
        );
        Self {
            store,
            metrics,
            policy: opts.pool_policy,
            max_chain_steps: opts.max_chain_steps.max(1),
            labels: Slot::new(LabelState::with_capacity(opts.label_capacity)),
            props: Slot::new(PropertyState::with_capacity(opts.overflow_capacity)),
            rels: Slot::new(RelationshipState::new()),
        }
    }

    /// Resolves node `id` and positions a node cursor on it.
    pub fn node(&self, id: NodeId) -> Result<NodeCursor<'_>> {
        let record = self.store.node(id)?;
        self.metrics.record_resolved(RecordKind::Node);
        if !record.in_use {
            return Err(SombraError::NotFound("node"));
        }
        if record.id != id {
            return Err(SombraError::Corruption("node record id mismatch"));
        }
        Ok(NodeCursor::from_record(record, self))
    }

    /// Pool policy in effect.
    pub fn pool_policy(&self) -> PoolPolicy {
        self.policy
    }

    /// Reports which cursor kinds are currently leased.
    pub fn pool_status(&self) -> PoolStatus {
        PoolStatus {
            label: self.labels.leased.get(),
            property: self.props.leased.get(),
            relationship: self.rels.leased.get(),
        }
    }

    pub(crate) fn ctx(&self) -> StoreCtx<'_> {
        StoreCtx {
            store: &*self.store,
            metrics: &*self.metrics,
            max_chain_steps: self.max_chain_steps,
        }
    }

    pub(crate) fn label_slot(&self) -> &Slot<LabelState> {
        &self.labels
    }

    pub(crate) fn property_slot(&self) -> &Slot<PropertyState> {
        &self.props
    }

    pub(crate) fn relationship_slot(&self) -> &Slot<RelationshipState> {
        &self.rels
    }

    pub(crate) fn lease<'a, T: PooledState>(&'a self, slot: &'a Slot<T>) -> Result<Lease<'a, T>> {
        let kind = T::KIND;
        if slot.leased.get() {
            match self.policy {
                PoolPolicy::Strict => {
                    debug!(kind = %kind, "cursor.pool.misuse");
                    return Err(SombraError::PoolMisuse(kind));
                }
                PoolPolicy::Shared => {
                    warn!(kind = %kind, "cursor.pool.alias");
                    self.metrics.pool_alias(kind);
                }
            }
        }
        // A live row borrow from an aliased handle would be clobbered by the reset.
        slot.state
            .try_borrow_mut()
            .map_err(|_| SombraError::PoolMisuse(kind))?
            .reset();
        let generation = slot.generation.get().wrapping_add(1);
        slot.generation.set(generation);
        slot.leased.set(true);
        self.metrics.cursor_acquired(kind);
        trace!(kind = %kind, generation, "cursor.pool.acquire");
        Ok(Lease {
            stmt: self,
            slot,
            generation,
            open: true,
        })
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        trace!("cursor.statement.close");
    }
}

/// Exclusive claim on a pool slot, released on close or drop.
pub(crate) struct Lease<'a, T: PooledState> {
    stmt: &'a Statement,
    slot: &'a Slot<T>,
    generation: u64,
    open: bool,
}

impl<'a, T: PooledState> Lease<'a, T> {
    pub(crate) fn stmt(&self) -> &'a Statement {
        self.stmt
    }

    /// Mutable state, or `None` once the lease is closed.
    pub(crate) fn state_mut(&self) -> Result<Option<RefMut<'a, T>>> {
        if !self.open {
            return Ok(None);
        }
        self.slot
            .state
            .try_borrow_mut()
            .map(Some)
            .map_err(|_| SombraError::PoolMisuse(T::KIND))
    }

    pub(crate) fn state(&self) -> Ref<'a, T> {
        self.slot.state.borrow()
    }

    pub(crate) fn release(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let kind = T::KIND;
        if self.slot.generation.get() != self.generation {
            // Superseded under the shared policy; the newer lease owns the slot.
            trace!(kind = %kind, generation = self.generation, "cursor.pool.release.stale");
            return;
        }
        self.slot.leased.set(false);
        if let Ok(mut state) = self.slot.state.try_borrow_mut() {
            state.reset();
        }
        self.stmt.metrics.cursor_released(kind);
        trace!(kind = %kind, generation = self.generation, "cursor.pool.release");
    }
}

impl<T: PooledState> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        self.release();
    }
}
