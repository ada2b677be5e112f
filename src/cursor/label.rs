use crate::storage::{LabelField, LabelFieldKind, RecordKind};
use crate::types::{LabelId, Result};

use super::pool::{Lease, PooledState, StoreCtx};
use super::{Cursor, CursorKind, Statement};

pub(crate) struct LabelState {
    labels: Vec<LabelId>,
    index: usize,
    current: LabelId,
    positioned: bool,
    exhausted: bool,
}

impl LabelState {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            labels: Vec::with_capacity(capacity),
            index: 0,
            current: LabelId::default(),
            positioned: false,
            exhausted: true,
        }
    }

    fn init(&mut self, field: LabelField, ctx: &StoreCtx<'_>) -> Result<()> {
        self.reset();
        match field.kind() {
            LabelFieldKind::Inline { .. } => field.decode_inline_into(&mut self.labels)?,
            LabelFieldKind::Dynamic(ptr) => {
                ctx.store.label_array(ptr, &mut self.labels)?;
                ctx.metrics.record_resolved(RecordKind::Dynamic);
            }
        }
        self.exhausted = false;
        Ok(())
    }

    fn advance(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        match self.labels.get(self.index) {
            Some(label) => {
                self.current = *label;
                self.index += 1;
                self.positioned = true;
                true
            }
            None => {
                self.current = LabelId::default();
                self.positioned = false;
                self.exhausted = true;
                false
            }
        }
    }
}

impl PooledState for LabelState {
    const KIND: CursorKind = CursorKind::Label;

    fn reset(&mut self) {
        self.labels.clear();
        self.index = 0;
        self.current = LabelId::default();
        self.positioned = false;
        self.exhausted = true;
    }
}

/// Cursor over a node's label ids, in ascending order.
pub struct LabelCursor<'a> {
    lease: Lease<'a, LabelState>,
}

impl<'a> LabelCursor<'a> {
    pub(crate) fn acquire(stmt: &'a Statement) -> Result<Self> {
        Ok(Self {
            lease: stmt.lease(stmt.label_slot())?,
        })
    }

    pub(crate) fn init(&mut self, field: LabelField) -> Result<()> {
        let ctx = self.lease.stmt().ctx();
        if let Some(mut state) = self.lease.state_mut()? {
            state.init(field, &ctx)?;
        }
        Ok(())
    }

    /// Label id of the current row.
    pub fn label(&self) -> LabelId {
        let state = self.lease.state();
        debug_assert!(state.positioned, "label cursor read outside a row");
        state.current
    }

    /// Advances until the current label is `label` (returns true) or the
    /// sequence passes it (returns false). Labels are ascending, so a false
    /// result leaves the cursor on the first larger label or exhausted.
    pub fn seek(&mut self, label: LabelId) -> Result<bool> {
        while self.next()? {
            let current = self.label();
            if current == label {
                return Ok(true);
            }
            if current > label {
                return Ok(false);
            }
        }
        Ok(false)
    }
}

impl Cursor for LabelCursor<'_> {
    fn next(&mut self) -> Result<bool> {
        let Some(mut state) = self.lease.state_mut()? else {
            return Ok(false);
        };
        let moved = state.advance();
        if moved {
            self.lease.stmt().ctx().metrics.row_yielded(CursorKind::Label);
        }
        Ok(moved)
    }

    fn close(&mut self) {
        self.lease.release();
    }
}
