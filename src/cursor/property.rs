use std::cell::Ref;
use std::str;

use tracing::debug;

use crate::storage::{PropSlot, PropValue, PropValueOwned, PropertyRecord, RecordKind};
use crate::types::{PropKeyId, PropRecId, Result, SombraError};

use super::pool::{Lease, PooledState, StoreCtx};
use super::{Cursor, CursorKind, Statement};

/// Current row of a [`PropertyCursor`].
///
/// String and byte values are materialized into a buffer owned by the pooled
/// cursor, whether the record held them inline or in overflow records.
pub struct PropertyRow {
    id: PropRecId,
    key: PropKeyId,
    slot: PropSlot,
    buf: Vec<u8>,
}

impl PropertyRow {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            id: PropRecId(0),
            key: PropKeyId::default(),
            slot: PropSlot::Null,
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Id of the property record backing this row.
    pub fn record_id(&self) -> PropRecId {
        self.id
    }

    /// Property key token.
    pub fn key(&self) -> PropKeyId {
        self.key
    }

    /// Fully materialized value.
    pub fn value(&self) -> PropValue<'_> {
        match self.slot {
            PropSlot::Null => PropValue::Null,
            PropSlot::Bool(v) => PropValue::Bool(v),
            PropSlot::Int(v) => PropValue::Int(v),
            PropSlot::Float(v) => PropValue::Float(v),
            PropSlot::Date(v) => PropValue::Date(v),
            PropSlot::DateTime(v) => PropValue::DateTime(v),
            // Validated in `load`.
            PropSlot::ShortStr(_) | PropSlot::Str(_) => {
                PropValue::Str(str::from_utf8(&self.buf).unwrap_or_default())
            }
            PropSlot::ShortBytes(_) | PropSlot::Bytes(_) => PropValue::Bytes(&self.buf),
        }
    }

    fn load(&mut self, record: &PropertyRecord, ctx: &StoreCtx<'_>) -> Result<()> {
        self.id = record.id;
        self.key = record.key;
        self.slot = record.value;
        self.buf.clear();
        match record.value {
            PropSlot::ShortStr(blob) | PropSlot::ShortBytes(blob) => {
                self.buf.extend_from_slice(blob.as_bytes());
            }
            PropSlot::Str(ptr) | PropSlot::Bytes(ptr) => {
                ctx.store.property_overflow(ptr, &mut self.buf)?;
                ctx.metrics.record_resolved(RecordKind::Dynamic);
            }
            _ => {}
        }
        if matches!(record.value, PropSlot::ShortStr(_) | PropSlot::Str(_))
            && str::from_utf8(&self.buf).is_err()
        {
            return Err(SombraError::Corruption("property string is not valid UTF-8"));
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.id = PropRecId(0);
        self.key = PropKeyId::default();
        self.slot = PropSlot::Null;
        self.buf.clear();
    }
}

pub(crate) struct PropertyState {
    next: Option<PropRecId>,
    steps: u64,
    positioned: bool,
    exhausted: bool,
    row: PropertyRow,
}

impl PropertyState {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            next: None,
            steps: 0,
            positioned: false,
            exhausted: true,
            row: PropertyRow::with_capacity(capacity),
        }
    }

    fn init(&mut self, first: Option<PropRecId>) {
        self.reset();
        self.next = first;
        self.exhausted = false;
    }

    fn advance(&mut self, ctx: &StoreCtx<'_>) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        self.positioned = false;
        let Some(id) = self.next else {
            self.finish();
            return Ok(false);
        };
        self.steps += 1;
        if self.steps > ctx.max_chain_steps {
            ctx.metrics.chain_budget_exceeded(CursorKind::Property);
            debug!(record = %id, steps = self.steps, "cursor.chain.budget_exceeded");
            return Err(SombraError::Corruption(
                "property chain exceeds traversal budget",
            ));
        }
        let record = ctx.store.property(id)?;
        ctx.metrics.record_resolved(RecordKind::Property);
        if !record.in_use {
            return Err(SombraError::NotFound("property"));
        }
        if record.id != id {
            return Err(SombraError::Corruption("property record id mismatch"));
        }
        self.next = record.next;
        self.row.load(&record, ctx)?;
        self.positioned = true;
        Ok(true)
    }

    fn finish(&mut self) {
        self.next = None;
        self.positioned = false;
        self.exhausted = true;
        self.row.clear();
    }
}

impl PooledState for PropertyState {
    const KIND: CursorKind = CursorKind::Property;

    fn reset(&mut self) {
        self.finish();
        self.steps = 0;
    }
}

/// Cursor over a property record chain.
pub struct PropertyCursor<'a> {
    lease: Lease<'a, PropertyState>,
}

impl<'a> PropertyCursor<'a> {
    pub(crate) fn acquire(stmt: &'a Statement) -> Result<Self> {
        Ok(Self {
            lease: stmt.lease(stmt.property_slot())?,
        })
    }

    pub(crate) fn init(&mut self, first: Option<PropRecId>) -> Result<()> {
        if let Some(mut state) = self.lease.state_mut()? {
            state.init(first);
        }
        Ok(())
    }

    /// Current row. The guard borrows the cursor, so it cannot outlive the
    /// next call to [`Cursor::next`] or [`Cursor::close`].
    pub fn row(&self) -> Ref<'_, PropertyRow> {
        let state = self.lease.state();
        debug_assert!(state.positioned, "property cursor read outside a row");
        Ref::map(state, |state| &state.row)
    }

    /// Key of the current row.
    pub fn key(&self) -> PropKeyId {
        self.row().key()
    }

    /// Copies the current value out of the cursor.
    pub fn value_owned(&self) -> PropValueOwned {
        self.row().value().to_owned_value()
    }

    /// Advances until a row with `key` is found. Property chains are not
    /// ordered, so a miss consumes the cursor.
    pub fn seek(&mut self, key: PropKeyId) -> Result<bool> {
        while self.next()? {
            if self.key() == key {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Cursor for PropertyCursor<'_> {
    fn next(&mut self) -> Result<bool> {
        let Some(mut state) = self.lease.state_mut()? else {
            return Ok(false);
        };
        let ctx = self.lease.stmt().ctx();
        match state.advance(&ctx) {
            Ok(true) => {
                ctx.metrics.row_yielded(CursorKind::Property);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(err) => {
                state.finish();
                Err(err)
            }
        }
    }

    fn close(&mut self) {
        self.lease.release();
    }
}
