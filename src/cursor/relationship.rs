use smallvec::SmallVec;
use tracing::debug;

use crate::storage::{Dir, RelGroupRecord, RecordKind, RelChain, RelationshipRecord};
use crate::types::{GroupId, NodeId, PropRecId, RelId, Result, SombraError, TypeId};

use super::pool::{Lease, PooledState, StoreCtx};
use super::property::PropertyCursor;
use super::{Cursor, CursorKind, Statement};

/// Current row of a [`RelationshipCursor`], seen from the node that opened it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RelationshipRow {
    record: RelationshipRecord,
    origin: NodeId,
}

impl RelationshipRow {
    /// Relationship id.
    pub fn id(&self) -> RelId {
        self.record.id
    }

    /// Relationship type.
    pub fn rel_type(&self) -> TypeId {
        self.record.ty
    }

    /// Source node.
    pub fn start_node(&self) -> NodeId {
        self.record.start
    }

    /// Target node.
    pub fn end_node(&self) -> NodeId {
        self.record.end
    }

    /// Node the traversal started from.
    pub fn origin(&self) -> NodeId {
        self.origin
    }

    /// Endpoint opposite to the origin; the origin itself for self-loops.
    pub fn other_node(&self) -> NodeId {
        self.record.other_node(self.origin)
    }

    /// Direction relative to the origin; [`Dir::Both`] for self-loops.
    pub fn direction(&self) -> Dir {
        self.record.direction_from(self.origin).unwrap_or(Dir::Both)
    }

    /// Whether start and end are the same node.
    pub fn is_loop(&self) -> bool {
        self.record.is_loop()
    }

    /// First record of the relationship's property chain.
    pub fn first_prop(&self) -> Option<PropRecId> {
        self.record.first_prop
    }

    /// Underlying record.
    pub fn record(&self) -> &RelationshipRecord {
        &self.record
    }
}

/// Position inside one selected relationship group.
#[derive(Copy, Clone, Debug)]
struct GroupWalk {
    ty: TypeId,
    // Sub-chain heads still to walk, tagged with the direction their members
    // have relative to the owner (`Both` = self-loops).
    heads: [(Dir, Option<RelId>); 3],
    len: usize,
    pos: usize,
    current: Dir,
    next: Option<RelId>,
}

impl GroupWalk {
    fn new(group: &RelGroupRecord, dir: Dir) -> Self {
        let mut heads = [(Dir::Both, None); 3];
        let mut len = 0;
        if dir.includes_out() {
            heads[len] = (Dir::Out, group.first_out);
            len += 1;
        }
        if dir.includes_in() {
            heads[len] = (Dir::In, group.first_in);
            len += 1;
        }
        heads[len] = (Dir::Both, group.first_loop);
        len += 1;
        let (current, next) = heads[0];
        Self {
            ty: group.ty,
            heads,
            len,
            pos: 1,
            current,
            next,
        }
    }

    /// Moves to the next sub-chain; false when the group is done.
    fn advance_subchain(&mut self) -> bool {
        if self.pos >= self.len {
            return false;
        }
        let (current, next) = self.heads[self.pos];
        self.pos += 1;
        self.current = current;
        self.next = next;
        true
    }
}

#[derive(Copy, Clone, Debug)]
enum Walk {
    Idle,
    Sparse {
        next: Option<RelId>,
    },
    Dense {
        next_group: Option<GroupId>,
        group: Option<GroupWalk>,
    },
}

pub(crate) struct RelationshipState {
    origin: NodeId,
    dir: Dir,
    types: SmallVec<[TypeId; 4]>,
    filter_types: bool,
    walk: Walk,
    steps: u64,
    positioned: bool,
    row: Option<RelationshipRow>,
}

impl RelationshipState {
    pub(crate) fn new() -> Self {
        Self {
            origin: NodeId(0),
            dir: Dir::Both,
            types: SmallVec::new(),
            filter_types: false,
            walk: Walk::Idle,
            steps: 0,
            positioned: false,
            row: None,
        }
    }

    fn init(&mut self, chain: RelChain, origin: NodeId, dir: Dir, types: Option<&[TypeId]>) {
        self.reset();
        self.origin = origin;
        self.dir = dir;
        if let Some(types) = types {
            self.filter_types = true;
            self.types.extend_from_slice(types);
        }
        self.walk = match chain {
            RelChain::Sparse(first) => Walk::Sparse { next: first },
            RelChain::Dense(first) => Walk::Dense {
                next_group: first,
                group: None,
            },
        };
    }

    fn accepts_type(&self, ty: TypeId) -> bool {
        !self.filter_types || self.types.contains(&ty)
    }

    fn step(&mut self, ctx: &StoreCtx<'_>) -> Result<()> {
        self.steps += 1;
        if self.steps > ctx.max_chain_steps {
            ctx.metrics.chain_budget_exceeded(CursorKind::Relationship);
            debug!(node = %self.origin, steps = self.steps, "cursor.chain.budget_exceeded");
            return Err(SombraError::Corruption(
                "relationship chain exceeds traversal budget",
            ));
        }
        Ok(())
    }

    fn inconsistent(&self, reason: &'static str) -> SombraError {
        debug!(node = %self.origin, reason, "cursor.chain.inconsistent");
        SombraError::Corruption(reason)
    }

    fn load(&mut self, id: RelId, ctx: &StoreCtx<'_>) -> Result<RelationshipRecord> {
        self.step(ctx)?;
        let record = ctx.store.relationship(id)?;
        ctx.metrics.record_resolved(RecordKind::Relationship);
        if !record.in_use {
            return Err(SombraError::NotFound("relationship"));
        }
        if record.id != id {
            return Err(self.inconsistent("relationship record id mismatch"));
        }
        Ok(record)
    }

    fn emit(&mut self, record: RelationshipRecord) -> bool {
        self.row = Some(RelationshipRow {
            record,
            origin: self.origin,
        });
        self.positioned = true;
        true
    }

    fn advance(&mut self, ctx: &StoreCtx<'_>) -> Result<bool> {
        self.positioned = false;
        loop {
            match self.walk {
                Walk::Idle => return Ok(false),
                Walk::Sparse { next: None }
                | Walk::Dense {
                    next_group: None,
                    group: None,
                } => {
                    self.finish();
                    return Ok(false);
                }
                Walk::Sparse { next: Some(id) } => {
                    let record = self.load(id, ctx)?;
                    let actual = record
                        .direction_from(self.origin)
                        .ok_or_else(|| self.inconsistent("relationship chain leaves its node"))?;
                    self.walk = Walk::Sparse {
                        next: record.next_for(self.origin),
                    };
                    if self.dir.accepts(actual) && self.accepts_type(record.ty) {
                        return Ok(self.emit(record));
                    }
                    ctx.metrics.row_filtered(CursorKind::Relationship);
                }
                Walk::Dense {
                    next_group,
                    group: Some(mut walk),
                } => match walk.next {
                    Some(id) => {
                        let record = self.load(id, ctx)?;
                        if record.ty != walk.ty
                            || record.direction_from(self.origin) != Some(walk.current)
                        {
                            return Err(
                                self.inconsistent("relationship group sub-chain is inconsistent")
                            );
                        }
                        walk.next = record.next_for(self.origin);
                        self.walk = Walk::Dense {
                            next_group,
                            group: Some(walk),
                        };
                        return Ok(self.emit(record));
                    }
                    None => {
                        let group = walk.advance_subchain().then_some(walk);
                        self.walk = Walk::Dense { next_group, group };
                    }
                },
                Walk::Dense {
                    next_group: Some(id),
                    group: None,
                } => {
                    self.step(ctx)?;
                    let group = ctx.store.relationship_group(id)?;
                    ctx.metrics.record_resolved(RecordKind::RelationshipGroup);
                    if !group.in_use {
                        return Err(SombraError::NotFound("relationship group"));
                    }
                    if group.id != id || group.owner != self.origin {
                        return Err(self.inconsistent("relationship group belongs to another node"));
                    }
                    let selected = if self.accepts_type(group.ty) {
                        Some(GroupWalk::new(&group, self.dir))
                    } else {
                        ctx.metrics.group_skipped();
                        None
                    };
                    self.walk = Walk::Dense {
                        next_group: group.next,
                        group: selected,
                    };
                }
            }
        }
    }

    fn finish(&mut self) {
        self.walk = Walk::Idle;
        self.positioned = false;
        self.row = None;
    }
}

impl PooledState for RelationshipState {
    const KIND: CursorKind = CursorKind::Relationship;

    fn reset(&mut self) {
        self.finish();
        self.types.clear();
        self.filter_types = false;
        self.steps = 0;
    }
}

/// Cursor over the relationships of one node, filtered by direction and type.
///
/// Sparse nodes are walked along their relationship chain; dense nodes along
/// their group chain, visiting the outgoing, incoming and self-loop
/// sub-chains of every selected group in that order. Self-loops are produced
/// once whatever the direction filter.
pub struct RelationshipCursor<'a> {
    lease: Lease<'a, RelationshipState>,
}

impl<'a> RelationshipCursor<'a> {
    pub(crate) fn acquire(stmt: &'a Statement) -> Result<Self> {
        Ok(Self {
            lease: stmt.lease(stmt.relationship_slot())?,
        })
    }

    pub(crate) fn init(
        &mut self,
        chain: RelChain,
        origin: NodeId,
        dir: Dir,
        types: Option<&[TypeId]>,
    ) -> Result<()> {
        if let Some(mut state) = self.lease.state_mut()? {
            state.init(chain, origin, dir, types);
        }
        Ok(())
    }

    /// Current row.
    pub fn row(&self) -> RelationshipRow {
        let state = self.lease.state();
        debug_assert!(state.positioned, "relationship cursor read outside a row");
        state.row.unwrap_or(RelationshipRow {
            record: RelationshipRecord::new(RelId(0), TypeId(0), state.origin, state.origin),
            origin: state.origin,
        })
    }

    /// Id of the current relationship.
    pub fn id(&self) -> RelId {
        self.row().id()
    }

    /// Opens the statement's property cursor on the current relationship.
    pub fn properties(&self) -> Result<PropertyCursor<'a>> {
        let first = self.row().first_prop();
        let mut cursor = PropertyCursor::acquire(self.lease.stmt())?;
        cursor.init(first)?;
        Ok(cursor)
    }
}

impl Cursor for RelationshipCursor<'_> {
    fn next(&mut self) -> Result<bool> {
        let Some(mut state) = self.lease.state_mut()? else {
            return Ok(false);
        };
        let ctx = self.lease.stmt().ctx();
        match state.advance(&ctx) {
            Ok(true) => {
                ctx.metrics.row_yielded(CursorKind::Relationship);
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
