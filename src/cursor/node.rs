use crate::storage::{Dir, NodeRecord};
use crate::types::{NodeId, Result, TypeId};

use super::label::LabelCursor;
use super::property::PropertyCursor;
use super::relationship::RelationshipCursor;
use super::Statement;

/// A resolved node record plus the statement whose pooled cursors it hands out.
///
/// Every accessor leases the statement's single instance of the requested
/// kind. Under the strict pool policy, asking for a kind that is still open
/// fails with [`SombraError::PoolMisuse`](crate::types::SombraError::PoolMisuse).
pub struct NodeCursor<'a> {
    record: NodeRecord,
    stmt: &'a Statement,
}

impl<'a> NodeCursor<'a> {
    /// Wraps an already resolved record.
    pub fn from_record(record: NodeRecord, stmt: &'a Statement) -> Self {
        Self { record, stmt }
    }

    /// Node id.
    pub fn id(&self) -> NodeId {
        self.record.id
    }

    /// Underlying record.
    pub fn record(&self) -> &NodeRecord {
        &self.record
    }

    /// Whether the node's relationships are bucketed in groups.
    pub fn is_dense(&self) -> bool {
        self.record.is_dense()
    }

    /// Label cursor over this node's labels.
    pub fn labels(&self) -> Result<LabelCursor<'a>> {
        let mut cursor = LabelCursor::acquire(self.stmt)?;
        cursor.init(self.record.labels)?;
        Ok(cursor)
    }

    /// Property cursor over this node's property chain.
    pub fn properties(&self) -> Result<PropertyCursor<'a>> {
        let mut cursor = PropertyCursor::acquire(self.stmt)?;
        cursor.init(self.record.first_prop)?;
        Ok(cursor)
    }

    /// Relationship cursor over every relationship in direction `dir`.
    pub fn relationships(&self, dir: Dir) -> Result<RelationshipCursor<'a>> {
        self.open_relationships(dir, None)
    }

    /// Relationship cursor restricted to `types`. An empty slice matches
    /// nothing.
    pub fn relationships_of_types(
        &self,
        dir: Dir,
        types: &[TypeId],
    ) -> Result<RelationshipCursor<'a>> {
        self.open_relationships(dir, Some(types))
    }

    fn open_relationships(
        &self,
        dir: Dir,
        types: Option<&[TypeId]>,
    ) -> Result<RelationshipCursor<'a>> {
        let mut cursor = RelationshipCursor::acquire(self.stmt)?;
        cursor.init(self.record.rels, self.record.id, dir, types)?;
        Ok(cursor)
    }
}
