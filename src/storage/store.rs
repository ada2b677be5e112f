use crate::types::{DynRecId, GroupId, LabelId, NodeId, PropRecId, RelId, Result};

use super::record::{NodeRecord, PropertyRecord, RelGroupRecord, RelationshipRecord};

/// Record-resolution contract the cursors read through.
///
/// Implementations own paging, on-disk layout and visibility. Every record
/// accessor returns an in-use record or fails with
/// [`SombraError::NotFound`](crate::types::SombraError::NotFound) /
/// [`SombraError::Corruption`](crate::types::SombraError::Corruption). The
/// dynamic accessors append into caller-owned buffers so cursors can reuse
/// their storage across rows.
pub trait RecordStore: Send + Sync {
    /// Resolves a node record.
    fn node(&self, id: NodeId) -> Result<NodeRecord>;

    /// Resolves a relationship record.
    fn relationship(&self, id: RelId) -> Result<RelationshipRecord>;

    /// Resolves a relationship-group record.
    fn relationship_group(&self, id: GroupId) -> Result<RelGroupRecord>;

    /// Resolves a property record.
    fn property(&self, id: PropRecId) -> Result<PropertyRecord>;

    /// Appends the ordered label ids of an external label array to `out`.
    fn label_array(&self, ptr: DynRecId, out: &mut Vec<LabelId>) -> Result<()>;

    /// Appends the materialized payload of an overflowed property value to `out`.
    fn property_overflow(&self, ptr: DynRecId, out: &mut Vec<u8>) -> Result<()>;
}
