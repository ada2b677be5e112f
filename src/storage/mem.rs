//! In-memory record store.
//!
//! Records live in plain vectors indexed by id. The builder links
//! relationship chains, relationship groups and property chains in insertion
//! order, spills labels and long values to dynamic records the same way a
//! paged store would, and exposes a few pointer-rewriting hooks for modelling
//! damaged stores in tests.

use std::collections::HashMap;
use std::fmt;

use crate::types::{
    DynRecId, GroupId, LabelId, NodeId, PropKeyId, PropRecId, RelId, Result, SombraError, TypeId,
};

use super::labels::LabelField;
use super::record::{
    NodeRecord, PropSlot, PropertyRecord, RecordKind, RelChain, RelGroupRecord,
    RelationshipRecord, ShortBlob,
};
use super::store::RecordStore;
use super::types::PropValue;

#[derive(Clone)]
enum DynPayload {
    Labels(Vec<LabelId>),
    Bytes(Vec<u8>),
}

/// Immutable in-memory [`RecordStore`].
#[derive(Clone, Default)]
pub struct MemStore {
    nodes: Vec<NodeRecord>,
    rels: Vec<RelationshipRecord>,
    groups: Vec<RelGroupRecord>,
    props: Vec<PropertyRecord>,
    dynamic: Vec<DynPayload>,
}

impl MemStore {
    /// Starts building a store.
    pub fn builder() -> MemStoreBuilder {
        MemStoreBuilder::default()
    }

    /// Number of node records, live or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of relationship records, live or not.
    pub fn relationship_count(&self) -> usize {
        self.rels.len()
    }
}

impl fmt::Debug for MemStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemStore")
            .field("nodes", &self.nodes.len())
            .field("relationships", &self.rels.len())
            .field("groups", &self.groups.len())
            .field("properties", &self.props.len())
            .field("dynamic", &self.dynamic.len())
            .finish()
    }
}

fn slot<T>(items: &[T], id: u64, kind: RecordKind) -> Result<&T> {
    usize::try_from(id)
        .ok()
        .and_then(|idx| items.get(idx))
        .ok_or(SombraError::NotFound(kind.as_str()))
}

fn slot_mut<T>(items: &mut [T], id: u64, kind: RecordKind) -> Result<&mut T> {
    usize::try_from(id)
        .ok()
        .and_then(|idx| items.get_mut(idx))
        .ok_or(SombraError::NotFound(kind.as_str()))
}

fn live<T: Copy>(record: &T, in_use: bool, kind: RecordKind) -> Result<T> {
    if in_use {
        Ok(*record)
    } else {
        Err(SombraError::NotFound(kind.as_str()))
    }
}

impl RecordStore for MemStore {
    fn node(&self, id: NodeId) -> Result<NodeRecord> {
        let record = slot(&self.nodes, id.0, RecordKind::Node)?;
        live(record, record.in_use, RecordKind::Node)
    }

    fn relationship(&self, id: RelId) -> Result<RelationshipRecord> {
        let record = slot(&self.rels, id.0, RecordKind::Relationship)?;
        live(record, record.in_use, RecordKind::Relationship)
    }

    fn relationship_group(&self, id: GroupId) -> Result<RelGroupRecord> {
        let record = slot(&self.groups, id.0, RecordKind::RelationshipGroup)?;
        live(record, record.in_use, RecordKind::RelationshipGroup)
    }

    fn property(&self, id: PropRecId) -> Result<PropertyRecord> {
        let record = slot(&self.props, id.0, RecordKind::Property)?;
        live(record, record.in_use, RecordKind::Property)
    }

    fn label_array(&self, ptr: DynRecId, out: &mut Vec<LabelId>) -> Result<()> {
        match slot(&self.dynamic, ptr.0, RecordKind::Dynamic)? {
            DynPayload::Labels(labels) => {
                out.extend_from_slice(labels);
                Ok(())
            }
            DynPayload::Bytes(_) => Err(SombraError::Corruption(
                "dynamic record is not a label array",
            )),
        }
    }

    fn property_overflow(&self, ptr: DynRecId, out: &mut Vec<u8>) -> Result<()> {
        match slot(&self.dynamic, ptr.0, RecordKind::Dynamic)? {
            DynPayload::Bytes(bytes) => {
                out.extend_from_slice(bytes);
                Ok(())
            }
            DynPayload::Labels(_) => Err(SombraError::Corruption(
                "dynamic record is not a property payload",
            )),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
enum PropOwner {
    Node(NodeId),
    Rel(RelId),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
enum SubChain {
    Out,
    In,
    Loop,
}

/// Builds a [`MemStore`], linking chains in insertion order.
#[derive(Default)]
pub struct MemStoreBuilder {
    store: MemStore,
    rel_tails: HashMap<NodeId, RelId>,
    group_tails: HashMap<NodeId, GroupId>,
    groups_by_type: HashMap<(NodeId, TypeId), GroupId>,
    sub_tails: HashMap<(GroupId, SubChain), RelId>,
    prop_tails: HashMap<PropOwner, PropRecId>,
}

impl MemStoreBuilder {
    /// Adds a sparse node. Labels are sorted and deduplicated; sets that do
    /// not fit the inline field go to a dynamic label array.
    pub fn node(&mut self, labels: &[LabelId]) -> Result<NodeId> {
        self.push_node(labels, RelChain::Sparse(None))
    }

    /// Adds a dense node whose relationships are bucketed per type.
    pub fn dense_node(&mut self, labels: &[LabelId]) -> Result<NodeId> {
        self.push_node(labels, RelChain::Dense(None))
    }

    /// Adds a relationship and links it into both endpoints' chains.
    pub fn relationship(&mut self, start: NodeId, end: NodeId, ty: TypeId) -> Result<RelId> {
        slot(&self.store.nodes, start.0, RecordKind::Node)?;
        slot(&self.store.nodes, end.0, RecordKind::Node)?;
        let id = RelId(self.store.rels.len() as u64);
        self.store
            .rels
            .push(RelationshipRecord::new(id, ty, start, end));
        self.link(start, id, ty)?;
        if start != end {
            self.link(end, id, ty)?;
        }
        Ok(id)
    }

    /// Appends a property to a node's chain.
    pub fn node_property(
        &mut self,
        node: NodeId,
        key: PropKeyId,
        value: PropValue<'_>,
    ) -> Result<PropRecId> {
        slot(&self.store.nodes, node.0, RecordKind::Node)?;
        self.push_property(PropOwner::Node(node), key, value)
    }

    /// Appends a property to a relationship's chain.
    pub fn relationship_property(
        &mut self,
        rel: RelId,
        key: PropKeyId,
        value: PropValue<'_>,
    ) -> Result<PropRecId> {
        slot(&self.store.rels, rel.0, RecordKind::Relationship)?;
        self.push_property(PropOwner::Rel(rel), key, value)
    }

    /// Rewrites the link that follows `rel` in `node`'s chain.
    pub fn set_relationship_next(
        &mut self,
        rel: RelId,
        node: NodeId,
        next: Option<RelId>,
    ) -> Result<()> {
        let record = slot_mut(&mut self.store.rels, rel.0, RecordKind::Relationship)?;
        if !record.involves(node) {
            return Err(SombraError::Invalid("node is not an endpoint of relationship"));
        }
        if record.start == node {
            record.start_next = next;
        } else {
            record.end_next = next;
        }
        Ok(())
    }

    /// Rewrites the link that follows `prop` in its chain.
    pub fn set_property_next(&mut self, prop: PropRecId, next: Option<PropRecId>) -> Result<()> {
        slot_mut(&mut self.store.props, prop.0, RecordKind::Property)?.next = next;
        Ok(())
    }

    /// Marks a property record as no longer in use without unlinking it.
    pub fn retire_property(&mut self, prop: PropRecId) -> Result<()> {
        slot_mut(&mut self.store.props, prop.0, RecordKind::Property)?.in_use = false;
        Ok(())
    }

    /// Marks a relationship record as no longer in use without unlinking it.
    pub fn retire_relationship(&mut self, rel: RelId) -> Result<()> {
        slot_mut(&mut self.store.rels, rel.0, RecordKind::Relationship)?.in_use = false;
        Ok(())
    }

    /// Group holding `node`'s relationships of type `ty`, if the node is
    /// dense and has any.
    pub fn group(&self, node: NodeId, ty: TypeId) -> Option<GroupId> {
        self.groups_by_type.get(&(node, ty)).copied()
    }

    /// Rewrites the link that follows `group` in its owner's group chain.
    pub fn set_group_next(&mut self, group: GroupId, next: Option<GroupId>) -> Result<()> {
        slot_mut(&mut self.store.groups, group.0, RecordKind::RelationshipGroup)?.next = next;
        Ok(())
    }

    /// Marks a relationship group as no longer in use without unlinking it.
    pub fn retire_group(&mut self, group: GroupId) -> Result<()> {
        slot_mut(&mut self.store.groups, group.0, RecordKind::RelationshipGroup)?.in_use = false;
        Ok(())
    }

    /// Overwrites a node's labels field.
    pub fn set_node_labels(&mut self, node: NodeId, labels: LabelField) -> Result<()> {
        slot_mut(&mut self.store.nodes, node.0, RecordKind::Node)?.labels = labels;
        Ok(())
    }

    /// Overwrites the stored value of a property record.
    pub fn set_property_slot(&mut self, prop: PropRecId, value: PropSlot) -> Result<()> {
        slot_mut(&mut self.store.props, prop.0, RecordKind::Property)?.value = value;
        Ok(())
    }

    /// Finishes the store.
    pub fn build(self) -> MemStore {
        self.store
    }

    fn push_node(&mut self, labels: &[LabelId], rels: RelChain) -> Result<NodeId> {
        let mut sorted = labels.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let field = if LabelField::fits_inline(&sorted) {
            LabelField::inline(&sorted)?
        } else {
            let ptr = self.push_dynamic(DynPayload::Labels(sorted));
            LabelField::dynamic(ptr)?
        };
        let id = NodeId(self.store.nodes.len() as u64);
        let mut record = NodeRecord::new(id);
        record.rels = rels;
        record.labels = field;
        self.store.nodes.push(record);
        Ok(id)
    }

    fn push_dynamic(&mut self, payload: DynPayload) -> DynRecId {
        let id = DynRecId(self.store.dynamic.len() as u64);
        self.store.dynamic.push(payload);
        id
    }

    fn link(&mut self, node: NodeId, rel: RelId, ty: TypeId) -> Result<()> {
        let chain = slot(&self.store.nodes, node.0, RecordKind::Node)?.rels;
        match chain {
            RelChain::Sparse(_) => {
                match self.rel_tails.get(&node).copied() {
                    Some(tail) => self.set_relationship_next(tail, node, Some(rel))?,
                    None => {
                        slot_mut(&mut self.store.nodes, node.0, RecordKind::Node)?.rels =
                            RelChain::Sparse(Some(rel));
                    }
                }
                self.rel_tails.insert(node, rel);
            }
            RelChain::Dense(_) => {
                let group = self.group_for(node, ty)?;
                let record = *slot(&self.store.rels, rel.0, RecordKind::Relationship)?;
                let sub = if record.is_loop() {
                    SubChain::Loop
                } else if record.start == node {
                    SubChain::Out
                } else {
                    SubChain::In
                };
                match self.sub_tails.get(&(group, sub)).copied() {
                    Some(tail) => self.set_relationship_next(tail, node, Some(rel))?,
                    None => {
                        let group_rec = slot_mut(
                            &mut self.store.groups,
                            group.0,
                            RecordKind::RelationshipGroup,
                        )?;
                        match sub {
                            SubChain::Out => group_rec.first_out = Some(rel),
                            SubChain::In => group_rec.first_in = Some(rel),
                            SubChain::Loop => group_rec.first_loop = Some(rel),
                        }
                    }
                }
                self.sub_tails.insert((group, sub), rel);
            }
        }
        Ok(())
    }

    fn group_for(&mut self, node: NodeId, ty: TypeId) -> Result<GroupId> {
        if let Some(group) = self.groups_by_type.get(&(node, ty)) {
            return Ok(*group);
        }
        let id = GroupId(self.store.groups.len() as u64);
        self.store.groups.push(RelGroupRecord::new(id, ty, node));
        match self.group_tails.get(&node).copied() {
            Some(tail) => {
                slot_mut(&mut self.store.groups, tail.0, RecordKind::RelationshipGroup)?.next =
                    Some(id);
            }
            None => {
                slot_mut(&mut self.store.nodes, node.0, RecordKind::Node)?.rels =
                    RelChain::Dense(Some(id));
            }
        }
        self.group_tails.insert(node, id);
        self.groups_by_type.insert((node, ty), id);
        Ok(id)
    }

    fn push_property(
        &mut self,
        owner: PropOwner,
        key: PropKeyId,
        value: PropValue<'_>,
    ) -> Result<PropRecId> {
        let slot_value = self.encode_slot(value);
        let id = PropRecId(self.store.props.len() as u64);
        self.store
            .props
            .push(PropertyRecord::new(id, key, slot_value));
        match self.prop_tails.get(&owner).copied() {
            Some(tail) => self.set_property_next(tail, Some(id))?,
            None => match owner {
                PropOwner::Node(node) => {
                    slot_mut(&mut self.store.nodes, node.0, RecordKind::Node)?.first_prop =
                        Some(id);
                }
                PropOwner::Rel(rel) => {
                    slot_mut(&mut self.store.rels, rel.0, RecordKind::Relationship)?.first_prop =
                        Some(id);
                }
            },
        }
        self.prop_tails.insert(owner, id);
        Ok(id)
    }

    fn encode_slot(&mut self, value: PropValue<'_>) -> PropSlot {
        match value {
            PropValue::Null => PropSlot::Null,
            PropValue::Bool(v) => PropSlot::Bool(v),
            PropValue::Int(v) => PropSlot::Int(v),
            PropValue::Float(v) => PropSlot::Float(v),
            PropValue::Date(v) => PropSlot::Date(v),
            PropValue::DateTime(v) => PropSlot::DateTime(v),
            PropValue::Str(s) => match ShortBlob::new(s.as_bytes()) {
                Some(blob) => PropSlot::ShortStr(blob),
                None => PropSlot::Str(self.push_dynamic(DynPayload::Bytes(s.as_bytes().to_vec()))),
            },
            PropValue::Bytes(b) => match ShortBlob::new(b) {
                Some(blob) => PropSlot::ShortBytes(blob),
                None => PropSlot::Bytes(self.push_dynamic(DynPayload::Bytes(b.to_vec()))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::labels::LabelFieldKind;

    #[test]
    fn sparse_chain_follows_insertion_order() -> Result<()> {
        let mut builder = MemStore::builder();
        let a = builder.node(&[])?;
        let b = builder.node(&[])?;
        let r1 = builder.relationship(a, b, TypeId(1))?;
        let r2 = builder.relationship(b, a, TypeId(1))?;
        let store = builder.build();
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.relationship_count(), 2);

        let node = store.node(a)?;
        assert_eq!(node.rels, RelChain::Sparse(Some(r1)));
        assert_eq!(store.relationship(r1)?.next_for(a), Some(r2));
        assert_eq!(store.relationship(r2)?.next_for(a), None);
        assert_eq!(store.relationship(r1)?.next_for(b), Some(r2));
        Ok(())
    }

    #[test]
    fn dense_node_groups_by_type_and_direction() -> Result<()> {
        let mut builder = MemStore::builder();
        let hub = builder.dense_node(&[])?;
        let other = builder.node(&[])?;
        let out_a = builder.relationship(hub, other, TypeId(1))?;
        let in_a = builder.relationship(other, hub, TypeId(1))?;
        let loop_b = builder.relationship(hub, hub, TypeId(2))?;
        let store = builder.build();

        let RelChain::Dense(Some(first)) = store.node(hub)?.rels else {
            panic!("expected dense chain head");
        };
        let group_a = store.relationship_group(first)?;
        assert_eq!(group_a.ty, TypeId(1));
        assert_eq!(group_a.first_out, Some(out_a));
        assert_eq!(group_a.first_in, Some(in_a));
        let group_b = store.relationship_group(group_a.next.expect("second group"))?;
        assert_eq!(group_b.first_loop, Some(loop_b));
        assert_eq!(group_b.next, None);
        Ok(())
    }

    #[test]
    fn wide_label_sets_spill_to_dynamic_records() -> Result<()> {
        let mut builder = MemStore::builder();
        let labels: Vec<LabelId> = (0..20).map(|i| LabelId(i * 1000)).collect();
        let node = builder.node(&labels)?;
        let store = builder.build();

        let field = store.node(node)?.labels;
        let LabelFieldKind::Dynamic(ptr) = field.kind() else {
            panic!("expected dynamic label field");
        };
        let mut out = Vec::new();
        store.label_array(ptr, &mut out)?;
        assert_eq!(out, labels);
        Ok(())
    }

    #[test]
    fn retired_records_are_not_found() -> Result<()> {
        let mut builder = MemStore::builder();
        let node = builder.node(&[])?;
        let prop = builder.node_property(node, PropKeyId(1), PropValue::Int(1))?;
        builder.retire_property(prop)?;
        let store = builder.build();
        assert!(matches!(
            store.property(prop),
            Err(SombraError::NotFound("property"))
        ));
        assert!(matches!(
            store.node(NodeId(42)),
            Err(SombraError::NotFound("node"))
        ));
        Ok(())
    }
}
