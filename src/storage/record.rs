use std::fmt;

use crate::types::{DynRecId, GroupId, NodeId, PropKeyId, PropRecId, RelId, TypeId};

use super::labels::LabelField;

/// Maximum payload length of a string or byte value stored inside a property
/// record. Longer values spill to dynamic overflow records.
pub const SHORT_BLOB_LEN: usize = 24;

/// Kinds of records the backing store resolves.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RecordKind {
    /// Node record.
    Node,
    /// Relationship record.
    Relationship,
    /// Relationship-group record of a dense node.
    RelationshipGroup,
    /// Property record.
    Property,
    /// Dynamic record chain (label arrays, property overflow).
    Dynamic,
}

impl RecordKind {
    /// Lowercase name used in logs and errors.
    pub const fn as_str(self) -> &'static str {
        match self {
            RecordKind::Node => "node",
            RecordKind::Relationship => "relationship",
            RecordKind::RelationshipGroup => "relationship group",
            RecordKind::Property => "property",
            RecordKind::Dynamic => "dynamic record",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a relationship relative to the node it is read from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Dir {
    /// The node is the relationship's start node.
    Out,
    /// The node is the relationship's end node.
    In,
    /// Either direction.
    Both,
}

impl Dir {
    /// True when outgoing relationships match.
    pub fn includes_out(self) -> bool {
        matches!(self, Dir::Out | Dir::Both)
    }

    /// True when incoming relationships match.
    pub fn includes_in(self) -> bool {
        matches!(self, Dir::In | Dir::Both)
    }

    /// Whether a relationship whose effective direction is `actual` passes
    /// this filter. Self-loops (`actual == Both`) pass every filter.
    pub fn accepts(self, actual: Dir) -> bool {
        match actual {
            Dir::Both => true,
            Dir::Out => self.includes_out(),
            Dir::In => self.includes_in(),
        }
    }
}

/// Head of a node's relationship chain.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RelChain {
    /// Relationships are linked directly off the node.
    Sparse(Option<RelId>),
    /// Relationships are bucketed in per-type groups.
    Dense(Option<GroupId>),
}

impl RelChain {
    /// Whether the node uses the dense representation.
    pub fn is_dense(self) -> bool {
        matches!(self, RelChain::Dense(_))
    }
}

/// Fixed-shape node record.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NodeRecord {
    /// Record id.
    pub id: NodeId,
    /// Whether the record is live.
    pub in_use: bool,
    /// Relationship chain head.
    pub rels: RelChain,
    /// First record of the property chain.
    pub first_prop: Option<PropRecId>,
    /// Packed or external labels.
    pub labels: LabelField,
}

impl NodeRecord {
    /// Creates an in-use sparse node without labels, properties or relationships.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            in_use: true,
            rels: RelChain::Sparse(None),
            first_prop: None,
            labels: LabelField::EMPTY,
        }
    }

    /// Whether the node uses relationship groups.
    pub fn is_dense(&self) -> bool {
        self.rels.is_dense()
    }
}

/// Fixed-shape relationship record.
///
/// A relationship participates in two chains, one per endpoint. For a
/// self-loop both endpoints are the same node and only `start_next` links it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RelationshipRecord {
    /// Record id.
    pub id: RelId,
    /// Whether the record is live.
    pub in_use: bool,
    /// Relationship type.
    pub ty: TypeId,
    /// Source node.
    pub start: NodeId,
    /// Target node.
    pub end: NodeId,
    /// Next relationship in the start node's chain.
    pub start_next: Option<RelId>,
    /// Next relationship in the end node's chain.
    pub end_next: Option<RelId>,
    /// First record of the property chain.
    pub first_prop: Option<PropRecId>,
}

impl RelationshipRecord {
    /// Creates an unlinked in-use relationship.
    pub fn new(id: RelId, ty: TypeId, start: NodeId, end: NodeId) -> Self {
        Self {
            id,
            in_use: true,
            ty,
            start,
            end,
            start_next: None,
            end_next: None,
            first_prop: None,
        }
    }

    /// Whether `node` is one of the endpoints.
    pub fn involves(&self, node: NodeId) -> bool {
        self.start == node || self.end == node
    }

    /// Whether both endpoints are the same node.
    pub fn is_loop(&self) -> bool {
        self.start == self.end
    }

    /// Effective direction seen from `node`, `None` if `node` is not an endpoint.
    pub fn direction_from(&self, node: NodeId) -> Option<Dir> {
        match (self.start == node, self.end == node) {
            (true, true) => Some(Dir::Both),
            (true, false) => Some(Dir::Out),
            (false, true) => Some(Dir::In),
            (false, false) => None,
        }
    }

    /// Next link of `node`'s chain.
    pub fn next_for(&self, node: NodeId) -> Option<RelId> {
        if self.start == node {
            self.start_next
        } else {
            self.end_next
        }
    }

    /// Endpoint opposite to `node`; the node itself for self-loops.
    pub fn other_node(&self, node: NodeId) -> NodeId {
        if self.start == node {
            self.end
        } else {
            self.start
        }
    }
}

/// Per-type bucket of a dense node's relationships.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RelGroupRecord {
    /// Record id.
    pub id: GroupId,
    /// Whether the record is live.
    pub in_use: bool,
    /// Relationship type of every member.
    pub ty: TypeId,
    /// Dense node the group belongs to.
    pub owner: NodeId,
    /// Next group of the owner.
    pub next: Option<GroupId>,
    /// Head of the outgoing sub-chain.
    pub first_out: Option<RelId>,
    /// Head of the incoming sub-chain.
    pub first_in: Option<RelId>,
    /// Head of the self-loop sub-chain.
    pub first_loop: Option<RelId>,
}

impl RelGroupRecord {
    /// Creates an empty in-use group.
    pub fn new(id: GroupId, ty: TypeId, owner: NodeId) -> Self {
        Self {
            id,
            in_use: true,
            ty,
            owner,
            next: None,
            first_out: None,
            first_in: None,
            first_loop: None,
        }
    }
}

/// String or byte payload short enough to live inside a property record.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ShortBlob {
    len: u8,
    data: [u8; SHORT_BLOB_LEN],
}

impl ShortBlob {
    /// Copies `bytes` into a short blob, `None` if it is too long.
    pub fn new(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > SHORT_BLOB_LEN {
            return None;
        }
        let mut data = [0u8; SHORT_BLOB_LEN];
        data[..bytes.len()].copy_from_slice(bytes);
        Some(Self {
            len: bytes.len() as u8,
            data,
        })
    }

    /// Stored bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..usize::from(self.len).min(SHORT_BLOB_LEN)]
    }
}

/// Value slot of a property record.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PropSlot {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// Days since epoch.
    Date(i64),
    /// Milliseconds since epoch.
    DateTime(i64),
    /// UTF-8 string stored in the record.
    ShortStr(ShortBlob),
    /// Byte string stored in the record.
    ShortBytes(ShortBlob),
    /// UTF-8 string spilled to dynamic records.
    Str(DynRecId),
    /// Byte string spilled to dynamic records.
    Bytes(DynRecId),
}

/// Fixed-shape property record; one key/value per record.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PropertyRecord {
    /// Record id.
    pub id: PropRecId,
    /// Whether the record is live.
    pub in_use: bool,
    /// Property key token.
    pub key: PropKeyId,
    /// Value slot.
    pub value: PropSlot,
    /// Next record of the owner's chain.
    pub next: Option<PropRecId>,
}

impl PropertyRecord {
    /// Creates an unlinked in-use property record.
    pub fn new(id: PropRecId, key: PropKeyId, value: PropSlot) -> Self {
        Self {
            id,
            in_use: true,
            key,
            value,
            next: None,
        }
    }
}
