//! Identifier newtypes and the crate-wide error type.

use std::fmt;

mod error;

pub use error::{Result, SombraError};

/// Identifier of a node record.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(pub u64);
/// Identifier of a relationship record.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct RelId(pub u64);
/// Identifier of a relationship-group record (dense nodes only).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct GroupId(pub u64);
/// Identifier of a property record.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct PropRecId(pub u64);
/// Pointer to a chain of dynamic records (label arrays, property overflow).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct DynRecId(pub u64);
/// Label token id.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct LabelId(pub u32);
/// Relationship type token id.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct TypeId(pub u32);
/// Property key token id.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct PropKeyId(pub u32);

macro_rules! display_newtype {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

display_newtype!(NodeId, RelId, GroupId, PropRecId, DynRecId, LabelId, TypeId, PropKeyId);

impl From<u32> for LabelId {
    fn from(value: u32) -> Self {
        LabelId(value)
    }
}

impl From<LabelId> for u32 {
    fn from(value: LabelId) -> Self {
        value.0
    }
}

impl From<u32> for TypeId {
    fn from(value: u32) -> Self {
        TypeId(value)
    }
}

impl From<TypeId> for u32 {
    fn from(value: TypeId) -> Self {
        value.0
    }
}

impl From<u32> for PropKeyId {
    fn from(value: u32) -> Self {
        PropKeyId(value)
    }
}

impl From<PropKeyId> for u32 {
    fn from(value: PropKeyId) -> Self {
        value.0
    }
}
