//! Pooled cursors over the record store.
//!
//! A [`Statement`] owns one instance of every cursor kind. A [`NodeCursor`]
//! borrows the statement and hands out label, property and relationship
//! cursors by leasing those instances and initializing them from its record.
//! Closing (or dropping) a cursor returns the instance to the statement.
//!
//! Rows are read through `&self` accessors while [`Cursor::next`] takes
//! `&mut self`, so a row can never be held across a move.

use std::fmt;

use crate::types::Result;

mod label;
mod node;
mod pool;
mod property;
mod relationship;

pub use label::LabelCursor;
pub use node::NodeCursor;
pub use pool::{PoolStatus, Statement};
pub use property::{PropertyCursor, PropertyRow};
pub use relationship::{RelationshipCursor, RelationshipRow};

/// Positioned iterator over store rows.
pub trait Cursor {
    /// Moves to the next row. Returns `Ok(false)` once the sequence is
    /// exhausted and keeps returning it until the cursor is re-initialized.
    fn next(&mut self) -> Result<bool>;

    /// Releases the cursor back to its pool. Calling it again is a no-op.
    fn close(&mut self);
}

/// The pooled cursor kinds a [`Statement`] owns.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CursorKind {
    /// [`LabelCursor`].
    Label,
    /// [`PropertyCursor`].
    Property,
    /// [`RelationshipCursor`].
    Relationship,
}

impl CursorKind {
    /// Lowercase name used in logs and errors.
    pub const fn as_str(self) -> &'static str {
        match self {
            CursorKind::Label => "label",
            CursorKind::Property => "property",
            CursorKind::Relationship => "relationship",
        }
    }
}

impl fmt::Display for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
