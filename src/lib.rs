//! Pooled store cursors for a record-oriented graph store.
//!
//! A [`Statement`] owns one reusable cursor of each kind. Resolve a node with
//! [`Statement::node`], then walk its labels, properties and relationships:
//!
//! ```
//! use std::sync::Arc;
//! use sombra_cursor::{Cursor, CursorOptions, Dir, LabelId, MemStore, Statement, TypeId};
//!
//! # fn main() -> sombra_cursor::Result<()> {
//! let mut builder = MemStore::builder();
//! let alice = builder.node(&[LabelId(1)])?;
//! let bob = builder.node(&[])?;
//! builder.relationship(alice, bob, TypeId(7))?;
//! let stmt = Statement::new(Arc::new(builder.build()), CursorOptions::default());
//!
//! let node = stmt.node(alice)?;
//! let mut rels = node.relationships(Dir::Out)?;
//! while rels.next()? {
//!     assert_eq!(rels.row().other_node(), bob);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cursor;
pub mod logging;
pub mod storage;
pub mod types;

pub use cursor::{
    Cursor, CursorKind, LabelCursor, NodeCursor, PoolStatus, PropertyCursor, PropertyRow,
    RelationshipCursor, RelationshipRow, Statement,
};
pub use logging::init_logging;
pub use storage::{
    CounterMetrics, CursorConfig, CursorMetrics, CursorOptions, Dir, MemStore, MemStoreBuilder,
    PoolPolicy, PropValue, PropValueOwned, RecordStore,
};
pub use types::{
    DynRecId, GroupId, LabelId, NodeId, PropKeyId, PropRecId, RelId, Result, SombraError, TypeId,
};
