//! Record layer underneath the cursors.
//!
//! Defines the fixed-shape records (nodes, relationships, relationship
//! groups, properties), the [`RecordStore`] trait cursors resolve them
//! through, an in-memory store, and the options, metrics and label-field
//! codec the cursor layer is configured with.

mod labels;
mod mem;
mod metrics;
mod options;
mod record;
mod store;
mod types;

pub use labels::{LabelField, LabelFieldKind, MAX_INLINE_LABELS};
pub use mem::{MemStore, MemStoreBuilder};
pub use metrics::{default_metrics, CounterMetrics, CursorMetrics, NoopMetrics};
pub use options::{
    CursorConfig, CursorOptions, PoolPolicy, DEFAULT_LABEL_CAPACITY, DEFAULT_MAX_CHAIN_STEPS,
    DEFAULT_OVERFLOW_CAPACITY,
};
pub use record::{
    Dir, NodeRecord, PropSlot, PropertyRecord, RecordKind, RelChain, RelGroupRecord,
    RelationshipRecord, ShortBlob, SHORT_BLOB_LEN,
};
pub use store::RecordStore;
pub use types::{PropValue, PropValueOwned};
