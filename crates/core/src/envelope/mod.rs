//! Per-project cost envelope and its draft/official lifecycle.

pub mod lifecycle;
pub mod types;

pub use lifecycle::{DraftLifecycleManager, LifecycleError};
pub use types::{
    BoqSnapshot, CostEnvelope, CostTotals, EnvelopeMeta, SnapshotStatus, StoredEnvelopesIndex,
};
