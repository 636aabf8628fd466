//! Cost items and their modification-state bookkeeping.

pub mod registry;
pub mod types;

pub use registry::CostItemRegistry;
pub use types::{CostSideData, ItemOrigin, ItemState, ItemStats, ProjectCostItem};
