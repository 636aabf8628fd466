//! Purchase-order links and committed/allocated bookkeeping.

pub mod tracker;
pub mod types;

pub use tracker::ProcurementLinkTracker;
pub use types::{
    AllocationMode, NewProcurementLink, ProcurementData, ProcurementLink, PurchaseOrder,
};
