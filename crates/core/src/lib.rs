//! Core business logic for Sitecost.
//!
//! This crate contains pure business logic with ZERO web or storage dependencies.
//! All domain types, reconciliation rules, and calculations live here.
//!
//! # Modules
//!
//! - `breakdown` - Itemized cost rows and aggregation into unit/total prices
//! - `variance` - Actual vs. estimated comparison and full totals passes
//! - `item` - Cost item collection and modification-state bookkeeping
//! - `envelope` - Draft/official envelope lifecycle
//! - `import` - Tender BOQ import and merge strategies
//! - `procurement` - Purchase-order link tracking and allocation
//! - `events` - Outbound notification seam
//! - `project` - Project aggregate bridged from draft totals

pub mod breakdown;
pub mod envelope;
pub mod events;
pub mod import;
pub mod item;
pub mod procurement;
pub mod project;
pub mod variance;
