//! Tender BOQ import and merge strategies.

pub mod synchronizer;
pub mod types;

pub use synchronizer::TenderImportSynchronizer;
pub use types::{ImportOutcome, ImportStrategy, PricedBoq, PricedBoqLine};
