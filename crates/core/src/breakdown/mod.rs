//! Itemized cost breakdowns and their aggregation into prices.

pub mod aggregator;
pub mod types;


pub use aggregator::BreakdownAggregator;
pub use types::{
    BreakdownRow, BreakdownTable, CostBreakdownSet, OverheadPercentages, RowOrigin,
};
