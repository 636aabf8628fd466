//! Aggregation of breakdown rows into unit and total prices.

use rust_decimal::Decimal;
use sitecost_shared::types::rounding::{round_money, round_unit_price};

use super::types::{BreakdownRow, CostBreakdownSet};
use crate::item::types::CostSideData;

/// Breakdown aggregation service.
///
/// All functions are pure: inputs are never mutated, results are returned
/// as new values.
#[must_use = "aggregation results must be assigned back by the caller"]
pub struct BreakdownAggregator;

impl BreakdownAggregator {
    /// Sums the effective totals of an ordered sequence of rows.
    ///
    /// Rows without an explicit `total_cost` contribute
    /// `quantity * unit_cost`; an empty sequence sums to zero.
    #[must_use]
    pub fn sum_rows(rows: &[BreakdownRow]) -> Decimal {
        rows.iter().map(BreakdownRow::effective_total).sum()
    }

    /// Sums all four categories of a breakdown set.
    #[must_use]
    pub fn sum_set(set: &CostBreakdownSet) -> Decimal {
        Self::sum_rows(&set.materials)
            + Self::sum_rows(&set.labor)
            + Self::sum_rows(&set.equipment)
            + Self::sum_rows(&set.subcontractors)
    }

    /// Base cost of a side: the sum of every category across every table.
    #[must_use]
    pub fn breakdown_base(side: &CostSideData) -> Decimal {
        side.tables.iter().map(|table| Self::sum_set(&table.rows)).sum()
    }

    /// Recomputes the unit and total price of an actual side from its
    /// breakdown tables and overhead percentages.
    ///
    /// Returns the new side plus whether the quantity had to be coerced
    /// to 1 to avoid a division by zero.
    ///
    /// When the breakdown base is zero the previous prices are preserved
    /// and `has_breakdown_data` is cleared: an empty worksheet must not
    /// wipe a side that was priced by hand.
    #[must_use]
    pub fn recompute_actual_side(side: &CostSideData) -> (CostSideData, bool) {
        let mut next = side.clone();
        let base = Self::breakdown_base(side);

        if base <= Decimal::ZERO {
            next.has_breakdown_data = false;
            return (next, false);
        }

        let pct = side.percentages;
        let administrative_value = base * pct.administrative / Decimal::ONE_HUNDRED;
        let operational_value = base * pct.operational / Decimal::ONE_HUNDRED;
        let profit_value = base * pct.profit / Decimal::ONE_HUNDRED;
        let total_before_tax = base + administrative_value + operational_value + profit_value;

        let mut coerced = false;
        if next.quantity <= Decimal::ZERO {
            next.quantity = Decimal::ONE;
            coerced = true;
        }

        next.unit_price = round_unit_price(total_before_tax / next.quantity);
        next.total_price = round_money(total_before_tax);
        next.has_breakdown_data = true;

        (next, coerced)
    }
}
