//! Variance calculation and full totals passes.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::breakdown::BreakdownAggregator;
use crate::envelope::types::{BoqSnapshot, CostEnvelope, CostTotals};
use crate::project::Project;

/// Actual vs. estimated variance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variance {
    /// `actual - estimated`, in money.
    pub value: Decimal,
    /// Variance as a percentage of the estimated total.
    pub pct: Decimal,
}

/// Variance calculation service.
pub struct VarianceCalculator;

impl VarianceCalculator {
    /// Variance between an estimated and an actual total.
    ///
    /// The percentage guards against a zero estimate: 100 when actual
    /// spend exists against a zero baseline, 0 when both sides are zero.
    #[must_use]
    pub fn item_variance(estimated_total: Decimal, actual_total: Decimal) -> Variance {
        Variance {
            value: actual_total - estimated_total,
            pct: Self::variance_pct(estimated_total, actual_total),
        }
    }

    fn variance_pct(estimated_total: Decimal, actual_total: Decimal) -> Decimal {
        if estimated_total > Decimal::ZERO {
            ((actual_total - estimated_total) / estimated_total * Decimal::ONE_HUNDRED).round_dp(2)
        } else if actual_total > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    }

    /// Recomputes every item's actual side and variance, then the snapshot
    /// totals, from scratch.
    ///
    /// Soft-removed items stay in the accumulation: removal is a review
    /// flag, not an exclusion. Totals are rebuilt on every call, never
    /// incremented, so repeated passes without intervening edits yield
    /// identical results.
    pub fn recompute_totals(snapshot: &mut BoqSnapshot) {
        let mut estimated_total = Decimal::ZERO;
        let mut actual_total = Decimal::ZERO;

        for item in &mut snapshot.items {
            let (actual, coerced) = BreakdownAggregator::recompute_actual_side(&item.actual);
            if coerced {
                item.state.quantity_coerced = true;
                warn!(item_id = %item.id, "actual-side quantity coerced to 1 during recompute");
            }
            item.actual = actual;
            item.variance =
                Self::item_variance(item.estimated.total_price, item.actual.total_price);
            item.state.breakdown_dirty = false;

            estimated_total += item.estimated.total_price;
            actual_total += item.actual.total_price;
        }

        snapshot.totals = CostTotals {
            estimated_total,
            actual_total,
            variance_total: actual_total - estimated_total,
            variance_pct: Self::variance_pct(estimated_total, actual_total),
        };
        snapshot.last_updated = Utc::now();
    }

    /// Copies the draft totals onto the project's profit metrics.
    ///
    /// This is the only bridge from the cost envelope back onto the
    /// project aggregate. No-op when the envelope has no draft.
    pub fn recompute_profit_metrics(project: &mut Project, envelope: &mut CostEnvelope) {
        let Some(draft) = envelope.draft.as_ref() else {
            return;
        };

        project.estimated_cost = draft.totals.estimated_total;
        project.actual_cost = draft.totals.actual_total;
        project.spent = draft.totals.actual_total;
        project.remaining = project.contract_value - project.actual_cost;
        project.actual_profit = project.contract_value - project.actual_cost;
        envelope.meta.last_variance_analysis_at = Some(Utc::now());
    }
}
