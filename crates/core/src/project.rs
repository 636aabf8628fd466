//! The project aggregate bridged from draft totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sitecost_shared::types::rounding::round_money;
use sitecost_shared::types::{ProjectId, TenderId};

/// Project-level cost and profit figures.
///
/// Owned by the wider application; this engine only writes the cost
/// fields through `VarianceCalculator::recompute_profit_metrics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project ID.
    pub id: ProjectId,
    /// Project name.
    pub name: String,
    /// Tender the project was awarded from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tender_id: Option<TenderId>,
    /// Awarded contract value.
    pub contract_value: Decimal,
    /// Estimated cost, bridged from the draft's estimated total.
    pub estimated_cost: Decimal,
    /// Actual cost, bridged from the draft's actual total.
    pub actual_cost: Decimal,
    /// Money spent to date; tracks the actual cost.
    pub spent: Decimal,
    /// `contract_value - actual_cost`.
    pub remaining: Decimal,
    /// `contract_value - actual_cost`.
    pub actual_profit: Decimal,
}

impl Project {
    /// Eighty percent of contract value, the default estimate used
    /// until the first tender import supplies real totals.
    const DEFAULT_ESTIMATE_PCT: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

    /// Bootstraps a project from a contract award.
    #[must_use]
    pub fn bootstrap_from_contract(
        id: ProjectId,
        name: impl Into<String>,
        source_tender_id: Option<TenderId>,
        contract_value: Decimal,
    ) -> Self {
        let estimated_cost =
            round_money(contract_value * Self::DEFAULT_ESTIMATE_PCT / Decimal::ONE_HUNDRED);
        Self {
            id,
            name: name.into(),
            source_tender_id,
            contract_value,
            estimated_cost,
            actual_cost: Decimal::ZERO,
            spent: Decimal::ZERO,
            remaining: contract_value,
            actual_profit: contract_value,
        }
    }
}
