//! Committed/allocated rollups over purchase-order links.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use sitecost_shared::types::rounding::MONEY_DP;
use sitecost_shared::types::{CostItemId, PurchaseOrderId};

use super::types::{AllocationMode, NewProcurementLink, ProcurementLink};
use crate::item::registry::CostItemRegistry;
use crate::item::types::ProjectCostItem;

/// Purchase-order link tracker.
///
/// Rollup rules: `committed` is the sum of every link amount on the
/// item. `allocated` takes manual links at face value; proportional
/// links pool per purchase order and the pool is spread across the
/// participating items by relative estimated value, largest-remainder,
/// so the spread sums exactly to the pool.
pub struct ProcurementLinkTracker;

impl ProcurementLinkTracker {
    /// Appends a link to an item and recomputes rollups across the
    /// whole item sequence. Returns false when the id is unknown.
    pub fn add_link(
        items: &mut [ProjectCostItem],
        item_id: CostItemId,
        link: NewProcurementLink,
    ) -> bool {
        let Some(item) = CostItemRegistry::find_mut(items, item_id) else {
            return false;
        };
        item.procurement.links.push(ProcurementLink {
            purchase_order_id: link.purchase_order_id,
            amount: link.amount,
            breakdown_row_id: link.breakdown_row_id,
            last_sync: Utc::now(),
            allocation_mode: link.allocation_mode,
        });
        Self::recompute_allocations(items);
        true
    }

    /// Drops an item's links to the given purchase order and recomputes
    /// rollups. Breakdown rows are never touched. Returns false when the
    /// item id is unknown.
    pub fn remove_link(
        items: &mut [ProjectCostItem],
        item_id: CostItemId,
        purchase_order_id: PurchaseOrderId,
    ) -> bool {
        let Some(item) = CostItemRegistry::find_mut(items, item_id) else {
            return false;
        };
        item.procurement
            .links
            .retain(|link| link.purchase_order_id != purchase_order_id);
        Self::recompute_allocations(items);
        true
    }

    /// Recomputes every item's committed and allocated totals from its
    /// links, from scratch.
    pub fn recompute_allocations(items: &mut [ProjectCostItem]) {
        // Manual links settle per item; proportional links pool per order.
        let mut pools: HashMap<PurchaseOrderId, Decimal> = HashMap::new();
        let mut participants: HashMap<PurchaseOrderId, Vec<usize>> = HashMap::new();

        for (idx, item) in items.iter_mut().enumerate() {
            let mut committed = Decimal::ZERO;
            let mut allocated = Decimal::ZERO;
            let mut seen_orders: Vec<PurchaseOrderId> = Vec::new();

            for link in &item.procurement.links {
                committed += link.amount;
                match link.allocation_mode {
                    AllocationMode::Manual => allocated += link.amount,
                    AllocationMode::Proportional => {
                        *pools.entry(link.purchase_order_id).or_default() += link.amount;
                        if !seen_orders.contains(&link.purchase_order_id) {
                            seen_orders.push(link.purchase_order_id);
                            participants
                                .entry(link.purchase_order_id)
                                .or_default()
                                .push(idx);
                        }
                    }
                }
            }

            item.procurement.committed = committed;
            item.procurement.allocated = allocated;
        }

        for (order_id, pool) in pools {
            let indices = participants.remove(&order_id).unwrap_or_default();
            let weights: Vec<Decimal> = indices
                .iter()
                .map(|&idx| items[idx].estimated.total_price)
                .collect();

            let shares = allocate_by_weights(pool, &weights, MONEY_DP);
            for (&idx, share) in indices.iter().zip(shares) {
                items[idx].procurement.allocated += share;
            }
        }
    }
}

/// Splits `total` across recipients in proportion to `weights` using the
/// Largest Remainder Method, so the shares sum exactly to the total.
///
/// All-zero weights fall back to an equal split.
fn allocate_by_weights(total: Decimal, weights: &[Decimal], decimal_places: u32) -> Vec<Decimal> {
    if weights.is_empty() {
        return vec![];
    }

    let unit = Decimal::new(1, decimal_places);
    let total_rounded =
        total.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven);

    let weight_sum: Decimal = weights.iter().copied().sum();
    let count = Decimal::from(weights.len() as u64);

    let exact: Vec<Decimal> = weights
        .iter()
        .map(|w| {
            if weight_sum > Decimal::ZERO {
                total_rounded * *w / weight_sum
            } else {
                total_rounded / count
            }
        })
        .collect();

    let mut rounded: Vec<Decimal> = exact
        .iter()
        .map(|a| a.round_dp_with_strategy(decimal_places, RoundingStrategy::ToZero))
        .collect();

    let sum_rounded: Decimal = rounded.iter().copied().sum();
    let remainder = total_rounded - sum_rounded;

    let units_to_distribute = (remainder / unit)
        .round_dp_with_strategy(0, RoundingStrategy::ToZero)
        .to_u64()
        .unwrap_or(0);
    let units_to_distribute = usize::try_from(units_to_distribute).unwrap_or(0);

    if units_to_distribute == 0 {
        return rounded;
    }

    let mut remainders: Vec<(usize, Decimal)> = exact
        .iter()
        .zip(rounded.iter())
        .enumerate()
        .map(|(i, (e, r))| (i, *e - *r))
        .collect();
    remainders.sort_by(|a, b| b.1.cmp(&a.1));

    for (idx, _) in remainders.iter().take(units_to_distribute) {
        rounded[*idx] += unit;
    }

    rounded
}
