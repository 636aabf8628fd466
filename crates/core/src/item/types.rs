//! Project cost item data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sitecost_shared::types::CostItemId;

use crate::breakdown::types::{BreakdownTable, CostBreakdownSet, OverheadPercentages};
use crate::procurement::types::ProcurementData;
use crate::variance::Variance;

/// How a cost item entered the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemOrigin {
    /// Seeded from a tender BOQ import.
    Imported,
    /// Added by hand in the cost register.
    Manual,
}

/// One side (estimated or actual) of a cost item.
///
/// The estimated side is a frozen baseline copied from the tender; only
/// the actual side is ever recomputed from its breakdown tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSideData {
    /// BOQ quantity for this side.
    pub quantity: Decimal,
    /// Price per unit (4 decimal places).
    pub unit_price: Decimal,
    /// Total price (2 decimal places).
    pub total_price: Decimal,
    /// Overhead percentages applied on top of the breakdown base.
    #[serde(default)]
    pub percentages: OverheadPercentages,
    /// Ordered, named breakdown worksheets. The single-worksheet case is
    /// simply a one-element sequence.
    #[serde(default)]
    pub tables: Vec<BreakdownTable>,
    /// False when the current prices did not come from breakdown rows.
    #[serde(default)]
    pub has_breakdown_data: bool,
}

impl CostSideData {
    /// A side priced directly, with no breakdown behind it.
    #[must_use]
    pub fn priced(quantity: Decimal, unit_price: Decimal, total_price: Decimal) -> Self {
        Self {
            quantity,
            unit_price,
            total_price,
            ..Self::default()
        }
    }

    /// A side carrying one worksheet of rows, prices not yet computed.
    #[must_use]
    pub fn with_single_table(
        quantity: Decimal,
        percentages: OverheadPercentages,
        rows: CostBreakdownSet,
    ) -> Self {
        Self {
            quantity,
            percentages,
            tables: vec![BreakdownTable::with_rows("Table 1", rows)],
            ..Self::default()
        }
    }
}

/// Per-item modification-state flags.
///
/// These are review aids, not gates: nothing in the engine refuses an
/// operation because of a flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemState {
    /// True once either side has been hand-edited.
    pub is_modified: bool,
    /// A merge import refreshed the estimated side while local edits exist.
    pub has_incoming_change: bool,
    /// Soft-delete marker; removed items are kept for audit.
    pub is_removed: bool,
    /// Added after the baseline import (by hand or by a later merge).
    pub is_new: bool,
    /// When the item was last edited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_edit_at: Option<DateTime<Utc>>,
    /// Breakdown content changed since the last totals pass.
    pub breakdown_dirty: bool,
    /// Quantity was coerced to 1 during an actual-side recompute.
    pub quantity_coerced: bool,
}

/// Partition counts over an envelope's items, derived from state flags.
///
/// Each item lands in exactly one bucket: removed wins over added,
/// added over modified, modified over unmodified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemStats {
    /// Total number of items, removed ones included.
    pub total: usize,
    /// Items with local edits.
    pub modified: usize,
    /// Items untouched since import.
    pub unmodified: usize,
    /// Items added after the baseline import.
    pub added: usize,
    /// Soft-removed items.
    pub removed: usize,
}

/// One BOQ line under estimated vs. actual reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCostItem {
    /// Item ID, unique within the envelope.
    pub id: CostItemId,
    /// Identifier of the source tender BOQ line, when imported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
    /// Line description.
    pub description: String,
    /// Unit of measure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// How the item entered the register.
    pub origin: ItemOrigin,
    /// Estimated (tender baseline) side.
    pub estimated: CostSideData,
    /// Actual (field-tracked) side.
    pub actual: CostSideData,
    /// Purchase-order links and rollups.
    #[serde(default)]
    pub procurement: ProcurementData,
    /// Actual vs. estimated variance.
    #[serde(default)]
    pub variance: Variance,
    /// Modification-state flags.
    #[serde(default)]
    pub state: ItemState,
}
