//! Cost breakdown data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sitecost_shared::types::{BreakdownRowId, BreakdownTableId, PurchaseOrderId};

/// Origin of a breakdown row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowOrigin {
    /// Row copied from the estimated baseline.
    Estimated,
    /// Row recorded directly against actual spend.
    ActualOnly,
}

/// One costed line inside a breakdown category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRow {
    /// Row ID.
    pub id: BreakdownRowId,
    /// Row label (material, trade, plant item).
    pub name: String,
    /// Unit of measure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Quantity.
    pub quantity: Decimal,
    /// Cost per unit.
    pub unit_cost: Decimal,
    /// Total cost. When absent the row contributes `quantity * unit_cost`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Decimal>,
    /// Origin of the row.
    pub origin: RowOrigin,
    /// Purchase orders linked against this row.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub procurement_links: Vec<PurchaseOrderId>,
}

impl BreakdownRow {
    /// Creates an actual-cost row with an explicit total.
    #[must_use]
    pub fn actual(name: impl Into<String>, quantity: Decimal, unit_cost: Decimal) -> Self {
        Self {
            id: BreakdownRowId::new(),
            name: name.into(),
            unit: None,
            quantity,
            unit_cost,
            total_cost: Some(quantity * unit_cost),
            origin: RowOrigin::ActualOnly,
            procurement_links: Vec::new(),
        }
    }

    /// The amount this row contributes to its category subtotal.
    #[must_use]
    pub fn effective_total(&self) -> Decimal {
        self.total_cost
            .unwrap_or_else(|| self.quantity * self.unit_cost)
    }
}

/// Itemized rows for one cost item, split into the four cost categories.
///
/// Category membership is structural: a row belongs to whichever sequence
/// holds it, there is no category tag on the row itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostBreakdownSet {
    /// Material rows.
    pub materials: Vec<BreakdownRow>,
    /// Labor rows.
    pub labor: Vec<BreakdownRow>,
    /// Equipment rows.
    pub equipment: Vec<BreakdownRow>,
    /// Subcontractor rows.
    pub subcontractors: Vec<BreakdownRow>,
}

impl CostBreakdownSet {
    /// Returns true when every category is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
            && self.labor.is_empty()
            && self.equipment.is_empty()
            && self.subcontractors.is_empty()
    }

    /// Iterates all rows across the four categories in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &BreakdownRow> {
        self.materials
            .iter()
            .chain(self.labor.iter())
            .chain(self.equipment.iter())
            .chain(self.subcontractors.iter())
    }

    /// Iterates all rows mutably across the four categories in order.
    pub fn iter_rows_mut(&mut self) -> impl Iterator<Item = &mut BreakdownRow> {
        self.materials
            .iter_mut()
            .chain(self.labor.iter_mut())
            .chain(self.equipment.iter_mut())
            .chain(self.subcontractors.iter_mut())
    }
}

/// A named, timestamped actual-cost worksheet.
///
/// An item may carry several worksheets ("Table 1", "Extra equipment");
/// aggregation sums across all of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownTable {
    /// Table ID.
    pub id: BreakdownTableId,
    /// Display name of the worksheet.
    pub name: String,
    /// The categorized rows.
    #[serde(flatten)]
    pub rows: CostBreakdownSet,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl BreakdownTable {
    /// Creates an empty worksheet with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: BreakdownTableId::new(),
            name: name.into(),
            rows: CostBreakdownSet::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a worksheet holding the given rows.
    #[must_use]
    pub fn with_rows(name: impl Into<String>, rows: CostBreakdownSet) -> Self {
        let mut table = Self::new(name);
        table.rows = rows;
        table
    }
}

/// Overhead percentages applied on top of a side's breakdown base.
///
/// Absent values deserialize to zero; there is no "unset" state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverheadPercentages {
    /// Administrative overhead percent.
    pub administrative: Decimal,
    /// Operational overhead percent.
    pub operational: Decimal,
    /// Profit margin percent.
    pub profit: Decimal,
    /// Other overhead percent (carried for reporting, not applied to the markup).
    pub other: Decimal,
}

impl OverheadPercentages {
    /// Creates percentages with the three applied components.
    #[must_use]
    pub const fn new(administrative: Decimal, operational: Decimal, profit: Decimal) -> Self {
        Self {
            administrative,
            operational,
            profit,
            other: Decimal::ZERO,
        }
    }
}
