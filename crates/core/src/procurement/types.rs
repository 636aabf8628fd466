//! Procurement link data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sitecost_shared::types::{BreakdownRowId, PurchaseOrderId};

/// How a purchase-order amount counts toward an item's allocated total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationMode {
    /// The link's literal amount is confirmed against actual spend.
    Manual,
    /// The amount joins a per-order pool spread across sibling items
    /// by relative estimated value.
    Proportional,
}

impl AllocationMode {
    /// Returns the string representation of the mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Proportional => "proportional",
        }
    }
}

/// One monetary link between a cost item and a purchase order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementLink {
    /// Linked purchase order.
    pub purchase_order_id: PurchaseOrderId,
    /// Linked amount.
    pub amount: Decimal,
    /// Optional breakdown row the order was raised against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown_row_id: Option<BreakdownRowId>,
    /// When this link was last synchronized.
    pub last_sync: DateTime<Utc>,
    /// How the amount counts toward the allocated total.
    pub allocation_mode: AllocationMode,
}

/// Input for creating a procurement link.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProcurementLink {
    /// Purchase order to link.
    pub purchase_order_id: PurchaseOrderId,
    /// Amount to link.
    pub amount: Decimal,
    /// Optional breakdown row the order was raised against.
    #[serde(default)]
    pub breakdown_row_id: Option<BreakdownRowId>,
    /// Allocation mode for the amount.
    pub allocation_mode: AllocationMode,
}

/// Per-item procurement rollups and their backing links.
///
/// These figures are reconciliation aids. They never feed the item's
/// `actual.total_price`, which stays breakdown-driven.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcurementData {
    /// Sum of all link amounts.
    pub committed: Decimal,
    /// Portion of the committed money confirmed against actual spend.
    pub allocated: Decimal,
    /// The individual purchase-order links.
    pub links: Vec<ProcurementLink>,
}

/// A purchase order as supplied by the purchase-order collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    /// Purchase order ID.
    pub id: PurchaseOrderId,
    /// Human-readable order reference.
    pub reference: String,
    /// Total order value.
    pub value: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_allocation_mode_as_str() {
        assert_eq!(AllocationMode::Manual.as_str(), "manual");
        assert_eq!(AllocationMode::Proportional.as_str(), "proportional");
    }

    #[test]
    fn test_procurement_data_defaults() {
        let data = ProcurementData::default();
        assert_eq!(data.committed, Decimal::ZERO);
        assert_eq!(data.allocated, Decimal::ZERO);
        assert!(data.links.is_empty());
    }

    #[test]
    fn test_link_serde_shape() {
        let link = ProcurementLink {
            purchase_order_id: PurchaseOrderId::new(),
            amount: dec!(1200.5),
            breakdown_row_id: None,
            last_sync: Utc::now(),
            allocation_mode: AllocationMode::Proportional,
        };

        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["allocationMode"], "proportional");
        assert_eq!(json["amount"], "1200.5");
        assert!(json.get("breakdownRowId").is_none());
    }
}
