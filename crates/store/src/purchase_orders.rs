//! Purchase order source.

use opendal::Operator;
use sitecost_core::procurement::PurchaseOrder;
use sitecost_shared::types::{ProjectId, PurchaseOrderId};

use super::error::StoreError;
use super::json::{read_json, write_json};

/// Read side of the purchase-order collaborator: orders listed per
/// project under `purchase-orders/{project_id}.json`.
#[derive(Clone)]
pub struct PurchaseOrderStore {
    operator: Operator,
}

impl PurchaseOrderStore {
    /// Creates a store over the given operator.
    #[must_use]
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    fn key(project_id: ProjectId) -> String {
        format!("purchase-orders/{project_id}.json")
    }

    /// The purchase orders raised against a project.
    pub async fn purchase_orders_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<PurchaseOrder>, StoreError> {
        Ok(read_json(&self.operator, &Self::key(project_id))
            .await?
            .unwrap_or_default())
    }

    /// Looks up one order within a project.
    pub async fn find(
        &self,
        project_id: ProjectId,
        purchase_order_id: PurchaseOrderId,
    ) -> Result<Option<PurchaseOrder>, StoreError> {
        let orders = self.purchase_orders_by_project(project_id).await?;
        Ok(orders.into_iter().find(|po| po.id == purchase_order_id))
    }

    /// Stores a project's order list. Owned by the procurement
    /// subsystem; written here only in seeding and tests.
    pub async fn put(
        &self,
        project_id: ProjectId,
        orders: &[PurchaseOrder],
    ) -> Result<(), StoreError> {
        write_json(&self.operator, &Self::key(project_id), &orders).await
    }
}
