//! Envelope orchestration: lock, load, mutate, recompute, save, emit.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use sitecost_core::envelope::{
    CostEnvelope, CostTotals, DraftLifecycleManager, LifecycleError,
};
use sitecost_core::events::{CostEvent, EventSink};
use sitecost_core::import::{ImportOutcome, ImportStrategy, TenderImportSynchronizer};
use sitecost_core::item::{CostItemRegistry, CostSideData, ItemStats};
use sitecost_core::procurement::{NewProcurementLink, ProcurementLinkTracker};
use sitecost_core::variance::VarianceCalculator;
use sitecost_shared::types::{CostItemId, ProjectId, PurchaseOrderId, TenderId};

use super::envelopes::EnvelopeStore;
use super::error::StoreError;
use super::projects::ProjectStore;
use super::purchase_orders::PurchaseOrderStore;
use super::tenders::TenderBoqStore;

/// Orchestration errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Underlying storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Lifecycle rule violation.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The referenced cost item does not exist in the draft.
    #[error("cost item not found: {0}")]
    ItemNotFound(CostItemId),

    /// The referenced tender has no priced BOQ.
    #[error("tender has no priced BOQ: {0}")]
    TenderNotFound(TenderId),

    /// The referenced purchase order is not raised against the project.
    #[error("purchase order not found on project: {0}")]
    PurchaseOrderNotFound(PurchaseOrderId),

    /// The project has no draft to operate on.
    #[error("project has no draft cost plan")]
    NoDraft,
}

/// Input for adding a hand-priced item to the draft.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewManualItem {
    /// Line description.
    pub description: String,
    /// Unit of measure.
    #[serde(default)]
    pub unit: Option<String>,
    /// BOQ quantity.
    pub quantity: Decimal,
    /// Estimated price per unit.
    pub unit_price: Decimal,
    /// Estimated total price.
    pub total_price: Decimal,
}

/// Per-project envelope orchestration.
///
/// Every mutating operation runs as one non-interleaved unit under the
/// project's lock: load, mutate, recompute totals, bridge profit
/// metrics, save, emit. A failed save leaves storage unchanged.
pub struct EnvelopeService {
    envelopes: EnvelopeStore,
    tenders: TenderBoqStore,
    purchase_orders: PurchaseOrderStore,
    projects: ProjectStore,
    events: Arc<dyn EventSink>,
    locks: DashMap<ProjectId, Arc<Mutex<()>>>,
}

impl EnvelopeService {
    /// Creates a service over the given stores and event sink.
    #[must_use]
    pub fn new(
        envelopes: EnvelopeStore,
        tenders: TenderBoqStore,
        purchase_orders: PurchaseOrderStore,
        projects: ProjectStore,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            envelopes,
            tenders,
            purchase_orders,
            projects,
            events,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, project_id: ProjectId) -> Arc<Mutex<()>> {
        self.locks
            .entry(project_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load(&self, project_id: ProjectId) -> Result<CostEnvelope, ServiceError> {
        Ok(self
            .envelopes
            .get_envelope(project_id)
            .await?
            .unwrap_or_default())
    }

    /// Persists the envelope and, when the project aggregate exists,
    /// bridges the draft totals onto its profit metrics.
    async fn persist(
        &self,
        project_id: ProjectId,
        envelope: &mut CostEnvelope,
    ) -> Result<(), ServiceError> {
        let project = self.projects.get(project_id).await?;
        if let Some(mut project) = project {
            VarianceCalculator::recompute_profit_metrics(&mut project, envelope);
            self.envelopes.persist_envelope(project_id, envelope).await?;
            self.projects.put(&project).await?;
        } else {
            self.envelopes.persist_envelope(project_id, envelope).await?;
        }
        Ok(())
    }

    /// Fetches a project's envelope without creating one.
    pub async fn get_envelope(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<CostEnvelope>, ServiceError> {
        Ok(self.envelopes.get_envelope(project_id).await?)
    }

    /// Ensures the project has a draft and returns the envelope.
    pub async fn ensure_draft(&self, project_id: ProjectId) -> Result<CostEnvelope, ServiceError> {
        let lock = self.lock_for(project_id);
        let _guard = lock.lock().await;

        let mut envelope = self.load(project_id).await?;
        let created = envelope.draft.is_none();
        DraftLifecycleManager::ensure_draft(&mut envelope);

        if created {
            self.persist(project_id, &mut envelope).await?;
            self.events.emit(&CostEvent::DraftUpdated { project_id });
        }
        Ok(envelope)
    }

    /// Promotes the draft to an official snapshot.
    pub async fn promote(&self, project_id: ProjectId) -> Result<CostEnvelope, ServiceError> {
        let lock = self.lock_for(project_id);
        let _guard = lock.lock().await;

        let mut envelope = self.load(project_id).await?;
        DraftLifecycleManager::promote(&mut envelope)?;
        self.persist(project_id, &mut envelope).await?;

        self.events.emit(&CostEvent::DraftPromoted { project_id });
        info!(%project_id, "cost envelope promoted");
        Ok(envelope)
    }

    /// Imports the tender's priced BOQ into the project draft.
    pub async fn import_from_tender(
        &self,
        project_id: ProjectId,
        tender_id: TenderId,
        strategy: ImportStrategy,
    ) -> Result<ImportOutcome, ServiceError> {
        let boq = self
            .tenders
            .get_by_tender_id(tender_id)
            .await?
            .ok_or(ServiceError::TenderNotFound(tender_id))?;

        let lock = self.lock_for(project_id);
        let _guard = lock.lock().await;

        let mut envelope = self.load(project_id).await?;
        let outcome = TenderImportSynchronizer::import(&mut envelope, &boq, strategy);
        self.persist(project_id, &mut envelope).await?;

        self.events.emit(&CostEvent::TenderImported {
            project_id,
            tender_id,
        });
        Ok(outcome)
    }

    /// Forces a totals pass over the draft. Idempotent.
    pub async fn recompute(&self, project_id: ProjectId) -> Result<CostEnvelope, ServiceError> {
        self.mutate_draft(project_id, |_| Ok(())).await
    }

    /// Appends a hand-priced item to the draft.
    pub async fn add_item(
        &self,
        project_id: ProjectId,
        input: NewManualItem,
    ) -> Result<CostItemId, ServiceError> {
        let mut new_id = None;
        self.mutate_draft(project_id, |draft| {
            new_id = Some(CostItemRegistry::add_manual_item(
                &mut draft.items,
                input.description.clone(),
                input.unit.clone(),
                CostSideData::priced(input.quantity, input.unit_price, input.total_price),
                CostSideData::default(),
            ));
            Ok(())
        })
        .await?;
        new_id.ok_or(ServiceError::NoDraft)
    }

    /// Replaces an item's actual side with new tables and percentages.
    pub async fn update_actual_side(
        &self,
        project_id: ProjectId,
        item_id: CostItemId,
        actual: CostSideData,
    ) -> Result<CostEnvelope, ServiceError> {
        self.mutate_draft(project_id, |draft| {
            if CostItemRegistry::update_actual_side(&mut draft.items, item_id, actual.clone()) {
                Ok(())
            } else {
                Err(ServiceError::ItemNotFound(item_id))
            }
        })
        .await
    }

    /// Soft-removes an item from the draft.
    pub async fn remove_item(
        &self,
        project_id: ProjectId,
        item_id: CostItemId,
    ) -> Result<CostEnvelope, ServiceError> {
        self.mutate_draft(project_id, |draft| {
            if CostItemRegistry::remove_item(&mut draft.items, item_id) {
                Ok(())
            } else {
                Err(ServiceError::ItemNotFound(item_id))
            }
        })
        .await
    }

    /// Restores a soft-removed item.
    pub async fn restore_item(
        &self,
        project_id: ProjectId,
        item_id: CostItemId,
    ) -> Result<CostEnvelope, ServiceError> {
        self.mutate_draft(project_id, |draft| {
            if CostItemRegistry::restore_item(&mut draft.items, item_id) {
                Ok(())
            } else {
                Err(ServiceError::ItemNotFound(item_id))
            }
        })
        .await
    }

    /// Clears an item's merge-conflict flag.
    pub async fn acknowledge_incoming_change(
        &self,
        project_id: ProjectId,
        item_id: CostItemId,
    ) -> Result<CostEnvelope, ServiceError> {
        self.mutate_draft(project_id, |draft| {
            if CostItemRegistry::acknowledge_incoming_change(&mut draft.items, item_id) {
                Ok(())
            } else {
                Err(ServiceError::ItemNotFound(item_id))
            }
        })
        .await
    }

    /// Links a purchase order to an item and recomputes procurement
    /// rollups. The order must be raised against the project.
    pub async fn add_procurement_link(
        &self,
        project_id: ProjectId,
        item_id: CostItemId,
        link: NewProcurementLink,
    ) -> Result<CostEnvelope, ServiceError> {
        self.purchase_orders
            .find(project_id, link.purchase_order_id)
            .await?
            .ok_or(ServiceError::PurchaseOrderNotFound(link.purchase_order_id))?;

        let envelope = self
            .mutate_draft(project_id, |draft| {
                if ProcurementLinkTracker::add_link(&mut draft.items, item_id, link.clone()) {
                    Ok(())
                } else {
                    Err(ServiceError::ItemNotFound(item_id))
                }
            })
            .await?;

        self.events.emit(&CostEvent::ProcurementSynced { project_id });
        Ok(envelope)
    }

    /// Unlinks a purchase order from an item.
    pub async fn remove_procurement_link(
        &self,
        project_id: ProjectId,
        item_id: CostItemId,
        purchase_order_id: PurchaseOrderId,
    ) -> Result<CostEnvelope, ServiceError> {
        let envelope = self
            .mutate_draft(project_id, |draft| {
                if ProcurementLinkTracker::remove_link(&mut draft.items, item_id, purchase_order_id)
                {
                    Ok(())
                } else {
                    Err(ServiceError::ItemNotFound(item_id))
                }
            })
            .await?;

        self.events.emit(&CostEvent::ProcurementSynced { project_id });
        Ok(envelope)
    }

    /// Draft totals plus the current item partition.
    pub async fn totals(
        &self,
        project_id: ProjectId,
    ) -> Result<(CostTotals, ItemStats), ServiceError> {
        let envelope = self
            .envelopes
            .get_envelope(project_id)
            .await?
            .ok_or(ServiceError::NoDraft)?;
        let draft = envelope.draft.as_ref().ok_or(ServiceError::NoDraft)?;
        Ok((draft.totals, CostItemRegistry::item_stats(&draft.items)))
    }

    /// Lock, load, mutate the draft, recompute totals, persist, emit.
    async fn mutate_draft<F>(
        &self,
        project_id: ProjectId,
        mutate: F,
    ) -> Result<CostEnvelope, ServiceError>
    where
        F: FnOnce(&mut sitecost_core::envelope::BoqSnapshot) -> Result<(), ServiceError>,
    {
        let lock = self.lock_for(project_id);
        let _guard = lock.lock().await;

        let mut envelope = self.load(project_id).await?;
        let draft = DraftLifecycleManager::ensure_draft(&mut envelope);
        mutate(draft)?;
        VarianceCalculator::recompute_totals(draft);

        self.persist(project_id, &mut envelope).await?;
        self.events.emit(&CostEvent::DraftUpdated { project_id });
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::backend::memory_operator;
    use sitecost_core::breakdown::types::{BreakdownRow, CostBreakdownSet, OverheadPercentages};
    use sitecost_core::events::NullEventSink;
    use sitecost_core::import::{PricedBoq, PricedBoqLine};
    use sitecost_core::procurement::{AllocationMode, PurchaseOrder};
    use sitecost_core::project::Project;

    fn service() -> EnvelopeService {
        let operator = memory_operator().unwrap();
        EnvelopeService::new(
            EnvelopeStore::new(operator.clone()),
            TenderBoqStore::new(operator.clone()),
            PurchaseOrderStore::new(operator.clone()),
            ProjectStore::new(operator),
            Arc::new(NullEventSink),
        )
    }

    fn boq_of(tender_id: TenderId, totals: &[Decimal]) -> PricedBoq {
        PricedBoq {
            tender_id,
            items: totals
                .iter()
                .enumerate()
                .map(|(i, total)| PricedBoqLine {
                    id: format!("t-{i}"),
                    description: format!("Line {i}"),
                    unit: None,
                    quantity: dec!(1),
                    unit_price: *total,
                    total_price: *total,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_ensure_draft_persists_once() {
        let service = service();
        let project_id = ProjectId::new();

        let envelope = service.ensure_draft(project_id).await.unwrap();
        assert!(envelope.draft.is_some());

        let stored = service.get_envelope(project_id).await.unwrap().unwrap();
        assert!(stored.draft.is_some());
    }

    #[tokio::test]
    async fn test_import_then_promote() {
        let service = service();
        let project_id = ProjectId::new();
        let tender_id = TenderId::new();
        service
            .tenders
            .put(&boq_of(tender_id, &[dec!(1000), dec!(2000)]))
            .await
            .unwrap();

        let outcome = service
            .import_from_tender(project_id, tender_id, ImportStrategy::Initial)
            .await
            .unwrap();
        assert_eq!(outcome.added, 2);

        let envelope = service.promote(project_id).await.unwrap();
        let official = envelope.official.unwrap();
        assert_eq!(official.totals.estimated_total, dec!(3000));
        assert_eq!(official.totals.variance_pct, dec!(-100));
    }

    #[tokio::test]
    async fn test_promote_without_draft_fails() {
        let service = service();
        let err = service.promote(ProjectId::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Lifecycle(LifecycleError::NoDraft)));
    }

    #[tokio::test]
    async fn test_import_unknown_tender_fails() {
        let service = service();
        let tender_id = TenderId::new();
        let err = service
            .import_from_tender(ProjectId::new(), tender_id, ImportStrategy::Initial)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::TenderNotFound(id) if id == tender_id));
    }

    #[tokio::test]
    async fn test_update_actual_side_recomputes_before_save() {
        let service = service();
        let project_id = ProjectId::new();
        let tender_id = TenderId::new();
        service
            .tenders
            .put(&boq_of(tender_id, &[dec!(1000)]))
            .await
            .unwrap();
        service
            .import_from_tender(project_id, tender_id, ImportStrategy::Initial)
            .await
            .unwrap();

        let item_id = service
            .get_envelope(project_id)
            .await
            .unwrap()
            .unwrap()
            .draft
            .unwrap()
            .items[0]
            .id;

        let rows = CostBreakdownSet {
            materials: vec![BreakdownRow::actual("concrete", dec!(1), dec!(800))],
            ..CostBreakdownSet::default()
        };
        let actual =
            CostSideData::with_single_table(dec!(1), OverheadPercentages::default(), rows);

        let envelope = service
            .update_actual_side(project_id, item_id, actual)
            .await
            .unwrap();

        // Totals were recomputed before the save, never observably stale.
        let draft = envelope.draft.unwrap();
        assert_eq!(draft.totals.actual_total, dec!(800));
        assert_eq!(draft.totals.variance_total, dec!(-200));
        assert!(!draft.items[0].state.breakdown_dirty);

        let stored = service.get_envelope(project_id).await.unwrap().unwrap();
        assert_eq!(stored.draft.unwrap().totals.actual_total, dec!(800));
    }

    #[tokio::test]
    async fn test_update_unknown_item_fails() {
        let service = service();
        let project_id = ProjectId::new();
        service.ensure_draft(project_id).await.unwrap();

        let item_id = CostItemId::new();
        let err = service
            .update_actual_side(project_id, item_id, CostSideData::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ItemNotFound(id) if id == item_id));
    }

    #[tokio::test]
    async fn test_add_item_and_totals() {
        let service = service();
        let project_id = ProjectId::new();

        service
            .add_item(
                project_id,
                NewManualItem {
                    description: "Temporary fencing".to_string(),
                    unit: Some("m".to_string()),
                    quantity: dec!(200),
                    unit_price: dec!(15),
                    total_price: dec!(3000),
                },
            )
            .await
            .unwrap();

        let (totals, stats) = service.totals(project_id).await.unwrap();
        assert_eq!(totals.estimated_total, dec!(3000));
        assert_eq!(stats.added, 1);
    }

    #[tokio::test]
    async fn test_procurement_link_requires_known_order() {
        let service = service();
        let project_id = ProjectId::new();
        let item_id = service
            .add_item(
                project_id,
                NewManualItem {
                    description: "Rebar".to_string(),
                    unit: None,
                    quantity: dec!(1),
                    unit_price: dec!(1000),
                    total_price: dec!(1000),
                },
            )
            .await
            .unwrap();

        let unknown = PurchaseOrderId::new();
        let err = service
            .add_procurement_link(
                project_id,
                item_id,
                NewProcurementLink {
                    purchase_order_id: unknown,
                    amount: dec!(500),
                    breakdown_row_id: None,
                    allocation_mode: AllocationMode::Manual,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PurchaseOrderNotFound(id) if id == unknown));
    }

    #[tokio::test]
    async fn test_procurement_link_round_trip() {
        let service = service();
        let project_id = ProjectId::new();
        let item_id = service
            .add_item(
                project_id,
                NewManualItem {
                    description: "Rebar".to_string(),
                    unit: None,
                    quantity: dec!(1),
                    unit_price: dec!(1000),
                    total_price: dec!(1000),
                },
            )
            .await
            .unwrap();

        let order = PurchaseOrder {
            id: PurchaseOrderId::new(),
            reference: "PO-7".to_string(),
            value: dec!(600),
        };
        service
            .purchase_orders
            .put(project_id, std::slice::from_ref(&order))
            .await
            .unwrap();

        let envelope = service
            .add_procurement_link(
                project_id,
                item_id,
                NewProcurementLink {
                    purchase_order_id: order.id,
                    amount: dec!(600),
                    breakdown_row_id: None,
                    allocation_mode: AllocationMode::Manual,
                },
            )
            .await
            .unwrap();
        assert_eq!(envelope.draft.as_ref().unwrap().items[0].procurement.committed, dec!(600));

        let envelope = service
            .remove_procurement_link(project_id, item_id, order.id)
            .await
            .unwrap();
        assert_eq!(
            envelope.draft.unwrap().items[0].procurement.committed,
            Decimal::ZERO
        );
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let service = service();
        let project_id = ProjectId::new();
        let tender_id = TenderId::new();
        service
            .tenders
            .put(&boq_of(tender_id, &[dec!(1000)]))
            .await
            .unwrap();
        service
            .import_from_tender(project_id, tender_id, ImportStrategy::Initial)
            .await
            .unwrap();

        let first = service.recompute(project_id).await.unwrap();
        let second = service.recompute(project_id).await.unwrap();
        assert_eq!(
            first.draft.unwrap().totals,
            second.draft.unwrap().totals
        );
    }

    #[tokio::test]
    async fn test_profit_metrics_bridged_when_project_exists() {
        let service = service();
        let project_id = ProjectId::new();
        let tender_id = TenderId::new();
        service
            .projects
            .put(&Project::bootstrap_from_contract(
                project_id,
                "Ring road",
                Some(tender_id),
                dec!(5000),
            ))
            .await
            .unwrap();
        service
            .tenders
            .put(&boq_of(tender_id, &[dec!(3000)]))
            .await
            .unwrap();

        service
            .import_from_tender(project_id, tender_id, ImportStrategy::Initial)
            .await
            .unwrap();

        let project = service.projects.get(project_id).await.unwrap().unwrap();
        assert_eq!(project.estimated_cost, dec!(3000));
        assert_eq!(project.actual_cost, dec!(0));
        assert_eq!(project.remaining, dec!(5000));
        assert_eq!(project.actual_profit, dec!(5000));
    }

    #[tokio::test]
    async fn test_totals_without_envelope_fails() {
        let service = service();
        let err = service.totals(ProjectId::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NoDraft));
    }
}
