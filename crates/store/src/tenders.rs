//! Tender BOQ source.

use opendal::Operator;
use sitecost_core::import::PricedBoq;
use sitecost_shared::types::TenderId;

use super::error::StoreError;
use super::json::{read_json, write_json};

/// Read side of the tender collaborator: priced BOQs keyed by tender,
/// stored under `tenders/{tender_id}/boq.json`.
#[derive(Clone)]
pub struct TenderBoqStore {
    operator: Operator,
}

impl TenderBoqStore {
    /// Creates a store over the given operator.
    #[must_use]
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    fn key(tender_id: TenderId) -> String {
        format!("tenders/{tender_id}/boq.json")
    }

    /// Fetches a tender's priced BOQ, `None` when the tender has none.
    pub async fn get_by_tender_id(
        &self,
        tender_id: TenderId,
    ) -> Result<Option<PricedBoq>, StoreError> {
        read_json(&self.operator, &Self::key(tender_id)).await
    }

    /// Stores a tender's priced BOQ. The tender subsystem owns this
    /// data; the engine writes it only in seeding and tests.
    pub async fn put(&self, boq: &PricedBoq) -> Result<(), StoreError> {
        write_json(&self.operator, &Self::key(boq.tender_id), boq).await
    }
}
