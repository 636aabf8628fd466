//! Outbound notification seam.
//!
//! The engine only emits; it never subscribes. Callers inject an
//! [`EventSink`] and forward events to whatever pub/sub mechanism they
//! own. [`TracingEventSink`] is the default wiring; [`NullEventSink`]
//! silences events in tests.

use sitecost_shared::types::{ProjectId, TenderId};
use tracing::info;

/// A change to a project's cost envelope worth telling the outside about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostEvent {
    /// The draft snapshot was mutated and persisted.
    DraftUpdated {
        /// Affected project.
        project_id: ProjectId,
    },
    /// The draft was promoted to an official snapshot.
    DraftPromoted {
        /// Affected project.
        project_id: ProjectId,
    },
    /// Items were imported from a tender BOQ.
    TenderImported {
        /// Affected project.
        project_id: ProjectId,
        /// Source tender.
        tender_id: TenderId,
    },
    /// Procurement links or rollups changed.
    ProcurementSynced {
        /// Affected project.
        project_id: ProjectId,
    },
}

impl CostEvent {
    /// Stable event name for subscribers.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DraftUpdated { .. } => "cost_envelope.draft_updated",
            Self::DraftPromoted { .. } => "cost_envelope.draft_promoted",
            Self::TenderImported { .. } => "cost_envelope.tender_imported",
            Self::ProcurementSynced { .. } => "cost_envelope.procurement_synced",
        }
    }

    /// The project the event concerns.
    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        match self {
            Self::DraftUpdated { project_id }
            | Self::DraftPromoted { project_id }
            | Self::TenderImported { project_id, .. }
            | Self::ProcurementSynced { project_id } => *project_id,
        }
    }
}

/// Outbound event channel.
pub trait EventSink: Send + Sync {
    /// Delivers one event. Must not fail; delivery problems are the
    /// sink's own concern.
    fn emit(&self, event: &CostEvent);
}

/// Sink that logs each event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &CostEvent) {
        info!(event = event.name(), project_id = %event.project_id(), "cost event");
    }
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: &CostEvent) {}
}
