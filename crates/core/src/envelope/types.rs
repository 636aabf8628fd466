//! Cost envelope data types.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sitecost_shared::types::{ProjectId, TenderId};

use crate::import::ImportStrategy;
use crate::item::types::{ItemStats, ProjectCostItem};

/// Lifecycle status of a BOQ snapshot.
///
/// A project moves from no envelope at all to a mutable `draft`, and on
/// promotion gains a frozen `official` copy. The draft stays editable
/// after promotion; both states coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    /// Mutable working copy.
    Draft,
    /// Frozen promoted copy, never mutated directly.
    Official,
}

impl SnapshotStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Official => "official",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "official" => Some(Self::Official),
            _ => None,
        }
    }

    /// Returns true if the snapshot can be modified.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rolled-up project totals for one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostTotals {
    /// Sum of estimated totals across all items.
    pub estimated_total: Decimal,
    /// Sum of actual totals across all items.
    pub actual_total: Decimal,
    /// `actual_total - estimated_total`.
    pub variance_total: Decimal,
    /// Variance as a percentage of the estimated total.
    pub variance_pct: Decimal,
}

/// One envelope state (draft or official) for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoqSnapshot {
    /// Snapshot lifecycle status.
    pub status: SnapshotStatus,
    /// The cost items, in insertion order.
    pub items: Vec<ProjectCostItem>,
    /// Rolled-up totals.
    pub totals: CostTotals,
    /// Set on every mutating recompute.
    pub last_updated: DateTime<Utc>,
}

impl BoqSnapshot {
    /// An empty draft with zeroed totals.
    #[must_use]
    pub fn empty_draft() -> Self {
        Self {
            status: SnapshotStatus::Draft,
            items: Vec::new(),
            totals: CostTotals::default(),
            last_updated: Utc::now(),
        }
    }
}

/// Audit and lineage fields for an envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvelopeMeta {
    /// When the draft was last promoted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_promotion_at: Option<DateTime<Utc>>,
    /// When items were last imported from a tender.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_import_from_tender_at: Option<DateTime<Utc>>,
    /// Tender the estimated baseline was imported from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_tender_id: Option<TenderId>,
    /// Strategy used by the most recent import.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_strategy: Option<ImportStrategy>,
    /// Item partition counts from the most recent import.
    pub item_stats: ItemStats,
    /// When profit metrics were last bridged onto the project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_variance_analysis_at: Option<DateTime<Utc>>,
}

/// The full persisted cost-reconciliation unit for one project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostEnvelope {
    /// Mutable working snapshot, at most one per project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<BoqSnapshot>,
    /// Frozen snapshot produced by the latest promotion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official: Option<BoqSnapshot>,
    /// Audit and lineage metadata.
    pub meta: EnvelopeMeta,
}

/// Mapping from project id to its envelope.
pub type StoredEnvelopesIndex = HashMap<ProjectId, CostEnvelope>;
