//! Seeding and refreshing the estimated baseline from tender data.

use chrono::Utc;
use tracing::info;

use super::types::{ImportOutcome, ImportStrategy, PricedBoq, PricedBoqLine};
use crate::envelope::lifecycle::DraftLifecycleManager;
use crate::envelope::types::CostEnvelope;
use crate::item::registry::CostItemRegistry;
use crate::item::types::{CostSideData, ItemOrigin, ItemState, ProjectCostItem};
use crate::procurement::types::ProcurementData;
use crate::variance::{Variance, VarianceCalculator};
use sitecost_shared::types::CostItemId;

/// Tender BOQ import synchronizer.
///
/// Imports never delete: items missing from the tender are soft-removed
/// and local edits are flagged rather than discarded (merge strategy).
pub struct TenderImportSynchronizer;

impl TenderImportSynchronizer {
    /// Seeds or refreshes the envelope's draft from a tender's priced
    /// BOQ, then restamps meta and recomputes totals.
    pub fn import(
        envelope: &mut CostEnvelope,
        boq: &PricedBoq,
        strategy: ImportStrategy,
    ) -> ImportOutcome {
        let draft = DraftLifecycleManager::ensure_draft(envelope);

        let mut outcome = ImportOutcome::default();
        match strategy {
            ImportStrategy::Initial => {
                draft.items = boq.items.iter().map(Self::imported_item).collect();
                outcome.added = draft.items.len();
            }
            ImportStrategy::Merge | ImportStrategy::Overwrite => {
                Self::merge_lines(&mut draft.items, &boq.items, strategy, &mut outcome);
            }
        }

        outcome.stats = CostItemRegistry::item_stats(&draft.items);
        VarianceCalculator::recompute_totals(draft);

        envelope.meta.last_import_from_tender_at = Some(Utc::now());
        envelope.meta.source_tender_id = Some(boq.tender_id);
        envelope.meta.import_strategy = Some(strategy);
        envelope.meta.item_stats = outcome.stats;

        info!(
            tender_id = %boq.tender_id,
            strategy = %strategy,
            added = outcome.added,
            updated = outcome.updated,
            unchanged = outcome.unchanged,
            conflicted = outcome.conflicted,
            removed = outcome.removed,
            "tender BOQ import applied"
        );
        outcome
    }

    /// A fresh item seeded from one tender line: estimated populated,
    /// actual left empty.
    fn imported_item(line: &PricedBoqLine) -> ProjectCostItem {
        ProjectCostItem {
            id: CostItemId::new(),
            original_id: Some(line.id.clone()),
            description: line.description.clone(),
            unit: line.unit.clone(),
            origin: ItemOrigin::Imported,
            estimated: Self::estimated_side(line),
            actual: CostSideData::default(),
            procurement: ProcurementData::default(),
            variance: Variance::default(),
            state: ItemState::default(),
        }
    }

    fn estimated_side(line: &PricedBoqLine) -> CostSideData {
        CostSideData::priced(line.quantity, line.unit_price, line.total_price)
    }

    fn merge_lines(
        items: &mut Vec<ProjectCostItem>,
        lines: &[PricedBoqLine],
        strategy: ImportStrategy,
        outcome: &mut ImportOutcome,
    ) {
        let mut matched = vec![false; items.len()];

        for line in lines {
            let Some(idx) = Self::match_line(items, &matched, line) else {
                items.push(ProjectCostItem {
                    state: ItemState {
                        is_new: true,
                        ..ItemState::default()
                    },
                    ..Self::imported_item(line)
                });
                matched.push(true);
                outcome.added += 1;
                continue;
            };
            matched[idx] = true;

            let item = &mut items[idx];
            let refreshed = Self::estimated_side(line);
            let changed = item.estimated.quantity != refreshed.quantity
                || item.estimated.unit_price != refreshed.unit_price
                || item.estimated.total_price != refreshed.total_price;

            // Both strategies refresh the baseline; merge additionally
            // flags items whose actual side carries local edits so the
            // caller can decide, overwrite clears any pending flag.
            item.estimated = refreshed;
            item.original_id = Some(line.id.clone());
            item.unit = line.unit.clone();

            match strategy {
                ImportStrategy::Merge if item.state.is_modified => {
                    item.state.has_incoming_change = true;
                    outcome.conflicted += 1;
                }
                ImportStrategy::Overwrite => {
                    item.state.has_incoming_change = false;
                    if changed {
                        outcome.updated += 1;
                    } else {
                        outcome.unchanged += 1;
                    }
                }
                ImportStrategy::Merge | ImportStrategy::Initial => {
                    if changed {
                        outcome.updated += 1;
                    } else {
                        outcome.unchanged += 1;
                    }
                }
            }
        }

        for (item, was_matched) in items.iter_mut().zip(&matched) {
            if !was_matched && !item.state.is_removed {
                item.state.is_removed = true;
                outcome.removed += 1;
            }
        }
    }

    /// Match-key chain: tender line id against `original_id`, then
    /// normalized description, then the item's own id. Each item matches
    /// at most one line.
    fn match_line(
        items: &[ProjectCostItem],
        matched: &[bool],
        line: &PricedBoqLine,
    ) -> Option<usize> {
        let available =
            |(idx, _): &(usize, &ProjectCostItem)| !matched.get(*idx).copied().unwrap_or(true);

        if let Some((idx, _)) = items
            .iter()
            .enumerate()
            .filter(available)
            .find(|(_, item)| item.original_id.as_deref() == Some(line.id.as_str()))
        {
            return Some(idx);
        }

        let key = normalize_key(&line.description);
        if let Some((idx, _)) = items
            .iter()
            .enumerate()
            .filter(available)
            .find(|(_, item)| normalize_key(&item.description) == key)
        {
            return Some(idx);
        }

        items
            .iter()
            .enumerate()
            .filter(available)
            .find(|(_, item)| item.id.to_string() == line.id)
            .map(|(idx, _)| idx)
    }
}

/// Normalizes a description for fallback matching.
fn normalize_key(description: &str) -> String {
    description.trim().to_lowercase()
}
