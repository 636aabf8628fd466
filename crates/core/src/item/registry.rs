//! Item collection ownership and modification-state bookkeeping.

use chrono::Utc;
use sitecost_shared::types::CostItemId;

use super::types::{CostSideData, ItemOrigin, ItemState, ItemStats, ProjectCostItem};
use crate::procurement::types::ProcurementData;
use crate::variance::Variance;

/// Registry operations over an envelope's item sequence.
///
/// Items keep their insertion order across every operation; removal is
/// always a soft delete so the audit trail survives.
pub struct CostItemRegistry;

impl CostItemRegistry {
    /// Appends a hand-added item and returns its id.
    pub fn add_manual_item(
        items: &mut Vec<ProjectCostItem>,
        description: impl Into<String>,
        unit: Option<String>,
        estimated: CostSideData,
        actual: CostSideData,
    ) -> CostItemId {
        let id = CostItemId::new();
        items.push(ProjectCostItem {
            id,
            original_id: None,
            description: description.into(),
            unit,
            origin: ItemOrigin::Manual,
            estimated,
            actual,
            procurement: ProcurementData::default(),
            variance: Variance::default(),
            state: ItemState {
                is_new: true,
                last_edit_at: Some(Utc::now()),
                ..ItemState::default()
            },
        });
        id
    }

    /// Finds an item by id.
    #[must_use]
    pub fn find(items: &[ProjectCostItem], id: CostItemId) -> Option<&ProjectCostItem> {
        items.iter().find(|item| item.id == id)
    }

    /// Finds an item by id, mutably.
    pub fn find_mut(
        items: &mut [ProjectCostItem],
        id: CostItemId,
    ) -> Option<&mut ProjectCostItem> {
        items.iter_mut().find(|item| item.id == id)
    }

    /// Replaces an item's actual side.
    ///
    /// Marks the item modified and its breakdown dirty until the next
    /// totals pass. Returns false when the id is unknown.
    pub fn update_actual_side(
        items: &mut [ProjectCostItem],
        id: CostItemId,
        actual: CostSideData,
    ) -> bool {
        let Some(item) = Self::find_mut(items, id) else {
            return false;
        };
        item.actual = actual;
        Self::touch(&mut item.state);
        item.state.breakdown_dirty = true;
        true
    }

    /// Replaces an item's estimated side.
    ///
    /// The engine never derives the estimated side itself, but a caller
    /// may correct the baseline by hand; that still counts as an edit.
    pub fn update_estimated_side(
        items: &mut [ProjectCostItem],
        id: CostItemId,
        estimated: CostSideData,
    ) -> bool {
        let Some(item) = Self::find_mut(items, id) else {
            return false;
        };
        item.estimated = estimated;
        Self::touch(&mut item.state);
        true
    }

    /// Soft-deletes an item. Returns false when the id is unknown.
    pub fn remove_item(items: &mut [ProjectCostItem], id: CostItemId) -> bool {
        let Some(item) = Self::find_mut(items, id) else {
            return false;
        };
        item.state.is_removed = true;
        Self::touch(&mut item.state);
        true
    }

    /// Clears the soft-delete flag. Returns false when the id is unknown.
    pub fn restore_item(items: &mut [ProjectCostItem], id: CostItemId) -> bool {
        let Some(item) = Self::find_mut(items, id) else {
            return false;
        };
        item.state.is_removed = false;
        Self::touch(&mut item.state);
        true
    }

    /// Clears the merge-conflict flag after the caller has reviewed it.
    pub fn acknowledge_incoming_change(items: &mut [ProjectCostItem], id: CostItemId) -> bool {
        let Some(item) = Self::find_mut(items, id) else {
            return false;
        };
        item.state.has_incoming_change = false;
        true
    }

    /// Partitions the items into state buckets.
    ///
    /// Precedence: removed, then added, then modified, then unmodified.
    #[must_use]
    pub fn item_stats(items: &[ProjectCostItem]) -> ItemStats {
        let mut stats = ItemStats {
            total: items.len(),
            ..ItemStats::default()
        };
        for item in items {
            if item.state.is_removed {
                stats.removed += 1;
            } else if item.state.is_new {
                stats.added += 1;
            } else if item.state.is_modified {
                stats.modified += 1;
            } else {
                stats.unmodified += 1;
            }
        }
        stats
    }

    fn touch(state: &mut ItemState) {
        state.is_modified = true;
        state.last_edit_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn register_two() -> Vec<ProjectCostItem> {
        let mut items = Vec::new();
        CostItemRegistry::add_manual_item(
            &mut items,
            "Excavation",
            Some("m3".to_string()),
            CostSideData::priced(dec!(100), dec!(12), dec!(1200)),
            CostSideData::default(),
        );
        CostItemRegistry::add_manual_item(
            &mut items,
            "Backfill",
            Some("m3".to_string()),
            CostSideData::priced(dec!(80), dec!(9), dec!(720)),
            CostSideData::default(),
        );
        items
    }

    #[test]
    fn test_add_manual_item_flags() {
        let items = register_two();
        assert_eq!(items.len(), 2);
        assert!(items[0].state.is_new);
        assert!(!items[0].state.is_modified);
        assert_eq!(items[0].origin, ItemOrigin::Manual);
        assert!(items[0].original_id.is_none());
    }

    #[test]
    fn test_ids_unique_and_order_preserved() {
        let items = register_two();
        assert_ne!(items[0].id, items[1].id);
        assert_eq!(items[0].description, "Excavation");
        assert_eq!(items[1].description, "Backfill");
    }

    #[test]
    fn test_update_actual_side_marks_dirty() {
        let mut items = register_two();
        let id = items[0].id;

        let updated = CostItemRegistry::update_actual_side(
            &mut items,
            id,
            CostSideData::priced(dec!(100), dec!(11), dec!(1100)),
        );

        assert!(updated);
        let item = &items[0];
        assert!(item.state.is_modified);
        assert!(item.state.breakdown_dirty);
        assert!(item.state.last_edit_at.is_some());
        assert_eq!(item.actual.total_price, dec!(1100));
    }

    #[test]
    fn test_update_unknown_item() {
        let mut items = register_two();
        assert!(!CostItemRegistry::update_actual_side(
            &mut items,
            CostItemId::new(),
            CostSideData::default(),
        ));
    }

    #[test]
    fn test_soft_remove_and_restore() {
        let mut items = register_two();
        let id = items[1].id;

        assert!(CostItemRegistry::remove_item(&mut items, id));
        assert_eq!(items.len(), 2);
        assert!(items[1].state.is_removed);

        assert!(CostItemRegistry::restore_item(&mut items, id));
        assert!(!items[1].state.is_removed);
    }

    #[test]
    fn test_acknowledge_incoming_change() {
        let mut items = register_two();
        let id = items[0].id;
        items[0].state.has_incoming_change = true;

        assert!(CostItemRegistry::acknowledge_incoming_change(&mut items, id));
        assert!(!items[0].state.has_incoming_change);
    }

    #[test]
    fn test_item_stats_precedence() {
        let mut items = register_two();

        // First item: new AND removed; removed wins.
        items[0].state.is_removed = true;
        // Second item: new AND modified; added wins over modified.
        items[1].state.is_modified = true;

        let stats = CostItemRegistry::item_stats(&items);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.added, 1);
        assert_eq!(stats.modified, 0);
        assert_eq!(stats.unmodified, 0);
    }

    #[test]
    fn test_item_stats_unmodified_bucket() {
        let mut items = register_two();
        for item in &mut items {
            item.state.is_new = false;
        }
        items[0].state.is_modified = true;

        let stats = CostItemRegistry::item_stats(&items);
        assert_eq!(stats.modified, 1);
        assert_eq!(stats.unmodified, 1);
    }
}
