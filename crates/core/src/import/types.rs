//! Tender import data types.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sitecost_shared::types::TenderId;

use crate::item::types::ItemStats;

/// How tender BOQ lines are merged into an existing draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStrategy {
    /// Seed a fresh register; every tender line becomes a new item.
    Initial,
    /// Refresh matched items, flagging conflicts on locally edited ones.
    Merge,
    /// Refresh matched items unconditionally.
    Overwrite,
}

impl ImportStrategy {
    /// Returns the string representation of the strategy.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Merge => "merge",
            Self::Overwrite => "overwrite",
        }
    }

    /// Parses a strategy from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "initial" => Some(Self::Initial),
            "merge" => Some(Self::Merge),
            "overwrite" => Some(Self::Overwrite),
            _ => None,
        }
    }
}

impl fmt::Display for ImportStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One priced line of a tender's bill of quantities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedBoqLine {
    /// Tender-side line identifier.
    pub id: String,
    /// Line description.
    pub description: String,
    /// Unit of measure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// BOQ quantity.
    pub quantity: Decimal,
    /// Tendered price per unit.
    pub unit_price: Decimal,
    /// Tendered total price.
    pub total_price: Decimal,
}

/// A tender's priced bill of quantities, as supplied by the BOQ source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedBoq {
    /// Source tender.
    pub tender_id: TenderId,
    /// The priced lines, in tender order.
    pub items: Vec<PricedBoqLine>,
}

/// Per-call counters reported by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOutcome {
    /// Items created from unmatched tender lines.
    pub added: usize,
    /// Matched items whose estimated side changed.
    pub updated: usize,
    /// Matched items whose estimated side was already current.
    pub unchanged: usize,
    /// Matched items refreshed over local edits (merge only).
    pub conflicted: usize,
    /// Items soft-removed because no tender line matched.
    pub removed: usize,
    /// Item partition after the import.
    pub stats: ItemStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_roundtrip() {
        for strategy in [
            ImportStrategy::Initial,
            ImportStrategy::Merge,
            ImportStrategy::Overwrite,
        ] {
            assert_eq!(ImportStrategy::parse(strategy.as_str()), Some(strategy));
        }
        assert_eq!(ImportStrategy::parse("replace"), None);
    }

    #[test]
    fn test_strategy_serde_lowercase() {
        let json = serde_json::to_value(ImportStrategy::Overwrite).unwrap();
        assert_eq!(json, "overwrite");
    }
}
