//! Inventory overview: what a session would work on, before running one.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use waycraft_core::{CurrencyKind, ItemHandle, ItemKind, ItemState, Rarity, ReagentKind};

use crate::collaborators::SnapshotProvider;
use crate::errors::SnapshotError;

/// One waystone and its outstanding needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    /// Handle.
    pub handle: ItemHandle,
    /// Display name.
    pub name: String,
    /// Rarity.
    pub rarity: Rarity,
    /// Modifier count.
    pub modifiers: u32,
    /// Already distilled.
    pub finalized: bool,
    /// Rendered need list.
    pub needs: String,
}

impl From<&ItemState> for ItemSummary {
    fn from(item: &ItemState) -> Self {
        Self {
            handle: item.handle,
            name: item.name.clone(),
            rarity: item.rarity,
            modifiers: item.modifiers,
            finalized: item.finalized,
            needs: item.needs.summary(),
        }
    }
}

/// Counts and per-item needs for the current inventory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryOverview {
    /// Number of waystones.
    pub waystones: usize,
    /// Waystones per rarity.
    pub by_rarity: BTreeMap<Rarity, usize>,
    /// Waystones already distilled.
    pub distilled: usize,
    /// Reagent stacks of the configured kind.
    pub reagent_stacks: usize,
    /// Reagent units of the configured kind.
    pub reagent_units: u32,
    /// Currency units per kind.
    pub currency: BTreeMap<CurrencyKind, u32>,
    /// Every waystone with its needs.
    pub items: Vec<ItemSummary>,
}

impl InventoryOverview {
    /// Read the provider once and summarize.
    pub fn collect(
        provider: &dyn SnapshotProvider,
        reagent: Option<ReagentKind>,
    ) -> Result<Self, SnapshotError> {
        let mut overview = Self::default();

        for raw in provider.items()? {
            if raw.kind != ItemKind::Waystone {
                continue;
            }
            let item = ItemState::from_raw(&raw);
            overview.waystones += 1;
            *overview.by_rarity.entry(item.rarity).or_default() += 1;
            if item.finalized {
                overview.distilled += 1;
            }
            overview.items.push(ItemSummary::from(&item));
        }

        if let Some(kind) = reagent {
            let units = provider.reagent_units(kind)?;
            overview.reagent_stacks = units.len();
            overview.reagent_units = units.iter().map(|u| u.quantity).sum();
        }

        for kind in CurrencyKind::ALL {
            let total = provider
                .currency_units(kind)?
                .iter()
                .map(|u| u.quantity)
                .sum();
            let _ = overview.currency.insert(kind, total);
        }

        Ok(overview)
    }
}

impl fmt::Display for InventoryOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Waystones: {} ({} distilled)",
            self.waystones, self.distilled
        )?;
        for (rarity, count) in &self.by_rarity {
            writeln!(f, "  {rarity}: {count}")?;
        }
        writeln!(
            f,
            "Reagent: {} units in {} stacks",
            self.reagent_units, self.reagent_stacks
        )?;
        for (kind, total) in &self.currency {
            writeln!(f, "{}: {total}", kind.label())?;
        }
        for item in &self.items {
            writeln!(
                f,
                "{} {} [{} {}/6]: {}",
                item.handle, item.name, item.rarity, item.modifiers, item.needs
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Fixture, SimulatedInventory};

    fn sim() -> SimulatedInventory {
        SimulatedInventory::new(
            Fixture::default()
                .with_waystone(1, Rarity::Normal, 0)
                .with_waystone(2, Rarity::Rare, 6)
                .with_waystone(3, Rarity::Rare, 4)
                .with_currency(10, CurrencyKind::Exalted, 7)
                .with_currency(11, CurrencyKind::Exalted, 2)
                .with_reagent(20, ReagentKind::LiquidParanoia, 3)
                .with_reagent(21, ReagentKind::LiquidParanoia, 5)
                .with_reagent(22, ReagentKind::DilutedLiquidGreed, 4),
        )
    }

    #[test]
    fn counts_inventory() {
        let overview = InventoryOverview::collect(&sim(), Some(ReagentKind::LiquidParanoia)).unwrap();
        assert_eq!(overview.waystones, 3);
        assert_eq!(overview.by_rarity[&Rarity::Rare], 2);
        assert_eq!(overview.reagent_stacks, 2);
        assert_eq!(overview.reagent_units, 8);
        assert_eq!(overview.currency[&CurrencyKind::Exalted], 9);
        assert_eq!(overview.currency[&CurrencyKind::Alchemy], 0);
    }

    #[test]
    fn per_item_need_summaries() {
        let overview = InventoryOverview::collect(&sim(), None).unwrap();
        assert_eq!(overview.items[0].needs, "Alchemy, 3 Exalt(s), 3 Distill");
        assert_eq!(overview.items[1].needs, "3 Distill");
        assert_eq!(overview.items[2].needs, "2 Exalt(s), 3 Distill");
        assert_eq!(overview.reagent_units, 0);
    }

    #[test]
    fn display_lists_items() {
        let text = InventoryOverview::collect(&sim(), Some(ReagentKind::DilutedLiquidGreed))
            .unwrap()
            .to_string();
        assert!(text.contains("Waystones: 3 (0 distilled)"));
        assert!(text.contains("Reagent: 4 units in 1 stacks"));
        assert!(text.contains("Exalted Orb: 9"));
        assert!(text.contains("item#2 Waystone 2 [rare 6/6]: 3 Distill"));
    }
}
