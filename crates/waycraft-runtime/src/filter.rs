//! Work-list selection.

use waycraft_core::{ItemKind, ItemState, RawItem};
use waycraft_settings::ProcessingSettings;

/// Waystones selected for a session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkList {
    /// Items to process, in inventory order.
    pub items: Vec<ItemState>,
    /// Items that need work but cannot be touched right now.
    pub ineligible: Vec<ItemState>,
}

/// Applies the rarity toggles and the skip-distilled switch.
#[derive(Clone, Debug, Default)]
pub struct WorkFilter {
    settings: ProcessingSettings,
}

impl WorkFilter {
    /// Create a filter from processing settings.
    pub fn new(settings: ProcessingSettings) -> Self {
        Self { settings }
    }

    /// Whether `item` passes the rarity and distilled toggles.
    pub fn admits(&self, item: &ItemState) -> bool {
        self.settings.allows(item.rarity) && !(self.settings.skip_distilled && item.finalized)
    }

    /// Select waystones that need work from a raw snapshot.
    pub fn select(&self, raws: &[RawItem]) -> WorkList {
        let mut list = WorkList::default();
        for item in raws
            .iter()
            .filter(|raw| raw.kind == ItemKind::Waystone)
            .map(ItemState::from_raw)
            .filter(|item| self.admits(item) && item.needs_work())
        {
            if item.needs.eligible {
                list.items.push(item);
            } else {
                list.ineligible.push(item);
            }
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waycraft_core::{CurrencyKind, ItemHandle, Rarity};

    fn raw(handle: u64, kind: ItemKind, rarity: Rarity, modifiers: u32, finalized: bool) -> RawItem {
        RawItem {
            handle: ItemHandle::new(handle),
            kind,
            name: format!("entry {handle}"),
            rarity,
            modifiers,
            finalized,
            locked: false,
        }
    }

    fn handles(items: &[ItemState]) -> Vec<u64> {
        items.iter().map(|i| i.handle.raw()).collect()
    }

    #[test]
    fn selects_waystones_that_need_work() {
        let raws = vec![
            raw(1, ItemKind::Waystone, Rarity::Normal, 0, false),
            raw(2, ItemKind::Waystone, Rarity::Rare, 6, true),
            raw(3, ItemKind::Currency(CurrencyKind::Regal), Rarity::Normal, 0, false),
            raw(4, ItemKind::Other, Rarity::Normal, 0, false),
            raw(5, ItemKind::Waystone, Rarity::Rare, 6, false),
        ];
        let list = WorkFilter::default().select(&raws);
        assert_eq!(handles(&list.items), vec![1, 5]);
        assert!(list.ineligible.is_empty());
    }

    #[test]
    fn rarity_toggles_exclude() {
        let settings = ProcessingSettings {
            process_magic: false,
            ..ProcessingSettings::default()
        };
        let raws = vec![
            raw(1, ItemKind::Waystone, Rarity::Magic, 1, false),
            raw(2, ItemKind::Waystone, Rarity::Rare, 4, false),
        ];
        let list = WorkFilter::new(settings).select(&raws);
        assert_eq!(handles(&list.items), vec![2]);
    }

    #[test]
    fn distilled_items_kept_when_not_skipping() {
        let settings = ProcessingSettings {
            skip_distilled: false,
            ..ProcessingSettings::default()
        };
        let raws = vec![raw(1, ItemKind::Waystone, Rarity::Rare, 4, true)];

        assert!(WorkFilter::default().select(&raws).items.is_empty());
        assert_eq!(handles(&WorkFilter::new(settings).select(&raws).items), vec![1]);
    }

    #[test]
    fn locked_items_listed_separately() {
        let mut locked = raw(1, ItemKind::Waystone, Rarity::Normal, 0, false);
        locked.locked = true;
        let list = WorkFilter::default().select(&[locked]);
        assert!(list.items.is_empty());
        assert_eq!(handles(&list.ineligible), vec![1]);
    }
}
