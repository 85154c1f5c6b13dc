//! Need evaluation.
//!
//! [`evaluate`] maps an item's observed rarity, modifier count and distilled
//! flag to the operations it still requires. It is pure and total: every
//! input combination yields a [`NeedSet`], combinations outside the policy
//! table simply need nothing.
//!
//! | rarity | modifiers | needs                                  |
//! |--------|-----------|----------------------------------------|
//! | normal | 0         | alchemy, 3 exalts                      |
//! | magic  | 1         | augmentation, regal, 3 exalts          |
//! | magic  | 2         | regal, 3 exalts                        |
//! | rare   | 3..=5     | `6 - modifiers` exalts                 |
//! | rare   | 6         | distillation only                      |
//!
//! Any currency need on an item that is not yet distilled also schedules
//! distillation: every freshly upgraded waystone gets distilled at the end of
//! its chain.

use serde::{Deserialize, Serialize};

use crate::item::{CurrencyKind, Rarity};

/// Modifier count of a fully exalted waystone.
pub const MAX_MODIFIERS: u32 = 6;

/// Reagent units consumed by one distillation.
pub const DISTILL_UNITS: u32 = 3;

/// Exalts scheduled after an alchemy/regal upgrade (worst case roll).
const EXALTS_AFTER_UPGRADE: u32 = 3;

/// Operations an item still requires.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedSet {
    /// Orb of Augmentation (magic item with a free prefix/suffix).
    pub augmentation: bool,
    /// Orb of Alchemy (normal item to rare).
    pub alchemy: bool,
    /// Regal Orb (magic item to rare).
    pub regal: bool,
    /// Exalted Orbs still to apply.
    pub exalts_remaining: u32,
    /// Whether the distillation step is required.
    pub needs_distillation: bool,
    /// Reagent units the distillation step consumes.
    pub distill_units: u32,
    /// Whether the item can be touched at all.
    pub eligible: bool,
}

impl NeedSet {
    /// Whether any currency operation is outstanding.
    pub fn has_currency_needs(&self) -> bool {
        self.augmentation || self.alchemy || self.regal || self.exalts_remaining > 0
    }

    /// Whether the single-shot operation for `kind` is outstanding.
    ///
    /// Exalts are repeated, so `Exalted` reports whether any remain.
    pub fn requires(&self, kind: CurrencyKind) -> bool {
        match kind {
            CurrencyKind::Augmentation => self.augmentation,
            CurrencyKind::Alchemy => self.alchemy,
            CurrencyKind::Regal => self.regal,
            CurrencyKind::Exalted => self.exalts_remaining > 0,
        }
    }

    /// Whether nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        !self.has_currency_needs() && !self.needs_distillation
    }

    /// Human-readable list of outstanding operations.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if self.augmentation {
            parts.push("Augment".to_owned());
        }
        if self.alchemy {
            parts.push("Alchemy".to_owned());
        }
        if self.regal {
            parts.push("Regal".to_owned());
        }
        if self.exalts_remaining > 0 {
            parts.push(format!("{} Exalt(s)", self.exalts_remaining));
        }
        if self.needs_distillation {
            parts.push(format!("{} Distill", self.distill_units));
        }

        if parts.is_empty() {
            "Nothing".to_owned()
        } else {
            parts.join(", ")
        }
    }
}

/// Compute the needs of an item from its observed state.
pub fn evaluate(rarity: Rarity, modifiers: u32, finalized: bool) -> NeedSet {
    let mut needs = NeedSet {
        eligible: true,
        ..NeedSet::default()
    };

    match (rarity, modifiers) {
        (Rarity::Normal, 0) => {
            needs.alchemy = true;
            needs.exalts_remaining = EXALTS_AFTER_UPGRADE;
        }
        (Rarity::Magic, 1) => {
            needs.augmentation = true;
            needs.regal = true;
            needs.exalts_remaining = EXALTS_AFTER_UPGRADE;
        }
        (Rarity::Magic, 2) => {
            needs.regal = true;
            needs.exalts_remaining = EXALTS_AFTER_UPGRADE;
        }
        (Rarity::Rare, 3..=5) => {
            needs.exalts_remaining = MAX_MODIFIERS - modifiers;
        }
        (Rarity::Rare, MAX_MODIFIERS) if !finalized => {
            needs.needs_distillation = true;
        }
        _ => {}
    }

    if needs.has_currency_needs() && !finalized {
        needs.needs_distillation = true;
    }
    if needs.needs_distillation {
        needs.distill_units = DISTILL_UNITS;
    }

    needs
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
