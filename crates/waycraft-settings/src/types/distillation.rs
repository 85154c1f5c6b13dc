//! Distillation workspace settings.

use serde::{Deserialize, Serialize};

use waycraft_core::{ReagentKind, ScreenPoint};

/// Accepted range for both axes of a configured screen position.
pub const COORDINATE_RANGE: (i32, i32) = (0, 2000);

/// Which reagent the distillation phase consumes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReagentChoice {
    /// Liquid Paranoia.
    #[default]
    Paranoia,
    /// Diluted Liquid Greed.
    Greed,
    /// Skip the distillation phase entirely.
    None,
}

impl ReagentChoice {
    /// The reagent to pool, or `None` when distillation is disabled.
    pub fn kind(self) -> Option<ReagentKind> {
        match self {
            Self::Paranoia => Some(ReagentKind::LiquidParanoia),
            Self::Greed => Some(ReagentKind::DilutedLiquidGreed),
            Self::None => None,
        }
    }
}

/// Whether opening the workspace consumes a reagent unit of its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpeningCost {
    /// The opening activation is not charged to local accounting.
    #[default]
    Included,
    /// Each opening decrements one extra unit.
    Separate,
}

impl OpeningCost {
    /// Units charged per workspace opening.
    pub fn units(self) -> u32 {
        match self {
            Self::Included => 0,
            Self::Separate => 1,
        }
    }
}

/// Distillation phase configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DistillationSettings {
    /// Reagent to consume.
    pub reagent: ReagentChoice,
    /// Opening-cost accounting policy.
    pub opening_cost: OpeningCost,
    /// Position of the finalize (instill) button.
    pub finalize_button: ScreenPoint,
    /// Position of the item slot inside the workspace.
    pub retrieve_slot: ScreenPoint,
}

impl Default for DistillationSettings {
    fn default() -> Self {
        Self {
            reagent: ReagentChoice::default(),
            opening_cost: OpeningCost::default(),
            finalize_button: ScreenPoint::new(935, 868),
            retrieve_slot: ScreenPoint::new(935, 460),
        }
    }
}
