//! Item model.
//!
//! The snapshot provider classifies every inventory entry into an [`ItemKind`]
//! before the core sees it; nothing downstream inspects display names or
//! metadata paths. Waystones arrive as [`RawItem`]s and are turned into
//! [`ItemState`]s, which carry the derived [`NeedSet`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::needs::{NeedSet, evaluate};

/// Opaque reference into the external inventory.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemHandle(u64);

impl ItemHandle {
    /// Wrap a provider-issued handle.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The provider-issued value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Item rarity tier.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    /// No modifiers rolled yet ("plain").
    #[serde(alias = "plain")]
    Normal,
    /// One or two modifiers ("enhanced").
    #[serde(alias = "enhanced")]
    Magic,
    /// Three to six modifiers.
    Rare,
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Magic => write!(f, "magic"),
            Self::Rare => write!(f, "rare"),
        }
    }
}

/// Single-use crafting currency.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyKind {
    /// Adds a modifier to a magic item.
    Augmentation,
    /// Upgrades a normal item straight to rare.
    Alchemy,
    /// Upgrades a magic item to rare, adding one modifier.
    Regal,
    /// Adds a modifier to a rare item.
    Exalted,
}

impl CurrencyKind {
    /// Every kind, in the order the currency phase applies them.
    pub const ALL: [Self; 4] = [Self::Augmentation, Self::Alchemy, Self::Regal, Self::Exalted];

    /// In-game display name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Augmentation => "Orb of Augmentation",
            Self::Alchemy => "Orb of Alchemy",
            Self::Regal => "Regal Orb",
            Self::Exalted => "Exalted Orb",
        }
    }
}

impl fmt::Display for CurrencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Augmentation => write!(f, "augmentation"),
            Self::Alchemy => write!(f, "alchemy"),
            Self::Regal => write!(f, "regal"),
            Self::Exalted => write!(f, "exalted"),
        }
    }
}

/// Stackable reagent consumed by distillation.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReagentKind {
    /// Liquid Paranoia.
    LiquidParanoia,
    /// Diluted Liquid Greed.
    DilutedLiquidGreed,
}

impl ReagentKind {
    /// In-game display name.
    pub fn label(self) -> &'static str {
        match self {
            Self::LiquidParanoia => "Liquid Paranoia",
            Self::DilutedLiquidGreed => "Diluted Liquid Greed",
        }
    }
}

impl fmt::Display for ReagentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification assigned by the snapshot provider.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "kind")]
pub enum ItemKind {
    /// A craftable waystone.
    Waystone,
    /// A distillation reagent stack.
    Reagent(ReagentKind),
    /// A currency stack.
    Currency(CurrencyKind),
    /// Anything the core does not care about.
    Other,
}

/// Anything that can run short during a session.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "kind")]
pub enum Resource {
    /// A currency kind from the ledger.
    Currency(CurrencyKind),
    /// A reagent kind from the pool.
    Reagent(ReagentKind),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Currency(kind) => f.write_str(kind.label()),
            Self::Reagent(kind) => f.write_str(kind.label()),
        }
    }
}

/// Screen coordinate relative to the game window's top-left corner.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal offset in pixels.
    pub x: i32,
    /// Vertical offset in pixels.
    pub y: i32,
}

impl ScreenPoint {
    /// Build a point from pixel offsets.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A stack of currency or reagent as read from the inventory.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StackSnapshot {
    /// Handle usable by the action executor.
    pub handle: ItemHandle,
    /// Units left in the stack.
    pub quantity: u32,
}

/// One inventory entry exactly as the provider reported it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    /// Handle usable by the action executor.
    pub handle: ItemHandle,
    /// Provider classification.
    pub kind: ItemKind,
    /// Display name.
    pub name: String,
    /// Current rarity.
    pub rarity: Rarity,
    /// Number of explicit modifiers.
    pub modifiers: u32,
    /// Whether the item already carries the distilled (instilled) modifier.
    pub finalized: bool,
    /// Whether an external UI state currently prevents touching the item.
    #[serde(default)]
    pub locked: bool,
}

/// A waystone plus the needs derived from its last observed state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemState {
    /// Handle usable by the action executor.
    pub handle: ItemHandle,
    /// Display name.
    pub name: String,
    /// Last observed rarity.
    pub rarity: Rarity,
    /// Last observed modifier count.
    pub modifiers: u32,
    /// Last observed distilled flag.
    pub finalized: bool,
    /// Derived needs.
    pub needs: NeedSet,
}

impl ItemState {
    /// Derive the state of a freshly observed item.
    pub fn from_raw(raw: &RawItem) -> Self {
        let mut needs = evaluate(raw.rarity, raw.modifiers, raw.finalized);
        needs.eligible &= !raw.locked;
        Self {
            handle: raw.handle,
            name: raw.name.clone(),
            rarity: raw.rarity,
            modifiers: raw.modifiers,
            finalized: raw.finalized,
            needs,
        }
    }

    /// Replace the observed fields with an authoritative re-read and
    /// re-derive the needs.
    pub fn refresh(&mut self, raw: &RawItem) {
        *self = Self::from_raw(raw);
    }

    /// Whether the item needs anything at all.
    pub fn needs_work(&self) -> bool {
        !self.needs.is_empty()
    }
}
