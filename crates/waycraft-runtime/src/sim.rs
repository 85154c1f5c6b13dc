//! Simulated inventory.
//!
//! [`SimulatedInventory`] implements both collaborator traits over an
//! in-memory model with deterministic currency effects, so the whole
//! pipeline can run without a game client. It records every action it
//! receives and counts snapshot reads.

use std::collections::BTreeMap;
use std::path::Path;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use waycraft_core::{
    CurrencyKind, ItemHandle, ItemKind, MAX_MODIFIERS, RawItem, Rarity, ReagentKind, ScreenPoint,
    StackSnapshot,
};

use crate::collaborators::{ActionExecutor, ClickKind, ContainerRef, Key, SnapshotProvider};
use crate::errors::{ActionError, FixtureError, SnapshotError};

/// Reagent units the finalize button consumes.
const UNITS_PER_DISTILL: u32 = 3;

/// A waystone as described by a fixture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureWaystone {
    /// Handle.
    pub handle: ItemHandle,
    /// Display name.
    #[serde(default = "default_waystone_name")]
    pub name: String,
    /// Rarity.
    pub rarity: Rarity,
    /// Explicit modifier count.
    pub modifiers: u32,
    /// Already distilled.
    #[serde(default)]
    pub finalized: bool,
    /// Not touchable.
    #[serde(default)]
    pub locked: bool,
}

fn default_waystone_name() -> String {
    "Waystone".to_owned()
}

/// A currency stack as described by a fixture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureCurrency {
    /// Handle.
    pub handle: ItemHandle,
    /// Currency kind.
    pub kind: CurrencyKind,
    /// Units in the stack.
    pub quantity: u32,
}

/// A reagent stack as described by a fixture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureReagent {
    /// Handle.
    pub handle: ItemHandle,
    /// Reagent kind.
    pub kind: ReagentKind,
    /// Units in the stack.
    pub quantity: u32,
}

/// Deterministic outcomes of currency rolls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimEffects {
    /// Modifiers an Orb of Alchemy rolls.
    pub alchemy_modifiers: u32,
    /// Modifiers one Exalted Orb adds (capped at six total).
    pub exalt_adds: u32,
}

impl Default for SimEffects {
    fn default() -> Self {
        Self {
            alchemy_modifiers: 4,
            exalt_adds: 1,
        }
    }
}

/// Initial inventory contents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fixture {
    /// Waystones.
    pub waystones: Vec<FixtureWaystone>,
    /// Currency stacks.
    pub currency: Vec<FixtureCurrency>,
    /// Reagent stacks.
    pub reagents: Vec<FixtureReagent>,
    /// Start with a blocking UI (stash) open.
    pub blocking_ui_open: bool,
    /// Roll outcomes.
    pub effects: SimEffects,
}

impl Fixture {
    /// Parse a fixture from JSON text.
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a fixture file.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Add a waystone.
    #[must_use]
    pub fn with_waystone(mut self, handle: u64, rarity: Rarity, modifiers: u32) -> Self {
        self.waystones.push(FixtureWaystone {
            handle: ItemHandle::new(handle),
            name: format!("Waystone {handle}"),
            rarity,
            modifiers,
            finalized: false,
            locked: false,
        });
        self
    }

    /// Add a fully described waystone.
    #[must_use]
    pub fn with_fixture_waystone(mut self, waystone: FixtureWaystone) -> Self {
        self.waystones.push(waystone);
        self
    }

    /// Add a currency stack.
    #[must_use]
    pub fn with_currency(mut self, handle: u64, kind: CurrencyKind, quantity: u32) -> Self {
        self.currency.push(FixtureCurrency {
            handle: ItemHandle::new(handle),
            kind,
            quantity,
        });
        self
    }

    /// Add a reagent stack.
    #[must_use]
    pub fn with_reagent(mut self, handle: u64, kind: ReagentKind, quantity: u32) -> Self {
        self.reagents.push(FixtureReagent {
            handle: ItemHandle::new(handle),
            kind,
            quantity,
        });
        self
    }

    /// Set how many modifiers one Exalted Orb adds.
    #[must_use]
    pub fn with_exalt_adds(mut self, adds: u32) -> Self {
        self.effects.exalt_adds = adds;
        self
    }
}

/// An action as the simulator received it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedAction {
    /// `apply_to_target`.
    Apply {
        /// Currency stack.
        source: ItemHandle,
        /// Waystone.
        target: ItemHandle,
    },
    /// `activate`.
    Activate(ItemHandle),
    /// `transfer_into`.
    Transfer(ContainerRef, ItemHandle),
    /// `trigger_at`.
    Trigger(ScreenPoint, ClickKind),
    /// `send_key`.
    Key(Key),
}

#[derive(Clone, Debug)]
struct SimWaystone {
    name: String,
    rarity: Rarity,
    modifiers: u32,
    finalized: bool,
    locked: bool,
}

#[derive(Clone, Debug, Default)]
struct Workspace {
    item: Option<ItemHandle>,
    units: u32,
}

#[derive(Debug)]
struct SimState {
    waystones: BTreeMap<ItemHandle, SimWaystone>,
    currency: BTreeMap<ItemHandle, (CurrencyKind, u32)>,
    reagents: BTreeMap<ItemHandle, (ReagentKind, u32)>,
    workspace: Option<Workspace>,
    blocking_ui_open: bool,
    effects: SimEffects,
    actions: Vec<RecordedAction>,
    snapshot_reads: usize,
}

/// In-memory inventory and input driver.
pub struct SimulatedInventory {
    state: Mutex<SimState>,
    finalize_button: ScreenPoint,
    retrieve_slot: ScreenPoint,
}

impl SimulatedInventory {
    /// Build from a fixture, with the default workspace layout.
    pub fn new(fixture: Fixture) -> Self {
        let waystones = fixture
            .waystones
            .into_iter()
            .map(|w| {
                (
                    w.handle,
                    SimWaystone {
                        name: w.name,
                        rarity: w.rarity,
                        modifiers: w.modifiers,
                        finalized: w.finalized,
                        locked: w.locked,
                    },
                )
            })
            .collect();
        let currency = fixture
            .currency
            .into_iter()
            .map(|c| (c.handle, (c.kind, c.quantity)))
            .collect();
        let reagents = fixture
            .reagents
            .into_iter()
            .map(|r| (r.handle, (r.kind, r.quantity)))
            .collect();

        Self {
            state: Mutex::new(SimState {
                waystones,
                currency,
                reagents,
                workspace: None,
                blocking_ui_open: fixture.blocking_ui_open,
                effects: fixture.effects,
                actions: Vec::new(),
                snapshot_reads: 0,
            }),
            finalize_button: ScreenPoint::new(935, 868),
            retrieve_slot: ScreenPoint::new(935, 460),
        }
    }

    /// Load a fixture file.
    pub fn from_fixture_file(path: &Path) -> Result<Self, FixtureError> {
        Ok(Self::new(Fixture::load(path)?))
    }

    /// Use a non-default workspace layout.
    #[must_use]
    pub fn with_layout(mut self, finalize_button: ScreenPoint, retrieve_slot: ScreenPoint) -> Self {
        self.finalize_button = finalize_button;
        self.retrieve_slot = retrieve_slot;
        self
    }

    /// Open or close the blocking UI.
    pub fn set_blocking_ui_open(&self, open: bool) {
        self.state.lock().blocking_ui_open = open;
    }

    /// Lock or unlock a waystone.
    pub fn set_locked(&self, handle: ItemHandle, locked: bool) {
        if let Some(w) = self.state.lock().waystones.get_mut(&handle) {
            w.locked = locked;
        }
    }

    /// Overwrite a reagent stack's quantity.
    pub fn set_reagent_quantity(&self, handle: ItemHandle, quantity: u32) {
        if let Some((_, q)) = self.state.lock().reagents.get_mut(&handle) {
            *q = quantity;
        }
    }

    /// Current state of a waystone, wherever it is.
    pub fn waystone(&self, handle: ItemHandle) -> Option<RawItem> {
        let state = self.state.lock();
        state.waystones.get(&handle).map(|w| waystone_raw(handle, w))
    }

    /// Remaining units in a currency stack.
    pub fn currency_quantity(&self, handle: ItemHandle) -> Option<u32> {
        self.state.lock().currency.get(&handle).map(|(_, q)| *q)
    }

    /// Remaining units of `kind` across all stacks.
    pub fn reagent_total(&self, kind: ReagentKind) -> u32 {
        self.state
            .lock()
            .reagents
            .values()
            .filter(|(k, _)| *k == kind)
            .map(|(_, q)| q)
            .sum()
    }

    /// Whether the distillation workspace is open.
    pub fn workspace_open(&self) -> bool {
        self.state.lock().workspace.is_some()
    }

    /// Item currently inside the workspace.
    pub fn workspace_item(&self) -> Option<ItemHandle> {
        self.state.lock().workspace.as_ref().and_then(|w| w.item)
    }

    /// Every action received so far.
    pub fn actions(&self) -> Vec<RecordedAction> {
        self.state.lock().actions.clone()
    }

    /// Number of actions received so far.
    pub fn action_count(&self) -> usize {
        self.state.lock().actions.len()
    }

    /// Number of full snapshot reads ([`SnapshotProvider::items`]).
    pub fn snapshot_reads(&self) -> usize {
        self.state.lock().snapshot_reads
    }
}

fn waystone_raw(handle: ItemHandle, w: &SimWaystone) -> RawItem {
    RawItem {
        handle,
        kind: ItemKind::Waystone,
        name: w.name.clone(),
        rarity: w.rarity,
        modifiers: w.modifiers,
        finalized: w.finalized,
        locked: w.locked,
    }
}

fn stack_raw(handle: ItemHandle, kind: ItemKind, name: &str) -> RawItem {
    RawItem {
        handle,
        kind,
        name: name.to_owned(),
        rarity: Rarity::Normal,
        modifiers: 0,
        finalized: false,
        locked: false,
    }
}

fn failed(detail: impl Into<String>) -> ActionError {
    ActionError::ActionFailed(detail.into())
}

impl SimState {
    fn in_workspace(&self, handle: ItemHandle) -> bool {
        self.workspace.as_ref().is_some_and(|w| w.item == Some(handle))
    }

    fn inventory_items(&self) -> Vec<RawItem> {
        let waystones = self
            .waystones
            .iter()
            .filter(|(h, _)| !self.in_workspace(**h))
            .map(|(h, w)| waystone_raw(*h, w));
        let currency = self
            .currency
            .iter()
            .filter(|(_, (_, q))| *q > 0)
            .map(|(h, (k, _))| stack_raw(*h, ItemKind::Currency(*k), k.label()));
        let reagents = self
            .reagents
            .iter()
            .filter(|(_, (_, q))| *q > 0)
            .map(|(h, (k, _))| stack_raw(*h, ItemKind::Reagent(*k), k.label()));
        waystones.chain(currency).chain(reagents).collect()
    }

    fn apply(&mut self, source: ItemHandle, target: ItemHandle) -> Result<(), ActionError> {
        let Some(&(kind, quantity)) = self.currency.get(&source) else {
            return Err(failed(format!("{source} is not a currency stack")));
        };
        if quantity == 0 {
            return Err(failed(format!("{source} is empty")));
        }
        if self.in_workspace(target) {
            return Err(failed(format!("{target} is inside the workspace")));
        }
        let effects = self.effects.clone();
        let Some(waystone) = self.waystones.get_mut(&target) else {
            return Err(failed(format!("{target} is not a waystone")));
        };

        match (kind, waystone.rarity, waystone.modifiers) {
            (CurrencyKind::Augmentation, Rarity::Magic, 1) => waystone.modifiers = 2,
            (CurrencyKind::Alchemy, Rarity::Normal, _) => {
                waystone.rarity = Rarity::Rare;
                waystone.modifiers = effects.alchemy_modifiers.min(MAX_MODIFIERS);
            }
            (CurrencyKind::Regal, Rarity::Magic, m) => {
                waystone.rarity = Rarity::Rare;
                waystone.modifiers = (m + 1).min(MAX_MODIFIERS);
            }
            (CurrencyKind::Exalted, Rarity::Rare, m) if m < MAX_MODIFIERS => {
                waystone.modifiers = (m + effects.exalt_adds).min(MAX_MODIFIERS);
            }
            (kind, rarity, m) => {
                return Err(failed(format!(
                    "{} cannot be applied to {rarity} waystone with {m} modifiers",
                    kind.label()
                )));
            }
        }

        if let Some((_, q)) = self.currency.get_mut(&source) {
            *q -= 1;
        }
        Ok(())
    }

    fn activate(&mut self, handle: ItemHandle) -> Result<(), ActionError> {
        match self.reagents.get(&handle) {
            Some((_, q)) if *q > 0 => {
                if self.workspace.is_none() {
                    self.workspace = Some(Workspace::default());
                }
                Ok(())
            }
            Some(_) => Err(failed(format!("{handle} is empty"))),
            None => Err(failed(format!("{handle} cannot be activated"))),
        }
    }

    fn transfer(&mut self, handle: ItemHandle) -> Result<(), ActionError> {
        let Some(workspace) = self.workspace.as_mut() else {
            return Err(failed("workspace closed"));
        };

        if self.waystones.contains_key(&handle) {
            if workspace.item.is_some() {
                return Err(failed("workspace slot occupied"));
            }
            workspace.item = Some(handle);
            return Ok(());
        }

        match self.reagents.get_mut(&handle) {
            Some((_, q)) if *q > 0 => {
                *q -= 1;
                workspace.units += 1;
                Ok(())
            }
            Some(_) => Err(failed(format!("{handle} is empty"))),
            None => Err(failed(format!("{handle} cannot go into the workspace"))),
        }
    }

    fn finalize(&mut self) {
        let Some(workspace) = self.workspace.as_mut() else {
            return;
        };
        let Some(item) = workspace.item else {
            return;
        };
        if workspace.units < UNITS_PER_DISTILL {
            return;
        }
        workspace.units -= UNITS_PER_DISTILL;
        if let Some(w) = self.waystones.get_mut(&item) {
            w.finalized = true;
        }
    }

    fn retrieve(&mut self) {
        if let Some(workspace) = self.workspace.as_mut() {
            workspace.item = None;
        }
    }
}

impl SnapshotProvider for SimulatedInventory {
    fn items(&self) -> Result<Vec<RawItem>, SnapshotError> {
        let mut state = self.state.lock();
        state.snapshot_reads += 1;
        Ok(state.inventory_items())
    }

    fn item(&self, handle: ItemHandle) -> Result<Option<RawItem>, SnapshotError> {
        let state = self.state.lock();
        if state.in_workspace(handle) {
            return Ok(None);
        }
        Ok(state.waystones.get(&handle).map(|w| waystone_raw(handle, w)))
    }

    fn reagent_units(&self, kind: ReagentKind) -> Result<Vec<StackSnapshot>, SnapshotError> {
        Ok(self
            .state
            .lock()
            .reagents
            .iter()
            .filter(|(_, (k, q))| *k == kind && *q > 0)
            .map(|(h, (_, q))| StackSnapshot {
                handle: *h,
                quantity: *q,
            })
            .collect())
    }

    fn currency_units(&self, kind: CurrencyKind) -> Result<Vec<StackSnapshot>, SnapshotError> {
        Ok(self
            .state
            .lock()
            .currency
            .iter()
            .filter(|(_, (k, q))| *k == kind && *q > 0)
            .map(|(h, (_, q))| StackSnapshot {
                handle: *h,
                quantity: *q,
            })
            .collect())
    }

    fn blocking_ui_open(&self) -> bool {
        self.state.lock().blocking_ui_open
    }
}

impl ActionExecutor for SimulatedInventory {
    fn apply_to_target(&self, source: ItemHandle, target: ItemHandle) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        state.actions.push(RecordedAction::Apply { source, target });
        state.apply(source, target)
    }

    fn activate(&self, handle: ItemHandle) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        state.actions.push(RecordedAction::Activate(handle));
        state.activate(handle)
    }

    fn transfer_into(&self, container: ContainerRef, handle: ItemHandle) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        state.actions.push(RecordedAction::Transfer(container, handle));
        match container {
            ContainerRef::DistillWorkspace => state.transfer(handle),
        }
    }

    fn trigger_at(&self, point: ScreenPoint, click: ClickKind) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        state.actions.push(RecordedAction::Trigger(point, click));
        match click {
            ClickKind::Plain if point == self.finalize_button => state.finalize(),
            ClickKind::Transfer if point == self.retrieve_slot => state.retrieve(),
            _ => {}
        }
        Ok(())
    }

    fn send_key(&self, key: Key) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        state.actions.push(RecordedAction::Key(key));
        match key {
            Key::Escape => state.workspace = None,
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
