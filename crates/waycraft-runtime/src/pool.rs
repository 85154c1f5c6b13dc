//! Reagent pool.
//!
//! Local accounting for one reagent kind across several stacks. The cached
//! total always equals the sum of the unit quantities; consumption always
//! draws from the first stack that still has something left.

use tracing::debug;
use waycraft_core::{CraftError, ItemHandle, ReagentKind, Resource, StackSnapshot};

use crate::collaborators::SnapshotProvider;
use crate::errors::SnapshotError;

/// Reagent stacks plus their cached total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourcePool {
    kind: ReagentKind,
    units: Vec<StackSnapshot>,
    total: u32,
}

impl ResourcePool {
    /// An empty pool for `kind`. Call [`Self::refresh`] before use.
    pub fn new(kind: ReagentKind) -> Self {
        Self {
            kind,
            units: Vec::new(),
            total: 0,
        }
    }

    /// A pool over explicit stacks.
    pub fn from_units(kind: ReagentKind, units: Vec<StackSnapshot>) -> Self {
        let total = units.iter().map(|u| u.quantity).sum();
        Self { kind, units, total }
    }

    /// Replace local accounting with the provider's current stacks.
    pub fn refresh(&mut self, provider: &dyn SnapshotProvider) -> Result<(), SnapshotError> {
        *self = Self::from_units(self.kind, provider.reagent_units(self.kind)?);
        debug!(reagent = %self.kind, stacks = self.units.len(), total = self.total, "pool refreshed");
        Ok(())
    }

    /// Reagent kind this pool tracks.
    pub fn kind(&self) -> ReagentKind {
        self.kind
    }

    /// Units believed to be available.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Stacks in consumption order.
    pub fn units(&self) -> &[StackSnapshot] {
        &self.units
    }

    /// First stack with at least one unit left.
    pub fn next_available(&self) -> Option<ItemHandle> {
        self.units.iter().find(|u| u.quantity > 0).map(|u| u.handle)
    }

    /// Make sure at least `needed` units are obtainable, refreshing from the
    /// provider once if local accounting says otherwise.
    pub fn reserve(
        &mut self,
        needed: u32,
        provider: &dyn SnapshotProvider,
    ) -> Result<(), CraftError> {
        if self.total >= needed {
            return Ok(());
        }
        self.refresh(provider)?;
        if self.total >= needed {
            return Ok(());
        }
        Err(CraftError::Shortage {
            resource: Resource::Reagent(self.kind),
            needed,
            available: self.total,
        })
    }

    /// Record one unit of `handle` as spent. Returns `false` when the stack is
    /// unknown or already empty, in which case nothing changes.
    pub fn consume(&mut self, handle: ItemHandle) -> bool {
        match self
            .units
            .iter_mut()
            .find(|u| u.handle == handle && u.quantity > 0)
        {
            Some(unit) => {
                unit.quantity -= 1;
                self.total -= 1;
                true
            }
            None => false,
        }
    }

    /// Draw one unit from the first non-empty stack.
    pub fn decrement(&mut self) -> Option<ItemHandle> {
        let handle = self.next_available()?;
        let _ = self.consume(handle);
        Some(handle)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
