//! Currency ledger.
//!
//! Built once per session from the snapshot. Cached quantities only decide
//! which stack to try first: [`CurrencyLedger::take`] re-reads the
//! authoritative quantity of each candidate before handing it out, so a stack
//! the host reports as empty is never used even if the ledger still lists it.

use std::collections::BTreeMap;

use tracing::debug;
use waycraft_core::{CraftError, CurrencyKind, ItemHandle, Resource, StackSnapshot};

use crate::collaborators::SnapshotProvider;
use crate::errors::SnapshotError;

/// Available currency stacks grouped by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CurrencyLedger {
    stacks: BTreeMap<CurrencyKind, Vec<StackSnapshot>>,
}

impl CurrencyLedger {
    /// Build from the provider's current stacks of every kind.
    pub fn build(provider: &dyn SnapshotProvider) -> Result<Self, SnapshotError> {
        let mut stacks = BTreeMap::new();
        for kind in CurrencyKind::ALL {
            let units = provider.currency_units(kind)?;
            debug!(%kind, stacks = units.len(), "ledger entry");
            let _ = stacks.insert(kind, units);
        }
        Ok(Self { stacks })
    }

    /// Build from explicit stacks.
    pub fn from_stacks(stacks: impl IntoIterator<Item = (CurrencyKind, Vec<StackSnapshot>)>) -> Self {
        Self {
            stacks: stacks.into_iter().collect(),
        }
    }

    /// Cached units of `kind` across all stacks.
    pub fn total(&self, kind: CurrencyKind) -> u32 {
        self.stacks
            .get(&kind)
            .map_or(0, |stacks| stacks.iter().map(|s| s.quantity).sum())
    }

    /// Pick a stack of `kind` that the host confirms still holds at least one
    /// unit. Cached quantities are corrected along the way.
    ///
    /// Nothing is decremented here; call [`Self::commit`] once the currency
    /// was actually used.
    pub fn take(
        &mut self,
        kind: CurrencyKind,
        provider: &dyn SnapshotProvider,
    ) -> Result<ItemHandle, CraftError> {
        let Some(stacks) = self.stacks.get_mut(&kind) else {
            return Err(shortage(kind));
        };

        if !stacks.iter().any(|s| s.quantity > 0) {
            return Err(shortage(kind));
        }

        let live = provider.currency_units(kind)?;
        for stack in stacks.iter_mut().filter(|s| s.quantity > 0) {
            let quantity = live
                .iter()
                .find(|s| s.handle == stack.handle)
                .map_or(0, |s| s.quantity);
            stack.quantity = quantity;
            if quantity > 0 {
                return Ok(stack.handle);
            }
            debug!(%kind, stack = %stack.handle, "stack empty on re-validation");
        }

        Err(shortage(kind))
    }

    /// Record one unit of `handle` as spent.
    pub fn commit(&mut self, kind: CurrencyKind, handle: ItemHandle) {
        if let Some(stack) = self
            .stacks
            .get_mut(&kind)
            .and_then(|stacks| stacks.iter_mut().find(|s| s.handle == handle))
        {
            stack.quantity = stack.quantity.saturating_sub(1);
        }
    }
}

fn shortage(kind: CurrencyKind) -> CraftError {
    CraftError::Shortage {
        resource: Resource::Currency(kind),
        needed: 1,
        available: 0,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
