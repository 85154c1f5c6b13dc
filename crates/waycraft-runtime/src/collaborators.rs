//! External collaborators: the inventory reader and the input driver.
//!
//! Both are synchronous and called from the session worker thread. Neither
//! may cache: every call reflects the host's current state.

use waycraft_core::{CurrencyKind, ItemHandle, RawItem, ReagentKind, ScreenPoint, StackSnapshot};

use crate::errors::{ActionError, SnapshotError};

/// Read-only view of the host inventory.
pub trait SnapshotProvider: Send + Sync {
    /// Every inventory entry, classified.
    fn items(&self) -> Result<Vec<RawItem>, SnapshotError>;

    /// Authoritative re-read of one entry. `None` when the handle no longer
    /// resolves.
    fn item(&self, handle: ItemHandle) -> Result<Option<RawItem>, SnapshotError> {
        Ok(self.items()?.into_iter().find(|raw| raw.handle == handle))
    }

    /// Stacks of `kind`, in inventory order.
    fn reagent_units(&self, kind: ReagentKind) -> Result<Vec<StackSnapshot>, SnapshotError>;

    /// Stacks of `kind`, in inventory order.
    fn currency_units(&self, kind: CurrencyKind) -> Result<Vec<StackSnapshot>, SnapshotError>;

    /// Whether a UI state that forbids automation (e.g. an open stash) is up.
    fn blocking_ui_open(&self) -> bool;
}

/// Where [`ActionExecutor::transfer_into`] moves things.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ContainerRef {
    /// The distillation workspace window.
    DistillWorkspace,
}

/// Click flavor for [`ActionExecutor::trigger_at`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ClickKind {
    /// Plain left click.
    Plain,
    /// Ctrl-click: moves whatever is under the cursor back to the inventory.
    Transfer,
}

/// Keys the core ever presses.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Key {
    /// Closes open windows.
    Escape,
}

/// Translates abstract instructions into pointer and key events.
#[cfg_attr(test, mockall::automock)]
pub trait ActionExecutor: Send + Sync {
    /// Use the item at `source` on the item at `target`.
    fn apply_to_target(&self, source: ItemHandle, target: ItemHandle) -> Result<(), ActionError>;

    /// Activate (right-click) an item. On a reagent stack this opens the
    /// distillation workspace.
    fn activate(&self, handle: ItemHandle) -> Result<(), ActionError>;

    /// Move one unit of `handle` into `container`.
    fn transfer_into(&self, container: ContainerRef, handle: ItemHandle) -> Result<(), ActionError>;

    /// Click a fixed screen position.
    fn trigger_at(&self, point: ScreenPoint, click: ClickKind) -> Result<(), ActionError>;

    /// Press a key.
    fn send_key(&self, key: Key) -> Result<(), ActionError>;
}
