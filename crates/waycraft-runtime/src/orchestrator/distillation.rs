//! Distillation phase.
//!
//! Every selected item goes through the shared workspace: open it (once),
//! move the item in, feed it three reagent units, press finalize, take the
//! item back out, then re-read it to confirm it came back distilled. The
//! workspace stays open between items and is only reopened after a failed
//! transfer; if an item may still be sitting in the slot, the workspace is
//! closed with Escape first so the slot is empty again.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use waycraft_core::logging::emit_craft_error;
use waycraft_core::{CraftError, DISTILL_UNITS, ItemState, Resource, Result, ScreenPoint};
use waycraft_settings::{DistillationSettings, OpeningCost};

use super::{Pacing, check_cancel};
use crate::collaborators::{ActionExecutor, ClickKind, ContainerRef, Key, SnapshotProvider};
use crate::pool::ResourcePool;
use crate::report::{SessionReport, SkipReason};

/// Workspace geometry and accounting policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DistillConfig {
    /// Whether opening the workspace is charged to local accounting.
    pub opening_cost: OpeningCost,
    /// Finalize button position.
    pub finalize_button: ScreenPoint,
    /// Workspace item slot position.
    pub retrieve_slot: ScreenPoint,
}

impl DistillConfig {
    /// Units the batch precondition demands before anything is touched.
    pub fn required_units(&self) -> u32 {
        DISTILL_UNITS + self.opening_cost.units()
    }
}

impl From<&DistillationSettings> for DistillConfig {
    fn from(settings: &DistillationSettings) -> Self {
        Self {
            opening_cost: settings.opening_cost,
            finalize_button: settings.finalize_button,
            retrieve_slot: settings.retrieve_slot,
        }
    }
}

impl Default for DistillConfig {
    fn default() -> Self {
        Self::from(&DistillationSettings::default())
    }
}

/// What the orchestrator knows about the workspace window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Workspace {
    Closed,
    Open,
    /// Open, but an item may still occupy the slot.
    Dirty,
}

/// Runs the distillation batch.
pub struct DistillationOrchestrator<'a> {
    provider: &'a dyn SnapshotProvider,
    executor: &'a dyn ActionExecutor,
    cancel: &'a CancellationToken,
    pacing: Pacing,
    config: DistillConfig,
}

impl<'a> DistillationOrchestrator<'a> {
    /// Create an orchestrator over the given collaborators.
    pub fn new(
        provider: &'a dyn SnapshotProvider,
        executor: &'a dyn ActionExecutor,
        cancel: &'a CancellationToken,
        pacing: Pacing,
        config: DistillConfig,
    ) -> Self {
        Self {
            provider,
            executor,
            cancel,
            pacing,
            config,
        }
    }

    /// Distill `items` in order, drawing from `pool`.
    ///
    /// A pool below the batch minimum aborts the batch with a shortage and no
    /// action at all. Only errors that escalate past an item are returned.
    #[instrument(skip_all, fields(items = items.len(), reagent = %pool.kind()))]
    pub fn run(
        &self,
        items: &[ItemState],
        pool: &mut ResourcePool,
        report: &mut SessionReport,
    ) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let required = self.config.required_units();
        if pool.total() < required {
            let err = CraftError::Shortage {
                resource: Resource::Reagent(pool.kind()),
                needed: required,
                available: pool.total(),
            };
            emit_craft_error(&err, None);
            report.record_shortage(None, &err);
            return Ok(());
        }

        info!(pool = pool.total(), "distillation batch started");
        let mut workspace = Workspace::Closed;
        for item in items {
            check_cancel(self.cancel)?;
            match self.distill(item, pool, &mut workspace, report) {
                Ok(()) => {}
                Err(err) if err.escalates() => return Err(err),
                Err(err) => {
                    emit_craft_error(&err, Some(item.handle));
                    report.record_failure(item, &err);
                }
            }
            self.pacing.after_item();
        }
        Ok(())
    }

    fn distill(
        &self,
        item: &ItemState,
        pool: &mut ResourcePool,
        workspace: &mut Workspace,
        report: &mut SessionReport,
    ) -> Result<()> {
        // 1. eligibility
        check_cancel(self.cancel)?;
        let Some(raw) = self.provider.item(item.handle)? else {
            return Err(CraftError::StaleHandle {
                handle: item.handle,
                detail: "no longer in inventory".into(),
            });
        };
        let current = ItemState::from_raw(&raw);
        if !current.needs.eligible || !current.needs.needs_distillation {
            info!(item = %item.handle, "not eligible for distillation, skipping");
            report.record_skip(item, SkipReason::Ineligible);
            return Ok(());
        }

        // 2. workspace
        check_cancel(self.cancel)?;
        if *workspace != Workspace::Open {
            if *workspace == Workspace::Dirty {
                self.close_workspace();
            }
            *workspace = Workspace::Closed;
            self.open_workspace(pool)?;
            *workspace = Workspace::Open;
        }

        // 3. item in
        check_cancel(self.cancel)?;
        if let Err(err) = self
            .executor
            .transfer_into(ContainerRef::DistillWorkspace, item.handle)
        {
            *workspace = Workspace::Closed;
            return Err(err.into_craft_error(item.handle));
        }
        self.pacing.after_action();

        // 4. reagent
        check_cancel(self.cancel)?;
        if let Err(err) = pool.reserve(DISTILL_UNITS, self.provider) {
            self.retrieve(item, workspace);
            return Err(err);
        }
        for _ in 0..DISTILL_UNITS {
            check_cancel(self.cancel)?;
            let Some(unit) = pool.next_available() else {
                self.retrieve(item, workspace);
                return Err(CraftError::Unexpected(
                    "reserved reagent unit disappeared".into(),
                ));
            };
            if let Err(err) = self
                .executor
                .transfer_into(ContainerRef::DistillWorkspace, unit)
            {
                // Local accounting no longer matches the host.
                if let Err(refresh) = pool.refresh(self.provider) {
                    warn!(error = %refresh, "failed to resync reagent pool");
                }
                self.retrieve(item, workspace);
                return Err(err.into_craft_error(unit));
            }
            let _ = pool.consume(unit);
            self.pacing.after_action();
        }

        // 5. finalize
        check_cancel(self.cancel)?;
        if let Err(err) = self
            .executor
            .trigger_at(self.config.finalize_button, ClickKind::Plain)
        {
            self.retrieve(item, workspace);
            return Err(err.into_craft_error(item.handle));
        }
        self.pacing.after_action();

        // 6. item out
        check_cancel(self.cancel)?;
        if let Err(err) = self
            .executor
            .trigger_at(self.config.retrieve_slot, ClickKind::Transfer)
        {
            *workspace = Workspace::Dirty;
            return Err(err.into_craft_error(item.handle));
        }
        self.pacing.after_action();

        // 7. verify
        match self.provider.item(item.handle)? {
            Some(raw) if raw.finalized => {
                report.record_distilled(item);
                debug!(item = %item.handle, remaining = pool.total(), "item distilled");
                Ok(())
            }
            Some(_) => Err(CraftError::StaleHandle {
                handle: item.handle,
                detail: "not distilled after finalize".into(),
            }),
            None => {
                *workspace = Workspace::Dirty;
                Err(CraftError::StaleHandle {
                    handle: item.handle,
                    detail: "not back in inventory after retrieve".into(),
                })
            }
        }
    }

    /// Activate a reagent stack to bring up the workspace.
    fn open_workspace(&self, pool: &mut ResourcePool) -> Result<()> {
        let opening = self.config.opening_cost.units();
        pool.reserve(opening.max(1), self.provider)?;
        let Some(stack) = pool.next_available() else {
            return Err(CraftError::Unexpected("no reagent stack to open with".into()));
        };

        self.executor
            .activate(stack)
            .map_err(|err| err.into_craft_error(stack))?;
        if opening > 0 {
            let _ = pool.consume(stack);
        }
        debug!(stack = %stack, "workspace opened");
        self.pacing.after_action();
        Ok(())
    }

    /// Ctrl-click the item slot to send the item back to the inventory.
    fn retrieve(&self, item: &ItemState, workspace: &mut Workspace) {
        if let Err(err) = self
            .executor
            .trigger_at(self.config.retrieve_slot, ClickKind::Transfer)
        {
            warn!(item = %item.handle, error = %err, "failed to retrieve item from workspace");
            *workspace = Workspace::Dirty;
        }
    }

    /// Escape out of the workspace; the host returns anything left in the slot.
    fn close_workspace(&self) {
        if let Err(err) = self.executor.send_key(Key::Escape) {
            warn!(error = %err, "failed to close workspace");
        }
        self.pacing.after_action();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
