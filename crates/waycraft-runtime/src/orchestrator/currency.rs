//! Currency phase.
//!
//! For each item: augmentation, alchemy, regal, then repeated exalts. The
//! item is re-read from the provider after every operation, so each decision
//! is made on authoritative state rather than on what the operation was
//! expected to do.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use waycraft_core::logging::emit_craft_error;
use waycraft_core::{CraftError, CurrencyKind, ItemState, MAX_MODIFIERS, Result};

use super::{Pacing, check_cancel};
use crate::collaborators::{ActionExecutor, SnapshotProvider};
use crate::errors::ActionError;
use crate::ledger::CurrencyLedger;
use crate::report::{SessionReport, SkipReason};

/// Single-shot upgrades, in application order. Exalts follow.
const UPGRADES: [CurrencyKind; 3] = [
    CurrencyKind::Augmentation,
    CurrencyKind::Alchemy,
    CurrencyKind::Regal,
];

/// Applies currency to items.
pub struct ItemOrchestrator<'a> {
    provider: &'a dyn SnapshotProvider,
    executor: &'a dyn ActionExecutor,
    cancel: &'a CancellationToken,
    pacing: Pacing,
}

impl<'a> ItemOrchestrator<'a> {
    /// Create an orchestrator over the given collaborators.
    pub fn new(
        provider: &'a dyn SnapshotProvider,
        executor: &'a dyn ActionExecutor,
        cancel: &'a CancellationToken,
        pacing: Pacing,
    ) -> Self {
        Self {
            provider,
            executor,
            cancel,
            pacing,
        }
    }

    /// Run the currency phase over `items`, in order.
    ///
    /// Only errors that escalate past an item are returned.
    #[instrument(skip_all, fields(items = items.len()))]
    pub fn run(
        &self,
        items: &mut [ItemState],
        ledger: &mut CurrencyLedger,
        report: &mut SessionReport,
    ) -> Result<()> {
        for item in items.iter_mut() {
            check_cancel(self.cancel)?;
            if !item.needs.has_currency_needs() {
                continue;
            }
            self.process(item, ledger, report)?;
            self.pacing.after_item();
        }
        Ok(())
    }

    /// Bring one item as far up the chain as currency allows.
    ///
    /// An item with no currency needs produces no external action.
    pub fn process(
        &self,
        item: &mut ItemState,
        ledger: &mut CurrencyLedger,
        report: &mut SessionReport,
    ) -> Result<()> {
        if !item.needs.has_currency_needs() {
            return Ok(());
        }
        if !item.needs.eligible {
            info!(item = %item.handle, "item not eligible, skipping");
            report.record_skip(item, SkipReason::Ineligible);
            return Ok(());
        }

        debug!(item = %item.handle, needs = %item.needs.summary(), "processing item");
        match self.upgrade(item, ledger, report) {
            Ok(()) => Ok(()),
            Err(err) if err.escalates() => Err(err),
            Err(err) => {
                emit_craft_error(&err, Some(item.handle));
                report.record_failure(item, &err);
                Ok(())
            }
        }
    }

    fn upgrade(
        &self,
        item: &mut ItemState,
        ledger: &mut CurrencyLedger,
        report: &mut SessionReport,
    ) -> Result<()> {
        for kind in UPGRADES {
            check_cancel(self.cancel)?;
            if !item.needs.requires(kind) {
                continue;
            }
            self.apply(kind, item, ledger, report)?;
            self.reread(item)?;
        }

        let budget = item.needs.exalts_remaining;
        for _ in 0..budget {
            check_cancel(self.cancel)?;
            self.reread(item)?;
            if item.modifiers >= MAX_MODIFIERS {
                debug!(item = %item.handle, "modifier cap reached");
                break;
            }
            self.apply(CurrencyKind::Exalted, item, ledger, report)?;
        }
        Ok(())
    }

    /// Use one unit of `kind` on `item`. Shortages and stale handles skip the
    /// operation without failing the item.
    fn apply(
        &self,
        kind: CurrencyKind,
        item: &ItemState,
        ledger: &mut CurrencyLedger,
        report: &mut SessionReport,
    ) -> Result<()> {
        let source = match ledger.take(kind, self.provider) {
            Ok(source) => source,
            Err(err) if !err.escalates() => {
                emit_craft_error(&err, Some(item.handle));
                report.record_shortage(Some(item.handle), &err);
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        match self.executor.apply_to_target(source, item.handle) {
            Ok(()) => {
                ledger.commit(kind, source);
                report.record_operation(item, kind);
                debug!(item = %item.handle, %kind, stack = %source, "currency applied");
            }
            Err(ActionError::ActionFailed(detail)) => {
                let err = CraftError::StaleHandle {
                    handle: item.handle,
                    detail,
                };
                emit_craft_error(&err, Some(item.handle));
            }
            Err(err) => return Err(err.into_craft_error(item.handle)),
        }

        self.pacing.after_action();
        Ok(())
    }

    /// Replace `item` with an authoritative re-read and re-derive its needs.
    fn reread(&self, item: &mut ItemState) -> Result<()> {
        match self.provider.item(item.handle)? {
            Some(raw) => {
                item.refresh(&raw);
                Ok(())
            }
            None => Err(CraftError::StaleHandle {
                handle: item.handle,
                detail: "no longer in inventory".into(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
