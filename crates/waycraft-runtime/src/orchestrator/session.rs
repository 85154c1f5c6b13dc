//! Session controller.
//!
//! Owns the reentrancy guard, the emergency stop and the fixed pipeline:
//! precondition check, focus click, snapshot, filter, currency phase,
//! distillation phase, cleanup. One session runs at a time; a cancelled
//! session keeps rejecting new starts until its settle period has passed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use waycraft_core::logging::emit_craft_error;
use waycraft_core::{CraftError, ItemState, Result, SessionId};
use waycraft_settings::CraftSettings;

use super::currency::ItemOrchestrator;
use super::distillation::{DistillConfig, DistillationOrchestrator};
use super::{Pacing, check_cancel};
use crate::collaborators::{ActionExecutor, ClickKind, Key, SnapshotProvider};
use crate::filter::WorkFilter;
use crate::ledger::CurrencyLedger;
use crate::pool::ResourcePool;
use crate::report::{SessionOutcome, SessionReport, SkipReason};

/// Reply to a start request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session began.
    Started(SessionId),
    /// A session is running or still settling after a cancel.
    AlreadyRunning,
}

/// Lifecycle state of the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Ready to start.
    Idle = 0,
    /// A session is in flight.
    Running = 1,
    /// Stop requested; the session is winding down or settling.
    CancelRequested = 2,
}

impl SessionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Running,
            2 => Self::CancelRequested,
            _ => Self::Idle,
        }
    }
}

/// Atomic tri-state session flag. Every transition is a compare-and-swap
/// from one exact state, so a late transition can never clobber a newer
/// session.
#[derive(Debug, Default)]
pub struct SessionFlag(AtomicU8);

impl SessionFlag {
    /// Current state.
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn transition(&self, from: SessionState, to: SessionState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn try_begin(&self) -> bool {
        self.transition(SessionState::Idle, SessionState::Running)
    }

    fn try_request_cancel(&self) -> bool {
        self.transition(SessionState::Running, SessionState::CancelRequested)
    }

    fn try_finish(&self) -> bool {
        self.transition(SessionState::Running, SessionState::Idle)
    }

    fn try_settle(&self) -> bool {
        self.transition(SessionState::CancelRequested, SessionState::Idle)
    }
}

/// Cloneable emergency stop for the controller's current session.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<SessionFlag>,
    token: Arc<Mutex<CancellationToken>>,
}

impl CancelHandle {
    /// Request an emergency stop. Returns `false` when nothing is running.
    pub fn request_cancel(&self) -> bool {
        let token = self.token.lock();
        if !self.flag.try_request_cancel() {
            return false;
        }
        token.cancel();
        warn!("emergency stop requested");
        true
    }
}

/// Collaborators and settings shared with the session worker.
struct Pipeline {
    provider: Arc<dyn SnapshotProvider>,
    executor: Arc<dyn ActionExecutor>,
    settings: CraftSettings,
}

/// Top-level driver.
pub struct SessionController {
    pipeline: Arc<Pipeline>,
    flag: Arc<SessionFlag>,
    token: Arc<Mutex<CancellationToken>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    last_report: Arc<Mutex<Option<SessionReport>>>,
}

impl SessionController {
    /// Create an idle controller.
    pub fn new(
        provider: Arc<dyn SnapshotProvider>,
        executor: Arc<dyn ActionExecutor>,
        settings: CraftSettings,
    ) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                provider,
                executor,
                settings,
            }),
            flag: Arc::new(SessionFlag::default()),
            token: Arc::new(Mutex::new(CancellationToken::new())),
            worker: Mutex::new(None),
            last_report: Arc::new(Mutex::new(None)),
        }
    }

    /// Settings the controller runs with.
    pub fn settings(&self) -> &CraftSettings {
        &self.pipeline.settings
    }

    /// Start a session on tokio's blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_session(&self) -> StartOutcome {
        let Some((session_id, cancel)) = self.begin() else {
            return StartOutcome::AlreadyRunning;
        };

        let pipeline = Arc::clone(&self.pipeline);
        let flag = Arc::clone(&self.flag);
        let last_report = Arc::clone(&self.last_report);
        let id = session_id.clone();
        let worker = tokio::task::spawn_blocking(move || {
            let report = pipeline.run(id, &cancel);
            *last_report.lock() = Some(report);
            release(&flag, pipeline.settings.timing.cancel_settle());
        });
        *self.worker.lock() = Some(worker);

        StartOutcome::Started(session_id)
    }

    /// Run a session on the calling thread and return once it has finished
    /// (including the post-cancel settle period).
    pub fn run_blocking(&self) -> StartOutcome {
        let Some((session_id, cancel)) = self.begin() else {
            return StartOutcome::AlreadyRunning;
        };

        let report = self.pipeline.run(session_id.clone(), &cancel);
        *self.last_report.lock() = Some(report);
        release(&self.flag, self.pipeline.settings.timing.cancel_settle());

        StartOutcome::Started(session_id)
    }

    /// Wait for the session started by [`Self::start_session`] to finish and
    /// return its report.
    pub async fn wait(&self) -> Option<SessionReport> {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(err) = worker.await {
                error!(error = %err, "session worker panicked");
            }
        }
        self.last_report()
    }

    /// Request an emergency stop of the running session.
    pub fn request_cancel(&self) -> bool {
        self.cancel_handle().request_cancel()
    }

    /// A handle that can stop this controller's sessions from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.flag),
            token: Arc::clone(&self.token),
        }
    }

    /// Whether a session is in flight and has not been asked to stop.
    pub fn is_running(&self) -> bool {
        self.flag.state() == SessionState::Running
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.flag.state()
    }

    /// Report of the most recently finished session.
    pub fn last_report(&self) -> Option<SessionReport> {
        self.last_report.lock().clone()
    }

    /// Claim the flag and arm a fresh cancellation token.
    fn begin(&self) -> Option<(SessionId, CancellationToken)> {
        let mut token = self.token.lock();
        if !self.flag.try_begin() {
            warn!(state = ?self.flag.state(), "session already running, start rejected");
            return None;
        }
        *token = CancellationToken::new();
        Some((SessionId::new(), token.clone()))
    }
}

/// Return the flag to idle. After a cancel the flag stays set for `settle`
/// so a stop keypress cannot immediately start another session.
fn release(flag: &Arc<SessionFlag>, settle: Duration) {
    if flag.try_finish() {
        return;
    }

    let flag = Arc::clone(flag);
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            drop(runtime.spawn(async move {
                tokio::time::sleep(settle).await;
                let _ = flag.try_settle();
            }));
        }
        Err(_) => {
            std::thread::sleep(settle);
            let _ = flag.try_settle();
        }
    }
}

impl Pipeline {
    #[instrument(skip_all, fields(session = %session_id))]
    fn run(&self, session_id: SessionId, cancel: &CancellationToken) -> SessionReport {
        let mut report = SessionReport::new(session_id);
        info!("session started");

        let outcome = match self.phases(cancel, &mut report) {
            Ok(()) => SessionOutcome::Completed,
            Err(CraftError::PreconditionFailed(detail)) => {
                emit_craft_error(&CraftError::PreconditionFailed(detail.clone()), None);
                report.finish(SessionOutcome::PreconditionFailed(detail));
                return report;
            }
            Err(CraftError::Cancelled) => {
                emit_craft_error(&CraftError::Cancelled, None);
                SessionOutcome::Cancelled
            }
            Err(err) => {
                emit_craft_error(&err, None);
                SessionOutcome::Faulted(err.to_string())
            }
        };

        self.cleanup();
        report.finish(outcome);
        info!(
            outcome = ?report.outcome,
            processed = report.items_processed(),
            skipped = report.items_skipped(),
            shortages = report.shortages.len(),
            "session finished"
        );
        report
    }

    fn phases(&self, cancel: &CancellationToken, report: &mut SessionReport) -> Result<()> {
        let provider = &*self.provider;
        let executor = &*self.executor;
        let settings = &self.settings;

        if provider.blocking_ui_open() {
            return Err(CraftError::PreconditionFailed(
                "a blocking window (stash) is open".into(),
            ));
        }

        if settings.focus.enabled {
            if let Err(err) = executor.trigger_at(settings.focus.point, ClickKind::Plain) {
                warn!(error = %err, "focus click failed");
            }
        }

        check_cancel(cancel)?;
        let raws = provider.items()?;
        let filter = WorkFilter::new(settings.processing.clone());
        let mut work = filter.select(&raws);
        for item in &work.ineligible {
            info!(item = %item.handle, "item not eligible, skipping");
            report.record_skip(item, SkipReason::Ineligible);
        }
        info!(items = work.items.len(), "work list built");

        let pacing = Pacing::from(&settings.timing);
        let mut ledger = CurrencyLedger::build(provider)?;
        ItemOrchestrator::new(provider, executor, cancel, pacing).run(
            &mut work.items,
            &mut ledger,
            report,
        )?;

        let Some(reagent) = settings.distillation.reagent.kind() else {
            info!("distillation disabled");
            return Ok(());
        };

        check_cancel(cancel)?;
        let candidates = self.distill_candidates(&work.items)?;
        let mut pool = ResourcePool::new(reagent);
        pool.refresh(provider)?;
        DistillationOrchestrator::new(
            provider,
            executor,
            cancel,
            pacing,
            DistillConfig::from(&settings.distillation),
        )
        .run(&candidates, &mut pool, report)
    }

    /// Fresh re-read of the work items, keeping those still awaiting
    /// distillation.
    fn distill_candidates(&self, items: &[ItemState]) -> Result<Vec<ItemState>> {
        let mut candidates = Vec::new();
        for item in items {
            if let Some(raw) = self.provider.item(item.handle)? {
                let fresh = ItemState::from_raw(&raw);
                if fresh.needs.needs_distillation && !fresh.finalized {
                    candidates.push(fresh);
                }
            }
        }
        Ok(candidates)
    }

    fn cleanup(&self) {
        if let Err(err) = self.executor.send_key(Key::Escape) {
            warn!(error = %err, "cleanup keypress failed");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
