//! End-to-end sessions against the simulated inventory.

use std::sync::{Arc, Mutex, OnceLock, mpsc};
use std::time::Duration;

use waycraft_core::{CurrencyKind, ItemHandle, Rarity, ReagentKind, ScreenPoint};
use waycraft_runtime::{
    ActionError, ActionExecutor, CancelHandle, ClickKind, ContainerRef, Fixture, Key,
    RecordedAction, SessionController, SessionOutcome, SessionState, SimulatedInventory,
    SkipReason, StartOutcome,
};
use waycraft_settings::{CraftSettings, OpeningCost, TimingSettings};

const PARANOIA: ReagentKind = ReagentKind::LiquidParanoia;
const FINALIZE: ScreenPoint = ScreenPoint::new(935, 868);
const RETRIEVE: ScreenPoint = ScreenPoint::new(935, 460);
const FOCUS: ScreenPoint = ScreenPoint::new(100, 100);

fn h(raw: u64) -> ItemHandle {
    ItemHandle::new(raw)
}

fn instant() -> CraftSettings {
    CraftSettings {
        timing: TimingSettings::instant(),
        ..CraftSettings::default()
    }
}

fn run(sim: &Arc<SimulatedInventory>, settings: CraftSettings) -> waycraft_runtime::SessionReport {
    let controller = SessionController::new(sim.clone(), sim.clone(), settings);
    assert!(matches!(controller.run_blocking(), StartOutcome::Started(_)));
    controller.last_report().expect("report after run")
}

fn count(sim: &SimulatedInventory, action: &RecordedAction) -> usize {
    sim.actions().iter().filter(|a| *a == action).count()
}

fn distill_actions(sim: &SimulatedInventory) -> usize {
    sim.actions()
        .iter()
        .filter(|a| {
            matches!(
                a,
                RecordedAction::Activate(_) | RecordedAction::Transfer(..)
            ) || matches!(a, RecordedAction::Trigger(p, _) if *p != FOCUS)
        })
        .count()
}

// ── full pipeline ───────────────────────────────────────────────────

#[test]
fn normal_waystone_is_fully_crafted() {
    let sim = Arc::new(SimulatedInventory::new(
        Fixture::default()
            .with_waystone(1, Rarity::Normal, 0)
            .with_currency(11, CurrencyKind::Alchemy, 1)
            .with_currency(13, CurrencyKind::Exalted, 5)
            .with_reagent(20, PARANOIA, 5),
    ));

    let report = run(&sim, instant());

    assert_eq!(report.outcome, SessionOutcome::Completed);
    let item = sim.waystone(h(1)).unwrap();
    assert_eq!(item.rarity, Rarity::Rare);
    assert_eq!(item.modifiers, 6);
    assert!(item.finalized);

    let record = report.item(h(1)).unwrap();
    assert_eq!(
        record.operations,
        vec![
            CurrencyKind::Alchemy,
            CurrencyKind::Exalted,
            CurrencyKind::Exalted
        ]
    );
    assert!(record.distilled);
    assert_eq!(report.items_processed(), 1);
    assert!(report.shortages.is_empty());

    assert_eq!(sim.currency_quantity(h(11)), Some(0));
    assert_eq!(sim.currency_quantity(h(13)), Some(3));
    assert_eq!(sim.reagent_total(PARANOIA), 2);

    assert_eq!(
        sim.actions(),
        vec![
            RecordedAction::Trigger(FOCUS, ClickKind::Plain),
            RecordedAction::Apply { source: h(11), target: h(1) },
            RecordedAction::Apply { source: h(13), target: h(1) },
            RecordedAction::Apply { source: h(13), target: h(1) },
            RecordedAction::Activate(h(20)),
            RecordedAction::Transfer(ContainerRef::DistillWorkspace, h(1)),
            RecordedAction::Transfer(ContainerRef::DistillWorkspace, h(20)),
            RecordedAction::Transfer(ContainerRef::DistillWorkspace, h(20)),
            RecordedAction::Transfer(ContainerRef::DistillWorkspace, h(20)),
            RecordedAction::Trigger(FINALIZE, ClickKind::Plain),
            RecordedAction::Trigger(RETRIEVE, ClickKind::Transfer),
            RecordedAction::Key(Key::Escape),
        ]
    );
    assert_eq!(sim.snapshot_reads(), 1);
}

#[test]
fn mixed_inventory_shares_one_workspace() {
    let sim = Arc::new(SimulatedInventory::new(
        Fixture::default()
            .with_waystone(1, Rarity::Magic, 1)
            .with_waystone(2, Rarity::Rare, 6)
            .with_waystone(3, Rarity::Rare, 4)
            .with_currency(10, CurrencyKind::Augmentation, 2)
            .with_currency(12, CurrencyKind::Regal, 2)
            .with_currency(13, CurrencyKind::Exalted, 10)
            .with_reagent(20, PARANOIA, 4)
            .with_reagent(21, PARANOIA, 10),
    ));

    let report = run(&sim, instant());

    assert_eq!(report.outcome, SessionOutcome::Completed);
    for handle in [1, 2, 3] {
        let item = sim.waystone(h(handle)).unwrap();
        assert_eq!(item.modifiers, 6, "{handle}");
        assert!(item.finalized, "{handle}");
    }
    assert_eq!(report.items_processed(), 3);
    assert_eq!(count(&sim, &RecordedAction::Activate(h(20))), 1);
    assert_eq!(sim.reagent_total(PARANOIA), 5);
    assert_eq!(count(&sim, &RecordedAction::Key(Key::Escape)), 1);
}

// ── shortages ───────────────────────────────────────────────────────

#[test]
fn batch_shortage_performs_no_distillation() {
    let mut fixture = Fixture::default().with_reagent(20, PARANOIA, 2);
    for handle in 1..=5 {
        fixture = fixture.with_waystone(handle, Rarity::Rare, 6);
    }
    let sim = Arc::new(SimulatedInventory::new(fixture));

    let report = run(&sim, instant());

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(report.shortages.len(), 1);
    assert_eq!(report.shortages[0].item, None);
    assert_eq!(report.shortages[0].available, 2);
    assert_eq!(distill_actions(&sim), 0);
    assert_eq!(sim.reagent_total(PARANOIA), 2);
    assert_eq!(report.items_processed(), 0);
}

#[test]
fn separate_opening_cost_raises_batch_minimum() {
    let sim = Arc::new(SimulatedInventory::new(
        Fixture::default()
            .with_waystone(1, Rarity::Rare, 6)
            .with_reagent(20, PARANOIA, 3),
    ));
    let mut settings = instant();
    settings.distillation.opening_cost = OpeningCost::Separate;

    let report = run(&sim, settings);

    assert_eq!(report.shortages.len(), 1);
    assert_eq!(report.shortages[0].needed, 4);
    assert_eq!(distill_actions(&sim), 0);
}

#[test]
fn second_item_short_of_reagent_is_skipped() {
    let sim = Arc::new(SimulatedInventory::new(
        Fixture::default()
            .with_waystone(1, Rarity::Rare, 6)
            .with_waystone(2, Rarity::Rare, 6)
            .with_reagent(20, PARANOIA, 4),
    ));

    let report = run(&sim, instant());

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert!(sim.waystone(h(1)).unwrap().finalized);
    assert!(!sim.waystone(h(2)).unwrap().finalized);
    assert_eq!(sim.reagent_total(PARANOIA), 1);
    let second = report.item(h(2)).unwrap();
    assert_eq!(
        second.skipped,
        Some(SkipReason::Shortage(waycraft_core::Resource::Reagent(PARANOIA)))
    );
    assert_eq!(report.shortages.len(), 1);
    assert_eq!(report.shortages[0].item, Some(h(2)));
    assert_eq!(sim.workspace_item(), None);
}

#[test]
fn currency_shortage_skips_only_that_operation() {
    let sim = Arc::new(SimulatedInventory::new(
        Fixture::default()
            .with_waystone(1, Rarity::Normal, 0)
            .with_currency(11, CurrencyKind::Alchemy, 1)
            .with_currency(13, CurrencyKind::Exalted, 1)
            .with_reagent(20, PARANOIA, 3),
    ));

    let report = run(&sim, instant());

    let record = report.item(h(1)).unwrap();
    assert_eq!(
        record.operations,
        vec![CurrencyKind::Alchemy, CurrencyKind::Exalted]
    );
    assert_eq!(record.skipped, None);
    assert_eq!(report.shortages.len(), 1);
    assert_eq!(
        report.shortages[0].resource,
        waycraft_core::Resource::Currency(CurrencyKind::Exalted)
    );
    assert_eq!(report.shortages[0].item, Some(h(1)));

    // Still short one modifier, but distilled at the end of the chain.
    let item = sim.waystone(h(1)).unwrap();
    assert_eq!(item.modifiers, 5);
    assert!(item.finalized);
}

#[test]
fn distillation_disabled_leaves_reagent_alone() {
    let sim = Arc::new(SimulatedInventory::new(
        Fixture::default()
            .with_waystone(1, Rarity::Rare, 5)
            .with_currency(13, CurrencyKind::Exalted, 1)
            .with_reagent(20, PARANOIA, 9),
    ));
    let mut settings = instant();
    settings.distillation.reagent = waycraft_settings::ReagentChoice::None;

    let report = run(&sim, settings);

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(sim.waystone(h(1)).unwrap().modifiers, 6);
    assert!(!sim.waystone(h(1)).unwrap().finalized);
    assert_eq!(sim.reagent_total(PARANOIA), 9);
    assert_eq!(distill_actions(&sim), 0);
}

#[test]
fn blocking_ui_fails_the_precondition() {
    let sim = Arc::new(SimulatedInventory::new(Fixture {
        blocking_ui_open: true,
        ..Fixture::default().with_waystone(1, Rarity::Normal, 0)
    }));

    let report = run(&sim, instant());

    assert!(matches!(report.outcome, SessionOutcome::PreconditionFailed(_)));
    assert!(sim.actions().is_empty());
}

// ── cancellation ────────────────────────────────────────────────────

/// Forwards to the simulator and fires the emergency stop right after the
/// first waystone lands in the workspace.
struct StopAfterItemTransfer {
    sim: Arc<SimulatedInventory>,
    stop: Arc<OnceLock<CancelHandle>>,
}

impl ActionExecutor for StopAfterItemTransfer {
    fn apply_to_target(&self, source: ItemHandle, target: ItemHandle) -> Result<(), ActionError> {
        self.sim.apply_to_target(source, target)
    }

    fn activate(&self, handle: ItemHandle) -> Result<(), ActionError> {
        self.sim.activate(handle)
    }

    fn transfer_into(&self, container: ContainerRef, handle: ItemHandle) -> Result<(), ActionError> {
        self.sim.transfer_into(container, handle)?;
        if handle == h(1) {
            if let Some(stop) = self.stop.get() {
                assert!(stop.request_cancel());
            }
        }
        Ok(())
    }

    fn trigger_at(&self, point: ScreenPoint, click: ClickKind) -> Result<(), ActionError> {
        self.sim.trigger_at(point, click)
    }

    fn send_key(&self, key: Key) -> Result<(), ActionError> {
        self.sim.send_key(key)
    }
}

#[test]
fn cancel_between_transfer_and_consume_spends_nothing() {
    let sim = Arc::new(SimulatedInventory::new(
        Fixture::default()
            .with_waystone(1, Rarity::Rare, 6)
            .with_waystone(2, Rarity::Rare, 6)
            .with_reagent(20, PARANOIA, 9),
    ));
    let stop = Arc::new(OnceLock::new());
    let executor = Arc::new(StopAfterItemTransfer {
        sim: sim.clone(),
        stop: stop.clone(),
    });
    let controller = SessionController::new(sim.clone(), executor, instant());
    let _ = stop.set(controller.cancel_handle());

    let _ = controller.run_blocking();
    let report = controller.last_report().unwrap();

    assert_eq!(report.outcome, SessionOutcome::Cancelled);
    assert_eq!(sim.reagent_total(PARANOIA), 9);
    assert!(!sim.waystone(h(1)).unwrap().finalized);
    assert_eq!(count(&sim, &RecordedAction::Key(Key::Escape)), 1);
    assert_eq!(sim.actions().last(), Some(&RecordedAction::Key(Key::Escape)));
    assert!(!sim.workspace_open());
    assert_eq!(controller.state(), SessionState::Idle);
}

// ── reentrancy ──────────────────────────────────────────────────────

/// Holds the first focus click until the test releases it.
struct GatedExecutor {
    sim: Arc<SimulatedInventory>,
    entered: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<Option<mpsc::Receiver<()>>>,
}

impl GatedExecutor {
    fn new(sim: Arc<SimulatedInventory>) -> (Self, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let executor = Self {
            sim,
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(Some(release_rx)),
        };
        (executor, entered_rx, release_tx)
    }

    fn gate(&self) {
        let release = self.release.lock().unwrap().take();
        if let Some(release) = release {
            if let Some(entered) = self.entered.lock().unwrap().take() {
                entered.send(()).unwrap();
            }
            release.recv().unwrap();
        }
    }
}

impl ActionExecutor for GatedExecutor {
    fn apply_to_target(&self, source: ItemHandle, target: ItemHandle) -> Result<(), ActionError> {
        self.sim.apply_to_target(source, target)
    }

    fn activate(&self, handle: ItemHandle) -> Result<(), ActionError> {
        self.sim.activate(handle)
    }

    fn transfer_into(&self, container: ContainerRef, handle: ItemHandle) -> Result<(), ActionError> {
        self.sim.transfer_into(container, handle)
    }

    fn trigger_at(&self, point: ScreenPoint, click: ClickKind) -> Result<(), ActionError> {
        self.gate();
        self.sim.trigger_at(point, click)
    }

    fn send_key(&self, key: Key) -> Result<(), ActionError> {
        self.sim.send_key(key)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_start_is_rejected_without_a_snapshot() {
    let sim = Arc::new(SimulatedInventory::new(
        Fixture::default()
            .with_waystone(1, Rarity::Rare, 6)
            .with_reagent(20, PARANOIA, 3),
    ));
    let (executor, entered, release) = GatedExecutor::new(sim.clone());
    let controller = SessionController::new(sim.clone(), Arc::new(executor), instant());

    assert!(matches!(controller.start_session(), StartOutcome::Started(_)));
    entered.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(controller.is_running());

    let reads = sim.snapshot_reads();
    assert_eq!(controller.start_session(), StartOutcome::AlreadyRunning);
    assert_eq!(sim.snapshot_reads(), reads);

    release.send(()).unwrap();
    let report = controller.wait().await.unwrap();
    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(sim.snapshot_reads(), 1);
    assert!(!controller.is_running());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_session_settles_before_next_start() {
    let sim = Arc::new(SimulatedInventory::new(
        Fixture::default()
            .with_waystone(1, Rarity::Rare, 6)
            .with_reagent(20, PARANOIA, 3),
    ));
    let (executor, entered, release) = GatedExecutor::new(sim.clone());
    let mut settings = instant();
    settings.timing.cancel_settle_ms = 300;
    let controller = SessionController::new(sim.clone(), Arc::new(executor), settings);

    assert!(matches!(controller.start_session(), StartOutcome::Started(_)));
    entered.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(controller.request_cancel());
    assert!(!controller.is_running());
    release.send(()).unwrap();

    let report = controller.wait().await.unwrap();
    assert_eq!(report.outcome, SessionOutcome::Cancelled);
    assert_eq!(sim.snapshot_reads(), 0);
    assert_eq!(controller.state(), SessionState::CancelRequested);
    assert_eq!(controller.start_session(), StartOutcome::AlreadyRunning);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(controller.state(), SessionState::Idle);
    assert!(matches!(controller.start_session(), StartOutcome::Started(_)));
    let report = controller.wait().await.unwrap();
    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert!(sim.waystone(h(1)).unwrap().finalized);
}

// ── fixtures ────────────────────────────────────────────────────────

#[test]
fn sample_fixture_runs_to_completion() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures/sample-inventory.json");
    let sim = Arc::new(SimulatedInventory::from_fixture_file(&path).unwrap());

    let report = run(&sim, instant());

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert!(report.items_processed() > 0);
}
