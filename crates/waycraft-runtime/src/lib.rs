//! # waycraft-runtime
//!
//! Everything that talks to the host inventory.
//!
//! - **Collaborators**: the `SnapshotProvider` / `ActionExecutor` seams
//! - **Accounting**: `CurrencyLedger` and the reagent `ResourcePool`
//! - **Orchestration**: the currency phase, the distillation phase and the
//!   `SessionController` that sequences them behind a reentrancy guard
//! - **Reporting**: `SessionReport` and the pre-run `InventoryOverview`
//! - **Simulation**: `SimulatedInventory`, an in-memory host driven by JSON
//!   fixtures, used by the CLI and the tests

#![deny(unsafe_code)]

pub mod collaborators;
pub mod errors;
pub mod filter;
pub mod ledger;
pub mod orchestrator;
pub mod overview;
pub mod pool;
pub mod report;
pub mod sim;

pub use collaborators::{ActionExecutor, ClickKind, ContainerRef, Key, SnapshotProvider};
pub use errors::{ActionError, FixtureError, SnapshotError};
pub use filter::{WorkFilter, WorkList};
pub use ledger::CurrencyLedger;
pub use orchestrator::Pacing;
pub use orchestrator::currency::ItemOrchestrator;
pub use orchestrator::distillation::{DistillConfig, DistillationOrchestrator};
pub use orchestrator::session::{
    CancelHandle, SessionController, SessionFlag, SessionState, StartOutcome,
};
pub use overview::{InventoryOverview, ItemSummary};
pub use pool::ResourcePool;
pub use report::{ItemRecord, SessionOutcome, SessionReport, ShortageEvent, SkipReason};
pub use sim::{Fixture, RecordedAction, SimulatedInventory};
