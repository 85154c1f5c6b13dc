//! # waycraft-core
//!
//! Foundation types for the waycraft workspace.
//!
//! - **Item model**: `ItemHandle`, `Rarity`, `ItemKind`, `RawItem`, `ItemState`
//! - **Need evaluation**: the pure `evaluate` policy table and `NeedSet`
//! - **Errors**: `CraftError` taxonomy shared by every orchestration phase
//! - **Branded IDs**: `SessionId` for correlating reports and log lines
//! - **Logging**: `tracing` subscriber bootstrap and in-memory capture for tests

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod item;
pub mod logging;
pub mod needs;

pub use errors::{CraftError, Result};
pub use ids::SessionId;
pub use item::{
    CurrencyKind, ItemHandle, ItemKind, ItemState, RawItem, Rarity, ReagentKind, Resource,
    ScreenPoint, StackSnapshot,
};
pub use needs::{DISTILL_UNITS, MAX_MODIFIERS, NeedSet, evaluate};
