//! Session report.
//!
//! Every skip and shortage that happens during a session lands here as well
//! as in the log, so a caller can tell what was done without scraping logs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use waycraft_core::{CraftError, CurrencyKind, ItemHandle, ItemState, Resource, SessionId};

/// How a session ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum SessionOutcome {
    /// Still running.
    Running,
    /// Every phase ran to the end.
    Completed,
    /// Stopped by an emergency stop.
    Cancelled,
    /// A blocking external state prevented the session from starting.
    PreconditionFailed(String),
    /// An unexpected error aborted the remaining phases.
    Faulted(String),
}

/// Why an item was left alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum SkipReason {
    /// Locked or otherwise not touchable.
    Ineligible,
    /// The handle stopped resolving mid-session.
    StaleHandle(String),
    /// Not enough of a resource to finish the item.
    Shortage(Resource),
}

/// What happened to one item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    /// Item handle.
    pub handle: ItemHandle,
    /// Display name.
    pub name: String,
    /// Currency applied, in order.
    pub operations: Vec<CurrencyKind>,
    /// Whether the distillation step finished.
    pub distilled: bool,
    /// Set when the item was skipped (or a step of it was).
    pub skipped: Option<SkipReason>,
}

impl ItemRecord {
    fn new(handle: ItemHandle, name: &str) -> Self {
        Self {
            handle,
            name: name.to_owned(),
            operations: Vec::new(),
            distilled: false,
            skipped: None,
        }
    }

    /// Whether any mutating work landed on the item.
    pub fn was_processed(&self) -> bool {
        !self.operations.is_empty() || self.distilled
    }
}

/// A resource ran short.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortageEvent {
    /// Item being worked on, or `None` for a batch-wide precondition.
    pub item: Option<ItemHandle>,
    /// What ran short.
    pub resource: Resource,
    /// Units required.
    pub needed: u32,
    /// Units obtainable.
    pub available: u32,
}

/// Outcome of one session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    /// Correlates the report with log lines.
    pub session_id: SessionId,
    /// Final (or current) outcome.
    pub outcome: SessionOutcome,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// When the session ended.
    pub finished_at: Option<DateTime<Utc>>,
    /// Per-item records in first-touched order.
    pub items: Vec<ItemRecord>,
    /// Every shortage encountered.
    pub shortages: Vec<ShortageEvent>,
}

impl SessionReport {
    /// A fresh report for a session that is starting now.
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            outcome: SessionOutcome::Running,
            started_at: Utc::now(),
            finished_at: None,
            items: Vec::new(),
            shortages: Vec::new(),
        }
    }

    /// Items that received at least one mutating operation.
    pub fn items_processed(&self) -> usize {
        self.items.iter().filter(|r| r.was_processed()).count()
    }

    /// Items with a skip recorded.
    pub fn items_skipped(&self) -> usize {
        self.items.iter().filter(|r| r.skipped.is_some()).count()
    }

    /// Record for `handle`, if the item was touched.
    pub fn item(&self, handle: ItemHandle) -> Option<&ItemRecord> {
        self.items.iter().find(|r| r.handle == handle)
    }

    fn record_mut(&mut self, item: &ItemState) -> &mut ItemRecord {
        let index = match self.items.iter().position(|r| r.handle == item.handle) {
            Some(index) => index,
            None => {
                self.items.push(ItemRecord::new(item.handle, &item.name));
                self.items.len() - 1
            }
        };
        &mut self.items[index]
    }

    /// Note a successful currency application.
    pub fn record_operation(&mut self, item: &ItemState, kind: CurrencyKind) {
        self.record_mut(item).operations.push(kind);
    }

    /// Note a finished distillation.
    pub fn record_distilled(&mut self, item: &ItemState) {
        self.record_mut(item).distilled = true;
    }

    /// Note that `item` (or a step of it) was skipped.
    pub fn record_skip(&mut self, item: &ItemState, reason: SkipReason) {
        self.record_mut(item).skipped = Some(reason);
    }

    /// Note an item-local failure. Shortages are also added to
    /// [`Self::shortages`].
    pub fn record_failure(&mut self, item: &ItemState, err: &CraftError) {
        let reason = match err {
            CraftError::Shortage { resource, .. } => {
                self.record_shortage(Some(item.handle), err);
                SkipReason::Shortage(*resource)
            }
            CraftError::StaleHandle { detail, .. } => SkipReason::StaleHandle(detail.clone()),
            other => SkipReason::StaleHandle(other.to_string()),
        };
        self.record_skip(item, reason);
    }

    /// Add a shortage event. Non-shortage errors are ignored.
    pub fn record_shortage(&mut self, item: Option<ItemHandle>, err: &CraftError) {
        if let CraftError::Shortage {
            resource,
            needed,
            available,
        } = err
        {
            self.shortages.push(ShortageEvent {
                item,
                resource: *resource,
                needed: *needed,
                available: *available,
            });
        }
    }

    /// Stamp the final outcome.
    pub fn finish(&mut self, outcome: SessionOutcome) {
        self.outcome = outcome;
        self.finished_at = Some(Utc::now());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
