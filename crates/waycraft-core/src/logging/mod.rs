//! Structured logging with `tracing`.
//!
//! - [`init_subscriber`] installs the process-wide stderr subscriber
//! - [`emit_craft_error`] logs a [`CraftError`] at the severity it implies
//! - [`test_utils`] captures events in memory for assertions

pub mod test_utils;

pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};

use tracing::Level;

use crate::errors::CraftError;
use crate::item::ItemHandle;

/// Initialize the global tracing subscriber with stderr output.
///
/// Call once at application startup. Subsequent calls are no-ops.
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // set_global_default is a no-op if already set
    let _ = subscriber.try_init();
}

/// Log a crafting error with its category, at the level its blast radius
/// calls for.
pub fn emit_craft_error(err: &CraftError, item: Option<ItemHandle>) {
    let category = err.category();
    let item = item.map(|h| h.to_string()).unwrap_or_default();
    match err.severity() {
        Level::ERROR => tracing::error!(category, item = %item, "{err}"),
        Level::WARN => tracing::warn!(category, item = %item, "{err}"),
        _ => tracing::info!(category, item = %item, "{err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{CurrencyKind, Resource};

    #[test]
    fn init_subscriber_does_not_panic() {
        init_subscriber("warn");
        init_subscriber("debug");
    }

    #[test]
    fn shortage_logged_as_info() {
        let (logs, _guard) = capture_logs();
        let err = CraftError::Shortage {
            resource: Resource::Currency(CurrencyKind::Exalted),
            needed: 1,
            available: 0,
        };
        emit_craft_error(&err, Some(ItemHandle::new(3)));

        assert!(logs.has_event(Level::INFO, "shortage of Exalted Orb"));
        let events = logs.events();
        assert!(
            events[0]
                .fields
                .iter()
                .any(|(k, v)| k == "category" && v == "shortage")
        );
        assert!(
            events[0]
                .fields
                .iter()
                .any(|(k, v)| k == "item" && v == "item#3")
        );
    }

    #[test]
    fn precondition_logged_as_error() {
        let (logs, _guard) = capture_logs();
        emit_craft_error(&CraftError::PreconditionFailed("stash open".into()), None);
        assert!(logs.has_event(Level::ERROR, "stash open"));
    }
}
