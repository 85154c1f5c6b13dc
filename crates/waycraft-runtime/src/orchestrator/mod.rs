//! Orchestration: the currency phase, the distillation phase and the session
//! controller that sequences them.

pub mod currency;
pub mod distillation;
pub mod session;

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use waycraft_core::{CraftError, Result};
use waycraft_settings::TimingSettings;

/// Settle delays between external actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pacing {
    /// After each currency application or distillation click.
    pub action: Duration,
    /// Between items.
    pub item: Duration,
}

impl Pacing {
    /// No waiting at all.
    pub const INSTANT: Self = Self {
        action: Duration::ZERO,
        item: Duration::ZERO,
    };

    /// Block the worker for the action settle delay.
    pub fn after_action(&self) {
        settle(self.action);
    }

    /// Block the worker for the inter-item delay.
    pub fn after_item(&self) {
        settle(self.item);
    }
}

impl From<&TimingSettings> for Pacing {
    fn from(timing: &TimingSettings) -> Self {
        Self {
            action: timing.currency_delay(),
            item: timing.item_delay(),
        }
    }
}

fn settle(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

/// Fail with [`CraftError::Cancelled`] once the emergency stop fired.
pub(crate) fn check_cancel(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(CraftError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacing_from_timing() {
        let pacing = Pacing::from(&TimingSettings::default());
        assert_eq!(pacing.action, Duration::from_millis(200));
        assert_eq!(pacing.item, Duration::from_millis(500));
    }

    #[test]
    fn check_cancel_tracks_token() {
        let token = CancellationToken::new();
        assert!(check_cancel(&token).is_ok());
        token.cancel();
        assert_eq!(check_cancel(&token), Err(CraftError::Cancelled));
    }

    #[test]
    fn instant_pacing_does_not_block() {
        let start = std::time::Instant::now();
        Pacing::INSTANT.after_action();
        Pacing::INSTANT.after_item();
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
