//! Pacing between external actions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Accepted range for [`TimingSettings::currency_delay_ms`].
pub const CURRENCY_DELAY_RANGE: (u64, u64) = (50, 1000);

/// Accepted range for [`TimingSettings::item_delay_ms`].
pub const ITEM_DELAY_RANGE: (u64, u64) = (100, 2000);

/// Accepted range for [`TimingSettings::cancel_settle_ms`].
pub const CANCEL_SETTLE_RANGE: (u64, u64) = (0, 10_000);

/// Settle delays applied after mutating actions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimingSettings {
    /// Pause after each currency application or distillation click.
    pub currency_delay_ms: u64,
    /// Pause between waystones.
    pub item_delay_ms: u64,
    /// How long a cancelled session blocks new starts.
    pub cancel_settle_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            currency_delay_ms: 200,
            item_delay_ms: 500,
            cancel_settle_ms: 1000,
        }
    }
}

impl TimingSettings {
    /// Zero delays everywhere, for simulated runs and tests.
    pub fn instant() -> Self {
        Self {
            currency_delay_ms: 0,
            item_delay_ms: 0,
            cancel_settle_ms: 0,
        }
    }

    /// [`Self::currency_delay_ms`] as a duration.
    pub fn currency_delay(&self) -> Duration {
        Duration::from_millis(self.currency_delay_ms)
    }

    /// [`Self::item_delay_ms`] as a duration.
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    /// [`Self::cancel_settle_ms`] as a duration.
    pub fn cancel_settle(&self) -> Duration {
        Duration::from_millis(self.cancel_settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let t = TimingSettings::default();
        assert_eq!(t.currency_delay(), Duration::from_millis(200));
        assert_eq!(t.item_delay(), Duration::from_millis(500));
        assert_eq!(t.cancel_settle(), Duration::from_secs(1));
    }

    #[test]
    fn instant_is_zero() {
        let t = TimingSettings::instant();
        assert_eq!(t.currency_delay(), Duration::ZERO);
        assert_eq!(t.item_delay(), Duration::ZERO);
        assert_eq!(t.cancel_settle(), Duration::ZERO);
    }
}
