//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`
//! so partial JSON is accepted: missing fields get their compiled default.

mod distillation;
mod focus;
mod processing;
mod timing;

pub use distillation::*;
pub use focus::*;
pub use processing::*;
pub use timing::*;

use serde::{Deserialize, Serialize};

use waycraft_core::ScreenPoint;

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// Loaded from `~/.waycraft/settings.json` with defaults applied for missing
/// fields. Environment variables can override specific values.
///
/// ```json
/// {
///   "timing": { "currencyDelayMs": 300 },
///   "distillation": { "reagent": "greed" }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CraftSettings {
    /// Settings schema version.
    pub version: String,
    /// Work-list filter.
    pub processing: ProcessingSettings,
    /// Settle delays.
    pub timing: TimingSettings,
    /// Distillation phase.
    pub distillation: DistillationSettings,
    /// Pre-session focus click.
    pub focus: FocusSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl Default for CraftSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            processing: ProcessingSettings::default(),
            timing: TimingSettings::default(),
            distillation: DistillationSettings::default(),
            focus: FocusSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl CraftSettings {
    /// Reject values outside their accepted ranges.
    pub fn validate(&self) -> Result<()> {
        check_range(
            "timing.currencyDelayMs",
            self.timing.currency_delay_ms,
            CURRENCY_DELAY_RANGE,
        )?;
        check_range(
            "timing.itemDelayMs",
            self.timing.item_delay_ms,
            ITEM_DELAY_RANGE,
        )?;
        check_range(
            "timing.cancelSettleMs",
            self.timing.cancel_settle_ms,
            CANCEL_SETTLE_RANGE,
        )?;
        check_point(
            "distillation.finalizeButton",
            self.distillation.finalize_button,
        )?;
        check_point("distillation.retrieveSlot", self.distillation.retrieve_slot)?;
        check_point("focus.point", self.focus.point)?;
        Ok(())
    }
}

fn check_range<T>(key: &str, value: T, (min, max): (T, T)) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(SettingsError::InvalidValue(format!(
            "{key} = {value} (expected {min}..={max})"
        )));
    }
    Ok(())
}

fn check_point(key: &str, point: ScreenPoint) -> Result<()> {
    check_range(&format!("{key}.x"), point.x, COORDINATE_RANGE)?;
    check_range(&format!("{key}.y"), point.y, COORDINATE_RANGE)
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive. `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
