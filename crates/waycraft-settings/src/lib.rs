//! # waycraft-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`CraftSettings::default()`]
//! 2. **User file**: `~/.waycraft/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `WAYCRAFT_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton, initialized on first access via [`get_settings`].
static SETTINGS: OnceLock<CraftSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.waycraft/settings.json` with env
/// var overrides. If loading fails, the failure is logged and compiled
/// defaults are used.
pub fn get_settings() -> &'static CraftSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|err| {
            tracing::warn!(category = err.category(), "{err}; using default settings");
            CraftSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: CraftSettings) -> std::result::Result<(), CraftSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_path_under_home_dir() {
        let path = settings_path();
        assert!(path.ends_with(".waycraft/settings.json"));
    }

    #[test]
    fn default_settings_match_plugin_defaults() {
        let settings = CraftSettings::default();
        assert_eq!(settings.timing.currency_delay_ms, 200);
        assert_eq!(settings.timing.item_delay_ms, 500);
        assert_eq!(settings.timing.cancel_settle_ms, 1000);
        assert_eq!(settings.distillation.reagent, ReagentChoice::Paranoia);
        assert!(settings.focus.enabled);
        assert!(settings.processing.skip_distilled);
    }

    #[test]
    fn installed_settings_are_served_globally() {
        let mut custom = CraftSettings::default();
        custom.timing.currency_delay_ms = 350;
        custom.focus.enabled = false;

        assert!(init_settings(custom.clone()).is_ok());
        assert_eq!(get_settings(), &custom);

        let rejected = init_settings(CraftSettings::default()).unwrap_err();
        assert_eq!(rejected, CraftSettings::default());
        assert_eq!(get_settings().timing.currency_delay_ms, 350);
    }
}
