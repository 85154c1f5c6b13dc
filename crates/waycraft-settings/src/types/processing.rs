//! Work-list filter settings.

use serde::{Deserialize, Serialize};

use waycraft_core::Rarity;

/// Which waystones a session is allowed to touch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingSettings {
    /// Process normal-rarity waystones.
    pub process_normal: bool,
    /// Process magic-rarity waystones.
    pub process_magic: bool,
    /// Process rare-rarity waystones.
    pub process_rare: bool,
    /// Leave waystones that already carry the distilled modifier alone.
    pub skip_distilled: bool,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            process_normal: true,
            process_magic: true,
            process_rare: true,
            skip_distilled: true,
        }
    }
}

impl ProcessingSettings {
    /// Whether waystones of `rarity` are enabled.
    pub fn allows(&self, rarity: Rarity) -> bool {
        match rarity {
            Rarity::Normal => self.process_normal,
            Rarity::Magic => self.process_magic,
            Rarity::Rare => self.process_rare,
        }
    }
}
