//! Pre-session focus click.

use serde::{Deserialize, Serialize};

use waycraft_core::ScreenPoint;

/// A click on a neutral screen position that gives the game window focus
/// before the first real action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FocusSettings {
    /// Whether to click at all.
    pub enabled: bool,
    /// Where to click.
    pub point: ScreenPoint,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            point: ScreenPoint::new(100, 100),
        }
    }
}
