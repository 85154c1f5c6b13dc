//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`CraftSettings::default()`]
//! 2. If `~/.waycraft/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `WAYCRAFT_*` environment variable overrides (highest priority)
//! 4. Validate ranges
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{CANCEL_SETTLE_RANGE, CURRENCY_DELAY_RANGE, CraftSettings, ITEM_DELAY_RANGE};

/// Resolve the path to the settings file (`~/.waycraft/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".waycraft").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<CraftSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON or out-of-range values are
/// errors.
pub fn load_settings_from_path(path: &Path) -> Result<CraftSettings> {
    let defaults = serde_json::to_value(CraftSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: CraftSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning and fall back to file/default.
pub fn apply_env_overrides(settings: &mut CraftSettings) {
    // ── Processing ──────────────────────────────────────────────────
    if let Some(v) = read_env_bool("WAYCRAFT_PROCESS_NORMAL") {
        settings.processing.process_normal = v;
    }
    if let Some(v) = read_env_bool("WAYCRAFT_PROCESS_MAGIC") {
        settings.processing.process_magic = v;
    }
    if let Some(v) = read_env_bool("WAYCRAFT_PROCESS_RARE") {
        settings.processing.process_rare = v;
    }
    if let Some(v) = read_env_bool("WAYCRAFT_SKIP_DISTILLED") {
        settings.processing.skip_distilled = v;
    }

    // ── Timing ──────────────────────────────────────────────────────
    let (min, max) = CURRENCY_DELAY_RANGE;
    if let Some(v) = read_env_u64("WAYCRAFT_CURRENCY_DELAY_MS", min, max) {
        settings.timing.currency_delay_ms = v;
    }
    let (min, max) = ITEM_DELAY_RANGE;
    if let Some(v) = read_env_u64("WAYCRAFT_ITEM_DELAY_MS", min, max) {
        settings.timing.item_delay_ms = v;
    }
    let (min, max) = CANCEL_SETTLE_RANGE;
    if let Some(v) = read_env_u64("WAYCRAFT_CANCEL_SETTLE_MS", min, max) {
        settings.timing.cancel_settle_ms = v;
    }

    // ── Distillation ────────────────────────────────────────────────
    if let Some(v) = read_env_enum("WAYCRAFT_REAGENT") {
        settings.distillation.reagent = v;
    }
    if let Some(v) = read_env_enum("WAYCRAFT_OPENING_COST") {
        settings.distillation.opening_cost = v;
    }

    // ── Focus / logging ─────────────────────────────────────────────
    if let Some(v) = read_env_bool("WAYCRAFT_FOCUS_ENABLED") {
        settings.focus.enabled = v;
    }
    if let Some(v) = read_env_string("WAYCRAFT_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a lowercase variant name into a serde enum.
pub fn parse_enum<T: DeserializeOwned>(val: &str) -> Option<T> {
    serde_json::from_value(Value::String(val.to_lowercase())).ok()
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

fn read_env_enum<T: DeserializeOwned>(name: &str) -> Option<T> {
    let val = read_env_string(name)?;
    let result = parse_enum(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "unknown variant in env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
