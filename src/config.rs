//! TOML-based policy configuration.
//!
//! The timing and recovery thresholds in this file are empirical workarounds
//! for embedding-engine behavior that may change between engine versions, so
//! they are configuration rather than constants. Loads from a `lectern.toml`
//! file, falling back to defaults that match the shipped behavior. Every
//! struct implements `Default` so a missing or partial config file behaves
//! identically to no file at all.
//!
//! ## Config file search order
//!
//! 1. `LECTERN_CONFIG` environment variable (explicit override)
//! 2. Next to the executable (`<exe_dir>/lectern.toml`)
//! 3. Platform config directory (`%APPDATA%\Lectern\lectern.toml` on Windows)
//! 4. Current working directory (`./lectern.toml`)
//! 5. No file found → `Config::default()`

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Config structs
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timing: TimingConfig,
    pub emulation: EmulationPolicy,
    pub recovery: RecoveryPolicy,
    pub session: SessionConfig,
}

/// Settle delays, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wait after emulation is applied before revealing the surface, letting
    /// the engine's layout/paint catch up.
    pub settle_delay_ms: u64,
    /// Wait after `DomReady` before the input-routing nudge runs.
    pub nudge_delay_ms: u64,
    /// Gap between focusing the host and refocusing the surface during a
    /// focus handoff.
    pub focus_handoff_delay_ms: u64,
}

/// Viewport emulation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulationPolicy {
    /// Logical viewport width cap in mobile mode (CSS pixels).
    pub mobile_viewport_max: i32,
}

/// Input-routing recovery policy. Which zoom mode has a working input path
/// is an engine-version-dependent observation, hence configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryPolicy {
    /// Tear down and rebuild the surface before re-navigation while CSS-zoom
    /// mode is active and a page has already loaded.
    pub recreate_in_css_zoom: bool,
    /// Run the best-effort focus/bounds nudge after `DomReady` in CSS-zoom
    /// mode when recreation did not run.
    pub nudge_after_load: bool,
}

/// Session and placement defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Storage partition new surfaces are created in.
    pub partition: String,
    /// User-agent override; empty keeps the engine default.
    pub user_agent: String,
    /// Horizontal offset used to park a hidden surface off-canvas. Parking
    /// instead of destroying keeps compositing state for a smooth reveal.
    pub park_offset_x: i32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Default impls — match shipped behavior exactly
// ─────────────────────────────────────────────────────────────────────────────

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 100,
            nudge_delay_ms: 150,
            focus_handoff_delay_ms: 40,
        }
    }
}

impl Default for EmulationPolicy {
    fn default() -> Self {
        Self {
            mobile_viewport_max: 768,
        }
    }
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            recreate_in_css_zoom: true,
            nudge_after_load: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            partition: "persist:surface".to_string(),
            user_agent: String::new(),
            park_offset_x: -20_000,
        }
    }
}

impl TimingConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn nudge_delay(&self) -> Duration {
        Duration::from_millis(self.nudge_delay_ms)
    }

    pub fn focus_handoff_delay(&self) -> Duration {
        Duration::from_millis(self.focus_handoff_delay_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config loading
// ─────────────────────────────────────────────────────────────────────────────

const CONFIG_FILE: &str = "lectern.toml";

impl Config {
    /// Loads configuration from a TOML file. Never panics — returns defaults
    /// if no file is found or if parsing fails.
    pub fn load() -> Self {
        match find_config_path() {
            Some(path) => match fs::read_to_string(&path) {
                Ok(content) => match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        info!(path = %path.display(), "Configuration loaded");
                        config
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                        Config::default()
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot read config, using defaults");
                    Config::default()
                }
            },
            None => {
                info!("No config file found, using defaults");
                Config::default()
            }
        }
    }
}

/// Searches for a config file in the standard locations.
fn find_config_path() -> Option<PathBuf> {
    // 1. Explicit env var override
    if let Ok(path) = std::env::var("LECTERN_CONFIG") {
        let p = PathBuf::from(path);
        if p.is_file() {
            return Some(p);
        }
    }

    // 2. Next to the executable
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let p = dir.join(CONFIG_FILE);
        if p.is_file() {
            return Some(p);
        }
    }

    // 3. Platform config directory
    if let Some(dir) = platform_config_dir() {
        let p = dir.join(CONFIG_FILE);
        if p.is_file() {
            return Some(p);
        }
    }

    // 4. Current working directory
    let p = PathBuf::from(CONFIG_FILE);
    if p.is_file() {
        return Some(p);
    }

    None
}

/// Returns the platform config directory without adding a dependency.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join("Lectern"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .or_else(|| std::env::var("HOME").ok().map(|h| format!("{h}/.config")))
            .map(|dir| PathBuf::from(dir).join("lectern"))
    }
}
