//! Capture configuration.
//!
//! Read from the platform config directory:
//!   macOS:   ~/Library/Application Support/glimpse/capture.json
//!   Linux:   ~/.config/glimpse/capture.json
//!   Windows: %APPDATA%/glimpse/capture.json
//!
//! then overridden by `GLIMPSE_*` environment variables (a `.env` file in
//! the working directory is honoured). Anything unreadable falls back to
//! the defaults with a warning.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::rect::MIN_SELECTION_PX;
use crate::capture::screenshot::Resolution;

pub const ENV_SETTLE_DELAY_MS: &str = "GLIMPSE_SETTLE_DELAY_MS";
pub const ENV_MIN_SELECTION_PX: &str = "GLIMPSE_MIN_SELECTION_PX";
pub const ENV_SELECTION_TIMEOUT_MS: &str = "GLIMPSE_SELECTION_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConfig {
    /// Pause between hiding the host and grabbing the frame, so the
    /// window manager has actually taken the host off screen.
    pub settle_delay_ms: u64,
    /// Selections at or below this edge length are ignored.
    pub min_selection_px: u32,
    /// Frame size for area capture; `None` keeps the display's native size.
    pub target_resolution: Option<Resolution>,
    /// Frame size for full-screen screenshots.
    pub screenshot_resolution: Option<Resolution>,
    /// Give up waiting for a selection after this long; `None` or `0`
    /// waits forever.
    pub selection_timeout_ms: Option<u64>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 200,
            min_selection_px: MIN_SELECTION_PX,
            target_resolution: None,
            screenshot_resolution: Some(Resolution::new(1920, 1080)),
            selection_timeout_ms: None,
        }
    }
}

impl CaptureConfig {
    /// Defaults, then the config file, then environment overrides.
    pub fn load() -> Self {
        let path = config_path();
        let mut config = if path.exists() {
            match Self::from_file(&path) {
                Ok(config) => {
                    log::info!("[CONFIG] Loaded {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("[CONFIG] {}: using defaults", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.apply_overrides(|key| dotenvy::var(key).ok());
        config
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        serde_json::from_str(&text).map_err(|e| format!("Invalid {}: {}", path.display(), e))
    }

    /// Applies `GLIMPSE_*` overrides looked up through `lookup`.
    ///
    /// A timeout of `0` or `none` disables the timeout.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = parse_var::<u64>(&lookup, ENV_SETTLE_DELAY_MS) {
            self.settle_delay_ms = ms;
        }
        if let Some(px) = parse_var::<u32>(&lookup, ENV_MIN_SELECTION_PX) {
            self.min_selection_px = px;
        }
        if let Some(raw) = lookup(ENV_SELECTION_TIMEOUT_MS) {
            let raw = raw.trim();
            if raw.eq_ignore_ascii_case("none") || raw == "0" {
                self.selection_timeout_ms = None;
            } else if let Some(ms) = parse_var::<u64>(&lookup, ENV_SELECTION_TIMEOUT_MS) {
                self.selection_timeout_ms = Some(ms);
            }
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Zero means no timeout, whether it came from the file or the env.
    pub fn selection_timeout(&self) -> Option<Duration> {
        self.selection_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

/// Location of `capture.json`.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("glimpse")
        .join("capture.json")
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("[CONFIG] Ignoring {}={:?}: not a number", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_hide_briefly_and_never_time_out() {
        let config = CaptureConfig::default();
        assert_eq!(config.settle_delay(), Duration::from_millis(200));
        assert_eq!(config.min_selection_px, 10);
        assert_eq!(config.target_resolution, None);
        assert_eq!(config.screenshot_resolution, Some(Resolution::new(1920, 1080)));
        assert_eq!(config.selection_timeout(), None);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let json = r#"{
            "selectionTimeoutMs": 30000,
            "targetResolution": { "width": 1280, "height": 720 }
        }"#;
        let config: CaptureConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.selection_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.target_resolution, Some(Resolution::new(1280, 720)));
        assert_eq!(config.settle_delay_ms, 200);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = CaptureConfig::default();
        config.apply_overrides(lookup(&[
            (ENV_SETTLE_DELAY_MS, "0"),
            (ENV_MIN_SELECTION_PX, " 4 "),
            (ENV_SELECTION_TIMEOUT_MS, "1500"),
        ]));
        assert_eq!(config.settle_delay_ms, 0);
        assert_eq!(config.min_selection_px, 4);
        assert_eq!(config.selection_timeout_ms, Some(1500));
    }

    #[test]
    fn bad_env_values_are_ignored() {
        let mut config = CaptureConfig::default();
        config.apply_overrides(lookup(&[
            (ENV_SETTLE_DELAY_MS, "soon"),
            (ENV_SELECTION_TIMEOUT_MS, "later"),
        ]));
        assert_eq!(config, CaptureConfig::default());
    }

    #[test]
    fn timeout_can_be_disabled_from_env() {
        let mut config = CaptureConfig {
            selection_timeout_ms: Some(10),
            ..CaptureConfig::default()
        };
        config.apply_overrides(lookup(&[(ENV_SELECTION_TIMEOUT_MS, "none")]));
        assert_eq!(config.selection_timeout(), None);
    }

    #[test]
    fn zero_timeout_in_file_means_no_timeout() {
        let config: CaptureConfig =
            serde_json::from_str(r#"{"settleDelayMs":0,"selectionTimeoutMs":0}"#).unwrap();
        assert_eq!(config.selection_timeout_ms, Some(0));
        assert_eq!(config.selection_timeout(), None);
    }

    #[test]
    fn from_file_reports_bad_json() {
        let path =
            std::env::temp_dir().join(format!("glimpse-config-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let err = CaptureConfig::from_file(&path).unwrap_err();
        assert!(err.contains("Invalid"), "unexpected error: {err}");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn config_path_is_under_glimpse() {
        let path = config_path();
        assert!(path.ends_with("glimpse/capture.json"));
    }
}
