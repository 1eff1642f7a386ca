//! User settings and their resolution.
//!
//! Priority, lowest first:
//! 1. Built-in defaults
//! 2. `settings.json` in the platform config dir (`~/.config/kimeno/` on Linux,
//!    `~/Library/Application Support/kimeno/` on macOS)
//! 3. `KIMENO_*` environment variables (a `.env` file works too, see `crate::init`)
//!
//! Settings are only read here; editing them is the host's business.

use crate::ocr::{OcrRequest, ReadingMode, RecognitionLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_FILE: &str = "settings.json";

pub const ENV_READING_MODE: &str = "KIMENO_READING_MODE";
pub const ENV_LANGUAGE: &str = "KIMENO_LANGUAGE";
pub const ENV_OCR_LEVEL: &str = "KIMENO_OCR_LEVEL";
pub const ENV_AUTO_COPY: &str = "KIMENO_AUTO_COPY";
pub const ENV_SETTLE_DELAY_MS: &str = "KIMENO_SETTLE_DELAY_MS";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid value {value:?} for {key}")]
    InvalidOverride { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Put recognized text on the clipboard.
    pub auto_copy_to_clipboard: bool,
    /// Language hint for the OCR engine.
    pub recognition_language: String,
    pub reading_mode: ReadingMode,
    pub recognition_level: RecognitionLevel,
    /// Wait between a finished selection and the capture, so the overlay is
    /// gone from the screen before pixels are read.
    pub settle_delay_ms: u64,
    pub history_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_copy_to_clipboard: true,
            recognition_language: "en-US".to_string(),
            reading_mode: ReadingMode::LineAware,
            recognition_level: RecognitionLevel::Accurate,
            settle_delay_ms: 200,
            history_limit: 100,
        }
    }
}

impl Settings {
    /// Defaults, then the settings file, then environment overrides.
    ///
    /// Never fails: problems are logged and the affected layer is skipped.
    pub fn load() -> Self {
        let path = Self::default_path();
        let mut settings = match Self::load_from(&path) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("[SETTINGS] {}, using defaults", e);
                Self::default()
            }
        };
        if let Err(e) = settings.apply_env_overrides() {
            log::warn!("[SETTINGS] Ignoring override: {}", e);
        }
        settings
    }

    /// Path of the settings file in the platform config dir.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kimeno")
            .join(SETTINGS_FILE)
    }

    /// Read settings from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let settings = serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("[SETTINGS] Loaded {}", path.display());
        Ok(settings)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), SettingsError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by the `KIMENO_*` names.
    ///
    /// Stops at the first invalid value; earlier overrides stay applied.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_READING_MODE) {
            self.reading_mode = value.parse().map_err(|_| invalid(ENV_READING_MODE, &value))?;
        }
        if let Some(value) = lookup(ENV_LANGUAGE) {
            let value = value.trim();
            if value.is_empty() {
                return Err(invalid(ENV_LANGUAGE, value));
            }
            self.recognition_language = value.to_string();
        }
        if let Some(value) = lookup(ENV_OCR_LEVEL) {
            self.recognition_level = value.parse().map_err(|_| invalid(ENV_OCR_LEVEL, &value))?;
        }
        if let Some(value) = lookup(ENV_AUTO_COPY) {
            self.auto_copy_to_clipboard =
                parse_bool(&value).ok_or_else(|| invalid(ENV_AUTO_COPY, &value))?;
        }
        if let Some(value) = lookup(ENV_SETTLE_DELAY_MS) {
            self.settle_delay_ms = value
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_SETTLE_DELAY_MS, &value))?;
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn ocr_request(&self) -> OcrRequest {
        OcrRequest {
            language: self.recognition_language.clone(),
            level: self.recognition_level,
        }
    }
}

fn invalid(key: &'static str, value: &str) -> SettingsError {
    SettingsError::InvalidOverride {
        key,
        value: value.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
