//! Capture history: recently recognized text, newest first.
//!
//! Stored as a JSON array at `<data_dir>/kimeno/history.json` when the host
//! asks for persistence; otherwise purely in memory.

use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const HISTORY_FILE: &str = "history.json";
const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("history file {path} is invalid: {source}")]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// One recognized capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureEntry {
    pub id: u64,
    pub title: String,
    pub text: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

impl CaptureEntry {
    fn new(id: u64, text: String) -> Self {
        Self {
            id,
            title: title_for(&text),
            text,
            timestamp: unix_now(),
        }
    }
}

/// Short label: the first line, truncated to 50 characters.
pub fn title_for(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return "Untitled".to_string();
    }
    if first_line.chars().count() <= TITLE_MAX_CHARS {
        return first_line.to_string();
    }
    let head: String = first_line.chars().take(TITLE_MAX_CHARS - 3).collect();
    format!("{}...", head)
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Bounded, newest-first list of captures.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureHistory {
    entries: Vec<CaptureEntry>,
    limit: usize,
    next_id: u64,
}

impl CaptureHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
            next_id: 1,
        }
    }

    /// Empty history capped at `settings.history_limit`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.history_limit)
    }

    /// Change the cap, dropping the oldest entries beyond it.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.entries.truncate(limit);
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Default location in the platform data dir.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kimeno")
            .join(HISTORY_FILE)
    }

    /// Load from `path`; a missing file is an empty history.
    pub fn load_from(path: &Path, limit: usize) -> Result<Self, HistoryError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new(limit)),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let mut entries: Vec<CaptureEntry> =
            serde_json::from_str(&raw).map_err(|source| HistoryError::Format {
                path: path.to_path_buf(),
                source,
            })?;
        entries.truncate(limit);
        let next_id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        log::info!("[HISTORY] Loaded {} entries from {}", entries.len(), path.display());
        Ok(Self {
            entries,
            limit,
            next_id,
        })
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), HistoryError> {
        let io_err = |source| HistoryError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            HistoryError::Format {
                path: path.to_path_buf(),
                source,
            }
        })?;
        std::fs::write(path, json).map_err(io_err)
    }

    /// Record `text` as the newest entry and return its id.
    pub fn add(&mut self, text: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(0, CaptureEntry::new(id, text.into()));
        self.entries.truncate(self.limit);
        id
    }

    pub fn entries(&self) -> &[CaptureEntry] {
        &self.entries
    }

    pub fn get(&self, id: u64) -> Option<&CaptureEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Returns false if no entry had `id`.
    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
