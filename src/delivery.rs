//! Delivery sinks: where recognized text goes once it exists.
//!
//! Every sink sees every result, including "no text found". Failures are
//! reported back to the pipeline, which logs them and moves on.

use crate::history::{CaptureHistory, HistoryError};
use crate::settings::Settings;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const PREVIEW_MAX_CHARS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error("history store lock poisoned")]
    Poisoned,
}

/// Receives the assembled text of one capture (`None` when nothing was read).
pub trait DeliverySink: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn deliver(&self, text: Option<&str>) -> Result<(), DeliveryError>;
}

/// User-facing summary of a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn for_text(text: Option<&str>) -> Self {
        match text {
            Some(text) => Self {
                title: "Text Copied".to_string(),
                body: preview(text),
            },
            None => Self {
                title: "No Text Found".to_string(),
                body: "No text was detected in the selected area".to_string(),
            },
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_MAX_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(PREVIEW_MAX_CHARS).collect();
    format!("{}...", head)
}

// ── Sinks ───────────────────────────────────────────────────────────

/// Writes the notification to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl DeliverySink for LogNotifier {
    fn name(&self) -> &'static str {
        "notification"
    }

    fn deliver(&self, text: Option<&str>) -> Result<(), DeliveryError> {
        let note = Notification::for_text(text);
        log::info!("[DELIVERY] {}: {}", note.title, note.body);
        Ok(())
    }
}

/// Appends recognized text to a shared history, optionally saving it.
#[derive(Debug, Clone)]
pub struct HistorySink {
    history: Arc<Mutex<CaptureHistory>>,
    persist_to: Option<PathBuf>,
}

impl HistorySink {
    pub fn new(history: Arc<Mutex<CaptureHistory>>) -> Self {
        Self {
            history,
            persist_to: None,
        }
    }

    /// Save the whole history to `path` after every addition.
    pub fn with_persistence(mut self, path: PathBuf) -> Self {
        self.persist_to = Some(path);
        self
    }
}

impl DeliverySink for HistorySink {
    fn name(&self) -> &'static str {
        "history"
    }

    fn deliver(&self, text: Option<&str>) -> Result<(), DeliveryError> {
        let Some(text) = text else {
            return Ok(());
        };
        let mut history = self.history.lock().map_err(|_| DeliveryError::Poisoned)?;
        let id = history.add(text);
        log::debug!("[HISTORY] Recorded entry {} ({} total)", id, history.len());
        if let Some(path) = &self.persist_to {
            history.save_to(path)?;
        }
        Ok(())
    }
}

/// Places recognized text on the system clipboard via arboard.
#[cfg(feature = "clipboard")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ClipboardSink;

#[cfg(feature = "clipboard")]
impl DeliverySink for ClipboardSink {
    fn name(&self) -> &'static str {
        "clipboard"
    }

    fn deliver(&self, text: Option<&str>) -> Result<(), DeliveryError> {
        let Some(text) = text else {
            return Ok(());
        };
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| DeliveryError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| DeliveryError::Clipboard(e.to_string()))?;
        log::info!("[DELIVERY] Copied {} chars to clipboard", text.chars().count());
        Ok(())
    }
}

/// The sink set a desktop host normally wants.
///
/// Clipboard delivery is included only with the `clipboard` feature and
/// `auto_copy_to_clipboard` enabled. The shared history is capped at
/// `settings.history_limit`.
pub fn default_sinks(
    settings: &Settings,
    history: Arc<Mutex<CaptureHistory>>,
) -> Vec<Arc<dyn DeliverySink>> {
    let mut sinks: Vec<Arc<dyn DeliverySink>> = Vec::new();
    #[cfg(feature = "clipboard")]
    {
        if settings.auto_copy_to_clipboard {
            sinks.push(Arc::new(ClipboardSink));
        }
    }
    #[cfg(not(feature = "clipboard"))]
    {
        if settings.auto_copy_to_clipboard {
            log::debug!("[DELIVERY] Built without the clipboard feature, auto-copy unavailable");
        }
    }
    match history.lock() {
        Ok(mut history) => history.set_limit(settings.history_limit),
        Err(_) => log::warn!("[HISTORY] History lock poisoned, limit not applied"),
    }
    sinks.push(Arc::new(HistorySink::new(history)));
    sinks.push(Arc::new(LogNotifier));
    sinks
}
