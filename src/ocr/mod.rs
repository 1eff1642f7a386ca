//! OCR domain: text recognition seam and reading-order reconstruction.
//!
//! The recognition engine itself is a platform collaborator supplied by the
//! host through `OcrProvider`. This module only defines the request it gets
//! and turns its unordered output into text.

pub mod reading_order;

pub use reading_order::{reconstruct, reconstruct_lines, Line, ReadingMode, TextObservation};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Recognition level requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionLevel {
    /// Slower, with language correction.
    #[default]
    Accurate,
    Fast,
}

impl std::str::FromStr for RecognitionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accurate" => Ok(RecognitionLevel::Accurate),
            "fast" => Ok(RecognitionLevel::Fast),
            other => Err(format!("unknown recognition level '{}'", other)),
        }
    }
}

/// Parameters for one recognition call.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrRequest {
    /// BCP 47 tag, e.g. "en-US".
    pub language: String,
    pub level: RecognitionLevel,
}

impl Default for OcrRequest {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            level: RecognitionLevel::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("text recognition engine unavailable: {0}")]
    Unavailable(String),
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// A text recognition engine.
///
/// Called from a blocking worker, never from the selection event loop.
/// An image with no text is `Ok(vec![])`, not an error.
pub trait OcrProvider: Send + Sync {
    fn recognize(
        &self,
        image: &DynamicImage,
        request: &OcrRequest,
    ) -> Result<Vec<TextObservation>, OcrError>;
}
