//! Reading-order reconstruction for OCR output.
//!
//! OCR engines return text fragments in no useful order. This module groups
//! fragments into visual lines (first-fit on vertical centers), orders lines
//! top to bottom and fragments left to right, and joins them into one string.
//!
//! Boxes are normalized to the captured bitmap with a bottom-left origin,
//! so a larger y is higher on screen. Malformed boxes are never rejected;
//! they are grouped and sorted exactly as given.

use crate::geometry::{Normalized, Rect};
use serde::{Deserialize, Serialize};

/// One recognized fragment and where it sits in the bitmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObservation {
    pub text: String,
    pub bounds: Rect<Normalized>,
}

impl TextObservation {
    pub fn new(text: impl Into<String>, bounds: Rect<Normalized>) -> Self {
        Self {
            text: text.into(),
            bounds,
        }
    }

    /// Build from the edges an OCR engine usually reports.
    pub fn from_edges(text: impl Into<String>, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(text, Rect::from_edges(min_x, min_y, max_x, max_y))
    }

    fn mid_y(&self) -> f64 {
        self.bounds.min_y() + self.bounds.height / 2.0
    }
}

/// How fragments are assembled into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingMode {
    /// Group into lines, read top to bottom and left to right.
    #[default]
    LineAware,
    /// Keep the engine's order, one fragment per line.
    RawOrder,
}

impl std::str::FromStr for ReadingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "line_aware" | "line-aware" | "line" => Ok(ReadingMode::LineAware),
            "raw_order" | "raw-order" | "raw" => Ok(ReadingMode::RawOrder),
            other => Err(format!("unknown reading mode '{}'", other)),
        }
    }
}

/// One visual line. `mid_y` and `height` come from its first member.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub mid_y: f64,
    pub height: f64,
    pub fragments: Vec<TextObservation>,
}

impl Line {
    fn start(first: TextObservation) -> Self {
        Self {
            mid_y: first.mid_y(),
            height: first.bounds.height,
            fragments: vec![first],
        }
    }

    fn accepts(&self, item: &TextObservation) -> bool {
        (item.mid_y() - self.mid_y).abs() < self.height * 0.5
    }

    /// Fragments joined by single spaces.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Group observations into lines in reading order.
///
/// Each observation joins the first existing line whose reference center is
/// within half that line's height; earlier assignments are never revisited.
/// Sorts are stable, so equal keys keep their input order.
pub fn reconstruct_lines(observations: Vec<TextObservation>) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    for item in observations {
        match lines.iter_mut().find(|line| line.accepts(&item)) {
            Some(line) => line.fragments.push(item),
            None => lines.push(Line::start(item)),
        }
    }

    lines.sort_by(|a, b| b.mid_y.total_cmp(&a.mid_y));
    for line in &mut lines {
        line.fragments
            .sort_by(|a, b| a.bounds.min_x().total_cmp(&b.bounds.min_x()));
    }
    lines
}

/// Assemble observations into one string. Empty input gives an empty string.
pub fn reconstruct(observations: Vec<TextObservation>, mode: ReadingMode) -> String {
    match mode {
        ReadingMode::RawOrder => observations
            .into_iter()
            .map(|o| o.text)
            .collect::<Vec<_>>()
            .join("\n"),
        ReadingMode::LineAware => reconstruct_lines(observations)
            .iter()
            .map(Line::text)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
