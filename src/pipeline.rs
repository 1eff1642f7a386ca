//! Capture-to-text pipeline.
//!
//! Host glue that runs after the selection machine reports a rectangle:
//! settle delay → pick target surface → capture → OCR → reading order → sinks.
//!
//! Capture and OCR are blocking collaborator calls, so they run on tokio's
//! blocking pool and never stall the event loop driving the selection.

use crate::capture::{capture_rect_for, CaptureError, CaptureProvider};
use crate::delivery::DeliverySink;
use crate::geometry::{CapturePixels, Global, Rect};
use crate::ocr::{self, Line, OcrError, OcrProvider, ReadingMode, TextObservation};
use crate::selection::{SurfaceId, SurfaceRegistry};
use crate::settings::Settings;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error("background worker failed: {0}")]
    Worker(String),
}

/// Result of one processed selection.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    pub surface: SurfaceId,
    pub capture_rect: Rect<CapturePixels>,
    /// Assembled text, `None` when nothing was recognized.
    pub text: Option<String>,
    /// Lines in the assembled text.
    pub lines: usize,
}

pub struct CapturePipeline {
    capture: Arc<dyn CaptureProvider>,
    ocr: Arc<dyn OcrProvider>,
    sinks: Vec<Arc<dyn DeliverySink>>,
    settings: Settings,
}

impl CapturePipeline {
    pub fn new(
        capture: Arc<dyn CaptureProvider>,
        ocr: Arc<dyn OcrProvider>,
        settings: Settings,
    ) -> Self {
        Self {
            capture,
            ocr,
            sinks: Vec::new(),
            settings,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DeliverySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_sinks(mut self, sinks: impl IntoIterator<Item = Arc<dyn DeliverySink>>) -> Self {
        self.sinks.extend(sinks);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Turn a completed selection into text and hand it to every sink.
    ///
    /// `surfaces` is the snapshot of the session that produced `selection`
    /// (as returned by `SelectionMachine::teardown`). Capture and OCR
    /// failures are returned; sink failures are only logged.
    pub async fn process_selection(
        &self,
        selection: Rect<Global>,
        surfaces: &SurfaceRegistry,
    ) -> Result<CaptureOutcome, PipelineError> {
        let pipeline_start = std::time::Instant::now();
        log::info!(
            "[CAPTURE] Selection received: {{x: {:.1}, y: {:.1}, w: {:.1}, h: {:.1}}}",
            selection.origin.x,
            selection.origin.y,
            selection.width,
            selection.height
        );

        // Stage 1: Resolve the target surface and its pixel rect
        let surface = surfaces
            .target_for(&selection)
            .ok_or(CaptureError::NoSurface)?
            .clone();
        let region = capture_rect_for(&selection, &surface)?;
        log::info!(
            "[CAPTURE] Target {} @{}x, pixel rect {{x: {:.0}, y: {:.0}, w: {:.0}, h: {:.0}}}",
            surface.id,
            surface.pixel_scale,
            region.origin.x,
            region.origin.y,
            region.width,
            region.height
        );

        // Stage 2: Let the overlay leave the screen
        let settle = self.settings.settle_delay();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        // Stage 3: Capture
        let capture_start = std::time::Instant::now();
        let provider = Arc::clone(&self.capture);
        let target = surface.clone();
        let image = tokio::task::spawn_blocking(move || provider.capture(&target, region))
            .await
            .map_err(|e| PipelineError::Worker(e.to_string()))??;
        let capture_ms = capture_start.elapsed().as_millis();
        log::info!(
            "[CAPTURE] {}x{} bitmap in {}ms",
            image.width(),
            image.height(),
            capture_ms
        );

        // Stage 4: OCR + reading order
        let ocr_start = std::time::Instant::now();
        let engine = Arc::clone(&self.ocr);
        let request = self.settings.ocr_request();
        let mode = self.settings.reading_mode;
        let (text, lines, fragments) = tokio::task::spawn_blocking(move || {
            let observations = engine.recognize(&image, &request)?;
            let fragments = observations.len();
            let (text, lines) = assemble(observations, mode);
            Ok::<_, OcrError>((text, lines, fragments))
        })
        .await
        .map_err(|e| PipelineError::Worker(e.to_string()))??;
        let ocr_ms = ocr_start.elapsed().as_millis();
        log::info!(
            "[OCR] {} fragments → {} lines, {} chars in {}ms ({:?})",
            fragments,
            lines,
            text.chars().count(),
            ocr_ms,
            mode
        );

        let text = if text.is_empty() { None } else { Some(text) };

        // Stage 5: Deliver
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(text.as_deref()) {
                log::warn!("[DELIVERY] {} sink failed: {}", sink.name(), e);
            }
        }

        log::info!(
            "[PIPELINE] Total: {}ms (settle={} + capture={} + ocr={})",
            pipeline_start.elapsed().as_millis(),
            settle.as_millis(),
            capture_ms,
            ocr_ms
        );

        Ok(CaptureOutcome {
            surface: surface.id,
            capture_rect: region,
            text,
            lines,
        })
    }
}

/// Assemble observations and count the lines produced.
fn assemble(observations: Vec<TextObservation>, mode: ReadingMode) -> (String, usize) {
    match mode {
        ReadingMode::LineAware => {
            let lines = ocr::reconstruct_lines(observations);
            let text = lines.iter().map(Line::text).collect::<Vec<_>>().join("\n");
            (text, lines.len())
        }
        ReadingMode::RawOrder => {
            let count = observations.len();
            (ocr::reconstruct(observations, ReadingMode::RawOrder), count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_counts_visual_lines() {
        let observations = vec![
            TextObservation::from_edges("b", 0.5, 0.8, 0.6, 0.9),
            TextObservation::from_edges("a", 0.1, 0.8, 0.2, 0.9),
            TextObservation::from_edges("c", 0.1, 0.2, 0.2, 0.3),
        ];
        assert_eq!(
            assemble(observations.clone(), ReadingMode::LineAware),
            ("a b\nc".to_string(), 2)
        );
        assert_eq!(
            assemble(observations, ReadingMode::RawOrder),
            ("b\na\nc".to_string(), 3)
        );
    }

    #[test]
    fn assemble_empty() {
        assert_eq!(assemble(Vec::new(), ReadingMode::LineAware), (String::new(), 0));
    }
}
