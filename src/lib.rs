//! Kimeno: select any screen region, get its text in reading order.
//!
//! This crate is the platform-independent core. No business logic lives
//! here, only module declarations and process initialisation.
//!
//! Domains:
//!   - geometry.rs : space-tagged points/rects and coordinate transforms
//!   - selection/  : drag-selection state machine across display surfaces
//!   - ocr/        : OCR seam + reading-order reconstruction
//!   - capture/    : capture seam, pixel-rect conversion, cropping
//!   - pipeline.rs : completed selection → capture → OCR → delivery
//!   - delivery.rs : clipboard / notification / history sinks
//!   - history.rs  : recent captures
//!   - settings.rs : configuration resolution
//!
//! Screen pixels, the OCR engine, hotkeys and windows are supplied by the
//! host through the traits in `capture`, `ocr`, `selection` and `delivery`.

pub mod capture;
pub mod delivery;
pub mod geometry;
pub mod history;
pub mod ocr;
pub mod pipeline;
pub mod selection;
pub mod settings;

pub use geometry::{Global, Point, Rect};
pub use ocr::{reconstruct, ReadingMode, TextObservation};
pub use pipeline::{CaptureOutcome, CapturePipeline, PipelineError};
pub use selection::{SelectionError, SelectionMachine, SelectionState, SurfaceDescriptor};
pub use settings::Settings;

/// Load `.env.local` → `.env` from the working directory, then start logging.
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init() {
    let mut loaded = None;
    let mut failed = None;
    'env_load: for env_file in [".env.local", ".env"] {
        let path = std::path::Path::new(env_file);
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(_) => loaded = Some(env_file),
                Err(e) => failed = Some(format!("{}: {}", env_file, e)),
            }
            break 'env_load;
        }
    }

    if env_logger::try_init().is_err() {
        return;
    }
    if let Some(file) = loaded {
        log::info!("[STARTUP] Loaded {}", file);
    }
    if let Some(err) = failed {
        log::warn!("[STARTUP] Failed to load {}", err);
    }
}
