//! Screen capture domain: public API.
//!
//! Acquiring pixels is a platform collaborator behind `CaptureProvider`.
//! This module owns the conversion from a finished global selection to the
//! capture-pixel rect of one surface, and the cropping helpers providers use.
//!
//! Backends:
//!   - xcap_backend.rs: `xcap` monitors (cargo feature `xcap`)

pub mod region;
#[cfg(feature = "xcap")]
pub mod xcap_backend;

pub use region::{crop_to_capture_rect, crop_to_png_bytes};
#[cfg(feature = "xcap")]
pub use xcap_backend::XcapCapture;

use crate::geometry::{intersect_rect, to_capture_pixels, to_local_rect, CapturePixels, Global, Rect};
use crate::selection::{SurfaceDescriptor, SurfaceId};
use image::DynamicImage;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("screen recording permission denied")]
    PermissionDenied,
    #[error("selection does not overlap any display")]
    NoSurface,
    #[error("no display matches {0}")]
    NoDisplay(SurfaceId),
    #[error("crop {x},{y} {width}x{height} exceeds the {image_width}x{image_height} capture")]
    CropOutOfBounds {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        image_width: u32,
        image_height: u32,
    },
    #[error("PNG encode failed: {0}")]
    Encode(String),
    #[error("capture backend failed: {0}")]
    Backend(String),
}

/// Produces a bitmap of one region of one surface.
///
/// Called from a blocking worker. `region` is already in the surface's
/// capture-pixel grid (top-left origin, scaled by its pixel density).
pub trait CaptureProvider: Send + Sync {
    fn capture(
        &self,
        surface: &SurfaceDescriptor,
        region: Rect<CapturePixels>,
    ) -> Result<DynamicImage, CaptureError>;
}

/// Capture-pixel rect of `selection` on `surface`.
///
/// The selection is clipped to the surface frame first, so a selection that
/// straddles two displays captures only the part on the target.
pub fn capture_rect_for(
    selection: &Rect<Global>,
    surface: &SurfaceDescriptor,
) -> Result<Rect<CapturePixels>, CaptureError> {
    let visible = intersect_rect(selection, &surface.frame).ok_or(CaptureError::NoSurface)?;
    let local = to_local_rect(visible, &surface.frame);
    Ok(to_capture_pixels(local, surface.frame.height, surface.pixel_scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_rect_on_offset_retina_display() {
        let surface = SurfaceDescriptor::new(1, Rect::new(1000.0, 500.0, 200.0, 100.0), 2.0);
        let selection = Rect::new(1010.0, 520.0, 30.0, 40.0);
        let rect = capture_rect_for(&selection, &surface).unwrap();
        assert_eq!(rect, Rect::new(20.0, 80.0, 60.0, 80.0));
    }

    #[test]
    fn capture_rect_clips_to_surface() {
        let surface = SurfaceDescriptor::new(1, Rect::new(0.0, 0.0, 100.0, 100.0), 1.0);
        let selection = Rect::new(80.0, 80.0, 50.0, 50.0);
        let rect = capture_rect_for(&selection, &surface).unwrap();
        assert_eq!(rect, Rect::new(80.0, 0.0, 20.0, 20.0));
    }

    #[test]
    fn capture_rect_off_surface_is_an_error() {
        let surface = SurfaceDescriptor::new(1, Rect::new(0.0, 0.0, 100.0, 100.0), 1.0);
        let selection = Rect::new(300.0, 300.0, 50.0, 50.0);
        assert!(matches!(
            capture_rect_for(&selection, &surface),
            Err(CaptureError::NoSurface)
        ));
    }
}
