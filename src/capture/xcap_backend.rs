//! Screen capture via the xcap crate.
//!
//! Only compiled with the `xcap` feature. xcap reports monitors with a
//! top-left origin and y growing downward; surfaces are converted to the
//! global y-up space with the primary monitor's bottom edge at y = 0.

use super::{region, CaptureError, CaptureProvider};
use crate::geometry::{CapturePixels, Global, Rect};
use crate::selection::{SurfaceDescriptor, SurfaceEnumerator};
use image::DynamicImage;
use xcap::Monitor;

/// Capture provider and surface enumerator backed by `xcap::Monitor`.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapCapture;

impl XcapCapture {
    pub fn new() -> Self {
        Self
    }
}

fn backend(e: xcap::XCapError) -> CaptureError {
    let message = e.to_string();
    if message.to_lowercase().contains("permission") {
        CaptureError::PermissionDenied
    } else {
        CaptureError::Backend(message)
    }
}

impl SurfaceEnumerator for XcapCapture {
    type Error = CaptureError;

    fn surfaces(&self) -> Result<Vec<SurfaceDescriptor>, CaptureError> {
        let monitors = Monitor::all().map_err(backend)?;
        if monitors.is_empty() {
            return Err(CaptureError::Backend("No monitors detected".to_string()));
        }

        let mut primary_height = None;
        for monitor in &monitors {
            if monitor.is_primary().map_err(backend)? {
                primary_height = Some(monitor.height().map_err(backend)? as f64);
            }
        }
        let primary_height = match primary_height {
            Some(h) => h,
            None => monitors[0].height().map_err(backend)? as f64,
        };

        let mut surfaces = Vec::with_capacity(monitors.len());
        for monitor in &monitors {
            let x = monitor.x().map_err(backend)? as f64;
            let y = monitor.y().map_err(backend)? as f64;
            let width = monitor.width().map_err(backend)? as f64;
            let height = monitor.height().map_err(backend)? as f64;
            let scale = monitor.scale_factor().map_err(backend)? as f64;
            let frame = Rect::<Global>::new(x, primary_height - (y + height), width, height);
            surfaces.push(SurfaceDescriptor::new(
                monitor.id().map_err(backend)?,
                frame,
                if scale > 0.0 { scale } else { 1.0 },
            ));
        }
        log::info!("[CAPTURE] Enumerated {} monitor(s)", surfaces.len());
        Ok(surfaces)
    }
}

impl CaptureProvider for XcapCapture {
    fn capture(
        &self,
        surface: &SurfaceDescriptor,
        region: Rect<CapturePixels>,
    ) -> Result<DynamicImage, CaptureError> {
        let start = std::time::Instant::now();
        let monitors = Monitor::all().map_err(backend)?;
        let mut target = None;
        for monitor in monitors {
            if monitor.id().map_err(backend)? == surface.id.0 {
                target = Some(monitor);
                break;
            }
        }
        let monitor = target.ok_or(CaptureError::NoDisplay(surface.id))?;

        let full = DynamicImage::ImageRgba8(monitor.capture_image().map_err(backend)?);
        log::info!(
            "[CAPTURE] {} captured {}x{} in {}ms",
            surface.id,
            full.width(),
            full.height(),
            start.elapsed().as_millis()
        );
        region::crop_to_capture_rect(&full, &region)
    }
}
