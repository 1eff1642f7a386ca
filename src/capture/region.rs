//! Region cropping for captured bitmaps.

use super::CaptureError;
use crate::geometry::{CapturePixels, Rect};
use image::DynamicImage;

// Float noise from scaling must not push a crop one pixel wider.
const EDGE_EPSILON: f64 = 1e-6;

/// Whole-pixel bounds `(x, y, width, height)` covering `region`, rounded outward.
fn pixel_bounds(
    region: &Rect<CapturePixels>,
    image_width: u32,
    image_height: u32,
) -> Result<(u32, u32, u32, u32), CaptureError> {
    let out_of_bounds = || CaptureError::CropOutOfBounds {
        x: region.origin.x,
        y: region.origin.y,
        width: region.width,
        height: region.height,
        image_width,
        image_height,
    };

    let x0 = (region.min_x() + EDGE_EPSILON).floor();
    let y0 = (region.min_y() + EDGE_EPSILON).floor();
    let x1 = (region.max_x() - EDGE_EPSILON).ceil();
    let y1 = (region.max_y() - EDGE_EPSILON).ceil();

    if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite())
        || x0 < 0.0
        || y0 < 0.0
        || x1 > image_width as f64
        || y1 > image_height as f64
        || x1 <= x0
        || y1 <= y0
    {
        return Err(out_of_bounds());
    }

    Ok((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
}

/// Crop a full-surface bitmap to a capture-pixel rect.
pub fn crop_to_capture_rect(
    full: &DynamicImage,
    region: &Rect<CapturePixels>,
) -> Result<DynamicImage, CaptureError> {
    let (x, y, width, height) = pixel_bounds(region, full.width(), full.height())?;
    Ok(full.crop_imm(x, y, width, height))
}

/// Crop and encode to PNG in memory, no disk I/O.
pub fn crop_to_png_bytes(
    full: &DynamicImage,
    region: &Rect<CapturePixels>,
) -> Result<Vec<u8>, CaptureError> {
    let cropped = crop_to_capture_rect(full, region)?;
    let mut png_bytes = Vec::new();
    cropped
        .write_to(
            &mut std::io::Cursor::new(&mut png_bytes),
            image::ImageFormat::Png,
        )
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn checker(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        }))
    }

    #[test]
    fn crops_exact_pixel_rect() {
        let full = checker(200, 100);
        let cropped = crop_to_capture_rect(&full, &Rect::new(20.0, 10.0, 60.0, 80.0)).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (60, 80));
    }

    #[test]
    fn fractional_rect_rounds_outward() {
        let full = checker(100, 100);
        let cropped = crop_to_capture_rect(&full, &Rect::new(10.5, 10.5, 9.0, 9.0)).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (10, 10));
    }

    #[test]
    fn rect_past_the_edge_is_rejected() {
        let full = checker(100, 100);
        let err = crop_to_capture_rect(&full, &Rect::new(90.0, 0.0, 20.0, 10.0)).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::CropOutOfBounds {
                image_width: 100,
                ..
            }
        ));
        assert!(crop_to_capture_rect(&full, &Rect::new(-1.0, 0.0, 10.0, 10.0)).is_err());
        assert!(crop_to_capture_rect(&full, &Rect::new(0.0, 0.0, 0.0, 10.0)).is_err());
    }

    #[test]
    fn png_bytes_have_png_signature() {
        let full = checker(32, 32);
        let png = crop_to_png_bytes(&full, &Rect::new(0.0, 0.0, 16.0, 16.0)).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 16);
    }
}
