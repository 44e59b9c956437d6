//! Pure region cropping logic: functional core.
//!
//! This module has zero infrastructure dependencies.
//! It takes pixel data in, returns pixel data out.
//!
//! Out-of-bounds rectangles are rejected, never clamped: a crop either
//! yields exactly the requested size or fails.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use super::captured::{CapturedImage, PNG_MIME};
use super::error::CaptureError;
use super::rect::SelectionRect;

/// Crops `frame` to `rect` and returns PNG bytes.
///
/// This is a pure function with no side effects.
pub fn crop_to_png_bytes(
    frame: &DynamicImage,
    rect: SelectionRect,
) -> Result<Vec<u8>, CaptureError> {
    if rect.width == 0 || rect.height == 0 {
        return Err(CaptureError::ZeroDimension);
    }

    let (frame_width, frame_height) = (frame.width(), frame.height());

    if !rect.fits_within(frame_width, frame_height) {
        return Err(CaptureError::CropOutOfBounds {
            rect,
            frame_size: (frame_width, frame_height),
        });
    }

    let cropped = frame.crop_imm(rect.x, rect.y, rect.width, rect.height);
    encode_png(&cropped)
}

/// Crops `frame` to `rect` and packages the result for the chat input.
pub fn crop(frame: &DynamicImage, rect: SelectionRect) -> Result<CapturedImage, CaptureError> {
    let start = std::time::Instant::now();
    let png_bytes = crop_to_png_bytes(frame, rect)?;

    log::info!(
        "[CAPTURE] Cropped region ({}x{} at {},{}) in {}ms, {} bytes",
        rect.width,
        rect.height,
        rect.x,
        rect.y,
        start.elapsed().as_millis(),
        png_bytes.len()
    );

    Ok(CapturedImage::area_capture(&png_bytes))
}

/// Encodes a whole image as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CaptureError> {
    let mut png_bytes: Vec<u8> = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;
    Ok(png_bytes)
}

/// Wraps PNG bytes in a `data:` URL the webview can use as an `<img>` source.
pub fn png_data_url(png_bytes: &[u8]) -> String {
    format!("data:{};base64,{}", PNG_MIME, STANDARD.encode(png_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([x as u8, y as u8, (x ^ y) as u8, 255])
        }))
    }

    #[test]
    fn crop_valid_region() {
        let img = gradient(100, 100);
        let bytes = crop_to_png_bytes(&img, SelectionRect::new(10, 10, 50, 50)).unwrap();
        // PNG magic bytes
        assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn crop_matches_source_pixels() {
        let img = gradient(200, 200);
        let bytes = crop_to_png_bytes(&img, SelectionRect::new(10, 10, 50, 50)).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (50, 50));

        let expected = img.crop_imm(10, 10, 50, 50).to_rgba8();
        assert_eq!(decoded.as_raw(), expected.as_raw());
    }

    #[test]
    fn crop_zero_dimension_fails() {
        let img = gradient(100, 100);
        let result = crop_to_png_bytes(&img, SelectionRect::new(0, 0, 0, 50));
        assert!(matches!(result, Err(CaptureError::ZeroDimension)));
    }

    #[test]
    fn crop_out_of_bounds_fails() {
        let img = gradient(100, 100);
        let result = crop_to_png_bytes(&img, SelectionRect::new(80, 80, 30, 30));
        assert!(matches!(
            result,
            Err(CaptureError::CropOutOfBounds {
                frame_size: (100, 100),
                ..
            })
        ));
    }

    #[test]
    fn crop_touching_far_edge_is_allowed() {
        let img = gradient(100, 100);
        assert!(crop_to_png_bytes(&img, SelectionRect::new(50, 50, 50, 50)).is_ok());
    }

    #[test]
    fn data_url_has_png_prefix() {
        let url = png_data_url(&[1, 2, 3]);
        assert_eq!(url, "data:image/png;base64,AQID");
    }
}
