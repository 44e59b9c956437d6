//! Frame Source: full-display still capture.
//!
//! This is the infrastructure layer: it talks to the OS through `xcap`.
//! The orchestrator only sees the `FrameSource` trait, so tests and
//! headless builds plug in their own source.

use image::{imageops::FilterType, DynamicImage};
use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Pixel size a frame should be delivered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Anything that can hand out a still snapshot of a display.
///
/// `Ok(None)` means there was nothing to capture (zero displays).
/// Implementations may block; the orchestrator calls them off the
/// async executor.
pub trait FrameSource: Send + Sync {
    fn acquire(&self, target: Option<Resolution>) -> Result<Option<DynamicImage>, CaptureError>;
}

/// Scales `frame` to exactly `target`, or returns it untouched when no
/// target is requested or it already matches.
pub fn fit_to_resolution(frame: DynamicImage, target: Option<Resolution>) -> DynamicImage {
    match target {
        Some(t)
            if t.width > 0
                && t.height > 0
                && (frame.width(), frame.height()) != (t.width, t.height) =>
        {
            log::debug!(
                "[CAPTURE] Resizing frame {}x{} -> {}x{}",
                frame.width(),
                frame.height(),
                t.width,
                t.height
            );
            frame.resize_exact(t.width, t.height, FilterType::Triangle)
        }
        _ => frame,
    }
}

/// Captures the first enumerated monitor with `xcap`.
///
/// Picking the first display is a known simplification: no attempt is
/// made to follow the cursor or the host window across monitors.
#[cfg(feature = "native-capture")]
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapFrameSource;

#[cfg(feature = "native-capture")]
impl FrameSource for XcapFrameSource {
    fn acquire(&self, target: Option<Resolution>) -> Result<Option<DynamicImage>, CaptureError> {
        let start = std::time::Instant::now();

        let monitors = xcap::Monitor::all()
            .map_err(|e| CaptureError::FrameAcquisition(format!("monitor enumeration: {}", e)))?;

        let Some(monitor) = monitors.into_iter().next() else {
            log::warn!("[CAPTURE] No monitors reported by the display server");
            return Ok(None);
        };

        let image = monitor
            .capture_image()
            .map_err(|e| CaptureError::FrameAcquisition(e.to_string()))?;

        log::info!(
            "[CAPTURE] Monitor '{}' captured in {}ms ({}x{})",
            monitor.name().unwrap_or_default(),
            start.elapsed().as_millis(),
            image.width(),
            image.height()
        );

        Ok(Some(fit_to_resolution(DynamicImage::ImageRgba8(image), target)))
    }
}
