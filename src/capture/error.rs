//! Capture error taxonomy.

use super::rect::SelectionRect;

/// Everything that can go wrong during a capture.
///
/// Only `SessionBusy` ever reaches an area-capture caller as an error;
/// the rest are folded into a `null` result after the host is restored.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("No capturable display found")]
    NoFrameSource,

    #[error("Frame acquisition failed: {0}")]
    FrameAcquisition(String),

    #[error("Overlay could not be created: {0}")]
    OverlayConstructionFailed(String),

    #[error(
        "Crop rectangle ({},{},{},{}) exceeds frame bounds ({}x{})",
        rect.x, rect.y, rect.width, rect.height,
        frame_size.0, frame_size.1
    )]
    CropOutOfBounds {
        rect: SelectionRect,
        frame_size: (u32, u32),
    },

    #[error("Crop rectangle has zero width or height")]
    ZeroDimension,

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),

    #[error("A capture session is already active")]
    SessionBusy,
}
