//! The image handed back to the chat input after a successful capture.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use super::error::CaptureError;

pub const PNG_MIME: &str = "image/png";

/// A finished capture, ready to attach to a message.
///
/// Only ever built from fully encoded PNG bytes, so it is never partially
/// populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedImage {
    pub file_name: String,
    /// `data:image/png;base64,...`
    pub data: String,
    /// Size of the PNG payload in bytes.
    pub size: usize,
    pub mime_type: String,
}

impl CapturedImage {
    /// Result of an area capture: `capture_<unix-ms>.png`.
    pub fn area_capture(png_bytes: &[u8]) -> Self {
        Self::from_png(format!("capture_{}.png", unix_millis()), png_bytes)
    }

    /// Result of a full-screen screenshot: `screenshot-<unix-ms>.png`.
    pub fn screenshot(png_bytes: &[u8]) -> Self {
        Self::from_png(format!("screenshot-{}.png", unix_millis()), png_bytes)
    }

    fn from_png(file_name: String, png_bytes: &[u8]) -> Self {
        Self {
            file_name,
            data: super::region::png_data_url(png_bytes),
            size: png_bytes.len(),
            mime_type: PNG_MIME.to_string(),
        }
    }

    /// Decodes the data URL back into raw PNG bytes.
    pub fn png_bytes(&self) -> Result<Vec<u8>, CaptureError> {
        let encoded = self
            .data
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or(&self.data);
        STANDARD
            .decode(encoded)
            .map_err(|e| CaptureError::EncodingFailed(e.to_string()))
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
