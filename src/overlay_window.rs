//! Tauri-backed host window and overlay surface.
//!
//! The overlay is a borderless, fullscreen, always-on-top webview loading
//! `overlay.html`. Its script draws the frame and the live rectangle and
//! forwards raw pointer/key input through the `overlay_input` command;
//! the selection logic itself runs in the overlay context on the Rust side.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tauri::{AppHandle, Emitter, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder};
use tokio::sync::mpsc;

use crate::capture::overlay::{
    spawn_overlay_context, FrameRenderer, OverlayHandle, OverlayInput, OverlaySurface,
    RenderStatus,
};
use crate::capture::relay::{OverlayEndpoint, OverlayFrame};
use crate::capture::{CaptureError, HostWindow};

pub const MAIN_LABEL: &str = "main";
/// Overlay windows are labelled `overlay-<generation>` so a new overlay
/// never collides with one that is still being torn down.
pub const OVERLAY_LABEL_PREFIX: &str = "overlay-";

fn overlay_label(generation: u64) -> String {
    format!("{}{}", OVERLAY_LABEL_PREFIX, generation)
}

fn is_overlay_label(label: &str) -> bool {
    label
        .strip_prefix(OVERLAY_LABEL_PREFIX)
        .is_some_and(|generation| generation.parse::<u64>().is_ok())
}

/// The main chat window. A missing window counts as success so every
/// call stays idempotent.
pub struct MainWindowHost {
    app: AppHandle,
}

impl MainWindowHost {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }

    fn window(&self) -> Option<WebviewWindow> {
        self.app.get_webview_window(MAIN_LABEL)
    }
}

impl HostWindow for MainWindowHost {
    fn hide(&self) -> Result<(), String> {
        match self.window() {
            Some(window) => window.hide().map_err(|e| e.to_string()),
            None => Ok(()),
        }
    }

    fn show(&self) -> Result<(), String> {
        match self.window() {
            Some(window) => window.show().map_err(|e| e.to_string()),
            None => Ok(()),
        }
    }

    fn focus(&self) -> Result<(), String> {
        match self.window() {
            Some(window) => window.set_focus().map_err(|e| e.to_string()),
            None => Ok(()),
        }
    }
}

/// Bridge between the overlay webview's commands and the overlay context.
///
/// Holds the input sender for the overlay currently on screen and the
/// frame it should show. The frame is pulled by the page on load, so a
/// page that loads after the frame was sent still gets it. Each attach
/// gets a generation so a late `Destroyed` event from the previous
/// overlay cannot detach the current one.
#[derive(Default)]
pub struct OverlayBridge {
    inputs: Mutex<Option<(u64, mpsc::UnboundedSender<OverlayInput>)>>,
    frame: Mutex<Option<OverlayFrame>>,
    generation: AtomicU64,
}

impl OverlayBridge {
    fn attach(&self, inputs: mpsc::UnboundedSender<OverlayInput>) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        *self.inputs.lock().unwrap_or_else(PoisonError::into_inner) = Some((generation, inputs));
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        generation
    }

    /// Drops the input sender; the overlay context reads that as `Closed`.
    fn detach(&self, generation: u64) {
        let mut inputs = self.inputs.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(inputs.as_ref(), Some((current, _)) if *current == generation) {
            inputs.take();
            self.frame
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
        }
    }

    pub fn forward(&self, input: OverlayInput) {
        let guard = self.inputs.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some((_, tx)) => {
                let _ = tx.send(input);
            }
            None => log::debug!("[OVERLAY] Input {:?} with no active overlay", input),
        }
    }

    pub fn current_frame(&self) -> Option<OverlayFrame> {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

struct WebviewRenderer {
    app: AppHandle,
    label: String,
}

impl FrameRenderer for WebviewRenderer {
    fn render(&mut self, frame: &OverlayFrame) -> Result<RenderStatus, String> {
        let bridge = self.app.state::<OverlayBridge>();
        *bridge.frame.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame.clone());

        self.app
            .emit_to(self.label.as_str(), "capture-frame", frame)
            .map_err(|e| e.to_string())?;

        // The page reports `painted` once the <img> has loaded.
        Ok(RenderStatus::Pending)
    }
}

pub struct WebviewOverlaySurface {
    app: AppHandle,
}

impl WebviewOverlaySurface {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl OverlaySurface for WebviewOverlaySurface {
    fn present(&self, endpoint: OverlayEndpoint) -> Result<Box<dyn OverlayHandle>, CaptureError> {
        // A stale overlay from a crashed session must not swallow input.
        for (label, stale) in self.app.webview_windows() {
            if is_overlay_label(&label) {
                log::warn!("[OVERLAY] Destroying leftover overlay window {}", label);
                let _ = stale.destroy();
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let bridge = self.app.state::<OverlayBridge>();
        let generation = bridge.attach(tx);
        let label = overlay_label(generation);

        let window = WebviewWindowBuilder::new(
            &self.app,
            label.as_str(),
            WebviewUrl::App("overlay.html".into()),
        )
        .fullscreen(true)
        .transparent(true)
        .decorations(false)
        .always_on_top(true)
        .skip_taskbar(true)
        .resizable(false)
        .shadow(false)
        .title("Glimpse Capture")
        .build()
        .map_err(|e| {
            bridge.detach(generation);
            CaptureError::OverlayConstructionFailed(e.to_string())
        })?;

        let app = self.app.clone();
        window.on_window_event(move |event| {
            if let tauri::WindowEvent::Destroyed = event {
                log::debug!("[OVERLAY] Window destroyed");
                app.state::<OverlayBridge>().detach(generation);
            }
        });

        spawn_overlay_context(
            endpoint,
            rx,
            WebviewRenderer {
                app: self.app.clone(),
                label,
            },
        );

        Ok(Box::new(WebviewOverlayHandle {
            window: Some(window),
        }))
    }
}

struct WebviewOverlayHandle {
    window: Option<WebviewWindow>,
}

impl OverlayHandle for WebviewOverlayHandle {
    fn dismiss(&mut self) {
        if let Some(window) = self.window.take() {
            if let Err(e) = window.destroy() {
                log::warn!("[OVERLAY] Failed to destroy overlay window: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_labels_are_per_generation() {
        assert_eq!(overlay_label(3), "overlay-3");
        assert_ne!(overlay_label(1), overlay_label(2));
        assert!(is_overlay_label(&overlay_label(42)));
        assert!(!is_overlay_label(MAIN_LABEL));
        assert!(!is_overlay_label("overlay-"));
        assert!(!is_overlay_label("overlay-settings"));
    }

    #[test]
    fn late_detach_from_previous_overlay_is_ignored() {
        let bridge = OverlayBridge::default();
        let (old_tx, _old_rx) = mpsc::unbounded_channel();
        let old = bridge.attach(old_tx);
        let (new_tx, mut new_rx) = mpsc::unbounded_channel();
        let current = bridge.attach(new_tx);
        assert_ne!(old, current);

        bridge.detach(old);
        bridge.forward(OverlayInput::Escape);
        assert_eq!(new_rx.try_recv().ok(), Some(OverlayInput::Escape));

        bridge.detach(current);
        bridge.forward(OverlayInput::Escape);
        assert!(new_rx.try_recv().is_err());
    }
}
