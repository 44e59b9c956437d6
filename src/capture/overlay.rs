//! Overlay Surface: the full-screen drag-to-select device.
//!
//! The overlay knows nothing about cropping or the host window. It draws
//! the frame, turns raw pointer/key input into at most one meaningful
//! result, and reports it over the relay. Each presented overlay runs its
//! own event loop (`run_overlay_context`) as an independent task.

use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::error::CaptureError;
use super::rect::SelectionRect;
use super::relay::{HostToOverlay, OverlayEndpoint, OverlayFrame, OverlayToHost};

/// Raw input reaching the overlay, in overlay-local pixels.
///
/// Deserializes from the webview's `{ "kind": "pointerDown", "x": .., "y": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OverlayInput {
    /// The frame is visible on screen.
    Painted,
    PointerDown { x: i32, y: i32 },
    PointerMove { x: i32, y: i32 },
    PointerUp { x: i32, y: i32 },
    /// The cancel gesture (Escape).
    Escape,
}

/// Pointer state machine that turns a press/release pair into a selection.
///
/// The live rectangle is drawn by the surface itself; only the release
/// point decides what gets confirmed.
#[derive(Debug, Clone)]
pub struct SelectionTracker {
    anchor: Option<(i32, i32)>,
    min_selection_px: u32,
}

impl SelectionTracker {
    pub fn new(min_selection_px: u32) -> Self {
        Self {
            anchor: None,
            min_selection_px,
        }
    }

    /// Feeds one input; returns the event to relay, if any.
    ///
    /// Escape cancels regardless of drag state. A pointer-up whose
    /// rectangle is too small is swallowed and the overlay stays usable.
    pub fn handle(&mut self, input: OverlayInput) -> Option<OverlayToHost> {
        match input {
            OverlayInput::Painted => Some(OverlayToHost::FirstPaint),
            OverlayInput::Escape => {
                self.anchor = None;
                Some(OverlayToHost::Cancelled)
            }
            OverlayInput::PointerDown { x, y } => {
                self.anchor = Some((x, y));
                None
            }
            OverlayInput::PointerMove { .. } => None,
            OverlayInput::PointerUp { x, y } => {
                let anchor = self.anchor.take()?;
                let rect = SelectionRect::from_points(anchor, (x, y));
                if rect.exceeds(self.min_selection_px) {
                    Some(OverlayToHost::SelectionConfirmed(rect))
                } else {
                    log::debug!(
                        "[OVERLAY] Ignoring {}x{} selection (min {}px)",
                        rect.width,
                        rect.height,
                        self.min_selection_px
                    );
                    None
                }
            }
        }
    }
}

/// Whether a frame is on screen once `render` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Painted,
    /// Painting finishes later and is reported as `OverlayInput::Painted`.
    Pending,
}

/// Puts the frame in front of the user.
pub trait FrameRenderer: Send + 'static {
    fn render(&mut self, frame: &OverlayFrame) -> Result<RenderStatus, String>;
}

/// Renderer for surfaces with nothing to draw on.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessRenderer;

impl FrameRenderer for HeadlessRenderer {
    fn render(&mut self, _frame: &OverlayFrame) -> Result<RenderStatus, String> {
        Ok(RenderStatus::Painted)
    }
}

/// The overlay's own event loop.
///
/// Waits for the frame, renders it, then turns `inputs` into relay events
/// until the host asks it to close or the input source disappears (the
/// window was destroyed), which is reported as `Closed`.
pub async fn run_overlay_context<R: FrameRenderer>(
    mut endpoint: OverlayEndpoint,
    mut inputs: mpsc::UnboundedReceiver<OverlayInput>,
    mut renderer: R,
) {
    let frame = loop {
        match endpoint.recv().await {
            Some(HostToOverlay::ShowFrame(frame)) => break frame,
            Some(HostToOverlay::Close) | None => return,
        }
    };

    match renderer.render(&frame) {
        Ok(RenderStatus::Painted) => {
            endpoint.emit(OverlayToHost::FirstPaint);
        }
        Ok(RenderStatus::Pending) => {}
        Err(e) => {
            log::error!("[OVERLAY] Failed to render frame: {}", e);
            endpoint.emit(OverlayToHost::Closed);
            return;
        }
    }

    let mut tracker = SelectionTracker::new(endpoint.min_selection_px());

    loop {
        tokio::select! {
            biased;
            message = endpoint.recv() => match message {
                Some(HostToOverlay::ShowFrame(_)) => {
                    log::warn!("[OVERLAY] Ignoring second frame for the same session");
                }
                Some(HostToOverlay::Close) | None => break,
            },
            input = inputs.recv() => match input {
                Some(input) => {
                    if let Some(event) = tracker.handle(input) {
                        endpoint.emit(event);
                    }
                }
                None => {
                    endpoint.emit(OverlayToHost::Closed);
                    break;
                }
            },
        }
    }

    log::debug!("[OVERLAY] Context finished");
}

/// Spawns `run_overlay_context` on the current tokio runtime.
pub fn spawn_overlay_context<R: FrameRenderer>(
    endpoint: OverlayEndpoint,
    inputs: mpsc::UnboundedReceiver<OverlayInput>,
    renderer: R,
) -> JoinHandle<()> {
    tokio::spawn(run_overlay_context(endpoint, inputs, renderer))
}

/// Something that can put an overlay on screen for one session.
///
/// `present` must wire `endpoint` to the surface before it becomes
/// interactive.
pub trait OverlaySurface: Send + Sync {
    fn present(&self, endpoint: OverlayEndpoint) -> Result<Box<dyn OverlayHandle>, CaptureError>;
}

/// Ownership of one presented overlay. Dismissing must be idempotent.
pub trait OverlayHandle: Send {
    fn dismiss(&mut self);
}

type InputSlot = Arc<Mutex<Option<mpsc::UnboundedSender<OverlayInput>>>>;

/// Overlay without a window, driven by a fixed input script or by an
/// `OverlayDriver`.
///
/// Without `hold_open`, the surface behaves like a window the user closes
/// right after the script: any script that does not confirm or cancel
/// ends as `Closed`.
pub struct HeadlessOverlay {
    script: Vec<OverlayInput>,
    hold_open: bool,
    slot: InputSlot,
    presented: Mutex<usize>,
}

impl HeadlessOverlay {
    pub fn scripted(script: Vec<OverlayInput>) -> Self {
        Self {
            script,
            hold_open: false,
            slot: Arc::new(Mutex::new(None)),
            presented: Mutex::new(0),
        }
    }

    /// Keeps the surface open after the script runs out.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Handle for feeding input into the currently presented overlay.
    pub fn driver(&self) -> OverlayDriver {
        OverlayDriver {
            slot: self.slot.clone(),
        }
    }

    /// How many times this surface has been presented.
    pub fn presented(&self) -> usize {
        *self.presented.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OverlaySurface for HeadlessOverlay {
    fn present(&self, endpoint: OverlayEndpoint) -> Result<Box<dyn OverlayHandle>, CaptureError> {
        let (tx, rx) = mpsc::unbounded_channel();
        for input in &self.script {
            let _ = tx.send(*input);
        }

        if self.hold_open {
            *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        }

        *self.presented.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        let task = spawn_overlay_context(endpoint, rx, HeadlessRenderer);
        Ok(Box::new(HeadlessOverlayHandle {
            slot: self.slot.clone(),
            task,
        }))
    }
}

struct HeadlessOverlayHandle {
    slot: InputSlot,
    task: JoinHandle<()>,
}

impl OverlayHandle for HeadlessOverlayHandle {
    fn dismiss(&mut self) {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.task.abort();
    }
}

/// Feeds input into a `HeadlessOverlay` while it is presented.
#[derive(Clone)]
pub struct OverlayDriver {
    slot: InputSlot,
}

impl OverlayDriver {
    /// Returns false when no overlay is currently presented.
    pub fn send(&self, input: OverlayInput) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|tx| tx.send(input).is_ok())
            .unwrap_or(false)
    }

    /// Simulates the window being closed by other means.
    pub fn close_window(&self) {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_presented(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Press, drag and release from `from` to `to`.
    pub fn drag(&self, from: (i32, i32), to: (i32, i32)) -> bool {
        self.send(OverlayInput::PointerDown {
            x: from.0,
            y: from.1,
        }) && self.send(OverlayInput::PointerMove { x: to.0, y: to.1 })
            && self.send(OverlayInput::PointerUp { x: to.0, y: to.1 })
    }
}
