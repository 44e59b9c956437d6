//! Capture Orchestrator: drives one area-capture session end to end.
//!
//! hide host → grab frame → present overlay → wait for the first of
//! {selection, cancel, close, timeout} → crop → restore host.
//!
//! The wait is the only suspension point that depends on the user. The
//! relay receiver exists before the overlay is presented, so no event
//! can be missed, and the first terminal event resolves the session;
//! the relay is then dropped so later events have nowhere to go.
//!
//! When an overlay reports a selection and then tears itself down, the
//! relay delivers them in that order, so the selection wins.

use image::DynamicImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::captured::CapturedImage;
use super::error::CaptureError;
use super::host::{HostRestore, HostWindow};
use super::overlay::{OverlayHandle, OverlaySurface};
use super::rect::SelectionRect;
use super::region;
use super::relay::{self, HostEnd, OverlayFrame, OverlayToHost};
use super::screenshot::{FrameSource, Resolution};
use super::session::{
    read_state, ActiveSessionGuard, CancelReason, CaptureSession, SessionOutcome, SessionState,
    SharedState,
};
use crate::config::CaptureConfig;

/// What ended the wait for user input.
enum Decision {
    Selected(SelectionRect),
    Cancelled(CancelReason),
}

/// Dismisses the overlay on every path, including early returns.
struct OverlayGuard(Box<dyn OverlayHandle>);

impl Drop for OverlayGuard {
    fn drop(&mut self) {
        self.0.dismiss();
    }
}

pub struct CaptureOrchestrator {
    host: Arc<dyn HostWindow>,
    source: Arc<dyn FrameSource>,
    overlay: Arc<dyn OverlaySurface>,
    config: CaptureConfig,
    state: SharedState,
    next_session_id: AtomicU64,
}

impl CaptureOrchestrator {
    pub fn new(
        host: Arc<dyn HostWindow>,
        source: Arc<dyn FrameSource>,
        overlay: Arc<dyn OverlaySurface>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            host,
            source,
            overlay,
            config,
            state: Arc::new(Mutex::new(SessionState::Idle)),
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Current session state; `Idle` when no session is active.
    pub fn state(&self) -> SessionState {
        read_state(&self.state)
    }

    /// Runs an area capture and returns the image, or `None` when the user
    /// cancelled or anything went wrong. Only `SessionBusy` is an error.
    pub async fn request_area_capture(&self) -> Result<Option<CapturedImage>, CaptureError> {
        Ok(self.capture_area().await?.into_image())
    }

    /// Same as `request_area_capture` but keeps the reason a session ended
    /// without an image.
    pub async fn capture_area(&self) -> Result<SessionOutcome, CaptureError> {
        let slot = ActiveSessionGuard::claim(&self.state).inspect_err(|_| {
            log::warn!("[CAPTURE] Capture requested while a session is active");
        })?;

        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let mut session = CaptureSession::new(id, self.state.clone());
        let restore = HostRestore::new(self.host.clone());

        log::info!("[CAPTURE] Session {} started", id);
        let start = std::time::Instant::now();

        let outcome = self.run_session(&mut session).await;

        match &outcome {
            SessionOutcome::Completed(image) => log::info!(
                "[CAPTURE] Session {} completed in {}ms: {} ({} bytes)",
                id,
                start.elapsed().as_millis(),
                image.file_name,
                image.size
            ),
            SessionOutcome::Cancelled(reason) => {
                log::info!("[CAPTURE] Session {} cancelled: {}", id, reason)
            }
            SessionOutcome::Failed(e) => log::error!("[CAPTURE] Session {} failed: {}", id, e),
        }

        session.finish(&outcome);
        restore.restore();
        drop(slot);

        Ok(outcome)
    }

    async fn run_session(&self, session: &mut CaptureSession) -> SessionOutcome {
        if let Err(e) = self.host.hide() {
            log::warn!("[CAPTURE] Failed to hide host window: {}", e);
        }

        let settle = self.config.settle_delay();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        let frame = match self.acquire_frame(self.config.target_resolution).await {
            Ok(frame) => frame,
            Err(e) => return SessionOutcome::Failed(e),
        };
        session.attach_frame(frame);

        let Some(full_frame) = session.frame() else {
            return SessionOutcome::Failed(CaptureError::NoFrameSource);
        };
        let overlay_frame = match encode_overlay_frame(full_frame) {
            Ok(frame) => frame,
            Err(e) => return SessionOutcome::Failed(e),
        };

        let (mut relay, endpoint) = relay::channel(self.config.min_selection_px);
        let overlay = match self.overlay.present(endpoint) {
            Ok(handle) => OverlayGuard(handle),
            Err(e) => return SessionOutcome::Failed(e),
        };
        session.advance(SessionState::OverlayPresented);

        if !relay.send_frame(overlay_frame) {
            log::warn!(
                "[CAPTURE] Session {}: overlay went away before receiving the frame",
                session.id()
            );
        }

        let decision = self.await_selection(session, &mut relay).await;

        relay.request_close();
        drop(relay);
        drop(overlay);

        match decision {
            Decision::Cancelled(reason) => SessionOutcome::Cancelled(reason),
            Decision::Selected(rect) => {
                session.advance(SessionState::Cropping);
                let Some(full_frame) = session.frame() else {
                    return SessionOutcome::Failed(CaptureError::NoFrameSource);
                };
                match region::crop(full_frame, rect) {
                    Ok(image) => SessionOutcome::Completed(image),
                    Err(e) => SessionOutcome::Failed(e),
                }
            }
        }
    }

    /// Waits for the first terminal overlay event.
    ///
    /// Undersized selections (and selections before the first paint) are
    /// ignored and the wait continues.
    async fn await_selection(&self, session: &mut CaptureSession, relay: &mut HostEnd) -> Decision {
        let deadline = self
            .config
            .selection_timeout()
            .map(|timeout| tokio::time::Instant::now() + timeout);

        loop {
            let event = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, relay.next_event()).await {
                        Ok(event) => event,
                        Err(_) => return Decision::Cancelled(CancelReason::TimedOut),
                    }
                }
                None => relay.next_event().await,
            };

            match event {
                OverlayToHost::FirstPaint => {
                    if session.state() == SessionState::OverlayPresented {
                        session.advance(SessionState::AwaitingSelection);
                    }
                }
                OverlayToHost::SelectionConfirmed(rect) => {
                    if session.state() != SessionState::AwaitingSelection {
                        log::debug!(
                            "[CAPTURE] Session {}: selection before first paint ignored",
                            session.id()
                        );
                        continue;
                    }
                    if !rect.exceeds(self.config.min_selection_px) {
                        log::debug!(
                            "[CAPTURE] Session {}: {}x{} selection below threshold, still waiting",
                            session.id(),
                            rect.width,
                            rect.height
                        );
                        continue;
                    }
                    return Decision::Selected(rect);
                }
                OverlayToHost::Cancelled => return Decision::Cancelled(CancelReason::Explicit),
                OverlayToHost::Closed => return Decision::Cancelled(CancelReason::OverlayClosed),
            }
        }
    }

    /// Full-screen screenshot without hiding the host or showing an overlay.
    ///
    /// Unlike area capture, failures are returned to the caller.
    pub async fn take_screenshot(&self) -> Result<CapturedImage, CaptureError> {
        let frame = self.acquire_frame(self.config.screenshot_resolution).await?;
        let png_bytes = region::encode_png(&frame)?;
        log::info!(
            "[CAPTURE] Screenshot {}x{} encoded ({} bytes)",
            frame.width(),
            frame.height(),
            png_bytes.len()
        );
        Ok(CapturedImage::screenshot(&png_bytes))
    }

    async fn acquire_frame(&self, target: Option<Resolution>) -> Result<DynamicImage, CaptureError> {
        let source = self.source.clone();
        let frame = tokio::task::spawn_blocking(move || source.acquire(target))
            .await
            .map_err(|e| CaptureError::FrameAcquisition(format!("capture task failed: {}", e)))??;

        frame.ok_or(CaptureError::NoFrameSource)
    }
}

fn encode_overlay_frame(frame: &DynamicImage) -> Result<OverlayFrame, CaptureError> {
    let start = std::time::Instant::now();
    let png_bytes = region::encode_png(frame)?;
    log::debug!(
        "[CAPTURE] Overlay frame encoded in {}ms ({} bytes)",
        start.elapsed().as_millis(),
        png_bytes.len()
    );

    Ok(OverlayFrame {
        width: frame.width(),
        height: frame.height(),
        data_url: region::png_data_url(&png_bytes),
    })
}
