//! Capture session state machine.
//!
//! ```text
//! Idle → HostHidden → FrameAcquired → OverlayPresented → AwaitingSelection
//!      → Cropping → Completed | Cancelled | Failed → (RestoreHost) → Idle
//! ```

use image::DynamicImage;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use super::captured::CapturedImage;
use super::error::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    HostHidden,
    FrameAcquired,
    OverlayPresented,
    AwaitingSelection,
    Cropping,
    Completed,
    Cancelled,
    Failed,
}

/// Why a session ended without an image. Callers of
/// `request_area_capture` never see this; logs and `capture_area` do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The user pressed the cancel gesture.
    Explicit,
    /// The overlay disappeared without reporting anything.
    OverlayClosed,
    /// The configured selection timeout ran out.
    TimedOut,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "cancelled by user"),
            Self::OverlayClosed => write!(f, "overlay closed without a selection"),
            Self::TimedOut => write!(f, "selection timed out"),
        }
    }
}

/// How a session resolved. Produced exactly once per session.
#[derive(Debug)]
pub enum SessionOutcome {
    Completed(CapturedImage),
    Cancelled(CancelReason),
    Failed(CaptureError),
}

impl SessionOutcome {
    pub fn terminal_state(&self) -> SessionState {
        match self {
            Self::Completed(_) => SessionState::Completed,
            Self::Cancelled(_) => SessionState::Cancelled,
            Self::Failed(_) => SessionState::Failed,
        }
    }

    /// Collapses the outcome into "image or nothing".
    pub fn into_image(self) -> Option<CapturedImage> {
        match self {
            Self::Completed(image) => Some(image),
            Self::Cancelled(_) | Self::Failed(_) => None,
        }
    }
}

pub(crate) type SharedState = Arc<Mutex<SessionState>>;

pub(crate) fn read_state(shared: &SharedState) -> SessionState {
    *shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks the orchestrator busy for as long as it lives.
pub(crate) struct ActiveSessionGuard {
    shared: SharedState,
}

impl ActiveSessionGuard {
    /// Check-and-set under one lock: succeeds only from `Idle`.
    pub(crate) fn claim(shared: &SharedState) -> Result<Self, CaptureError> {
        let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != SessionState::Idle {
            return Err(CaptureError::SessionBusy);
        }
        *state = SessionState::HostHidden;
        Ok(Self {
            shared: shared.clone(),
        })
    }
}

impl Drop for ActiveSessionGuard {
    fn drop(&mut self) {
        *self.shared.lock().unwrap_or_else(PoisonError::into_inner) = SessionState::Idle;
        log::debug!("[CAPTURE] Session slot released");
    }
}

/// One capture invocation. Owns the full frame exclusively.
pub(crate) struct CaptureSession {
    id: u64,
    state: SessionState,
    full_frame: Option<DynamicImage>,
    shared: SharedState,
}

impl CaptureSession {
    pub(crate) fn new(id: u64, shared: SharedState) -> Self {
        Self {
            id,
            state: SessionState::HostHidden,
            full_frame: None,
            shared,
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: SessionState) {
        log::debug!(
            "[CAPTURE] Session {}: {:?} -> {:?}",
            self.id,
            self.state,
            next
        );
        self.state = next;
        *self.shared.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    pub(crate) fn attach_frame(&mut self, frame: DynamicImage) {
        self.full_frame = Some(frame);
        self.advance(SessionState::FrameAcquired);
    }

    pub(crate) fn frame(&self) -> Option<&DynamicImage> {
        self.full_frame.as_ref()
    }

    /// Records the terminal state and releases the frame.
    pub(crate) fn finish(mut self, outcome: &SessionOutcome) {
        self.full_frame = None;
        self.advance(outcome.terminal_state());
    }
}
