//! Screen capture domain: public API.
//!
//! This module owns the interactive area-capture flow: hiding the host
//! window, grabbing a frame, letting the user drag a rectangle on an
//! overlay, cropping, and putting the host back no matter how the
//! session ends. Platform pieces (host window, frame source, overlay
//! surface) plug in through traits so the flow itself stays testable.

pub mod captured;
pub mod error;
pub mod host;
pub mod orchestrator;
pub mod overlay;
pub mod rect;
pub mod region;
pub mod relay;
pub mod screenshot;
pub mod session;

pub use captured::CapturedImage;
pub use error::CaptureError;
pub use host::HostWindow;
pub use orchestrator::CaptureOrchestrator;
pub use overlay::{HeadlessOverlay, OverlayDriver, OverlayInput, OverlaySurface};
pub use rect::SelectionRect;
pub use region::crop;
pub use screenshot::{FrameSource, Resolution};
pub use session::{CancelReason, SessionOutcome, SessionState};

#[cfg(feature = "native-capture")]
pub use screenshot::XcapFrameSource;
