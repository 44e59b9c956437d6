//! Selection Relay: message path between the orchestrator and the overlay.
//!
//! The overlay runs as its own task (and, on desktop, its own webview), so
//! the two sides never share state. The host pushes the frame in; the
//! overlay pushes interaction results out. The relay is one-shot from the
//! host's point of view: once the session resolves the host end is dropped
//! and any later overlay events go nowhere.

use serde::Serialize;
use tokio::sync::mpsc;

use super::rect::SelectionRect;

/// Pre-encoded frame the overlay shows as its background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayFrame {
    pub width: u32,
    pub height: u32,
    pub data_url: String,
}

/// Host → overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostToOverlay {
    ShowFrame(OverlayFrame),
    Close,
}

/// Overlay → host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayToHost {
    /// The frame has been drawn; user interaction may begin.
    FirstPaint,
    SelectionConfirmed(SelectionRect),
    Cancelled,
    /// The surface went away without confirming or cancelling.
    Closed,
}

/// Creates a connected host end / overlay endpoint pair.
///
/// Both directions exist before the overlay is shown, so an event fired
/// the instant the surface becomes interactive is buffered, not lost.
pub fn channel(min_selection_px: u32) -> (HostEnd, OverlayEndpoint) {
    let (to_overlay_tx, to_overlay_rx) = mpsc::unbounded_channel();
    let (to_host_tx, to_host_rx) = mpsc::unbounded_channel();

    (
        HostEnd {
            outbound: to_overlay_tx,
            inbound: to_host_rx,
        },
        OverlayEndpoint {
            inbound: to_overlay_rx,
            outbound: to_host_tx,
            min_selection_px,
        },
    )
}

/// Orchestrator side of the relay.
pub struct HostEnd {
    outbound: mpsc::UnboundedSender<HostToOverlay>,
    inbound: mpsc::UnboundedReceiver<OverlayToHost>,
}

impl HostEnd {
    /// Returns false when the overlay context is already gone.
    pub fn send_frame(&self, frame: OverlayFrame) -> bool {
        self.outbound.send(HostToOverlay::ShowFrame(frame)).is_ok()
    }

    pub fn request_close(&self) {
        let _ = self.outbound.send(HostToOverlay::Close);
    }

    /// Next overlay event. A disconnected overlay reads as `Closed`.
    pub async fn next_event(&mut self) -> OverlayToHost {
        self.inbound.recv().await.unwrap_or(OverlayToHost::Closed)
    }
}

/// Overlay side of the relay, handed to `OverlaySurface::present`.
pub struct OverlayEndpoint {
    inbound: mpsc::UnboundedReceiver<HostToOverlay>,
    outbound: mpsc::UnboundedSender<OverlayToHost>,
    min_selection_px: u32,
}

impl OverlayEndpoint {
    pub fn min_selection_px(&self) -> u32 {
        self.min_selection_px
    }

    pub async fn recv(&mut self) -> Option<HostToOverlay> {
        self.inbound.recv().await
    }

    /// Returns false once the host has stopped listening.
    pub fn emit(&self, event: OverlayToHost) -> bool {
        self.outbound.send(event).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropped_overlay_reads_as_closed() {
        let (mut host, endpoint) = channel(10);
        assert!(endpoint.emit(OverlayToHost::FirstPaint));
        drop(endpoint);

        assert_eq!(host.next_event().await, OverlayToHost::FirstPaint);
        assert_eq!(host.next_event().await, OverlayToHost::Closed);
    }

    #[tokio::test]
    async fn events_before_listening_are_buffered() {
        let (mut host, endpoint) = channel(10);
        let rect = SelectionRect::new(1, 2, 30, 40);
        endpoint.emit(OverlayToHost::SelectionConfirmed(rect));
        assert_eq!(
            host.next_event().await,
            OverlayToHost::SelectionConfirmed(rect)
        );
    }

    #[tokio::test]
    async fn emit_fails_after_host_drops() {
        let (host, endpoint) = channel(10);
        drop(host);
        assert!(!endpoint.emit(OverlayToHost::Cancelled));
    }

    #[tokio::test]
    async fn frame_then_close_arrive_in_order() {
        let (host, mut endpoint) = channel(10);
        let frame = OverlayFrame {
            width: 2,
            height: 2,
            data_url: "data:image/png;base64,".to_string(),
        };
        assert!(host.send_frame(frame.clone()));
        host.request_close();

        assert_eq!(endpoint.recv().await, Some(HostToOverlay::ShowFrame(frame)));
        assert_eq!(endpoint.recv().await, Some(HostToOverlay::Close));
    }
}
