//! Glimpse: desktop AI chat companion.
//!
//! The library holds the screen-capture core (`capture/`) and its
//! configuration. With the `desktop` feature it also provides the Tauri
//! app shell that wires together:
//! - System tray and Alt+Space toggle (tray.rs)
//! - Main-window host control and the webview overlay (overlay_window.rs)
//! - Tauri command handlers for frontend communication

pub mod capture;
pub mod config;

#[cfg(feature = "desktop")]
mod overlay_window;
#[cfg(feature = "desktop")]
mod tray;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use std::sync::Arc;
    use tauri::Manager;

    use crate::capture::overlay::OverlayInput;
    use crate::capture::relay::OverlayFrame;
    use crate::capture::{CaptureOrchestrator, CapturedImage, XcapFrameSource};
    use crate::config::CaptureConfig;
    use crate::overlay_window::{MainWindowHost, OverlayBridge, WebviewOverlaySurface};
    use crate::tray;

    /// Tauri command: run an interactive area capture.
    ///
    /// Resolves to `null` when the user cancels or the capture fails;
    /// rejects only when a capture is already running.
    #[tauri::command]
    async fn request_area_capture(
        orchestrator: tauri::State<'_, Arc<CaptureOrchestrator>>,
    ) -> Result<Option<CapturedImage>, String> {
        orchestrator
            .request_area_capture()
            .await
            .map_err(|e| e.to_string())
    }

    /// Tauri command: full-screen screenshot, no overlay.
    #[tauri::command]
    async fn take_screenshot(
        orchestrator: tauri::State<'_, Arc<CaptureOrchestrator>>,
    ) -> Result<CapturedImage, String> {
        orchestrator
            .take_screenshot()
            .await
            .map_err(|e| e.to_string())
    }

    /// Tauri command: show/hide the chat window.
    #[tauri::command]
    fn toggle_visibility(app: tauri::AppHandle) {
        tray::toggle_main_window(&app);
    }

    /// Tauri command (overlay page): fetch the frame to draw.
    ///
    /// Pulled rather than pushed so a page that finishes loading after the
    /// frame was sent still gets it.
    #[tauri::command]
    fn overlay_frame(bridge: tauri::State<'_, OverlayBridge>) -> Option<OverlayFrame> {
        bridge.current_frame()
    }

    /// Tauri command (overlay page): relay pointer/key input.
    #[tauri::command]
    fn overlay_input(bridge: tauri::State<'_, OverlayBridge>, input: OverlayInput) {
        bridge.forward(input);
    }

    /// Entry point: called by Tauri runtime.
    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        env_logger::init();

        let config = CaptureConfig::load();

        tauri::Builder::default()
            .manage(OverlayBridge::default())
            .invoke_handler(tauri::generate_handler![
                request_area_capture,
                take_screenshot,
                toggle_visibility,
                overlay_frame,
                overlay_input
            ])
            .setup(move |app| {
                log::info!("Glimpse starting up");

                let handle = app.handle().clone();
                let orchestrator = CaptureOrchestrator::new(
                    Arc::new(MainWindowHost::new(handle.clone())),
                    Arc::new(XcapFrameSource),
                    Arc::new(WebviewOverlaySurface::new(handle.clone())),
                    config,
                );
                app.manage(Arc::new(orchestrator));

                tray::setup_tray(&handle)?;
                if let Err(e) = tray::setup_global_shortcut(&handle) {
                    log::warn!("[TRAY] Global shortcut unavailable: {}", e);
                }

                log::info!("System tray initialized");
                Ok(())
            })
            .run(tauri::generate_context!())
            .expect("Error running Glimpse");
    }
}
