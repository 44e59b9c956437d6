//! System tray and global shortcut.
//!
//! Left-click on the tray icon or Alt+Space toggles the chat window.
//! The context menu also offers an area capture and Quit.

use std::sync::Arc;
use tauri::{
    image::Image as TauriImage,
    menu::{MenuBuilder, MenuItemBuilder},
    tray::TrayIconBuilder,
    AppHandle, Emitter, Manager,
};

use crate::capture::CaptureOrchestrator;
use crate::overlay_window::MAIN_LABEL;

/// Sets up the system tray icon with its click and menu handlers.
pub fn setup_tray(app: &AppHandle) -> Result<(), Box<dyn std::error::Error>> {
    let toggle_item = MenuItemBuilder::with_id("toggle", "Show / Hide").build(app)?;
    let capture_item = MenuItemBuilder::with_id("capture", "Capture area").build(app)?;
    let quit_item = MenuItemBuilder::with_id("quit", "Quit Glimpse").build(app)?;
    let menu = MenuBuilder::new(app)
        .item(&toggle_item)
        .item(&capture_item)
        .separator()
        .item(&quit_item)
        .build()?;

    // Decode the PNG icon to RGBA for Tauri's Image type
    let icon_bytes = include_bytes!("../icons/32x32.png");
    let icon_img = image::load_from_memory(icon_bytes)
        .map_err(|e| format!("Failed to decode tray icon: {}", e))?;
    let rgba = icon_img.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    let tray_icon = TauriImage::new_owned(rgba.into_raw(), w, h);

    let _tray = TrayIconBuilder::new()
        .icon(tray_icon)
        .tooltip("Glimpse")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray_icon, event| {
            if let tauri::tray::TrayIconEvent::Click {
                button: tauri::tray::MouseButton::Left,
                button_state: tauri::tray::MouseButtonState::Up,
                ..
            } = event
            {
                toggle_main_window(tray_icon.app_handle());
            }
        })
        .on_menu_event(|app, event| match event.id().as_ref() {
            "toggle" => toggle_main_window(app),
            "capture" => start_capture_from_tray(app),
            "quit" => {
                log::info!("[TRAY] Quit requested from tray menu");
                app.exit(0);
            }
            _ => {}
        })
        .build(app)?;

    Ok(())
}

/// Shows and focuses the chat window when hidden, hides it otherwise.
pub fn toggle_main_window(app: &AppHandle) {
    let Some(window) = app.get_webview_window(MAIN_LABEL) else {
        return;
    };

    let result = if window.is_visible().unwrap_or(false) {
        window.hide()
    } else {
        window.show().and_then(|_| window.set_focus())
    };

    if let Err(e) = result {
        log::warn!("[TRAY] Failed to toggle main window: {}", e);
    }
}

/// Registers Alt+Space as the show/hide toggle.
pub fn setup_global_shortcut(app: &AppHandle) -> Result<(), Box<dyn std::error::Error>> {
    use tauri_plugin_global_shortcut::{
        Code, GlobalShortcutExt, Modifiers, Shortcut, ShortcutState,
    };

    let toggle = Shortcut::new(Some(Modifiers::ALT), Code::Space);

    app.plugin(
        tauri_plugin_global_shortcut::Builder::new()
            .with_handler(move |app, shortcut, event| {
                if shortcut == &toggle && event.state() == ShortcutState::Pressed {
                    toggle_main_window(app);
                }
            })
            .build(),
    )?;
    app.global_shortcut().register(toggle)?;

    log::info!("[TRAY] Alt+Space registered");
    Ok(())
}

/// Runs an area capture and hands the result to the chat window as an
/// `area-captured` event (`null` when nothing was captured).
fn start_capture_from_tray(app: &AppHandle) {
    let orchestrator = app.state::<Arc<CaptureOrchestrator>>().inner().clone();
    let app = app.clone();

    tauri::async_runtime::spawn(async move {
        match orchestrator.request_area_capture().await {
            Ok(image) => {
                if let Err(e) = app.emit_to(MAIN_LABEL, "area-captured", image) {
                    log::error!("[TRAY] Failed to deliver capture: {}", e);
                }
            }
            Err(e) => log::warn!("[TRAY] Capture not started: {}", e),
        }
    });
}
