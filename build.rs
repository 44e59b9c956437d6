//! Build script for Glimpse.
//!
//! Only the `desktop` feature needs code generation (Tauri context and
//! command permissions); the capture library builds without it.

fn main() {
    #[cfg(feature = "desktop")]
    tauri_build::build();
}
