//! Host window control and the RestoreHost guarantee.

use std::sync::Arc;

/// The application window that gets out of the way during a capture.
///
/// Every method must be safe to call at any time and any number of times.
pub trait HostWindow: Send + Sync {
    fn hide(&self) -> Result<(), String>;
    fn show(&self) -> Result<(), String>;
    fn focus(&self) -> Result<(), String>;
}

/// Shows and focuses the host exactly once.
///
/// `restore` does it explicitly; if the guard is dropped first (early
/// return, panic, or the capture future being dropped) `Drop` does it.
pub struct HostRestore {
    host: Arc<dyn HostWindow>,
    done: bool,
}

impl HostRestore {
    pub fn new(host: Arc<dyn HostWindow>) -> Self {
        Self { host, done: false }
    }

    pub fn restore(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        if let Err(e) = self.host.show() {
            log::warn!("[CAPTURE] Failed to show host window: {}", e);
        }
        if let Err(e) = self.host.focus() {
            log::warn!("[CAPTURE] Failed to focus host window: {}", e);
        }
        log::debug!("[CAPTURE] Host window restored");
    }
}

impl Drop for HostRestore {
    fn drop(&mut self) {
        self.run();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingHost {
        shows: Mutex<usize>,
        focuses: Mutex<usize>,
    }

    impl HostWindow for CountingHost {
        fn hide(&self) -> Result<(), String> {
            Ok(())
        }
        fn show(&self) -> Result<(), String> {
            *self.shows.lock().unwrap() += 1;
            Err("compositor said no".to_string())
        }
        fn focus(&self) -> Result<(), String> {
            *self.focuses.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn explicit_restore_runs_once() {
        let host = Arc::new(CountingHost::default());
        HostRestore::new(host.clone()).restore();
        assert_eq!(*host.shows.lock().unwrap(), 1);
        assert_eq!(*host.focuses.lock().unwrap(), 1);
    }

    #[test]
    fn drop_restores_and_show_error_still_focuses() {
        let host = Arc::new(CountingHost::default());
        {
            let _guard = HostRestore::new(host.clone());
        }
        assert_eq!(*host.shows.lock().unwrap(), 1);
        assert_eq!(*host.focuses.lock().unwrap(), 1);
    }
}
