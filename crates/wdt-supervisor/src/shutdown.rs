//! Shutdown request flag and signal registration.
//!
//! The flag is the only state shared between the keep-alive loop and the
//! signal handler. The handler writes it, the loop reads it once per cycle.

use crate::error::SupervisorResult;
use portable_atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to a single shutdown-requested flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create a flag in the not-requested state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown.
    ///
    /// Returns `true` only for the call that actually raised the flag;
    /// later requests leave it unchanged.
    pub fn request(&self) -> bool {
        !self.requested.swap(true, Ordering::AcqRel)
    }

    /// Whether shutdown was requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

/// Route SIGINT, SIGTERM and SIGHUP to `signal`.
///
/// The handler does nothing except raise the flag. It may run while a
/// keep-alive is in flight; the loop notices the request at its next check.
///
/// SIGHUP is treated as a shutdown request too, so a daemon that is sent
/// HUP to reload or restart will exit instead.
///
/// # Errors
///
/// Returns an error if a handler is already registered for this process or
/// the OS refuses the registration.
pub fn install_signal_handlers(signal: &ShutdownSignal) -> SupervisorResult<()> {
    let handle = signal.clone();
    ctrlc::set_handler(move || {
        handle.request();
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_requested());
    }

    #[test]
    fn test_request_is_idempotent() {
        let signal = ShutdownSignal::new();
        assert!(signal.request());
        assert!(!signal.request());
        assert!(signal.is_requested());
    }

    #[test]
    fn test_clones_share_flag() {
        let signal = ShutdownSignal::new();
        let handler_side = signal.clone();
        handler_side.request();
        assert!(signal.is_requested());
    }

    #[test]
    fn test_request_from_other_thread() -> Result<(), Box<dyn std::error::Error>> {
        let signal = ShutdownSignal::new();
        let handle = signal.clone();
        std::thread::spawn(move || handle.request())
            .join()
            .map_err(|_panic| "request thread panicked")?;
        assert!(signal.is_requested());
        Ok(())
    }
}
