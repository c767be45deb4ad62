//! Suspension between keep-alive pulses.

use std::time::Duration;

/// Blocks the keep-alive loop between pulses.
///
/// A pause is never cut short by a shutdown request; the loop checks the
/// flag only after the pause returns.
pub trait Pacer {
    /// Suspend the calling thread for `interval`.
    fn pause(&mut self, interval: Duration);
}

/// Pacer backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

impl<F: FnMut(Duration)> Pacer for F {
    fn pause(&mut self, interval: Duration) {
        self(interval);
    }
}
