//! Shared test doubles for supervisor tests.

use std::time::Duration;
use wdt_supervisor::prelude::*;

/// Pacer that records every pause and can deliver "signals" while paused.
#[derive(Debug)]
pub struct ScriptedPacer {
    pub pauses: Vec<Duration>,
    shutdown: ShutdownSignal,
    signal_on_pause: Option<usize>,
    signals_per_delivery: usize,
}

impl ScriptedPacer {
    /// Pacer that never signals.
    pub fn new(shutdown: ShutdownSignal) -> Self {
        Self {
            pauses: Vec::new(),
            shutdown,
            signal_on_pause: None,
            signals_per_delivery: 1,
        }
    }

    /// Request shutdown during the `n`th pause (1-based).
    pub fn signal_on_pause(mut self, n: usize) -> Self {
        self.signal_on_pause = Some(n);
        self
    }

    /// Deliver `count` signals at once instead of one.
    pub fn signals_per_delivery(mut self, count: usize) -> Self {
        self.signals_per_delivery = count;
        self
    }
}

impl Pacer for ScriptedPacer {
    fn pause(&mut self, interval: Duration) {
        self.pauses.push(interval);
        if self.signal_on_pause == Some(self.pauses.len()) {
            for _ in 0..self.signals_per_delivery {
                self.shutdown.request();
            }
        }
    }
}

/// Supervisor wired to a scripted pacer that shares its shutdown flag.
pub fn supervisor_signalled_on(
    config: SupervisorConfig,
    pause: usize,
) -> Supervisor<ScriptedPacer> {
    let shutdown = ShutdownSignal::new();
    let pacer = ScriptedPacer::new(shutdown.clone()).signal_on_pause(pause);
    Supervisor::with_pacer(config, pacer).with_shutdown(shutdown)
}
