//! Keep-alive supervision of a single watchdog device.
//!
//! A run is strictly sequential:
//!
//! ```text
//! open ──► support / timeout ──► set_timeout (if requested)
//!                                     │
//!              ┌──────────────────────┘
//!              ▼
//!     ┌─► shutdown requested? ──yes──┐
//!     │        │ no                  │
//!     │   time_left, keep_alive      │
//!     │        │                     │
//!     └── pause(interval)            │
//!                                    ▼
//!                    magic_close (if MAGICCLOSE) ──► close
//! ```
//!
//! The device sits in a `DeviceGuard` from the moment it is opened, so it is
//! closed exactly once on every exit path, including early returns.

use crate::config::{SupervisorConfig, keep_alive_interval_for};
use crate::error::{SupervisorError, SupervisorResult};
use crate::pacer::{Pacer, ThreadPacer};
use crate::shutdown::ShutdownSignal;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use watchdogdev::{DeviceCapabilities, DeviceResult, WatchdogDevice, WatchdogOptions};

/// Why the keep-alive loop ended gracefully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A shutdown signal was observed.
    ShutdownRequested,
    /// The configured number of keep-alive cycles was reached.
    CycleLimitReached,
}

/// What happened to the magic close handshake during release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicCloseOutcome {
    /// The magic character was sent before closing.
    Performed,
    /// The device does not advertise `MAGICCLOSE`.
    NotRequired,
    /// The device requires it but sending it failed.
    Failed,
}

/// Summary of a run that ended gracefully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Capabilities read at startup.
    pub capabilities: DeviceCapabilities,
    /// Device timeout after configuration, when known.
    pub timeout_secs: Option<u32>,
    /// Keep-alive attempts made.
    pub cycles: u64,
    /// Successful keep-alives.
    pub keep_alives_sent: u64,
    /// Failed keep-alives (never three in a row on a graceful run).
    pub keep_alive_failures: u64,
    /// Why the loop ended.
    pub stop_reason: StopReason,
    /// Result of the magic close handshake.
    pub magic_close: MagicCloseOutcome,
}

#[derive(Debug, Clone, Copy, Default)]
struct LoopStats {
    cycles: u64,
    sent: u64,
    failed: u64,
}

/// Owns an open device and releases it exactly once.
#[derive(Debug)]
struct DeviceGuard<D: WatchdogDevice> {
    device: D,
    released: bool,
}

impl<D: WatchdogDevice> DeviceGuard<D> {
    fn new(device: D) -> Self {
        Self {
            device,
            released: false,
        }
    }

    fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn release(mut self, requires_magic_close: bool) -> MagicCloseOutcome {
        let outcome = if requires_magic_close {
            match self.device.magic_close() {
                Ok(()) => {
                    info!("Magic close performed");
                    MagicCloseOutcome::Performed
                }
                Err(err) => {
                    error!(error = %err, "Magic close failed, device may reset after release");
                    MagicCloseOutcome::Failed
                }
            }
        } else {
            info!("Magic close not required, skipping");
            MagicCloseOutcome::NotRequired
        };
        self.close_once();
        outcome
    }

    fn close_once(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match self.device.close() {
            Ok(()) => debug!("Watchdog device released"),
            Err(err) => error!(error = %err, "Failed to release watchdog device"),
        }
    }
}

impl<D: WatchdogDevice> Drop for DeviceGuard<D> {
    fn drop(&mut self) {
        self.close_once();
    }
}

/// Keep-alive supervisor for one watchdog device.
///
/// # Example
///
/// ```rust
/// use wdt_supervisor::prelude::*;
/// use std::time::Duration;
/// use watchdogdev::SoftwareWatchdog;
///
/// let config = SupervisorConfig::builder().timeout_secs(60).max_cycles(2).build()?;
/// let mut pauses = Vec::new();
/// let mut supervisor = Supervisor::with_pacer(config, |interval: Duration| pauses.push(interval));
///
/// let report = supervisor.run_with(|_path| Ok(SoftwareWatchdog::default()))?;
/// assert_eq!(report.keep_alives_sent, 2);
/// assert_eq!(report.magic_close, MagicCloseOutcome::Performed);
/// # Ok::<(), SupervisorError>(())
/// ```
#[derive(Debug)]
pub struct Supervisor<P: Pacer = ThreadPacer> {
    config: SupervisorConfig,
    shutdown: ShutdownSignal,
    pacer: P,
}

impl Supervisor<ThreadPacer> {
    /// Create a supervisor that sleeps the current thread between pulses.
    #[must_use]
    pub fn new(config: SupervisorConfig) -> Self {
        Self::with_pacer(config, ThreadPacer)
    }
}

impl<P: Pacer> Supervisor<P> {
    /// Create a supervisor with a custom pacer.
    #[must_use]
    pub fn with_pacer(config: SupervisorConfig, pacer: P) -> Self {
        Self {
            config,
            shutdown: ShutdownSignal::new(),
            pacer,
        }
    }

    /// Use an existing shutdown flag instead of a fresh one.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Handle to the shutdown flag observed by the loop.
    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Supervisor configuration.
    #[must_use]
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Pacer in use.
    #[must_use]
    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Open the configured watchdog device node and supervise it until
    /// shutdown.
    ///
    /// # Errors
    ///
    /// See [`Supervisor::run_with`].
    #[cfg(target_os = "linux")]
    pub fn run(&mut self) -> SupervisorResult<RunReport> {
        self.run_with(watchdogdev::LinuxWatchdog::open)
    }

    /// Open a device with `open` and supervise it until shutdown.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` if the configuration does not validate
    /// - `DeviceUnavailable` if `open` fails
    /// - `Startup` if capabilities cannot be read
    /// - `WatchdogLost` if keep-alives fail `max_consecutive_failures` times
    ///   in a row
    ///
    /// The device is released before any error is returned.
    pub fn run_with<D, F>(&mut self, open: F) -> SupervisorResult<RunReport>
    where
        D: WatchdogDevice,
        F: FnOnce(&Path) -> DeviceResult<D>,
    {
        let result = self.open_and_supervise(open);
        info!("Watchdog supervisor exited");
        result
    }

    fn open_and_supervise<D, F>(&mut self, open: F) -> SupervisorResult<RunReport>
    where
        D: WatchdogDevice,
        F: FnOnce(&Path) -> DeviceResult<D>,
    {
        self.config.validate()?;

        let path = self.config.device_path().to_path_buf();
        let device = open(path.as_path()).map_err(|err| {
            error!(path = %path.display(), error = %err, "Watchdog device unavailable");
            SupervisorError::DeviceUnavailable(err)
        })?;
        info!(path = %path.display(), "Watchdog device opened");

        let mut guard = DeviceGuard::new(device);
        let capabilities = self.startup(guard.device_mut())?;
        let timeout_secs = self.configure_timeout(guard.device_mut());
        let interval = self.loop_interval(timeout_secs);

        let outcome = self.supervise(guard.device_mut(), interval);
        let magic_close = guard.release(capabilities.requires_magic_close());

        let (stats, stop_reason) = outcome?;
        Ok(RunReport {
            capabilities,
            timeout_secs,
            cycles: stats.cycles,
            keep_alives_sent: stats.sent,
            keep_alive_failures: stats.failed,
            stop_reason,
            magic_close,
        })
    }

    fn startup<D: WatchdogDevice>(&self, device: &mut D) -> SupervisorResult<DeviceCapabilities> {
        let capabilities = device.support().map_err(|err| {
            error!(error = %err, "Failed to query watchdog capabilities");
            SupervisorError::Startup(err)
        })?;
        info!(
            identity = %capabilities.identity,
            firmware_version = capabilities.firmware_version,
            options = %capabilities.options,
            "Watchdog capabilities"
        );

        match device.timeout() {
            Ok(timeout_secs) => info!(timeout_secs, "Current watchdog timeout"),
            Err(err) => warn!(error = %err, "Current watchdog timeout unavailable"),
        }

        match device.boot_status() {
            Ok(status) if status.contains(WatchdogOptions::CARDRESET) => {
                warn!(boot_status = %status, "Last reboot was caused by the watchdog");
            }
            Ok(status) => debug!(boot_status = %status, "Watchdog boot status"),
            Err(err) => debug!(error = %err, "Watchdog boot status unavailable"),
        }

        Ok(capabilities)
    }

    fn configure_timeout<D: WatchdogDevice>(&self, device: &mut D) -> Option<u32> {
        let policy = self.config.timeout;
        let interval_secs = policy.keep_alive_interval().as_secs();

        let Some(timeout_secs) = policy.timeout_secs() else {
            info!(interval_secs, "No timeout requested, keeping device timeout");
            return device.timeout().ok();
        };

        if policy.was_clamped() {
            info!(
                requested_secs = policy.requested_secs(),
                timeout_secs, "Requested timeout raised to minimum"
            );
        }

        match device.set_timeout(timeout_secs) {
            Ok(kept) => {
                let effective = match device.timeout() {
                    Ok(secs) => secs,
                    Err(err) => {
                        debug!(error = %err, "Could not read back timeout, using value from set");
                        kept
                    }
                };
                info!(timeout_secs = effective, interval_secs, "New watchdog timeout");
                Some(effective)
            }
            Err(err) => {
                warn!(
                    requested_secs = timeout_secs,
                    error = %err,
                    "Watchdog rejected timeout, keeping current value"
                );
                device.timeout().ok()
            }
        }
    }

    /// Keep-alive cadence, shortened when the device kept a timeout that the
    /// configured interval would not beat.
    fn loop_interval(&self, retained_secs: Option<u32>) -> Duration {
        let interval = self.config.timeout.keep_alive_interval();
        let Some(retained_secs) = retained_secs else {
            return interval;
        };
        if interval < Duration::from_secs(u64::from(retained_secs)) {
            return interval;
        }

        let bounded = keep_alive_interval_for(retained_secs);
        warn!(
            interval_secs = interval.as_secs(),
            timeout_secs = retained_secs,
            bounded_secs = bounded.as_secs(),
            "Keep-alive interval not shorter than device timeout, pulsing faster"
        );
        bounded
    }

    fn supervise<D: WatchdogDevice>(
        &mut self,
        device: &mut D,
        interval: Duration,
    ) -> SupervisorResult<(LoopStats, StopReason)> {
        let max_failures = self.config.max_consecutive_failures;
        let mut stats = LoopStats::default();
        let mut consecutive_failures: u32 = 0;

        loop {
            if self.shutdown.is_requested() {
                info!("Shutdown requested, leaving keep-alive loop");
                return Ok((stats, StopReason::ShutdownRequested));
            }

            match device.time_left() {
                Ok(secs) => debug!(time_left_secs = secs, "Watchdog time left"),
                Err(err) => debug!(error = %err, "Watchdog time left unavailable"),
            }

            stats.cycles = stats.cycles.saturating_add(1);
            match device.keep_alive() {
                Ok(()) => {
                    consecutive_failures = 0;
                    stats.sent = stats.sent.saturating_add(1);
                    info!(attempt = stats.cycles, "Keep-alive sent");
                }
                Err(err) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    stats.failed = stats.failed.saturating_add(1);
                    if consecutive_failures >= max_failures {
                        error!(
                            failures = consecutive_failures,
                            error = %err,
                            "Watchdog lost: keep-alive failed repeatedly"
                        );
                        return Err(SupervisorError::WatchdogLost {
                            failures: consecutive_failures,
                            source: err,
                        });
                    }
                    warn!(
                        attempt = stats.cycles,
                        failures = consecutive_failures,
                        error = %err,
                        "Keep-alive failed"
                    );
                }
            }

            if let Some(limit) = self.config.max_cycles
                && stats.cycles >= limit
            {
                info!(cycles = stats.cycles, "Keep-alive cycle limit reached");
                return Ok((stats, StopReason::CycleLimitReached));
            }

            self.pacer.pause(interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchdogdev::{DeviceCall, SoftwareWatchdog};

    #[test]
    fn test_guard_closes_on_drop() {
        let device = SoftwareWatchdog::default();
        let journal = device.journal();
        {
            let _guard = DeviceGuard::new(device);
        }
        assert_eq!(journal.count(DeviceCall::Close), 1);
    }

    #[test]
    fn test_guard_release_closes_once() {
        let device = SoftwareWatchdog::default();
        let journal = device.journal();
        let outcome = DeviceGuard::new(device).release(true);
        assert_eq!(outcome, MagicCloseOutcome::Performed);
        assert_eq!(
            journal.shutdown_sequence(),
            vec![DeviceCall::MagicClose, DeviceCall::Close]
        );
    }

    #[test]
    fn test_guard_skips_magic_close_when_not_required() {
        let device = SoftwareWatchdog::default();
        let journal = device.journal();
        let outcome = DeviceGuard::new(device).release(false);
        assert_eq!(outcome, MagicCloseOutcome::NotRequired);
        assert_eq!(journal.shutdown_sequence(), vec![DeviceCall::Close]);
    }

    #[test]
    fn test_loop_interval_bounded_by_retained_timeout() {
        let supervisor = Supervisor::new(SupervisorConfig::new(Some(200)));
        assert_eq!(supervisor.loop_interval(Some(10)), Duration::from_secs(1));
        assert_eq!(supervisor.loop_interval(Some(300)), Duration::from_secs(20));
        assert_eq!(supervisor.loop_interval(None), Duration::from_secs(20));
    }

    #[test]
    fn test_cycle_limit_stops_without_final_pause() -> SupervisorResult<()> {
        let config = SupervisorConfig::builder().max_cycles(3).build()?;
        let mut pauses: Vec<Duration> = Vec::new();
        let mut supervisor =
            Supervisor::with_pacer(config, |interval: Duration| pauses.push(interval));

        let report = supervisor.run_with(|_| Ok(SoftwareWatchdog::default()))?;
        drop(supervisor);

        assert_eq!(report.stop_reason, StopReason::CycleLimitReached);
        assert_eq!(report.cycles, 3);
        assert_eq!(pauses.len(), 2);
        Ok(())
    }
}
