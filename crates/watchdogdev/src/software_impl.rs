//! Software watchdog implementation.
//!
//! This module provides `SoftwareWatchdog`, an in-memory implementation of
//! the `WatchdogDevice` trait for testing and hardware-free environments.
//! It keeps its own countdown, can be scripted to fail, and records every
//! call in a shared `DeviceJournal`.

use crate::device::WatchdogDevice;
use crate::error::{DeviceError, DeviceResult};
use crate::options::{DeviceCapabilities, WatchdogOptions};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A single call made against a `SoftwareWatchdog`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCall {
    /// `support()`.
    Support,
    /// `timeout()`.
    Timeout,
    /// `set_timeout(seconds)`.
    SetTimeout(u32),
    /// `time_left()`.
    TimeLeft,
    /// `keep_alive()`, successful or not.
    KeepAlive,
    /// `magic_close()`.
    MagicClose,
    /// `close()`, including repeated no-op calls.
    Close,
    /// `boot_status()`.
    BootStatus,
}

/// Shared, ordered record of the calls made against a device.
///
/// Cloning the journal yields another handle to the same record, so a test
/// can keep one while the device itself is moved into the code under test.
#[derive(Debug, Clone, Default)]
pub struct DeviceJournal {
    calls: Arc<Mutex<Vec<DeviceCall>>>,
}

impl DeviceJournal {
    fn record(&self, call: DeviceCall) {
        self.calls.lock().push(call);
    }

    /// Snapshot of all recorded calls in order.
    #[must_use]
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().clone()
    }

    /// Number of times `call` was recorded.
    #[must_use]
    pub fn count(&self, call: DeviceCall) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    /// Recorded calls that tear the device down (`MagicClose` and `Close`).
    #[must_use]
    pub fn shutdown_sequence(&self) -> Vec<DeviceCall> {
        self.calls
            .lock()
            .iter()
            .copied()
            .filter(|c| matches!(c, DeviceCall::MagicClose | DeviceCall::Close))
            .collect()
    }
}

/// In-memory watchdog device.
///
/// # Example
///
/// ```rust
/// use watchdogdev::prelude::*;
///
/// let mut device = SoftwareWatchdog::builder()
///     .options(WatchdogOptions::MAGICCLOSE | WatchdogOptions::SETTIMEOUT)
///     .build();
/// let journal = device.journal();
///
/// assert!(device.support()?.requires_magic_close());
/// device.keep_alive()?;
/// device.magic_close()?;
/// device.close()?;
/// assert_eq!(journal.count(DeviceCall::Close), 1);
/// # Ok::<(), DeviceError>(())
/// ```
#[derive(Debug)]
pub struct SoftwareWatchdog {
    capabilities: DeviceCapabilities,
    timeout_secs: u32,
    max_timeout_secs: u32,
    last_ping: Instant,
    keep_alive_script: VecDeque<bool>,
    fail_support: bool,
    fail_time_left: bool,
    fail_magic_close: bool,
    boot_status: WatchdogOptions,
    expect_close: bool,
    closed: bool,
    journal: DeviceJournal,
}

impl SoftwareWatchdog {
    /// Create a builder with `softdog`-like defaults.
    #[must_use]
    pub fn builder() -> SoftwareWatchdogBuilder {
        SoftwareWatchdogBuilder::default()
    }

    /// Handle to the call journal of this device.
    #[must_use]
    pub fn journal(&self) -> DeviceJournal {
        self.journal.clone()
    }

    /// Whether the magic character was written since the last ping.
    ///
    /// Releasing the device while this is false would reset a real machine.
    #[must_use]
    pub fn expects_close(&self) -> bool {
        self.expect_close
    }

    fn ensure_open(&self, operation: &'static str) -> DeviceResult<()> {
        if self.closed {
            return Err(DeviceError::closed(operation));
        }
        Ok(())
    }
}

impl Default for SoftwareWatchdog {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WatchdogDevice for SoftwareWatchdog {
    fn support(&mut self) -> DeviceResult<DeviceCapabilities> {
        self.journal.record(DeviceCall::Support);
        self.ensure_open("support")?;
        if self.fail_support {
            return Err(DeviceError::io("support", io::Error::other("scripted failure")));
        }
        Ok(self.capabilities.clone())
    }

    fn timeout(&mut self) -> DeviceResult<u32> {
        self.journal.record(DeviceCall::Timeout);
        self.ensure_open("timeout")?;
        Ok(self.timeout_secs)
    }

    fn set_timeout(&mut self, seconds: u32) -> DeviceResult<u32> {
        self.journal.record(DeviceCall::SetTimeout(seconds));
        self.ensure_open("set_timeout")?;
        if seconds == 0 || seconds > self.max_timeout_secs {
            return Err(DeviceError::unsupported("set_timeout"));
        }
        self.timeout_secs = seconds;
        self.last_ping = Instant::now();
        Ok(self.timeout_secs)
    }

    fn time_left(&mut self) -> DeviceResult<u32> {
        self.journal.record(DeviceCall::TimeLeft);
        self.ensure_open("time_left")?;
        if self.fail_time_left {
            return Err(DeviceError::unsupported("time_left"));
        }
        let deadline = Duration::from_secs(u64::from(self.timeout_secs));
        let left = deadline.saturating_sub(self.last_ping.elapsed());
        Ok(u32::try_from(left.as_secs()).unwrap_or(u32::MAX))
    }

    fn keep_alive(&mut self) -> DeviceResult<()> {
        self.journal.record(DeviceCall::KeepAlive);
        self.ensure_open("keep_alive")?;
        if self.keep_alive_script.pop_front().unwrap_or(false) {
            return Err(DeviceError::io("keep_alive", io::Error::other("scripted failure")));
        }
        self.last_ping = Instant::now();
        self.expect_close = false;
        Ok(())
    }

    fn magic_close(&mut self) -> DeviceResult<()> {
        self.journal.record(DeviceCall::MagicClose);
        self.ensure_open("magic_close")?;
        if self.fail_magic_close {
            return Err(DeviceError::io("magic_close", io::Error::other("scripted failure")));
        }
        self.expect_close = true;
        Ok(())
    }

    fn close(&mut self) -> DeviceResult<()> {
        self.journal.record(DeviceCall::Close);
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn boot_status(&mut self) -> DeviceResult<WatchdogOptions> {
        self.journal.record(DeviceCall::BootStatus);
        self.ensure_open("boot_status")?;
        Ok(self.boot_status)
    }
}

/// Builder for `SoftwareWatchdog`.
#[derive(Debug)]
pub struct SoftwareWatchdogBuilder {
    capabilities: DeviceCapabilities,
    timeout_secs: u32,
    max_timeout_secs: u32,
    keep_alive_script: VecDeque<bool>,
    fail_support: bool,
    fail_time_left: bool,
    fail_magic_close: bool,
    boot_status: WatchdogOptions,
}

impl Default for SoftwareWatchdogBuilder {
    fn default() -> Self {
        Self {
            capabilities: DeviceCapabilities::new(
                "Software Watchdog",
                0,
                WatchdogOptions::SETTIMEOUT
                    | WatchdogOptions::MAGICCLOSE
                    | WatchdogOptions::KEEPALIVEPING,
            ),
            timeout_secs: 60,
            max_timeout_secs: 65_535,
            keep_alive_script: VecDeque::new(),
            fail_support: false,
            fail_time_left: false,
            fail_magic_close: false,
            boot_status: WatchdogOptions::empty(),
        }
    }
}

impl SoftwareWatchdogBuilder {
    /// Set the identity string.
    #[must_use]
    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.capabilities.identity = identity.into();
        self
    }

    /// Set the firmware version.
    #[must_use]
    pub fn firmware_version(mut self, version: u32) -> Self {
        self.capabilities.firmware_version = version;
        self
    }

    /// Set the advertised options.
    #[must_use]
    pub fn options(mut self, options: WatchdogOptions) -> Self {
        self.capabilities.options = options;
        self
    }

    /// Set the initial timeout in seconds.
    #[must_use]
    pub fn timeout_secs(mut self, seconds: u32) -> Self {
        self.timeout_secs = seconds;
        self
    }

    /// Largest timeout `set_timeout` accepts; larger values are rejected.
    #[must_use]
    pub fn max_timeout_secs(mut self, seconds: u32) -> Self {
        self.max_timeout_secs = seconds;
        self
    }

    /// Script keep-alive outcomes: each `true` fails one call, in order.
    /// Calls beyond the script succeed.
    #[must_use]
    pub fn keep_alive_failures(mut self, script: impl IntoIterator<Item = bool>) -> Self {
        self.keep_alive_script = script.into_iter().collect();
        self
    }

    /// Make `support()` fail with a transport error.
    #[must_use]
    pub fn fail_support(mut self, fail: bool) -> Self {
        self.fail_support = fail;
        self
    }

    /// Make `time_left()` report the query as unsupported.
    #[must_use]
    pub fn fail_time_left(mut self, fail: bool) -> Self {
        self.fail_time_left = fail;
        self
    }

    /// Make `magic_close()` fail with a transport error.
    #[must_use]
    pub fn fail_magic_close(mut self, fail: bool) -> Self {
        self.fail_magic_close = fail;
        self
    }

    /// Options reported by `boot_status()`.
    #[must_use]
    pub fn boot_status(mut self, status: WatchdogOptions) -> Self {
        self.boot_status = status;
        self
    }

    /// Build the device. It is considered open from this point.
    #[must_use]
    pub fn build(self) -> SoftwareWatchdog {
        SoftwareWatchdog {
            capabilities: self.capabilities,
            timeout_secs: self.timeout_secs,
            max_timeout_secs: self.max_timeout_secs,
            last_ping: Instant::now(),
            keep_alive_script: self.keep_alive_script,
            fail_support: self.fail_support,
            fail_time_left: self.fail_time_left,
            fail_magic_close: self.fail_magic_close,
            boot_status: self.boot_status,
            expect_close: false,
            closed: false,
            journal: DeviceJournal::default(),
        }
    }
}
