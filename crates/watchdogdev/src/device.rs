//! Watchdog device trait definition.
//!
//! This module provides the `WatchdogDevice` trait that abstracts an open
//! watchdog character device. Opening is left to each backend's
//! constructor, so a value of a `WatchdogDevice` type always represents an
//! acquired handle until `close()` is called.

use crate::error::{DeviceError, DeviceResult};
use crate::options::{DeviceCapabilities, WatchdogOptions};

/// Default watchdog device node on Linux.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/watchdog";

/// An open watchdog device.
///
/// Once opened, most drivers start counting down immediately. If
/// `keep_alive()` is not called within the configured timeout the device
/// resets the machine.
///
/// # Lifecycle
///
/// ```text
/// open ──► support() / timeout() / set_timeout()
///            │
///            ▼
///        keep_alive() ◄──┐
///            │           │ every interval
///            └───────────┘
///            │
///            ▼
///      magic_close()   (only when MAGICCLOSE is advertised)
///            │
///            ▼
///         close()      (idempotent)
/// ```
///
/// Every operation after `close()` fails with `DeviceError::Closed`, except
/// `close()` itself which is a no-op.
pub trait WatchdogDevice: Send {
    /// Query identity, firmware version and supported options.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot report its capabilities.
    fn support(&mut self) -> DeviceResult<DeviceCapabilities>;

    /// Read the configured countdown length in seconds.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` if the driver cannot report it.
    fn timeout(&mut self) -> DeviceResult<u32>;

    /// Configure the countdown length.
    ///
    /// Drivers may round the value. The returned value is the timeout the
    /// device actually retained.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` if the firmware rejects the value.
    fn set_timeout(&mut self, seconds: u32) -> DeviceResult<u32>;

    /// Seconds left before an unacknowledged device triggers a reset.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` if the driver does not track it.
    fn time_left(&mut self) -> DeviceResult<u32>;

    /// Reset the countdown.
    ///
    /// # Errors
    ///
    /// Returns `Io` on transport failure.
    fn keep_alive(&mut self) -> DeviceResult<()>;

    /// Send the magic close character so that releasing the handle does not
    /// itself trigger a reset.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the character could not be written.
    fn magic_close(&mut self) -> DeviceResult<()>;

    /// Release the handle. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the first release fails.
    fn close(&mut self) -> DeviceResult<()>;

    /// Whether `close()` has already released the handle.
    fn is_closed(&self) -> bool;

    /// Options describing the cause of the last reboot.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` unless the backend implements it.
    fn boot_status(&mut self) -> DeviceResult<WatchdogOptions> {
        Err(DeviceError::unsupported("boot_status"))
    }
}

impl<D: WatchdogDevice + ?Sized> WatchdogDevice for Box<D> {
    fn support(&mut self) -> DeviceResult<DeviceCapabilities> {
        (**self).support()
    }

    fn timeout(&mut self) -> DeviceResult<u32> {
        (**self).timeout()
    }

    fn set_timeout(&mut self, seconds: u32) -> DeviceResult<u32> {
        (**self).set_timeout(seconds)
    }

    fn time_left(&mut self) -> DeviceResult<u32> {
        (**self).time_left()
    }

    fn keep_alive(&mut self) -> DeviceResult<()> {
        (**self).keep_alive()
    }

    fn magic_close(&mut self) -> DeviceResult<()> {
        (**self).magic_close()
    }

    fn close(&mut self) -> DeviceResult<()> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn boot_status(&mut self) -> DeviceResult<WatchdogOptions> {
        (**self).boot_status()
    }
}
