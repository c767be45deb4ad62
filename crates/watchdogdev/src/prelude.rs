//! Prelude for watchdogdev.
//!
//! This module re-exports the most commonly used types for convenient importing.
//!
//! # Example
//!
//! ```rust
//! use watchdogdev::prelude::*;
//!
//! let mut device = SoftwareWatchdog::default();
//! device.keep_alive()?;
//! # Ok::<(), DeviceError>(())
//! ```

pub use crate::device::{DEFAULT_DEVICE_PATH, WatchdogDevice};
pub use crate::error::{DeviceError, DeviceResult};
#[cfg(target_os = "linux")]
pub use crate::linux::LinuxWatchdog;
pub use crate::options::{DeviceCapabilities, WatchdogOptions};
pub use crate::software_impl::{DeviceCall, DeviceJournal, SoftwareWatchdog, SoftwareWatchdogBuilder};
