//! # watchdogdev
//!
//! Access to watchdog timer devices such as Linux `/dev/watchdog`.
//!
//! This crate provides:
//! - `WatchdogDevice` trait covering capability queries, timeouts,
//!   keep-alives, magic close and release
//! - `LinuxWatchdog` backed by the kernel `WDIOC_*` ioctl interface
//! - `SoftwareWatchdog` for testing and hardware-free environments
//! - `WatchdogOptions` mirroring the `WDIOF_*` option bits
//!
//! ## Magic close
//!
//! Drivers advertising `WatchdogOptions::MAGICCLOSE` keep counting after
//! the handle is released unless the character `'V'` was written first.
//! Check `DeviceCapabilities::requires_magic_close()` before closing.
//!
//! ## Example
//!
//! ```rust
//! use watchdogdev::prelude::*;
//!
//! let mut device = SoftwareWatchdog::builder().timeout_secs(30).build();
//! let caps = device.support()?;
//!
//! device.keep_alive()?;
//! if caps.requires_magic_close() {
//!     device.magic_close()?;
//! }
//! device.close()?;
//! assert!(device.is_closed());
//! # Ok::<(), DeviceError>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod device;
pub mod error;
#[cfg(target_os = "linux")]
pub mod linux;
pub mod options;
pub mod prelude;
pub mod software_impl;

pub use device::{DEFAULT_DEVICE_PATH, WatchdogDevice};
pub use error::{DeviceError, DeviceResult};
#[cfg(target_os = "linux")]
pub use linux::LinuxWatchdog;
pub use options::{DeviceCapabilities, WatchdogOptions};
pub use software_impl::{DeviceCall, DeviceJournal, SoftwareWatchdog, SoftwareWatchdogBuilder};
