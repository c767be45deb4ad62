//! # wdt-supervisor
//!
//! Keep-alive supervisor for hardware watchdog devices.
//!
//! A `Supervisor` owns one watchdog device for its whole lifetime:
//! - reads and logs the device identity, firmware version and options
//! - optionally configures a timeout (clamped to at least 10 seconds)
//! - pulses the device every `max(1, timeout / 10)` seconds
//! - stops when SIGINT or SIGTERM raise the `ShutdownSignal`
//! - performs the magic close handshake when the device advertises it
//! - always releases the device exactly once
//!
//! Three consecutive keep-alive failures end the run with
//! `SupervisorError::WatchdogLost`.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod pacer;
pub mod prelude;
pub mod shutdown;
pub mod supervisor;

pub use config::{
    DEFAULT_KEEPALIVE_INTERVAL, DEFAULT_MAX_CONSECUTIVE_FAILURES, MIN_TIMEOUT_SECS,
    SupervisorConfig, SupervisorConfigBuilder, TimeoutConfig, keep_alive_interval_for,
};
pub use error::{SupervisorError, SupervisorResult};
pub use pacer::{Pacer, ThreadPacer};
pub use shutdown::{ShutdownSignal, install_signal_handlers};
pub use supervisor::{MagicCloseOutcome, RunReport, StopReason, Supervisor};
