//! Prelude for wdt-supervisor.
//!
//! This module re-exports the most commonly used types for convenient importing.

pub use crate::config::{
    DEFAULT_KEEPALIVE_INTERVAL, DEFAULT_MAX_CONSECUTIVE_FAILURES, MIN_TIMEOUT_SECS,
    SupervisorConfig, SupervisorConfigBuilder, TimeoutConfig, keep_alive_interval_for,
};
pub use crate::error::{SupervisorError, SupervisorResult};
pub use crate::pacer::{Pacer, ThreadPacer};
pub use crate::shutdown::{ShutdownSignal, install_signal_handlers};
pub use crate::supervisor::{MagicCloseOutcome, RunReport, StopReason, Supervisor};
