//! Error types for the keep-alive supervisor.

use watchdogdev::DeviceError;

/// Fatal conditions that end a supervisor run.
///
/// Recoverable device errors (a rejected timeout, a single failed pulse)
/// are logged where they happen and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// The device could not be opened.
    #[error("watchdog device unavailable: {0}")]
    DeviceUnavailable(#[source] DeviceError),

    /// The device opened but could not be queried.
    #[error("watchdog startup failed: {0}")]
    Startup(#[source] DeviceError),

    /// Keep-alive pulses failed too many times in a row.
    #[error("watchdog lost after {failures} consecutive keep-alive failures: {source}")]
    WatchdogLost {
        /// Consecutive failures observed.
        failures: u32,
        /// Last keep-alive error.
        #[source]
        source: DeviceError,
    },

    /// Signal handlers could not be registered.
    #[error("failed to install signal handler: {0}")]
    SignalHandler(#[from] ctrlc::Error),

    /// The supervisor configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SupervisorError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Process exit status for this condition.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::DeviceUnavailable(_) => 2,
            Self::WatchdogLost { .. } => 3,
            Self::Startup(_) | Self::SignalHandler(_) | Self::InvalidConfiguration(_) => 1,
        }
    }
}

/// A specialized `Result` type for supervisor operations.
pub type SupervisorResult<T> = Result<T, SupervisorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_exit_codes_are_nonzero() {
        let unavailable = SupervisorError::DeviceUnavailable(DeviceError::unavailable(
            "/dev/watchdog",
            io::Error::from(io::ErrorKind::NotFound),
        ));
        let lost = SupervisorError::WatchdogLost {
            failures: 3,
            source: DeviceError::io("keep_alive", io::Error::other("EIO")),
        };
        let config = SupervisorError::invalid_configuration("max_consecutive_failures must be at least 1");

        assert_eq!(unavailable.exit_code(), 2);
        assert_eq!(lost.exit_code(), 3);
        assert_eq!(config.exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let lost = SupervisorError::WatchdogLost {
            failures: 3,
            source: DeviceError::io("keep_alive", io::Error::other("EIO")),
        };
        assert_eq!(
            lost.to_string(),
            "watchdog lost after 3 consecutive keep-alive failures: watchdog keep_alive failed: EIO"
        );
    }
}
