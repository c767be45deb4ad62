//! Configuration types for the keep-alive supervisor.

use crate::error::{SupervisorError, SupervisorResult};
use std::path::{Path, PathBuf};
use std::time::Duration;
use watchdogdev::DEFAULT_DEVICE_PATH;

/// Smallest timeout the supervisor will ask a device for, in seconds.
pub const MIN_TIMEOUT_SECS: u32 = 10;

/// Keep-alive cadence used when no timeout is requested.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);

/// Consecutive keep-alive failures tolerated before the watchdog is lost.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Keep-alive cadence for a device timeout: a tenth of it, at least one
/// second.
#[must_use]
pub fn keep_alive_interval_for(timeout_secs: u32) -> Duration {
    Duration::from_secs(u64::from((timeout_secs / 10).max(1)))
}

/// Requested device timeout and the keep-alive cadence derived from it.
///
/// Requested values below `MIN_TIMEOUT_SECS` are clamped up. The interval
/// is a tenth of the effective timeout and never below one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    requested_secs: Option<u32>,
    timeout_secs: Option<u32>,
    interval: Duration,
}

impl TimeoutConfig {
    /// Build the timeout policy from an optional requested timeout.
    #[must_use]
    pub fn new(requested_secs: Option<u32>) -> Self {
        match requested_secs {
            Some(requested) => {
                let timeout = requested.max(MIN_TIMEOUT_SECS);
                Self {
                    requested_secs,
                    timeout_secs: Some(timeout),
                    interval: keep_alive_interval_for(timeout),
                }
            }
            None => Self::device_default(),
        }
    }

    /// Leave the device timeout untouched and pulse at the default cadence.
    #[must_use]
    pub fn device_default() -> Self {
        Self {
            requested_secs: None,
            timeout_secs: None,
            interval: DEFAULT_KEEPALIVE_INTERVAL,
        }
    }

    /// Timeout to configure on the device, after clamping. `None` means the
    /// device keeps whatever it currently has.
    #[must_use]
    pub fn timeout_secs(&self) -> Option<u32> {
        self.timeout_secs
    }

    /// Value originally requested, before clamping.
    #[must_use]
    pub fn requested_secs(&self) -> Option<u32> {
        self.requested_secs
    }

    /// Whether the requested value was raised to the minimum.
    #[must_use]
    pub fn was_clamped(&self) -> bool {
        self.requested_secs != self.timeout_secs
    }

    /// Delay between keep-alive pulses.
    #[must_use]
    pub fn keep_alive_interval(&self) -> Duration {
        self.interval
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::device_default()
    }
}

/// Keep-alive supervisor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Watchdog device node.
    ///
    /// Default: `/dev/watchdog`.
    pub device_path: PathBuf,

    /// Timeout policy and derived keep-alive interval.
    pub timeout: TimeoutConfig,

    /// Number of consecutive keep-alive failures before the run ends with
    /// `WatchdogLost`.
    ///
    /// Default: 3.
    pub max_consecutive_failures: u32,

    /// Stop gracefully after this many keep-alive attempts.
    ///
    /// Default: `None` (run until a shutdown signal).
    pub max_cycles: Option<u64>,
}

impl SupervisorConfig {
    /// Create a configuration with the given requested timeout.
    #[must_use]
    pub fn new(requested_timeout_secs: Option<u32>) -> Self {
        Self {
            timeout: TimeoutConfig::new(requested_timeout_secs),
            ..Self::default()
        }
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> SupervisorConfigBuilder {
        SupervisorConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> SupervisorResult<()> {
        if self.max_consecutive_failures == 0 {
            return Err(SupervisorError::invalid_configuration(
                "max_consecutive_failures must be at least 1",
            ));
        }
        if self.max_cycles == Some(0) {
            return Err(SupervisorError::invalid_configuration(
                "max_cycles must be at least 1 when set",
            ));
        }
        if self.device_path.as_os_str().is_empty() {
            return Err(SupervisorError::invalid_configuration(
                "device_path must not be empty",
            ));
        }
        Ok(())
    }

    /// Device node as a path.
    #[must_use]
    pub fn device_path(&self) -> &Path {
        &self.device_path
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            device_path: PathBuf::from(DEFAULT_DEVICE_PATH),
            timeout: TimeoutConfig::device_default(),
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            max_cycles: None,
        }
    }
}

/// Builder for `SupervisorConfig`.
#[derive(Debug, Default)]
pub struct SupervisorConfigBuilder {
    config: SupervisorConfig,
}

impl SupervisorConfigBuilder {
    /// Set the device node.
    #[must_use]
    pub fn device_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.device_path = path.into();
        self
    }

    /// Request a device timeout in seconds.
    #[must_use]
    pub fn timeout_secs(mut self, seconds: u32) -> Self {
        self.config.timeout = TimeoutConfig::new(Some(seconds));
        self
    }

    /// Set the timeout policy directly.
    #[must_use]
    pub fn timeout(mut self, timeout: TimeoutConfig) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the consecutive keep-alive failures tolerated.
    #[must_use]
    pub fn max_consecutive_failures(mut self, count: u32) -> Self {
        self.config.max_consecutive_failures = count;
        self
    }

    /// Stop after a fixed number of keep-alive attempts.
    #[must_use]
    pub fn max_cycles(mut self, cycles: u64) -> Self {
        self.config.max_cycles = Some(cycles);
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> SupervisorResult<SupervisorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SupervisorConfig::default();
        assert_eq!(config.device_path(), Path::new("/dev/watchdog"));
        assert_eq!(config.timeout.timeout_secs(), None);
        assert_eq!(config.timeout.keep_alive_interval(), DEFAULT_KEEPALIVE_INTERVAL);
        assert_eq!(config.max_consecutive_failures, 3);
        assert_eq!(config.max_cycles, None);
    }

    #[test]
    fn test_timeout_clamp() {
        let timeout = TimeoutConfig::new(Some(3));
        assert_eq!(timeout.timeout_secs(), Some(10));
        assert_eq!(timeout.requested_secs(), Some(3));
        assert!(timeout.was_clamped());
        assert_eq!(timeout.keep_alive_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_interval_derivation() {
        assert_eq!(
            TimeoutConfig::new(Some(10)).keep_alive_interval(),
            Duration::from_secs(1)
        );
        assert_eq!(
            TimeoutConfig::new(Some(60)).keep_alive_interval(),
            Duration::from_secs(6)
        );
        assert_eq!(
            TimeoutConfig::new(Some(100)).keep_alive_interval(),
            Duration::from_secs(10)
        );
        assert!(!TimeoutConfig::new(Some(100)).was_clamped());
    }

    #[test]
    fn test_interval_for_short_device_timeouts() {
        assert_eq!(keep_alive_interval_for(0), Duration::from_secs(1));
        assert_eq!(keep_alive_interval_for(9), Duration::from_secs(1));
        assert_eq!(keep_alive_interval_for(45), Duration::from_secs(4));
    }

    #[test]
    fn test_config_validation() {
        let result = SupervisorConfig::builder().max_consecutive_failures(0).build();
        assert!(matches!(result, Err(SupervisorError::InvalidConfiguration(_))));

        let result = SupervisorConfig::builder().max_cycles(0).build();
        assert!(result.is_err());

        let result = SupervisorConfig::builder().device_path("").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builder() -> SupervisorResult<()> {
        let config = SupervisorConfig::builder()
            .device_path("/dev/watchdog1")
            .timeout_secs(60)
            .max_consecutive_failures(5)
            .max_cycles(12)
            .build()?;
        assert_eq!(config.device_path(), Path::new("/dev/watchdog1"));
        assert_eq!(config.timeout.timeout_secs(), Some(60));
        assert_eq!(config.max_consecutive_failures, 5);
        assert_eq!(config.max_cycles, Some(12));
        Ok(())
    }
}
