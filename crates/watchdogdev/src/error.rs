//! Error types for watchdog device operations.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while talking to a watchdog device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The device node could not be opened (missing node, permissions,
    /// or another process already holds it).
    #[error("watchdog device {} is unavailable: {source}", path.display())]
    Unavailable {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The driver or firmware rejected the operation or its argument.
    #[error("watchdog device does not support {operation}")]
    Unsupported {
        /// Operation that was rejected.
        operation: &'static str,
    },

    /// Transport failure while executing an operation.
    #[error("watchdog {operation} failed: {source}")]
    Io {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The handle was already released.
    #[error("watchdog {operation} attempted on a closed device")]
    Closed {
        /// Operation that was attempted.
        operation: &'static str,
    },
}

impl DeviceError {
    /// Create an unavailable-device error.
    #[must_use]
    pub fn unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Unavailable {
            path: path.into(),
            source,
        }
    }

    /// Create an unsupported-operation error.
    #[must_use]
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Create a transport error.
    #[must_use]
    pub fn io(operation: &'static str, source: io::Error) -> Self {
        Self::Io { operation, source }
    }

    /// Create a closed-handle error.
    #[must_use]
    pub fn closed(operation: &'static str) -> Self {
        Self::Closed { operation }
    }

    /// Whether the error means the device rejected the request rather than
    /// failed to carry it.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// A specialized `Result` type for watchdog device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeviceError::unavailable(
            "/dev/watchdog",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(err.to_string().starts_with("watchdog device /dev/watchdog is unavailable"));

        assert_eq!(
            DeviceError::unsupported("set_timeout").to_string(),
            "watchdog device does not support set_timeout"
        );
        assert_eq!(
            DeviceError::closed("keep_alive").to_string(),
            "watchdog keep_alive attempted on a closed device"
        );
    }

    #[test]
    fn test_error_constructors() {
        let err = DeviceError::io("keep_alive", io::Error::other("EIO"));
        assert!(matches!(err, DeviceError::Io { operation: "keep_alive", .. }));
        assert!(!err.is_unsupported());
        assert!(DeviceError::unsupported("time_left").is_unsupported());
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error as _;

        let err = DeviceError::io("keep_alive", io::Error::other("bus fault"));
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("bus fault"));
    }
}
