//! Error types for reader/writer device operations.
//!
//! This module defines the error type shared by all `TagDevice`
//! implementations, covering device acquisition, initialization, and
//! per-operation communication failures.

/// Result type alias for device operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while driving a tag reader/writer.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// No device with the requested identity could be opened.
    #[error("Device not found: {device}")]
    DeviceNotFound { device: String },

    /// Device was present but has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// A tag read operation failed.
    ///
    /// Note that "no tag present" is a normal [`TagRead::NoTag`] result,
    /// not an error.
    ///
    /// [`TagRead::NoTag`]: crate::types::TagRead::NoTag
    #[error("Tag read error: {message}")]
    ReadError { message: String },

    /// A tag write operation failed.
    #[error("Tag write error: {message}")]
    WriteError { message: String },

    /// Device communication error (transport level).
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Operation is not supported by this device.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new device-not-found error.
    pub fn device_not_found(device: impl Into<String>) -> Self {
        Self::DeviceNotFound {
            device: device.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new tag read error.
    pub fn read(message: impl Into<String>) -> Self {
        Self::ReadError {
            message: message.into(),
        }
    }

    /// Create a new tag write error.
    pub fn write(message: impl Into<String>) -> Self {
        Self::WriteError {
            message: message.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_not_found_error() {
        let error = HardwareError::device_not_found("ffff:0035");
        assert!(matches!(error, HardwareError::DeviceNotFound { .. }));
        assert_eq!(error.to_string(), "Device not found: ffff:0035");
    }

    #[test]
    fn test_read_error() {
        let error = HardwareError::read("truncated report");
        assert!(matches!(error, HardwareError::ReadError { .. }));
        assert_eq!(error.to_string(), "Tag read error: truncated report");
    }

    #[test]
    fn test_write_error() {
        let error = HardwareError::write("device busy");
        assert_eq!(error.to_string(), "Tag write error: device busy");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let error: HardwareError = io.into();
        assert!(matches!(error, HardwareError::Io(_)));
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            HardwareError::disconnected("reader"),
            HardwareError::initialization_failed("no response"),
            HardwareError::unsupported("set_led"),
            HardwareError::communication("short write"),
        ];

        for error in errors {
            let _ = format!("{}", error);
            let _ = format!("{:?}", error);
        }
    }
}
