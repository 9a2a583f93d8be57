//! Transport error types

use thiserror::Error;

/// Errors that can occur while talking to the embedded controller
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Unable to open EC device {path} (os error {code}). Ensure the CrosEC driver is installed and accessible.")]
    DeviceUnavailable { path: String, code: i32 },

    #[error("Payload of {len} bytes exceeds maximum EC command size of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Failed to send EC command 0x{command:04X} (os error {code})")]
    Io { command: u16, code: i32 },

    #[error("EC command failed with status 0x{status:X}")]
    ControllerRejected { status: u32 },

    #[error("Start key {0} does not fit in a byte")]
    StartKeyOutOfRange(usize),

    #[error("Malformed EC packet: {0}")]
    Malformed(String),

    #[error("EC device access is not supported on this platform")]
    Unsupported,

    #[error("Operation was canceled")]
    Canceled,
}

impl TransportError {
    /// True for the cooperative-cancellation outcome, which is not a failure
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Build an `Io` error from the last OS error
    pub(crate) fn last_os_error(command: u16) -> Self {
        TransportError::Io {
            command,
            code: std::io::Error::last_os_error()
                .raw_os_error()
                .unwrap_or(-1),
        }
    }
}
