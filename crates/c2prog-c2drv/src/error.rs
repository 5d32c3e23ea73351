//! Error types for the c2drv backend

use thiserror::Error;

/// c2drv specific errors
#[derive(Debug, Error)]
pub enum C2drvError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Driver request failed
    #[error("{op} ioctl failed: {source}")]
    Ioctl {
        op: &'static str,
        #[source]
        source: nix::errno::Errno,
    },

    /// The driver moves exactly one data byte per request
    #[error("Invalid data transfer length {0} (driver supports 1)")]
    InvalidLength(usize),
}

/// Result type for c2drv operations
pub type Result<T> = std::result::Result<T, C2drvError>;

impl From<C2drvError> for c2prog_core::Error {
    fn from(e: C2drvError) -> Self {
        c2prog_core::Error::transport("c2drv", e)
    }
}
