//! Error types for the FX2 C2 bridge

use crate::device::UsbLocation;
use thiserror::Error;

/// Errors that can occur when talking to the FX2 bridge
#[derive(Debug, Error)]
pub enum Fx2Error {
    /// No bridge connected
    #[error("FX2 C2 bridge not found (VID:04b4 PID:8613)")]
    DeviceNotFound,

    /// No bridge at the requested USB location
    #[error("No FX2 C2 bridge at USB bus {:03} device {:03}", .0.bus, .0.address)]
    NotFoundAt(UsbLocation),

    /// Malformed `BBB/DDD` location
    #[error("expected BBB/DDD with 3-digit bus and device numbers, got '{0}'")]
    InvalidLocation(String),

    /// Failed to open device
    #[error("Failed to open FX2 bridge: {0}")]
    OpenFailed(String),

    /// Failed to claim interface or endpoints
    #[error("Failed to claim interface: {0}")]
    ClaimFailed(String),

    /// USB transfer failed
    #[error("USB transfer failed: {0}")]
    TransferFailed(String),

    /// USB transfer did not complete in time
    #[error("USB transfer timed out")]
    Timeout,

    /// Bridge answered with something unexpected
    #[error("Invalid response from FX2 bridge: {0}")]
    InvalidResponse(String),

    /// Target did not answer on the C2 bus
    #[error("Target not responding on the C2 bus")]
    TargetTimeout,

    /// Bridge firmware did not understand the request
    #[error("Request rejected by bridge firmware")]
    Rejected,

    /// Data transfer length the bridge cannot carry
    #[error("Invalid data transfer length {0} (1-4)")]
    InvalidLength(usize),
}

/// Result type for FX2 operations
pub type Result<T> = std::result::Result<T, Fx2Error>;

impl From<Fx2Error> for c2prog_core::Error {
    fn from(e: Fx2Error) -> Self {
        c2prog_core::Error::transport("fx2", e)
    }
}
