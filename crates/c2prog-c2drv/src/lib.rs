//! c2prog-c2drv - c2drv kernel driver support
//!
//! The `c2drv` Linux kernel module bit-bangs the C2 protocol on a parallel
//! port and exposes the bus primitives as ioctls on a character device. It
//! transfers exactly one data byte per request.

mod device;
mod error;

pub use device::C2drv;
pub use error::{C2drvError, Result};
