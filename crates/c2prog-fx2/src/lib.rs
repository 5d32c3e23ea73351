//! c2prog-fx2 - Cypress EZ-USB FX2 C2 bridge support
//!
//! An FX2 running the C2 bridge firmware drives the C2 clock and data lines
//! and exposes the six bus primitives as a simple request/response protocol
//! over a pair of bulk endpoints (see [`protocol`]).
//!
//! # Example
//!
//! ```no_run
//! use c2prog_core::bus::C2Bus;
//! use c2prog_fx2::Fx2;
//!
//! let mut fx2 = Fx2::open(None)?;
//! fx2.reset()?;
//! fx2.write_address(0x00)?;
//! let mut id = [0u8; 1];
//! fx2.read_data(&mut id)?;
//! println!("Device ID: 0x{:02x}", id[0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod device;
mod error;
pub mod protocol;

pub use device::{Fx2, UsbLocation};
pub use error::{Fx2Error, Result};
