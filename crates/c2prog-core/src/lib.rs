//! c2prog-core - Core library for programming 8051 targets over C2
//!
//! This crate contains everything that does not depend on a particular
//! physical interface:
//!
//! - [`bus::C2Bus`] - the six primitives every bus backend provides
//! - [`target::Target`] - the target debug protocol built on those primitives
//!   (RAM/XRAM/SFR access, program counter, breakpoints, halt/resume)
//! - [`ihex`] - the Intel HEX decoder and the loader that streams an image
//!   into target XRAM
//!
//! # Example
//!
//! ```ignore
//! use c2prog_core::{bus::C2Bus, target::Target};
//!
//! fn identify<B: C2Bus>(bus: &mut B) -> c2prog_core::Result<()> {
//!     let mut target = Target::init(bus)?;
//!     let version = target.chip_version()?;
//!     println!("Device ID: 0x{:02x}; Revision ID: 0x{:02x}",
//!         version.device_id(), version.revision());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bus;
pub mod error;
pub mod ihex;
pub mod space;
pub mod target;

pub use error::{Error, ErrorKind, Result};
pub use space::MemorySpace;
