//! C2 bus capability trait
//!
//! A bus backend only has to move bytes through the two C2 bus registers:
//! the address register, which selects one of the target's debug registers,
//! and the data register, which reads or writes the selected register.
//! Everything above that (memory windows, program counter, breakpoints) is
//! built in [`crate::target`] and works the same for every backend.
//!
//! ## Transfer size
//!
//! Some backends can only move one data byte per call (the `c2drv` kernel
//! driver for example). Callers must not assume a multi-byte data transfer
//! is atomic and should loop over single bytes, which is what
//! [`Target`](crate::target::Target) does.
//!
//! ## Releasing the backend
//!
//! The backend's OS resources are released when the value is dropped.

use crate::error::Result;

/// C2 bus master
///
/// Every call blocks until the physical transfer completes or fails.
/// Implementations need no internal locking; a bus is used by one caller
/// at a time.
pub trait C2Bus {
    /// Pulse the target's reset line (full device reset)
    fn reset(&mut self) -> Result<()>;

    /// Stop program execution without a full reset
    fn quick_reset(&mut self) -> Result<()>;

    /// Read the bus address register
    fn read_address(&mut self) -> Result<u8>;

    /// Write the bus address register
    fn write_address(&mut self, addr: u8) -> Result<()>;

    /// Read `buf.len()` bytes from the data register
    fn read_data(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Write `data` to the data register
    fn write_data(&mut self, data: &[u8]) -> Result<()>;
}

// Boxed buses are what the registry hands out
impl<B: C2Bus + ?Sized> C2Bus for Box<B> {
    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn quick_reset(&mut self) -> Result<()> {
        (**self).quick_reset()
    }

    fn read_address(&mut self) -> Result<u8> {
        (**self).read_address()
    }

    fn write_address(&mut self, addr: u8) -> Result<()> {
        (**self).write_address(addr)
    }

    fn read_data(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_data(buf)
    }

    fn write_data(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_data(data)
    }
}
