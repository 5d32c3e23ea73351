//! Target memory spaces

use crate::error::{Error, Result};
use core::fmt;

/// Memory space reachable through the target's memory window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemorySpace {
    /// Internal data RAM
    Ram,
    /// External / extended data memory (also holds the code image)
    Xram,
    /// Special function registers (upper page only)
    Sfr,
}

impl MemorySpace {
    /// Lowest valid address
    pub const fn min_address(self) -> u32 {
        match self {
            Self::Ram | Self::Xram => 0x0000,
            Self::Sfr => 0x80,
        }
    }

    /// Highest valid address
    pub const fn max_address(self) -> u32 {
        match self {
            Self::Ram | Self::Xram => 0xFFFF,
            Self::Sfr => 0xFF,
        }
    }

    /// Value written to the memory window selector to reach this space
    pub const fn selector(self) -> u8 {
        match self {
            Self::Ram => 0x01,
            Self::Xram => 0x02,
            Self::Sfr => 0x03,
        }
    }

    /// Check that `addr` is a valid start address in this space
    pub fn check_address(self, addr: u32) -> Result<()> {
        if addr < self.min_address() || addr > self.max_address() {
            return Err(Error::AddressOutOfRange { space: self, addr });
        }
        Ok(())
    }

    /// Check that `len` bytes starting at `addr` fit entirely in this space
    pub fn check_span(self, addr: u32, len: usize) -> Result<()> {
        self.check_address(addr)?;
        let end = addr as u64 + len as u64;
        if end > self.max_address() as u64 + 1 {
            return Err(Error::SpanOutOfRange {
                space: self,
                addr,
                len,
            });
        }
        Ok(())
    }

    /// Number of bytes an access of `len` bytes at `addr` actually transfers
    ///
    /// SFR accesses never cross the end of the register page, so their
    /// length is silently cut to `0x100 - addr`. RAM and XRAM accesses are
    /// not clamped; [`check_span`](Self::check_span) rejects those that do
    /// not fit.
    pub fn clamp_len(self, addr: u32, len: usize) -> usize {
        match self {
            Self::Sfr => {
                let room = (self.max_address() + 1).saturating_sub(addr) as usize;
                len.min(room)
            }
            Self::Ram | Self::Xram => len,
        }
    }
}

impl fmt::Display for MemorySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ram => write!(f, "RAM"),
            Self::Xram => write!(f, "XRAM"),
            Self::Sfr => write!(f, "SFR"),
        }
    }
}
