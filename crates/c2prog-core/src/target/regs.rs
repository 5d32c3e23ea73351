//! Target debug register map
//!
//! These are the register numbers written to the C2 address register. A
//! register is read or written by selecting it and then transferring one
//! byte through the data register.

use bitflags::bitflags;

/// Device ID (read-only)
pub const DEVICEID: u8 = 0x00;
/// Revision ID (read-only)
pub const REVID: u8 = 0x01;
/// Debug control
pub const DBGCTL: u8 = 0x02;
/// Memory window space selector, see [`MemorySpace::selector`](crate::MemorySpace::selector)
pub const MEMCTL: u8 = 0x03;
/// Memory window address, high byte
pub const MEMADRH: u8 = 0x04;
/// Memory window address, low byte
pub const MEMADRL: u8 = 0x05;
/// Memory window data; each transfer advances the window address by one
pub const MEMDAT: u8 = 0x06;
/// Program counter, low byte
pub const PCL: u8 = 0x20;
/// Program counter, high byte
pub const PCH: u8 = 0x21;
/// Breakpoint enable mask
pub const BPEN: u8 = 0x30;
/// First breakpoint address register (BP0L)
pub const BP_BASE: u8 = 0x31;

/// Number of hardware breakpoint slots
pub const BREAKPOINT_SLOTS: u8 = 8;

/// Low address register of breakpoint `slot`
pub const fn bp_low(slot: u8) -> u8 {
    BP_BASE + 2 * slot
}

/// High address register of breakpoint `slot`
pub const fn bp_high(slot: u8) -> u8 {
    BP_BASE + 2 * slot + 1
}

bitflags! {
    /// DBGCTL bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DebugControl: u8 {
        /// CPU is halted in debug mode
        const HALT = 1 << 0;
    }
}

bitflags! {
    /// BPEN bits, one per breakpoint slot
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BreakpointMask: u8 {
        /// Slot 0 enabled
        const BP0 = 1 << 0;
        /// Slot 1 enabled
        const BP1 = 1 << 1;
        /// Slot 2 enabled
        const BP2 = 1 << 2;
        /// Slot 3 enabled
        const BP3 = 1 << 3;
        /// Slot 4 enabled
        const BP4 = 1 << 4;
        /// Slot 5 enabled
        const BP5 = 1 << 5;
        /// Slot 6 enabled
        const BP6 = 1 << 6;
        /// Slot 7 enabled
        const BP7 = 1 << 7;
    }
}

impl BreakpointMask {
    /// Mask bit of a single slot (`slot` must be below [`BREAKPOINT_SLOTS`])
    pub fn slot(slot: u8) -> Self {
        Self::from_bits_truncate(1u8 << (slot & 7))
    }
}
