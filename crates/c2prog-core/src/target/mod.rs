//! Target debug protocol
//!
//! [`Target`] turns the six bus primitives into addressed memory accesses
//! and debug controls. It borrows the bus for its lifetime; opening and
//! closing the bus stays with the caller.
//!
//! ## Memory access
//!
//! All three memory spaces are reached through the same memory window:
//!
//! 1. write the space selector to `MEMCTL`
//! 2. write the start address to `MEMADRH` / `MEMADRL`
//! 3. select `MEMDAT` and transfer one byte per data access
//!
//! The target advances the window address after every data transfer, so the
//! address is only set once per call.
//!
//! ## Run state
//!
//! The target's run/halt state is not tracked. Memory accesses on a running
//! target, or `resume` on a running target, have whatever effect the hardware
//! gives them.

pub mod regs;

use crate::bus::C2Bus;
use crate::error::{Error, Result};
use crate::ihex::ImageSink;
use crate::space::MemorySpace;
use regs::{BreakpointMask, DebugControl, BREAKPOINT_SLOTS};

/// Chip identification, device ID in the high byte and revision in the low byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipVersion(pub u16);

impl ChipVersion {
    /// Device ID
    pub fn device_id(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Revision ID
    pub fn revision(self) -> u8 {
        self.0 as u8
    }
}

impl From<ChipVersion> for u16 {
    fn from(v: ChipVersion) -> Self {
        v.0
    }
}

/// Debug access to a target on a C2 bus
pub struct Target<'a, B: C2Bus + ?Sized> {
    bus: &'a mut B,
}

impl<'a, B: C2Bus + ?Sized> Target<'a, B> {
    /// Bind to a bus without touching the target
    pub fn new(bus: &'a mut B) -> Self {
        Self { bus }
    }

    /// Bind to a bus and perform the connect handshake
    ///
    /// The target is reset and its identification registers are read once to
    /// make sure the link works.
    pub fn init(bus: &'a mut B) -> Result<Self> {
        let mut target = Self::new(bus);
        target.reset()?;
        let version = target.chip_version()?;
        log::debug!(
            "Connected to target: device ID 0x{:02x}, revision 0x{:02x}",
            version.device_id(),
            version.revision()
        );
        Ok(target)
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<()> {
        self.bus.write_address(reg)?;
        self.bus.write_data(&[value])
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8> {
        let mut value = [0u8; 1];
        self.bus.write_address(reg)?;
        self.bus.read_data(&mut value)?;
        Ok(value[0])
    }

    fn select_window(&mut self, space: MemorySpace, addr: u16) -> Result<()> {
        log::trace!("Memory window: {} 0x{:04x}", space, addr);
        self.write_reg(regs::MEMCTL, space.selector())?;
        self.write_reg(regs::MEMADRH, (addr >> 8) as u8)?;
        self.write_reg(regs::MEMADRL, addr as u8)?;
        self.bus.write_address(regs::MEMDAT)
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Full target reset
    pub fn reset(&mut self) -> Result<()> {
        self.bus.reset()
    }

    /// Stop program execution
    pub fn halt(&mut self) -> Result<()> {
        self.bus.quick_reset()?;
        let ctl = DebugControl::from_bits_retain(self.read_reg(regs::DBGCTL)?);
        self.write_reg(regs::DBGCTL, (ctl | DebugControl::HALT).bits())
    }

    /// Resume program execution
    pub fn resume(&mut self) -> Result<()> {
        let ctl = DebugControl::from_bits_retain(self.read_reg(regs::DBGCTL)?);
        self.write_reg(regs::DBGCTL, (ctl - DebugControl::HALT).bits())
    }

    /// Read the identification registers
    pub fn chip_version(&mut self) -> Result<ChipVersion> {
        let device = self.read_reg(regs::DEVICEID)?;
        let revision = self.read_reg(regs::REVID)?;
        Ok(ChipVersion(u16::from_be_bytes([device, revision])))
    }

    // =========================================================================
    // Memory
    // =========================================================================

    /// Read from any memory space
    ///
    /// Returns the number of bytes actually read, which is less than
    /// `buf.len()` only for SFR reads that would cross the end of the page.
    /// RAM and XRAM reads must fit in the space.
    pub fn read_space(&mut self, space: MemorySpace, addr: u32, buf: &mut [u8]) -> Result<usize> {
        let len = space.clamp_len(addr, buf.len());
        space.check_span(addr, len)?;
        if len == 0 {
            return Ok(0);
        }

        self.select_window(space, addr as u16)?;
        for byte in &mut buf[..len] {
            self.bus.read_data(core::slice::from_mut(byte))?;
        }
        Ok(len)
    }

    /// Write to any memory space
    ///
    /// Returns the number of bytes actually written (see [`Self::read_space`]).
    pub fn write_space(&mut self, space: MemorySpace, addr: u32, data: &[u8]) -> Result<usize> {
        let len = space.clamp_len(addr, data.len());
        space.check_span(addr, len)?;
        if len == 0 {
            return Ok(0);
        }

        self.select_window(space, addr as u16)?;
        for byte in &data[..len] {
            self.bus.write_data(core::slice::from_ref(byte))?;
        }
        Ok(len)
    }

    /// Read internal RAM
    pub fn ram_read(&mut self, addr: u16, buf: &mut [u8]) -> Result<()> {
        self.read_space(MemorySpace::Ram, addr.into(), buf).map(|_| ())
    }

    /// Write internal RAM
    pub fn ram_write(&mut self, addr: u16, data: &[u8]) -> Result<()> {
        self.write_space(MemorySpace::Ram, addr.into(), data).map(|_| ())
    }

    /// Read XRAM
    pub fn xram_read(&mut self, addr: u16, buf: &mut [u8]) -> Result<()> {
        self.read_space(MemorySpace::Xram, addr.into(), buf).map(|_| ())
    }

    /// Write XRAM
    pub fn xram_write(&mut self, addr: u16, data: &[u8]) -> Result<()> {
        self.write_space(MemorySpace::Xram, addr.into(), data).map(|_| ())
    }

    /// Read special function registers starting at `addr` (0x80-0xFF)
    ///
    /// The read stops at the end of the SFR page; the return value is the
    /// number of bytes read.
    pub fn sfr_read(&mut self, addr: u8, buf: &mut [u8]) -> Result<usize> {
        self.read_space(MemorySpace::Sfr, addr.into(), buf)
    }

    /// Write special function registers starting at `addr` (0x80-0xFF)
    pub fn sfr_write(&mut self, addr: u8, data: &[u8]) -> Result<usize> {
        self.write_space(MemorySpace::Sfr, addr.into(), data)
    }

    // =========================================================================
    // Program counter
    // =========================================================================

    /// Read the program counter
    pub fn pc_get(&mut self) -> Result<u16> {
        let low = self.read_reg(regs::PCL)?;
        let high = self.read_reg(regs::PCH)?;
        Ok(u16::from_le_bytes([low, high]))
    }

    /// Set the program counter
    pub fn pc_set(&mut self, pc: u16) -> Result<()> {
        let [low, high] = pc.to_le_bytes();
        self.write_reg(regs::PCL, low)?;
        self.write_reg(regs::PCH, high)
    }

    // =========================================================================
    // Breakpoints
    // =========================================================================

    fn check_slot(slot: u8) -> Result<()> {
        if slot >= BREAKPOINT_SLOTS {
            return Err(Error::InvalidBreakpoint(slot));
        }
        Ok(())
    }

    fn write_bp_address(&mut self, slot: u8, addr: u16) -> Result<()> {
        let [low, high] = addr.to_le_bytes();
        self.write_reg(regs::bp_low(slot), low)?;
        self.write_reg(regs::bp_high(slot), high)
    }

    fn enabled_breakpoints(&mut self) -> Result<BreakpointMask> {
        Ok(BreakpointMask::from_bits_retain(self.read_reg(regs::BPEN)?))
    }

    /// Arm breakpoint `slot` (0-7) at `addr`
    pub fn bp_set(&mut self, slot: u8, addr: u16) -> Result<()> {
        Self::check_slot(slot)?;
        log::debug!("Breakpoint {} at 0x{:04x}", slot, addr);
        self.write_bp_address(slot, addr)?;
        let mask = self.enabled_breakpoints()? | BreakpointMask::slot(slot);
        self.write_reg(regs::BPEN, mask.bits())
    }

    /// Disarm breakpoint `slot` (0-7) and clear its address
    pub fn bp_clear(&mut self, slot: u8) -> Result<()> {
        Self::check_slot(slot)?;
        log::debug!("Clearing breakpoint {}", slot);
        let mask = self.enabled_breakpoints()? - BreakpointMask::slot(slot);
        self.write_reg(regs::BPEN, mask.bits())?;
        self.write_bp_address(slot, 0)
    }

    /// Disarm and clear all breakpoints
    pub fn bp_clear_all(&mut self) -> Result<()> {
        log::debug!("Clearing all breakpoints");
        self.write_reg(regs::BPEN, BreakpointMask::empty().bits())?;
        for slot in 0..BREAKPOINT_SLOTS {
            self.write_bp_address(slot, 0)?;
        }
        Ok(())
    }
}

/// Program images are deposited in XRAM
impl<B: C2Bus + ?Sized> ImageSink for Target<'_, B> {
    fn write_block(&mut self, addr: u16, data: &[u8]) -> Result<()> {
        self.xram_write(addr, data)
    }
}
