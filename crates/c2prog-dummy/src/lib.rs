//! c2prog-dummy - In-memory 8051 target emulator
//!
//! This crate provides a C2 bus whose far end is an emulated target with
//! the same debug register map as real hardware. It's useful for testing
//! and development without a programmer attached.

use c2prog_core::bus::C2Bus;
use c2prog_core::error::{Error, Result};
use c2prog_core::target::regs::{self, BreakpointMask, DebugControl, BREAKPOINT_SLOTS};

const MEMORY_SIZE: usize = 0x10000;
const SFR_PAGE_SIZE: usize = 0x100;

/// Memory window selector values (see `MemorySpace::selector`)
const SEL_RAM: u8 = 0x01;
const SEL_XRAM: u8 = 0x02;
const SEL_SFR: u8 = 0x03;

/// Configuration for the emulated target
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Value of the DEVICEID register
    pub device_id: u8,
    /// Value of the REVID register
    pub revision: u8,
    /// Fill value for RAM, XRAM and SFRs at power-up
    pub fill: u8,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            device_id: 0x0A,
            revision: 0x02,
            fill: 0x00,
        }
    }
}

/// Emulated target
pub struct DummyTarget {
    config: DummyConfig,
    ram: Vec<u8>,
    xram: Vec<u8>,
    sfr: [u8; SFR_PAGE_SIZE],
    /// C2 address register
    address: u8,
    dbgctl: DebugControl,
    memctl: u8,
    window: u16,
    pc: u16,
    bpen: BreakpointMask,
    bp: [u16; BREAKPOINT_SLOTS as usize],
    ops: usize,
    fail_at: Option<usize>,
}

impl DummyTarget {
    /// Create a new emulated target
    pub fn new(config: DummyConfig) -> Self {
        let fill = config.fill;
        Self {
            config,
            ram: vec![fill; MEMORY_SIZE],
            xram: vec![fill; MEMORY_SIZE],
            sfr: [fill; SFR_PAGE_SIZE],
            address: 0,
            dbgctl: DebugControl::empty(),
            memctl: 0,
            window: 0,
            pc: 0,
            bpen: BreakpointMask::empty(),
            bp: [0; BREAKPOINT_SLOTS as usize],
            ops: 0,
            fail_at: None,
        }
    }

    /// Create a new emulated target with default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Make every bus primitive fail once `ops` primitives have succeeded
    pub fn fail_after(&mut self, ops: usize) {
        self.fail_at = Some(self.ops + ops);
    }

    /// Number of bus primitives executed so far
    pub fn op_count(&self) -> usize {
        self.ops
    }

    /// Internal RAM contents
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// XRAM contents
    pub fn xram(&self) -> &[u8] {
        &self.xram
    }

    /// Mutable XRAM contents
    pub fn xram_mut(&mut self) -> &mut [u8] {
        &mut self.xram
    }

    /// SFR page, indexed by full SFR address (0x00-0x7F are never reachable)
    pub fn sfr(&self) -> &[u8] {
        &self.sfr
    }

    /// Current program counter
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Whether the CPU is halted
    pub fn is_halted(&self) -> bool {
        self.dbgctl.contains(DebugControl::HALT)
    }

    /// Enable mask and address registers of all breakpoint slots
    pub fn breakpoints(&self) -> (u8, [u16; BREAKPOINT_SLOTS as usize]) {
        (self.bpen.bits(), self.bp)
    }

    fn step(&mut self, what: &str) -> Result<()> {
        if let Some(limit) = self.fail_at {
            if self.ops >= limit {
                return Err(Error::transport("dummy", "injected link failure"));
            }
        }
        self.ops += 1;
        log::trace!("dummy: {}", what);
        Ok(())
    }

    fn window_byte(&mut self) -> Option<&mut u8> {
        let addr = self.window as usize;
        match self.memctl {
            SEL_RAM => self.ram.get_mut(addr),
            SEL_XRAM => self.xram.get_mut(addr),
            SEL_SFR => self.sfr.get_mut(addr & 0xFF),
            _ => None,
        }
    }

    fn read_window(&mut self) -> u8 {
        let value = self.window_byte().map_or(0xFF, |b| *b);
        self.window = self.window.wrapping_add(1);
        value
    }

    fn write_window(&mut self, value: u8) {
        if let Some(b) = self.window_byte() {
            *b = value;
        }
        self.window = self.window.wrapping_add(1);
    }

    fn bp_slot(reg: u8) -> Option<(usize, bool)> {
        let end = regs::bp_high(BREAKPOINT_SLOTS - 1);
        if (regs::BP_BASE..=end).contains(&reg) {
            let offset = reg - regs::BP_BASE;
            Some(((offset / 2) as usize, offset % 2 == 1))
        } else {
            None
        }
    }

    fn read_reg(&mut self) -> u8 {
        match self.address {
            regs::DEVICEID => self.config.device_id,
            regs::REVID => self.config.revision,
            regs::DBGCTL => self.dbgctl.bits(),
            regs::MEMCTL => self.memctl,
            regs::MEMADRH => (self.window >> 8) as u8,
            regs::MEMADRL => self.window as u8,
            regs::MEMDAT => self.read_window(),
            regs::PCL => self.pc as u8,
            regs::PCH => (self.pc >> 8) as u8,
            regs::BPEN => self.bpen.bits(),
            reg => match Self::bp_slot(reg) {
                Some((slot, true)) => (self.bp[slot] >> 8) as u8,
                Some((slot, false)) => self.bp[slot] as u8,
                None => 0xFF,
            },
        }
    }

    fn write_reg(&mut self, value: u8) {
        match self.address {
            regs::DEVICEID | regs::REVID => {}
            regs::DBGCTL => self.dbgctl = DebugControl::from_bits_truncate(value),
            regs::MEMCTL => self.memctl = value,
            regs::MEMADRH => self.window = (self.window & 0x00FF) | (u16::from(value) << 8),
            regs::MEMADRL => self.window = (self.window & 0xFF00) | u16::from(value),
            regs::MEMDAT => self.write_window(value),
            regs::PCL => self.pc = (self.pc & 0xFF00) | u16::from(value),
            regs::PCH => self.pc = (self.pc & 0x00FF) | (u16::from(value) << 8),
            regs::BPEN => self.bpen = BreakpointMask::from_bits_retain(value),
            reg => match Self::bp_slot(reg) {
                Some((slot, true)) => {
                    self.bp[slot] = (self.bp[slot] & 0x00FF) | (u16::from(value) << 8)
                }
                Some((slot, false)) => {
                    self.bp[slot] = (self.bp[slot] & 0xFF00) | u16::from(value)
                }
                None => log::debug!("dummy: write to unknown register 0x{:02x}", reg),
            },
        }
    }
}

impl C2Bus for DummyTarget {
    fn reset(&mut self) -> Result<()> {
        self.step("reset")?;
        self.dbgctl = DebugControl::empty();
        self.memctl = 0;
        self.window = 0;
        self.pc = 0;
        self.bpen = BreakpointMask::empty();
        self.bp = [0; BREAKPOINT_SLOTS as usize];
        Ok(())
    }

    fn quick_reset(&mut self) -> Result<()> {
        self.step("quick reset")?;
        self.dbgctl |= DebugControl::HALT;
        Ok(())
    }

    fn read_address(&mut self) -> Result<u8> {
        self.step("address read")?;
        Ok(self.address)
    }

    fn write_address(&mut self, addr: u8) -> Result<()> {
        self.step("address write")?;
        self.address = addr;
        Ok(())
    }

    fn read_data(&mut self, buf: &mut [u8]) -> Result<()> {
        self.step("data read")?;
        for byte in buf {
            *byte = self.read_reg();
        }
        Ok(())
    }

    fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.step("data write")?;
        for &byte in data {
            self.write_reg(byte);
        }
        Ok(())
    }
}
