//! CLI command implementations
//!
//! Every command token is executed against a [`Target`] bound to the bus
//! opened from `--device`. Output meant for the operator (identification,
//! PC value, dumps) goes to stdout; progress goes through the logger.

mod dump;
mod memory;
mod program;

use crate::cli::Command;
use c2prog_core::bus::C2Bus;
use c2prog_core::target::Target;
use c2prog_core::MemorySpace;

/// Result type of a single command
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Global options that change how commands behave
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Dumps write raw bytes instead of a hex dump
    pub binary: bool,
    /// Suppress progress bars
    pub quiet: bool,
}

/// Execute one command
pub fn execute<B: C2Bus + ?Sized>(
    target: &mut Target<'_, B>,
    command: &Command,
    options: &Options,
) -> CommandResult {
    match command {
        Command::Identify => {
            let version = target.chip_version()?;
            println!(
                "Device ID: 0x{:02x}; Revision ID: 0x{:02x}",
                version.device_id(),
                version.revision()
            );
        }
        Command::Reset => {
            log::info!("Resetting target");
            target.reset()?;
        }
        Command::Halt => {
            log::info!("Halting target");
            target.halt()?;
        }
        Command::Run => {
            log::info!("Resuming target");
            target.resume()?;
        }
        Command::Program { file } => program::run_program(target, file, options)?,
        Command::WriteMem { space, addr, data } => {
            memory::run_write(target, *space, *addr, data)?
        }
        Command::LoadMem { space, addr, file } => memory::run_load(target, *space, *addr, file)?,
        Command::DumpMem { space, addr, len } => {
            dump::run_dump(target, *space, *addr, *len, options)?
        }
        Command::WriteSfr { addr, value } => {
            log::info!("Setting SFR 0x{:02x} to 0x{:02x}", addr, value);
            target.sfr_write(*addr, &[*value])?;
        }
        Command::DumpSfr { addr, len } => {
            dump::run_dump(target, MemorySpace::Sfr, (*addr).into(), *len, options)?
        }
        Command::GetPc => {
            let pc = target.pc_get()?;
            println!("PC: 0x{:04x}", pc);
        }
        Command::SetPc(pc) => {
            log::info!("Setting PC to 0x{:04x}", pc);
            target.pc_set(*pc)?;
        }
        Command::Break { addr, slot } => {
            log::info!("Setting breakpoint {} at 0x{:04x}", slot, addr);
            target.bp_set(*slot, *addr)?;
        }
        Command::ClearBreak(Some(slot)) => {
            log::info!("Clearing breakpoint {}", slot);
            target.bp_clear(*slot)?;
        }
        Command::ClearBreak(None) => {
            log::info!("Clearing all breakpoints");
            target.bp_clear_all()?;
        }
        Command::Delay(duration) => {
            log::debug!("Sleeping {} ms", duration.as_millis());
            std::thread::sleep(*duration);
        }
    }

    Ok(())
}
