//! c2prog - Programmer and debugger for 8051 targets on the C2 bus
//!
//! Downloads Intel HEX images into target XRAM, reads and writes RAM, XRAM
//! and SFRs, and controls execution (halt, resume, program counter,
//! hardware breakpoints).
//!
//! # Architecture
//!
//! The bus named by `--device` is opened through the `c2prog-bus` registry,
//! which hands back a transport-agnostic `BusHandle`. All commands run
//! against a `Target` bound to that handle, so they behave the same on the
//! FX2 USB bridge, the c2drv kernel driver or the emulated `dummy://` target.

mod cli;
mod commands;

use c2prog_bus::BusHandle;
use c2prog_core::bus::C2Bus;
use c2prog_core::target::Target;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use cli::{Cli, Command};
use commands::Options;

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if cli.device == "help" {
        print!("{}", c2prog_bus::bus_help());
        return;
    }

    if cli.commands.is_empty() {
        Cli::command()
            .error(ErrorKind::MissingRequiredArgument, "No command specified")
            .exit();
    }

    let mut bus = match c2prog_bus::open_bus(&cli.device) {
        Ok(bus) => bus,
        Err(e) => {
            log::error!("Failed to open C2 bus: {}", e);
            std::process::exit(1);
        }
    };

    let options = Options {
        binary: cli.binary,
        quiet: cli.quiet,
    };
    let failed = run_commands(&mut bus, &cli.commands, &options, cli.keep_going);

    if let Some(msg) = bus.last_error() {
        log::debug!("Last bus error: {}", msg);
    }
    bus.close();

    if failed > 0 {
        std::process::exit(1);
    }
}

/// Connect to the target and execute `cmds` in order
///
/// Returns the number of failed commands. Without `keep_going` execution
/// stops at the first failure.
fn run_commands(
    bus: &mut BusHandle,
    cmds: &[Command],
    options: &Options,
    keep_going: bool,
) -> usize {
    let mut target = match Target::init(bus) {
        Ok(target) => target,
        Err(e) => {
            log::error!("Failed to connect to target: {}", e);
            return 1;
        }
    };

    run_on_target(&mut target, cmds, options, keep_going)
}

fn run_on_target<B: C2Bus + ?Sized>(
    target: &mut Target<'_, B>,
    cmds: &[Command],
    options: &Options,
    keep_going: bool,
) -> usize {
    let mut failed = 0usize;
    for command in cmds {
        log::debug!("Executing {:?}", command);
        if let Err(e) = commands::execute(target, command, options) {
            log::error!("Command '{}' failed: {}", command.name(), e);
            failed += 1;
            if !keep_going {
                break;
            }
        }
    }
    failed
}
