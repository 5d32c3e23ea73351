//! CLI argument parsing

use c2prog_core::MemorySpace;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum number of arguments of a single command token
const MAX_ARGS: usize = 16;

/// Upper bound for dump lengths
pub const MAX_DUMP_LEN: usize = 1024 * 1024;

/// Delay used when `delay` has no (or a negative) argument
const DEFAULT_DELAY_MS: u64 = 250;

const COMMANDS_HELP: &str = "\
Commands:
  identify        Get Device ID and Revision ID
  reset           Reset the 8051
  halt            Stop 8051 execution
  run             Resume 8051 execution
  prg:FILE        Program the 8051; FILE is an Intel HEX file (.ihx). Resets
                  the 8051 before the download; use \"run\" afterwards
  wram:ADR,VAL    Write VAL (hexadecimal string) to RAM starting at ADR
  lram:ADR,FILE   Load content of binary FILE into RAM at ADR
  dram:ADR,LEN    Dump LEN bytes of RAM starting at ADR
  wxram:ADR,VAL   Write VAL (hexadecimal string) to XRAM starting at ADR
  lxram:ADR,FILE  Load content of binary FILE into XRAM at ADR
  dxram:ADR,LEN   Dump LEN bytes of XRAM starting at ADR
  wsfr:ADR,VAL    Write VAL to the SFR at ADR
  dsfr:ADR,LEN    Dump LEN bytes of SFR memory starting at ADR
  getpc           Get the value of the PC
  setpc:VAL       Set the PC to VAL
  break:ADR,NR    Set breakpoint NR (0-7) at ADR
  cbreak[:NR]     Clear breakpoint NR, or all breakpoints
  delay:MS        Wait MS milliseconds (default 250)

Numbers are decimal, octal with a leading 0, or hexadecimal with 0x.

Note: the run/halt state of the MCU is not tracked. Accessing memory of a
running MCU, or resuming a running one, can break the protocol; only a
reset recovers from that.";

#[derive(Parser)]
#[command(name = "c2prog")]
#[command(author, version, about = "Programmer and debugger for 8051 targets on the C2 bus", long_about = None)]
#[command(after_help = COMMANDS_HELP)]
pub struct Cli {
    /// C2 bus device URI (<type>://<path>); use 'help' to list bus types
    #[arg(short, long, value_name = "URI", default_value = "fx2://")]
    pub device: String,

    /// Use binary output when dumping data
    #[arg(short, long)]
    pub binary: bool,

    /// Only report warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Keep executing commands after one fails
    #[arg(short, long)]
    pub keep_going: bool,

    /// Commands to execute, in order
    #[arg(value_name = "COMMAND", value_parser = parse_command)]
    pub commands: Vec<Command>,
}

/// One command token, validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print device and revision ID
    Identify,
    /// Full target reset
    Reset,
    /// Stop the MCU
    Halt,
    /// Resume the MCU
    Run,
    /// Download an Intel HEX image
    Program { file: PathBuf },
    /// Write bytes to RAM or XRAM
    WriteMem {
        space: MemorySpace,
        addr: u16,
        data: Vec<u8>,
    },
    /// Load a binary file into RAM or XRAM
    LoadMem {
        space: MemorySpace,
        addr: u16,
        file: PathBuf,
    },
    /// Dump RAM or XRAM
    DumpMem {
        space: MemorySpace,
        addr: u32,
        len: usize,
    },
    /// Write one SFR
    WriteSfr { addr: u8, value: u8 },
    /// Dump SFRs (never past 0xFF)
    DumpSfr { addr: u8, len: usize },
    /// Print the program counter
    GetPc,
    /// Set the program counter
    SetPc(u16),
    /// Arm a breakpoint
    Break { addr: u16, slot: u8 },
    /// Clear one breakpoint, or all of them
    ClearBreak(Option<u8>),
    /// Sleep
    Delay(Duration),
}

impl Command {
    /// Command name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identify => "identify",
            Self::Reset => "reset",
            Self::Halt => "halt",
            Self::Run => "run",
            Self::Program { .. } => "prg",
            Self::WriteMem { space, .. } => match space {
                MemorySpace::Ram => "wram",
                _ => "wxram",
            },
            Self::LoadMem { space, .. } => match space {
                MemorySpace::Ram => "lram",
                _ => "lxram",
            },
            Self::DumpMem { space, .. } => match space {
                MemorySpace::Ram => "dram",
                _ => "dxram",
            },
            Self::WriteSfr { .. } => "wsfr",
            Self::DumpSfr { .. } => "dsfr",
            Self::GetPc => "getpc",
            Self::SetPc(_) => "setpc",
            Self::Break { .. } => "break",
            Self::ClearBreak(_) => "cbreak",
            Self::Delay(_) => "delay",
        }
    }
}

/// Parse an integer the way C's `strtol(s, NULL, 0)` reads it
///
/// `0x` prefix for hexadecimal, a leading `0` for octal, decimal otherwise,
/// with an optional sign. Unlike `strtol`, trailing garbage is an error.
pub fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (16, hex)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (8, &unsigned[1..])
    } else {
        (10, unsigned)
    };

    if digits.is_empty() || digits.starts_with(|c| c == '+' || c == '-') {
        return None;
    }
    let value = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -value } else { value })
}

/// Arguments of one command token
struct Args<'a> {
    command: &'a str,
    values: Vec<&'a str>,
}

impl<'a> Args<'a> {
    /// Split `cmd:arg1,arg2,...`
    fn split(token: &'a str) -> Result<Self, String> {
        let Some((command, rest)) = token.split_once(':') else {
            return Ok(Self {
                command: token,
                values: Vec::new(),
            });
        };

        let values: Vec<&str> = rest.split(',').collect();
        if values.len() > MAX_ARGS {
            return Err(format!("Too many arguments for command \"{}\"", command));
        }
        Ok(Self { command, values })
    }

    /// Argument `n`; empty arguments count as missing
    fn get(&self, n: usize) -> Option<&'a str> {
        self.values.get(n).copied().filter(|s| !s.is_empty())
    }

    fn int(&self, n: usize) -> Result<Option<i64>, String> {
        match self.get(n) {
            None => Ok(None),
            Some(s) => parse_int(s)
                .map(Some)
                .ok_or_else(|| self.error(&format!("Invalid number '{}'", s))),
        }
    }

    fn error(&self, msg: &str) -> String {
        format!("Command '{}': {}", self.command, msg)
    }

    /// Address argument for RAM/XRAM writes and loads
    fn address16(&self, n: usize) -> Result<u16, String> {
        self.int(n)?
            .and_then(|a| u16::try_from(a).ok())
            .ok_or_else(|| self.error("Address out-of-range(0-0xffff)"))
    }

    fn dump_len(&self, n: usize) -> Result<usize, String> {
        let len = self.int(n)?.unwrap_or(1).clamp(1, MAX_DUMP_LEN as i64);
        Ok(len as usize)
    }
}

/// Parse one command token such as `dxram:0x100,64`
pub fn parse_command(token: &str) -> Result<Command, String> {
    let args = Args::split(token)?;

    let mem_space = |name: &str| {
        if name.ends_with("xram") {
            MemorySpace::Xram
        } else {
            MemorySpace::Ram
        }
    };

    let command = match args.command {
        "identify" => Command::Identify,
        "reset" => Command::Reset,
        "halt" => Command::Halt,
        "run" => Command::Run,
        "getpc" => Command::GetPc,

        "prg" => {
            let file = args
                .get(0)
                .ok_or_else(|| args.error("requires file to download"))?;
            Command::Program { file: file.into() }
        }

        name @ ("wram" | "wxram") => {
            let addr = args.address16(0)?;
            let value = args.get(1).ok_or_else(|| args.error("Missing VAL"))?;
            if value.len() % 2 != 0 {
                return Err(args.error("VAL must be an even number of characters"));
            }
            let data = hex::decode(value)
                .map_err(|_| args.error("VAL contains non hexadecimal characters"))?;
            Command::WriteMem {
                space: mem_space(name),
                addr,
                data,
            }
        }

        name @ ("lram" | "lxram") => {
            let addr = args.address16(0)?;
            let file = args.get(1).ok_or_else(|| args.error("Missing FILE"))?;
            Command::LoadMem {
                space: mem_space(name),
                addr,
                file: file.into(),
            }
        }

        name @ ("dram" | "dxram") => {
            let addr = args.int(0)?.unwrap_or(0).max(0);
            Command::DumpMem {
                space: mem_space(name),
                addr: u32::try_from(addr).unwrap_or(u32::MAX),
                len: args.dump_len(1)?,
            }
        }

        "wsfr" => {
            let addr = args.int(0)?.filter(|a| (0x80..=0xFF).contains(a));
            let value = args.int(1)?.filter(|v| (0..=0xFF).contains(v));
            match (addr, value) {
                (Some(addr), Some(value)) => Command::WriteSfr {
                    addr: addr as u8,
                    value: value as u8,
                },
                _ => return Err(args.error("Illegal/missing address and/or value.")),
            }
        }

        "dsfr" => {
            let addr = args
                .int(0)?
                .filter(|a| (0x80..=0xFF).contains(a))
                .ok_or_else(|| args.error("Address out of range(0x80-0xff)."))?;
            let len = args.dump_len(1)?.min(0x100 - addr as usize);
            Command::DumpSfr {
                addr: addr as u8,
                len,
            }
        }

        "setpc" => {
            let pc = args
                .int(0)?
                .and_then(|pc| u16::try_from(pc).ok())
                .ok_or_else(|| args.error("Value out of range(0x0-0xffff)."))?;
            Command::SetPc(pc)
        }

        "break" => {
            let addr = args
                .int(0)?
                .and_then(|a| u16::try_from(a).ok())
                .ok_or_else(|| args.error("Address out of range(0-0xffff)."))?;
            let slot = breakpoint_slot(&args, args.int(1)?.unwrap_or(0))?;
            Command::Break { addr, slot }
        }

        "cbreak" => match args.int(0)? {
            Some(nr) => Command::ClearBreak(Some(breakpoint_slot(&args, nr)?)),
            None => Command::ClearBreak(None),
        },

        "delay" => {
            let ms = args
                .int(0)?
                .and_then(|d| u64::try_from(d).ok())
                .unwrap_or(DEFAULT_DELAY_MS);
            Command::Delay(Duration::from_millis(ms))
        }

        _ => return Err(args.error("Unknown command")),
    };

    Ok(command)
}

fn breakpoint_slot(args: &Args<'_>, nr: i64) -> Result<u8, String> {
    u8::try_from(nr)
        .ok()
        .filter(|nr| *nr < 8)
        .ok_or_else(|| args.error("NR out of range(0-7)."))
}
