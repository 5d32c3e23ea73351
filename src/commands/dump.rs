//! RAM/XRAM/SFR dump command

use super::{CommandResult, Options};
use c2prog_core::bus::C2Bus;
use c2prog_core::target::Target;
use c2prog_core::MemorySpace;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};

/// Chunk size for dump reads (4 KiB)
const DUMP_CHUNK_SIZE: usize = 4096;

/// Size of the RAM and XRAM address spaces
const SPACE_SIZE: usize = 0x10000;

/// Bytes shown per hex dump line
const BYTES_PER_LINE: usize = 32;

/// Bytes per group within a hex dump line
const GROUP_SIZE: usize = 8;

/// Dump `len` bytes of `space` starting at `addr` to stdout
pub fn run_dump<B: C2Bus + ?Sized>(
    target: &mut Target<'_, B>,
    space: MemorySpace,
    addr: u32,
    len: usize,
    options: &Options,
) -> CommandResult {
    space.check_address(addr)?;
    let len = space.clamp_len(addr, len);
    log::info!("Dumping {} bytes of {} at 0x{:04x}", len, space, addr);

    let data = read_with_progress(target, space, addr, len, options.quiet)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if options.binary {
        out.write_all(&data)?;
    } else {
        write_hexdump(&mut out, addr, &data)?;
    }
    out.flush()?;
    Ok(())
}

/// Read memory in chunks, showing a progress bar for long reads
fn read_with_progress<B: C2Bus + ?Sized>(
    target: &mut Target<'_, B>,
    space: MemorySpace,
    addr: u32,
    len: usize,
    quiet: bool,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut data = vec![0u8; len];

    let pb = if quiet || len <= DUMP_CHUNK_SIZE {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
                .progress_chars("#>-"),
        );
        pb
    };

    let mut offset = 0usize;
    while offset < len {
        // Dumps wrap at the end of the 64 KiB space; no read may cross it
        let chunk_addr = (addr as usize + offset) % SPACE_SIZE;
        let chunk_size = (len - offset)
            .min(DUMP_CHUNK_SIZE)
            .min(SPACE_SIZE - chunk_addr);
        target.read_space(
            space,
            chunk_addr as u32,
            &mut data[offset..offset + chunk_size],
        )?;

        offset += chunk_size;
        pb.set_position(offset as u64);
    }

    pb.finish_and_clear();
    Ok(data)
}

/// Render `data` as a hex dump with an ASCII column
///
/// Each line holds 32 bytes in groups of 8 and starts with the target
/// address of its first byte.
pub fn write_hexdump<W: Write>(out: &mut W, base: u32, data: &[u8]) -> io::Result<()> {
    for (line_no, line) in data.chunks(BYTES_PER_LINE).enumerate() {
        let addr = (base as usize + line_no * BYTES_PER_LINE) % SPACE_SIZE;
        write!(out, "  0x{:04x} ", addr)?;

        for (j, byte) in line.iter().enumerate() {
            if j != 0 && j % GROUP_SIZE == 0 {
                write!(out, " ")?;
            }
            write!(out, "{:02x}", byte)?;
        }
        for j in line.len()..BYTES_PER_LINE {
            let pad = if j != 0 && j % GROUP_SIZE == 0 { "   " } else { "  " };
            write!(out, "{}", pad)?;
        }

        write!(out, "    ")?;
        for &byte in line {
            let c = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '.'
            };
            write!(out, "{}", c)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use c2prog_dummy::DummyTarget;

    fn render(base: u32, data: &[u8]) -> String {
        let mut out = Vec::new();
        write_hexdump(&mut out, base, data).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_hexdump_full_line() {
        let data: Vec<u8> = (0x40..0x60).collect();
        assert_eq!(
            render(0x100, &data),
            "  0x0100 4041424344454647 48494a4b4c4d4e4f 5051525354555657 58595a5b5c5d5e5f    @ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_\n"
        );
    }

    #[test]
    fn test_hexdump_partial_line_is_padded() {
        let data: Vec<u8> = (0x00..0x28).map(|b| b + 0x20).collect();
        let text = render(0xF0, &data);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  0x00f0 2021222324252627 28292a2b"));
        assert_eq!(
            lines[1],
            format!("  0x0110 4041424344454647{}    @ABCDEFG", " ".repeat(51))
        );
        // ASCII columns line up
        assert_eq!(lines[0].len() - 32, lines[1].find('@').unwrap());
    }

    #[test]
    fn test_hexdump_non_printable() {
        assert_eq!(
            render(0x80, &[0x00, 0x41, 0x7F, 0xFF]),
            format!("  0x0080 00417fff{}    .A..\n", " ".repeat(2 * 28 + 3))
        );
    }

    #[test]
    fn test_hexdump_address_wraps() {
        let text = render(0xFFE0, &[0u8; 64]);
        assert!(text.lines().nth(1).unwrap().starts_with("  0x0000 "));
    }

    #[test]
    fn test_dump_wraps_at_end_of_xram() {
        let mut dummy = DummyTarget::new_default();
        for (i, byte) in dummy.xram_mut().iter_mut().enumerate() {
            *byte = i as u8;
        }
        dummy.xram_mut()[0xFFFF] = 0xEE;
        dummy.xram_mut()[0x0000] = 0xAA;

        let mut target = Target::new(&mut dummy);
        let data = read_with_progress(&mut target, MemorySpace::Xram, 0xFFF0, 0x20, true).unwrap();

        let expected: Vec<u8> = (0xF0..=0xFE)
            .chain([0xEE, 0xAA])
            .chain(0x01..=0x0F)
            .collect();
        assert_eq!(data, expected);
        // Two window setups: one for 0xFFF0-0xFFFF, one from 0x0000
        assert_eq!(dummy.op_count(), 2 * 7 + 0x20);
    }

    #[test]
    fn test_dump_splits_long_reads_into_chunks() {
        let mut dummy = DummyTarget::new_default();
        let mut target = Target::new(&mut dummy);
        let data =
            read_with_progress(&mut target, MemorySpace::Ram, 0x0000, DUMP_CHUNK_SIZE + 1, true)
                .unwrap();
        assert_eq!(data.len(), DUMP_CHUNK_SIZE + 1);
        assert_eq!(dummy.op_count(), 2 * 7 + DUMP_CHUNK_SIZE + 1);
    }

    #[test]
    fn test_hexdump_empty() {
        assert_eq!(render(0, &[]), "");
    }
}
