//! Intel HEX download command

use super::{CommandResult, Options};
use c2prog_core::bus::C2Bus;
use c2prog_core::ihex::{self, ImageSink};
use c2prog_core::target::Target;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Image sink that forwards to the target and keeps a spinner going
struct ProgressSink<'t, 'a, B: C2Bus + ?Sized> {
    target: &'t mut Target<'a, B>,
    pb: ProgressBar,
    bytes: usize,
}

impl<B: C2Bus + ?Sized> ImageSink for ProgressSink<'_, '_, B> {
    fn write_block(&mut self, addr: u16, data: &[u8]) -> c2prog_core::Result<()> {
        self.target.write_block(addr, data)?;
        self.bytes += data.len();
        self.pb
            .set_message(format!("Writing XRAM: {} bytes (0x{:04x})", self.bytes, addr));
        Ok(())
    }
}

/// Reset the target and download an Intel HEX image into XRAM
///
/// The target is left reset; `run` starts the new program.
pub fn run_program<B: C2Bus + ?Sized>(
    target: &mut Target<'_, B>,
    file: &Path,
    options: &Options,
) -> CommandResult {
    log::info!("Resetting target");
    target.reset()?;

    let pb = if options.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Downloading {}", file.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let mut sink = ProgressSink {
        target,
        pb,
        bytes: 0,
    };
    let result = ihex::load_file(file, &mut sink);
    sink.pb.finish_and_clear();

    let summary = result?;
    log::info!(
        "Downloaded {}: {} records, {} bytes",
        file.display(),
        summary.records,
        summary.bytes
    );
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use c2prog_bus::open_bus;
    use c2prog_core::ihex::format_data_record;
    use c2prog_core::{Error, ErrorKind};

    fn temp_image(name: &str, lines: &[String]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("c2prog-{}-{}", std::process::id(), name));
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    #[test]
    fn test_program_image() {
        let path = temp_image(
            "ok.ihx",
            &[
                format_data_record(0x0000, &[0x02, 0x00, 0x30]),
                format_data_record(0x0030, &[0x80, 0xFE]),
                ":00000001FF".to_string(),
            ],
        );
        let mut bus = open_bus("dummy://").unwrap();
        let mut target = Target::init(&mut bus).unwrap();
        let options = Options {
            binary: false,
            quiet: true,
        };

        run_program(&mut target, &path, &options).unwrap();

        let mut buf = [0u8; 3];
        target.xram_read(0x0000, &mut buf).unwrap();
        assert_eq!(buf, [0x02, 0x00, 0x30]);
        target.xram_read(0x0030, &mut buf[..2]).unwrap();
        assert_eq!(&buf[..2], &[0x80, 0xFE]);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_program_reports_bad_lines() {
        let path = temp_image(
            "bad.ihx",
            &[
                format_data_record(0x0000, &[0x01]),
                ":0100010002FF".to_string(),
                ":00000001FF".to_string(),
            ],
        );
        let mut bus = open_bus("dummy://").unwrap();
        let mut target = Target::init(&mut bus).unwrap();
        let options = Options::default();

        let err = run_program(&mut target, &path, &options).unwrap_err();
        let err = err.downcast::<Error>().unwrap();
        assert_eq!(err.kind(), ErrorKind::ProtocolData);

        std::fs::remove_file(path).ok();
    }
}
