//! RAM/XRAM write and binary load commands

use super::CommandResult;
use c2prog_core::bus::C2Bus;
use c2prog_core::target::Target;
use c2prog_core::{Error, MemorySpace};
use std::path::Path;

/// Write `data` to `space` at `addr`
pub fn run_write<B: C2Bus + ?Sized>(
    target: &mut Target<'_, B>,
    space: MemorySpace,
    addr: u16,
    data: &[u8],
) -> CommandResult {
    space.check_span(addr.into(), data.len())?;
    log::info!(
        "Setting {} bytes of {} at 0x{:04x}: {}",
        data.len(),
        space,
        addr,
        hex::encode(data)
    );
    target.write_space(space, addr.into(), data)?;
    Ok(())
}

/// Copy the content of a binary file to `space` at `addr`
///
/// The whole file must fit in the space; nothing is written otherwise.
pub fn run_load<B: C2Bus + ?Sized>(
    target: &mut Target<'_, B>,
    space: MemorySpace,
    addr: u16,
    file: &Path,
) -> CommandResult {
    let data = read_image(file)?;
    space.check_span(addr.into(), data.len())?;

    log::info!(
        "Loading {} bytes from {} into {} at 0x{:04x}",
        data.len(),
        file.display(),
        space,
        addr
    );
    target.write_space(space, addr.into(), &data)?;
    Ok(())
}

fn read_image(file: &Path) -> Result<Vec<u8>, Error> {
    std::fs::read(file).map_err(|source| Error::Open {
        path: file.to_path_buf(),
        source,
    })
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use c2prog_bus::open_bus;
    use c2prog_core::ErrorKind;

    fn temp_blob(name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("c2prog-{}-{}", std::process::id(), name));
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_write_past_end_is_rejected() {
        let mut bus = open_bus("dummy://").unwrap();
        let mut target = Target::new(&mut bus);
        let err = run_write(&mut target, MemorySpace::Xram, 0xFFFF, &[1, 2]).unwrap_err();
        let err = err.downcast::<Error>().unwrap();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn test_load_missing_file() {
        let mut bus = open_bus("dummy://").unwrap();
        let mut target = Target::new(&mut bus);
        let err = run_load(
            &mut target,
            MemorySpace::Ram,
            0,
            Path::new("/nonexistent/blob.bin"),
        )
        .unwrap_err();
        let err = err.downcast::<Error>().unwrap();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_load_file() {
        let path = temp_blob("load.bin", &[0xAA, 0xBB, 0xCC]);
        let mut bus = open_bus("dummy://").unwrap();
        let mut target = Target::new(&mut bus);

        run_load(&mut target, MemorySpace::Xram, 0x10, &path).unwrap();
        let mut buf = [0u8; 3];
        target.xram_read(0x10, &mut buf).unwrap();
        assert_eq!(buf, [0xAA, 0xBB, 0xCC]);

        let err = run_load(&mut target, MemorySpace::Xram, 0xFFFF, &path).unwrap_err();
        let err = err.downcast::<Error>().unwrap();
        assert_eq!(err.kind(), ErrorKind::Range);

        std::fs::remove_file(path).ok();
    }
}
