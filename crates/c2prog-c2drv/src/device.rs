//! c2drv device implementation
//!
//! This module provides the `C2drv` struct that implements the `C2Bus`
//! trait on top of the driver's ioctl interface.

use crate::error::{C2drvError, Result};

use c2prog_core::bus::C2Bus;
use c2prog_core::error::Result as CoreResult;

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::time::Duration;

/// Settle time after a reset pulse
const RESET_DELAY: Duration = Duration::from_micros(2);

/// c2drv ioctl constants
mod ioctl {
    use nix::libc::c_ulong;
    use nix::{ioctl_none, ioctl_read, ioctl_write_ptr};

    // c2drv ioctl magic number
    const C2_IOC_MAGIC: u8 = b'c';

    // c2drv ioctl type numbers
    const C2_IOC_TYPE_RESET: u8 = 0;
    const C2_IOC_TYPE_QRESET: u8 = 1;
    const C2_IOC_TYPE_AREAD: u8 = 2;
    const C2_IOC_TYPE_AWRITE: u8 = 3;
    const C2_IOC_TYPE_D1READ: u8 = 4;
    const C2_IOC_TYPE_D1WRITE: u8 = 5;

    // Generate ioctl functions
    ioctl_none!(c2_ioc_reset, C2_IOC_MAGIC, C2_IOC_TYPE_RESET);
    ioctl_none!(c2_ioc_qreset, C2_IOC_MAGIC, C2_IOC_TYPE_QRESET);
    ioctl_read!(c2_ioc_aread, C2_IOC_MAGIC, C2_IOC_TYPE_AREAD, u8);
    ioctl_write_ptr!(c2_ioc_awrite, C2_IOC_MAGIC, C2_IOC_TYPE_AWRITE, u8);
    ioctl_read!(c2_ioc_d1read, C2_IOC_MAGIC, C2_IOC_TYPE_D1READ, c_ulong);
    ioctl_write_ptr!(c2_ioc_d1write, C2_IOC_MAGIC, C2_IOC_TYPE_D1WRITE, u8);
}

/// C2 bus through the c2drv kernel driver
#[derive(Debug)]
pub struct C2drv {
    /// File handle for the driver's character device
    file: File,
}

impl C2drv {
    /// Open the driver's character device (e.g. `/dev/c2drv`)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("c2drv: Opening device {}", path.display());

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| C2drvError::OpenFailed {
                path: path.display().to_string(),
                source: e,
            })?;

        Ok(Self { file })
    }

    fn single(len: usize) -> Result<()> {
        if len != 1 {
            return Err(C2drvError::InvalidLength(len));
        }
        Ok(())
    }

    fn reset_pulse(&mut self) -> Result<()> {
        let fd = self.file.as_raw_fd();
        // SAFETY: fd is a valid open file descriptor owned by self.file
        unsafe { ioctl::c2_ioc_reset(fd) }
            .map_err(|source| C2drvError::Ioctl { op: "reset", source })?;
        std::thread::sleep(RESET_DELAY);
        Ok(())
    }

    fn quick_reset_pulse(&mut self) -> Result<()> {
        let fd = self.file.as_raw_fd();
        // SAFETY: fd is a valid open file descriptor owned by self.file
        unsafe { ioctl::c2_ioc_qreset(fd) }
            .map_err(|source| C2drvError::Ioctl { op: "qreset", source })?;
        Ok(())
    }

    fn address_read(&mut self) -> Result<u8> {
        let fd = self.file.as_raw_fd();
        let mut addr: u8 = 0;
        // SAFETY: fd is valid and addr is a valid u8 the driver writes to
        unsafe { ioctl::c2_ioc_aread(fd, &mut addr) }
            .map_err(|source| C2drvError::Ioctl { op: "address read", source })?;
        Ok(addr)
    }

    fn address_write(&mut self, addr: u8) -> Result<()> {
        let fd = self.file.as_raw_fd();
        // SAFETY: fd is valid and addr outlives the call
        unsafe { ioctl::c2_ioc_awrite(fd, &addr) }
            .map_err(|source| C2drvError::Ioctl { op: "address write", source })?;
        Ok(())
    }

    fn data_read(&mut self, buf: &mut [u8]) -> Result<()> {
        Self::single(buf.len())?;
        let fd = self.file.as_raw_fd();
        let mut value: nix::libc::c_ulong = 0;
        // SAFETY: fd is valid and value is a valid c_ulong the driver writes to
        unsafe { ioctl::c2_ioc_d1read(fd, &mut value) }
            .map_err(|source| C2drvError::Ioctl { op: "data read", source })?;
        buf[0] = value as u8;
        Ok(())
    }

    fn data_write(&mut self, data: &[u8]) -> Result<()> {
        Self::single(data.len())?;
        let fd = self.file.as_raw_fd();
        // SAFETY: fd is valid and data[0] outlives the call
        unsafe { ioctl::c2_ioc_d1write(fd, &data[0]) }
            .map_err(|source| C2drvError::Ioctl { op: "data write", source })?;
        Ok(())
    }
}

impl C2Bus for C2drv {
    fn reset(&mut self) -> CoreResult<()> {
        Ok(self.reset_pulse()?)
    }

    fn quick_reset(&mut self) -> CoreResult<()> {
        Ok(self.quick_reset_pulse()?)
    }

    fn read_address(&mut self) -> CoreResult<u8> {
        Ok(self.address_read()?)
    }

    fn write_address(&mut self, addr: u8) -> CoreResult<()> {
        Ok(self.address_write(addr)?)
    }

    fn read_data(&mut self, buf: &mut [u8]) -> CoreResult<()> {
        Ok(self.data_read(buf)?)
    }

    fn write_data(&mut self, data: &[u8]) -> CoreResult<()> {
        Ok(self.data_write(data)?)
    }
}
