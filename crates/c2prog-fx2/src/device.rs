//! FX2 C2 bridge device implementation
//!
//! This module provides the `Fx2` struct that talks to the bridge firmware
//! over two bulk endpoints and implements the `C2Bus` trait.

use std::fmt;
use std::time::Duration;

use c2prog_core::bus::C2Bus;
use c2prog_core::error::Result as CoreResult;
use nusb::transfer::{Buffer, Bulk, In, Out};
use nusb::{Endpoint, MaybeFuture};

use crate::error::{Fx2Error, Result};
use crate::protocol::*;

/// Timeout for a single bulk transfer
const USB_TIMEOUT: Duration = Duration::from_secs(5);

/// USB bus and device number of a bridge, as shown by `lsusb`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbLocation {
    /// USB bus number
    pub bus: u8,
    /// USB device address
    pub address: u8,
}

impl UsbLocation {
    /// Parse a `BBB/DDD` location (exactly three decimal digits each)
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = || Fx2Error::InvalidLocation(path.to_string());

        let (bus, address) = path.split_once('/').ok_or_else(invalid)?;
        let field = |s: &str| -> Result<u8> {
            if s.len() != 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            s.parse().map_err(|_| invalid())
        };

        Ok(Self {
            bus: field(bus)?,
            address: field(address)?,
        })
    }
}

impl fmt::Display for UsbLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}/{:03}", self.bus, self.address)
    }
}

/// FX2 C2 bridge
///
/// All methods are synchronous and block until the bridge has answered.
pub struct Fx2 {
    /// Bulk OUT endpoint for requests
    out_ep: Endpoint<Bulk, Out>,
    /// Bulk IN endpoint for responses
    in_ep: Endpoint<Bulk, In>,
}

impl Fx2 {
    /// Open a bridge
    ///
    /// Without a location the first FX2 (VID:04b4 PID:8613) found is used.
    pub fn open(location: Option<UsbLocation>) -> Result<Self> {
        let mut devices = nusb::list_devices()
            .wait()
            .map_err(|e| Fx2Error::OpenFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == FX2_USB_VENDOR && d.product_id() == FX2_USB_PRODUCT);

        let device_info = match location {
            Some(loc) => devices
                .find(|d| d.busnum() == loc.bus && d.device_address() == loc.address)
                .ok_or(Fx2Error::NotFoundAt(loc))?,
            None => devices.next().ok_or(Fx2Error::DeviceNotFound)?,
        };

        log::info!(
            "Opening FX2 bridge at bus {:03} device {:03}",
            device_info.busnum(),
            device_info.device_address()
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| Fx2Error::OpenFailed(e.to_string()))?;

        let interface = device
            .claim_interface(INTERFACE)
            .wait()
            .map_err(|e| Fx2Error::ClaimFailed(e.to_string()))?;

        let out_ep = interface
            .endpoint::<Bulk, Out>(WRITE_EP)
            .map_err(|e| Fx2Error::ClaimFailed(e.to_string()))?;
        let in_ep = interface
            .endpoint::<Bulk, In>(READ_EP)
            .map_err(|e| Fx2Error::ClaimFailed(e.to_string()))?;

        Ok(Self { out_ep, in_ep })
    }

    /// Send one request and return the payload of its response
    fn transaction(&mut self, request: &[u8], reply_len: usize) -> Result<Vec<u8>> {
        self.usb_write(request)?;
        let response = self.usb_read()?;
        let payload = parse_response(&response, reply_len)?;
        Ok(payload.to_vec())
    }

    fn usb_write(&mut self, data: &[u8]) -> Result<()> {
        self.out_ep.submit(Buffer::from(data.to_vec()));

        let Some(completion) = self.out_ep.wait_next_complete(USB_TIMEOUT) else {
            self.drain_all_pending();
            return Err(Fx2Error::Timeout);
        };
        completion
            .status
            .map_err(|e| Fx2Error::TransferFailed(e.to_string()))?;

        log::trace!("USB write {:02x?}", data);
        Ok(())
    }

    fn usb_read(&mut self) -> Result<Vec<u8>> {
        let len = self.in_ep.max_packet_size();
        let mut buf = Buffer::new(len);
        buf.set_requested_len(len);
        self.in_ep.submit(buf);

        let Some(completion) = self.in_ep.wait_next_complete(USB_TIMEOUT) else {
            self.drain_all_pending();
            return Err(Fx2Error::Timeout);
        };
        completion
            .status
            .map_err(|e| Fx2Error::TransferFailed(e.to_string()))?;

        let data = completion.buffer[..completion.actual_len].to_vec();
        log::trace!("USB read {:02x?}", data);
        Ok(data)
    }

    /// Cancel and drain all pending transfers on both endpoints
    fn drain_all_pending(&mut self) {
        self.out_ep.cancel_all();
        while self.out_ep.pending() > 0 {
            let _ = self.out_ep.wait_next_complete(Duration::from_millis(100));
        }
        self.in_ep.cancel_all();
        while self.in_ep.pending() > 0 {
            let _ = self.in_ep.wait_next_complete(Duration::from_millis(100));
        }
    }
}

impl Drop for Fx2 {
    fn drop(&mut self) {
        self.drain_all_pending();
    }
}

impl C2Bus for Fx2 {
    fn reset(&mut self) -> CoreResult<()> {
        self.transaction(&[CMD_RESET], 0)?;
        Ok(())
    }

    fn quick_reset(&mut self) -> CoreResult<()> {
        self.transaction(&[CMD_QRESET], 0)?;
        Ok(())
    }

    fn read_address(&mut self) -> CoreResult<u8> {
        let reply = self.transaction(&[CMD_ADDR_READ], 1)?;
        Ok(reply[0])
    }

    fn write_address(&mut self, addr: u8) -> CoreResult<()> {
        self.transaction(&[CMD_ADDR_WRITE, addr], 0)?;
        Ok(())
    }

    fn read_data(&mut self, buf: &mut [u8]) -> CoreResult<()> {
        for chunk in buf.chunks_mut(MAX_DATA_LEN) {
            let request = data_read_request(chunk.len())?;
            let reply = self.transaction(&request, chunk.len())?;
            chunk.copy_from_slice(&reply);
        }
        Ok(())
    }

    fn write_data(&mut self, data: &[u8]) -> CoreResult<()> {
        for chunk in data.chunks(MAX_DATA_LEN) {
            let request = data_write_request(chunk)?;
            self.transaction(&request, 0)?;
        }
        Ok(())
    }
}
