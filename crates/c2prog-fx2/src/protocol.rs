//! C2 bridge firmware protocol
//!
//! Every request is one bulk OUT packet starting with a command byte. The
//! bridge answers each request with one bulk IN packet: a status byte,
//! followed by the data bytes of read commands.
//!
//! | Command        | Request               | Response          |
//! |----------------|-----------------------|-------------------|
//! | RESET          | `01`                  | `ss`              |
//! | QRESET         | `02`                  | `ss`              |
//! | ADDR_READ      | `03`                  | `ss aa`           |
//! | ADDR_WRITE     | `04 aa`               | `ss`              |
//! | DATA_READ      | `05 nn`               | `ss d0 .. dn-1`   |
//! | DATA_WRITE     | `06 nn d0 .. dn-1`    | `ss`              |

use crate::error::{Fx2Error, Result};

/// Cypress EZ-USB FX2 vendor ID
pub const FX2_USB_VENDOR: u16 = 0x04B4;
/// Cypress EZ-USB FX2 product ID
pub const FX2_USB_PRODUCT: u16 = 0x8613;

/// Interface claimed by the bridge firmware
pub const INTERFACE: u8 = 0;
/// Bulk OUT endpoint
pub const WRITE_EP: u8 = 0x01;
/// Bulk IN endpoint
pub const READ_EP: u8 = 0x81;

pub const CMD_RESET: u8 = 0x01;
pub const CMD_QRESET: u8 = 0x02;
pub const CMD_ADDR_READ: u8 = 0x03;
pub const CMD_ADDR_WRITE: u8 = 0x04;
pub const CMD_DATA_READ: u8 = 0x05;
pub const CMD_DATA_WRITE: u8 = 0x06;

/// Largest data transfer a single C2 data frame carries
pub const MAX_DATA_LEN: usize = 4;

pub const STATUS_OK: u8 = 0x00;
pub const STATUS_TIMEOUT: u8 = 0x01;
pub const STATUS_BAD_COMMAND: u8 = 0x02;

/// Build a DATA_READ request for `len` bytes (1..=4)
pub fn data_read_request(len: usize) -> Result<[u8; 2]> {
    check_data_len(len)?;
    Ok([CMD_DATA_READ, len as u8])
}

/// Build a DATA_WRITE request (1..=4 bytes)
pub fn data_write_request(data: &[u8]) -> Result<Vec<u8>> {
    check_data_len(data.len())?;
    let mut request = Vec::with_capacity(2 + data.len());
    request.push(CMD_DATA_WRITE);
    request.push(data.len() as u8);
    request.extend_from_slice(data);
    Ok(request)
}

fn check_data_len(len: usize) -> Result<()> {
    if len == 0 || len > MAX_DATA_LEN {
        return Err(Fx2Error::InvalidLength(len));
    }
    Ok(())
}

/// Check a response packet and return its payload
///
/// The payload must be exactly `expected` bytes long.
pub fn parse_response(response: &[u8], expected: usize) -> Result<&[u8]> {
    let (&status, payload) = response
        .split_first()
        .ok_or_else(|| Fx2Error::InvalidResponse("empty response".into()))?;

    match status {
        STATUS_OK => {}
        STATUS_TIMEOUT => return Err(Fx2Error::TargetTimeout),
        STATUS_BAD_COMMAND => return Err(Fx2Error::Rejected),
        other => {
            return Err(Fx2Error::InvalidResponse(format!(
                "unknown status 0x{:02x}",
                other
            )))
        }
    }

    if payload.len() != expected {
        return Err(Fx2Error::InvalidResponse(format!(
            "expected {} data bytes, got {}",
            expected,
            payload.len()
        )));
    }
    Ok(payload)
}
