//! Intel HEX record decoding
//!
//! A record line looks like `:LLAAAATT<data>CC`, all fields hexadecimal:
//! byte count `LL`, load address `AAAA`, record type `TT`, `LL` data bytes
//! and a checksum `CC` chosen so that all decoded bytes sum to zero mod 256.
//! Only data (`00`) and end-of-file (`01`) records are understood.

use core::fmt;
use thiserror::Error;

/// Largest payload a record can carry (two hex digit byte count)
pub const MAX_RECORD_DATA: usize = 255;

/// Longest well formed record line, without line ending
pub const MAX_LINE_LEN: usize = 1 + 2 * (1 + 2 + 1 + MAX_RECORD_DATA + 1);

/// Record payload buffer
pub type RecordData = heapless::Vec<u8, MAX_RECORD_DATA>;

/// Record type field of a data record
pub const TYPE_DATA: u8 = 0x00;
/// Record type field of the end-of-file record
pub const TYPE_EOF: u8 = 0x01;

/// A decoded record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Bytes to load at `address`
    Data {
        /// Load address
        address: u16,
        /// Payload
        data: RecordData,
    },
    /// End of the image; anything after it is ignored
    EndOfFile,
}

/// Which part of a line could not be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatViolation {
    /// Line does not start with `:`
    MissingStartCode,
    /// Byte count, address or type field is not hexadecimal
    Header,
    /// Fewer data bytes than the byte count announces
    Data,
    /// Checksum field missing or not hexadecimal
    Checksum,
    /// Line longer than any valid record
    TooLong,
}

impl fmt::Display for FormatViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStartCode => write!(f, "missing ':' start code"),
            Self::Header => write!(f, "malformed record header"),
            Self::Data => write!(f, "malformed or truncated data"),
            Self::Checksum => write!(f, "malformed checksum"),
            Self::TooLong => write!(f, "line longer than {} characters", MAX_LINE_LEN),
        }
    }
}

/// Why a single line was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LineError {
    /// Line is not a well formed record
    #[error("format violation: {0}")]
    Format(FormatViolation),
    /// Record decoded but its checksum is wrong
    #[error("checksum mismatch (expected 0x{expected:02x}, found 0x{found:02x})")]
    ChecksumMismatch {
        /// Checksum computed from the record contents
        expected: u8,
        /// Checksum stored in the line
        found: u8,
    },
    /// Record type other than data or end-of-file
    #[error("unknown record type {0:02x}")]
    UnknownType(u8),
    /// Data record runs past the end of the 64 KiB address space
    #[error("{len} bytes at 0x{address:04x} run past address 0xffff")]
    AddressOverflow {
        /// Load address
        address: u16,
        /// Payload length
        len: usize,
    },
}

/// Reads fixed-width hex byte pairs from a line
struct HexCursor<'a> {
    text: &'a [u8],
    pos: usize,
}

impl<'a> HexCursor<'a> {
    fn new(text: &'a [u8]) -> Self {
        Self { text, pos: 0 }
    }

    fn digit(&mut self) -> Option<u8> {
        let c = *self.text.get(self.pos)?;
        let value = (c as char).to_digit(16)?;
        self.pos += 1;
        Some(value as u8)
    }

    fn byte(&mut self) -> Option<u8> {
        let high = self.digit()?;
        let low = self.digit()?;
        Some(high << 4 | low)
    }
}

/// Checksum byte that makes a record sum to zero
pub fn record_checksum(byte_count: u8, address: u16, record_type: u8, data: &[u8]) -> u8 {
    let [addr_high, addr_low] = address.to_be_bytes();
    let sum = data
        .iter()
        .fold(byte_count.wrapping_add(addr_high), |acc, &b| acc.wrapping_add(b))
        .wrapping_add(addr_low)
        .wrapping_add(record_type);
    sum.wrapping_neg()
}

/// Decode one line
///
/// Content after the checksum field (line endings, trailing blanks) is
/// ignored. The end-of-file record is accepted without looking at anything
/// past its type field.
pub fn parse_record(line: &[u8]) -> Result<Record, LineError> {
    let body = line
        .strip_prefix(b":")
        .ok_or(LineError::Format(FormatViolation::MissingStartCode))?;
    let mut cursor = HexCursor::new(body);

    let header = (|| {
        let count = cursor.byte()?;
        let address = u16::from_be_bytes([cursor.byte()?, cursor.byte()?]);
        let record_type = cursor.byte()?;
        Some((count, address, record_type))
    })();
    let (count, address, record_type) =
        header.ok_or(LineError::Format(FormatViolation::Header))?;

    match record_type {
        TYPE_DATA => {
            let mut data = RecordData::new();
            for _ in 0..count {
                let byte = cursor
                    .byte()
                    .ok_or(LineError::Format(FormatViolation::Data))?;
                data.push(byte)
                    .map_err(|_| LineError::Format(FormatViolation::Data))?;
            }
            let found = cursor
                .byte()
                .ok_or(LineError::Format(FormatViolation::Checksum))?;

            let expected = record_checksum(count, address, record_type, &data);
            if expected != found {
                return Err(LineError::ChecksumMismatch { expected, found });
            }
            if usize::from(address) + data.len() > 0x10000 {
                return Err(LineError::AddressOverflow {
                    address,
                    len: data.len(),
                });
            }
            Ok(Record::Data { address, data })
        }
        TYPE_EOF => Ok(Record::EndOfFile),
        other => Err(LineError::UnknownType(other)),
    }
}

/// Encode a data record line (without line ending)
pub fn format_data_record(address: u16, data: &[u8]) -> String {
    let count = data.len().min(MAX_RECORD_DATA);
    let data = &data[..count];
    let mut line = format!(":{:02X}{:04X}{:02X}", count, address, TYPE_DATA);
    for byte in data {
        line.push_str(&format!("{:02X}", byte));
    }
    let checksum = record_checksum(count as u8, address, TYPE_DATA, data);
    line.push_str(&format!("{:02X}", checksum));
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_record() {
        let record = parse_record(b":0300300002337A1E\r\n").unwrap();
        match record {
            Record::Data { address, data } => {
                assert_eq!(address, 0x0030);
                assert_eq!(&data[..], &[0x02, 0x33, 0x7A]);
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_parse_lowercase() {
        assert!(matches!(
            parse_record(b":0300300002337a1e"),
            Ok(Record::Data { .. })
        ));
    }

    #[test]
    fn test_parse_eof() {
        assert_eq!(parse_record(b":00000001FF"), Ok(Record::EndOfFile));
    }

    #[test]
    fn test_missing_start_code() {
        assert_eq!(
            parse_record(b"0300300002337A1E"),
            Err(LineError::Format(FormatViolation::MissingStartCode))
        );
        assert_eq!(
            parse_record(b""),
            Err(LineError::Format(FormatViolation::MissingStartCode))
        );
    }

    #[test]
    fn test_bad_header() {
        assert_eq!(
            parse_record(b":03zz300002337A1E"),
            Err(LineError::Format(FormatViolation::Header))
        );
        assert_eq!(
            parse_record(b":0300"),
            Err(LineError::Format(FormatViolation::Header))
        );
    }

    #[test]
    fn test_truncated_data() {
        assert_eq!(
            parse_record(b":040030000233\n"),
            Err(LineError::Format(FormatViolation::Data))
        );
    }

    #[test]
    fn test_missing_checksum() {
        assert_eq!(
            parse_record(b":0300300002337A"),
            Err(LineError::Format(FormatViolation::Checksum))
        );
    }

    #[test]
    fn test_checksum_mismatch_reports_values() {
        assert_eq!(
            parse_record(b":0300300002337A1F"),
            Err(LineError::ChecksumMismatch {
                expected: 0x1E,
                found: 0x1F
            })
        );
    }

    #[test]
    fn test_unknown_type() {
        // Extended linear address records are not supported
        assert_eq!(
            parse_record(b":020000040800F2"),
            Err(LineError::UnknownType(0x04))
        );
    }

    #[test]
    fn test_full_length_record() {
        let data: Vec<u8> = (0..=254u8).collect();
        let line = format_data_record(0x1000, &data);
        match parse_record(line.as_bytes()).unwrap() {
            Record::Data { address, data: parsed } => {
                assert_eq!(address, 0x1000);
                assert_eq!(parsed.len(), MAX_RECORD_DATA);
                assert_eq!(&parsed[..], &data[..]);
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_record_past_end_of_space() {
        let line = format_data_record(0xFFFE, &[0x11, 0x22, 0x33, 0x44]);
        assert_eq!(
            parse_record(line.as_bytes()),
            Err(LineError::AddressOverflow {
                address: 0xFFFE,
                len: 4
            })
        );

        // Ending exactly at 0xFFFF is fine
        let line = format_data_record(0xFFFE, &[0x11, 0x22]);
        assert!(matches!(
            parse_record(line.as_bytes()),
            Ok(Record::Data { address: 0xFFFE, .. })
        ));
    }

    #[test]
    fn test_max_line_len_fits_full_record() {
        let line = format_data_record(0x0000, &[0xA5; MAX_RECORD_DATA]);
        assert_eq!(line.len(), MAX_LINE_LEN);
    }

    #[test]
    fn test_valid_records_sum_to_zero() {
        for (address, data) in [
            (0x0000u16, vec![]),
            (0xFFFF, vec![0xFF; 16]),
            (0x1234, vec![0x00, 0x80, 0x7F]),
        ] {
            let count = data.len() as u8;
            let checksum = record_checksum(count, address, TYPE_DATA, &data);
            let [hi, lo] = address.to_be_bytes();
            let sum = data
                .iter()
                .fold(count as u32 + hi as u32 + lo as u32 + checksum as u32, |acc, &b| {
                    acc + b as u32
                });
            assert_eq!(sum % 256, 0);
        }
    }

    #[test]
    fn test_any_single_byte_corruption_detected() {
        let line = format_data_record(0x2040, &[0xDE, 0xAD, 0xBE, 0xEF]);
        // Decoded bytes after the type field: address (2), data (4), checksum (1)
        let positions = [3usize, 5, 9, 11, 13, 15, 17];
        for pos in positions {
            let mut corrupted = line.clone().into_bytes();
            let field = std::str::from_utf8(&corrupted[pos..pos + 2]).unwrap();
            let value = u8::from_str_radix(field, 16).unwrap().wrapping_add(1);
            corrupted[pos..pos + 2].copy_from_slice(format!("{:02X}", value).as_bytes());
            assert!(
                matches!(
                    parse_record(&corrupted),
                    Err(LineError::ChecksumMismatch { .. })
                ),
                "corruption at {} not detected",
                pos
            );
        }
    }
}
