//! Intel HEX image loading
//!
//! [`parse_record`] decodes a single line. [`load`] walks a whole image,
//! writes every valid data record to an [`ImageSink`] and keeps going past
//! bad lines so that all of them get reported in one pass.

mod loader;
mod record;

pub use loader::{load, load_file, HexLine, HexLines, ImageSink, LoadSummary};
pub use record::{
    format_data_record, parse_record, record_checksum, FormatViolation, LineError, Record,
    RecordData, MAX_LINE_LEN, MAX_RECORD_DATA, TYPE_DATA, TYPE_EOF,
};
