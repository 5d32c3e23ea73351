//! Streaming Intel HEX loader

use super::record::{parse_record, FormatViolation, LineError, Record, MAX_LINE_LEN};
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Destination for decoded data records
///
/// The loader stays independent of the device: anything that can accept a
/// block of bytes at a 16-bit address can receive an image.
pub trait ImageSink {
    /// Store `data` starting at `addr`
    fn write_block(&mut self, addr: u16, data: &[u8]) -> Result<()>;
}

impl<S: ImageSink + ?Sized> ImageSink for &mut S {
    fn write_block(&mut self, addr: u16, data: &[u8]) -> Result<()> {
        (**self).write_block(addr, data)
    }
}

/// One decoded line of an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexLine {
    /// 1-based line number
    pub number: usize,
    /// Decoded record, or why the line was rejected
    pub record: core::result::Result<Record, LineError>,
}

/// Longest line buffered, including a CRLF line ending
const LINE_LIMIT: usize = MAX_LINE_LEN + 2;

/// Iterator over the lines of an image
///
/// Stops after the end-of-file record, at end of input, or after yielding
/// an I/O error. A line longer than [`MAX_LINE_LEN`] characters plus its line
/// ending is never buffered whole; it is rejected and skipped.
pub struct HexLines<R> {
    reader: R,
    buf: Vec<u8>,
    line: usize,
    done: bool,
}

impl<R: BufRead> HexLines<R> {
    /// Wrap a reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line: 0,
            done: false,
        }
    }

    /// Number of the line most recently read
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Read one line into `buf`, stopping after `LINE_LIMIT` bytes
    ///
    /// Returns `None` at end of input, otherwise whether the line was too
    /// long and has been skipped.
    fn read_line(&mut self) -> io::Result<Option<bool>> {
        self.buf.clear();
        let n = (&mut self.reader)
            .take(LINE_LIMIT as u64)
            .read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }

        let overlong = n == LINE_LIMIT && self.buf.last() != Some(&b'\n');
        if overlong {
            self.skip_rest_of_line()?;
        }
        Ok(Some(overlong))
    }

    fn skip_rest_of_line(&mut self) -> io::Result<()> {
        loop {
            let available = self.reader.fill_buf()?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.reader.consume(end + 1);
                    return Ok(());
                }
                None => {
                    let len = available.len();
                    self.reader.consume(len);
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for HexLines<R> {
    type Item = io::Result<HexLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.line += 1;
        match self.read_line() {
            Ok(None) => {
                self.done = true;
                None
            }
            Ok(Some(overlong)) => {
                let record = if overlong {
                    Err(LineError::Format(FormatViolation::TooLong))
                } else {
                    parse_record(&self.buf)
                };
                if record == Ok(Record::EndOfFile) {
                    self.done = true;
                }
                Some(Ok(HexLine {
                    number: self.line,
                    record,
                }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// What a successful load wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Data records written
    pub records: usize,
    /// Payload bytes written
    pub bytes: usize,
}

/// Stream an Intel HEX image into `sink`
///
/// Every valid data record is written as soon as it is decoded. Bad lines
/// are logged as `<source>:<line>: <reason>` and skipped; if there were any,
/// the load fails with [`Error::HexLoad`] after the whole image has been
/// processed. A failing sink or a read error aborts immediately.
pub fn load<R, S>(reader: R, source_name: &str, sink: &mut S) -> Result<LoadSummary>
where
    R: BufRead,
    S: ImageSink + ?Sized,
{
    let mut lines = HexLines::new(reader);
    let mut summary = LoadSummary::default();
    let mut errors = 0usize;

    while let Some(item) = lines.next() {
        let line = item.map_err(|source| Error::Read {
            source_name: source_name.to_string(),
            line: lines.line_number(),
            source,
        })?;

        match line.record {
            Ok(Record::Data { address, data }) => {
                log::trace!(
                    "{}:{}: {} bytes at 0x{:04x}",
                    source_name,
                    line.number,
                    data.len(),
                    address
                );
                sink.write_block(address, &data)?;
                summary.records += 1;
                summary.bytes += data.len();
            }
            Ok(Record::EndOfFile) => {
                log::debug!("{}:{}: end of file record", source_name, line.number);
            }
            Err(e) => {
                log::error!("{}:{}: {}", source_name, line.number, e);
                errors += 1;
            }
        }
    }

    if errors > 0 {
        return Err(Error::HexLoad {
            source_name: source_name.to_string(),
            errors,
        });
    }

    log::debug!(
        "{}: loaded {} records ({} bytes)",
        source_name,
        summary.records,
        summary.bytes
    );
    Ok(summary)
}

/// Open `path` and [`load`] it
pub fn load_file<S: ImageSink + ?Sized>(path: &Path, sink: &mut S) -> Result<LoadSummary> {
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    load(BufReader::new(file), &path.display().to_string(), sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ihex::format_data_record;
    use crate::ErrorKind;
    use std::io::{Cursor, Read};

    #[derive(Default)]
    struct VecSink {
        writes: Vec<(u16, Vec<u8>)>,
        fail_after: Option<usize>,
    }

    impl ImageSink for VecSink {
        fn write_block(&mut self, addr: u16, data: &[u8]) -> Result<()> {
            if self.fail_after == Some(self.writes.len()) {
                return Err(Error::transport("mock", "link lost"));
            }
            self.writes.push((addr, data.to_vec()));
            Ok(())
        }
    }

    fn image(lines: &[String]) -> Cursor<Vec<u8>> {
        Cursor::new(lines.join("\n").into_bytes())
    }

    fn data_line(addr: u16, fill: u8) -> String {
        format_data_record(addr, &[fill; 4])
    }

    const EOF: &str = ":00000001FF";

    #[test]
    fn test_load_valid_image() {
        let lines = [
            data_line(0x0000, 0x11),
            data_line(0x0004, 0x22),
            EOF.to_string(),
        ];
        let mut sink = VecSink::default();
        let summary = load(image(&lines), "fw.hex", &mut sink).unwrap();

        assert_eq!(summary, LoadSummary { records: 2, bytes: 8 });
        assert_eq!(
            sink.writes,
            vec![(0x0000, vec![0x11; 4]), (0x0004, vec![0x22; 4])]
        );
    }

    #[test]
    fn test_bad_lines_reported_good_lines_written() {
        let mut lines: Vec<String> = (0..8).map(|i| data_line(i * 0x10, i as u8)).collect();
        // Line 3: last checksum digit flipped
        let mut bad = lines[2].clone();
        let last = bad.pop().unwrap();
        bad.push(if last == '0' { '1' } else { '0' });
        lines[2] = bad;
        // Line 7: header not hexadecimal
        lines[6] = ":04XX600000000000".to_string();
        lines.push(EOF.to_string());

        let mut sink = VecSink::default();
        let err = load(image(&lines), "fw.hex", &mut sink).unwrap_err();

        match err {
            Error::HexLoad {
                ref source_name,
                errors,
            } => {
                assert_eq!(source_name, "fw.hex");
                assert_eq!(errors, 2);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(err.kind(), ErrorKind::ProtocolData);
        let written: Vec<u16> = sink.writes.iter().map(|(addr, _)| *addr).collect();
        assert_eq!(written, vec![0x00, 0x10, 0x30, 0x40, 0x50, 0x70]);
    }

    #[test]
    fn test_content_after_eof_ignored() {
        let lines = [
            data_line(0x0100, 0xAA),
            EOF.to_string(),
            "this is not a record".to_string(),
            data_line(0x0200, 0xBB),
        ];
        let mut sink = VecSink::default();
        let summary = load(image(&lines), "fw.hex", &mut sink).unwrap();

        assert_eq!(summary.records, 1);
        assert_eq!(sink.writes, vec![(0x0100, vec![0xAA; 4])]);
    }

    #[test]
    fn test_missing_eof_is_accepted() {
        let lines = [data_line(0x0000, 0x01)];
        let mut sink = VecSink::default();
        assert_eq!(
            load(image(&lines), "fw.hex", &mut sink).unwrap().records,
            1
        );
    }

    #[test]
    fn test_unknown_record_type_counted() {
        let lines = [
            ":020000040800F2".to_string(),
            data_line(0x0000, 0x01),
            EOF.to_string(),
        ];
        let mut sink = VecSink::default();
        let err = load(image(&lines), "fw.hex", &mut sink).unwrap_err();

        assert!(matches!(err, Error::HexLoad { errors: 1, .. }));
        assert_eq!(sink.writes.len(), 1);
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = format!("{}\r\n{}\r\n", data_line(0x0000, 0x5A), EOF);
        let mut sink = VecSink::default();
        load(Cursor::new(text.into_bytes()), "fw.hex", &mut sink).unwrap();
        assert_eq!(sink.writes, vec![(0x0000, vec![0x5A; 4])]);
    }

    #[test]
    fn test_sink_failure_aborts() {
        let lines = [
            data_line(0x0000, 0x01),
            data_line(0x0004, 0x02),
            data_line(0x0008, 0x03),
            EOF.to_string(),
        ];
        let mut sink = VecSink {
            fail_after: Some(1),
            ..Default::default()
        };
        let err = load(image(&lines), "fw.hex", &mut sink).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(sink.writes.len(), 1);
    }

    /// Yields its data, then fails every further read
    struct BrokenReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::Other, "device removed")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_read_error_reports_line() {
        let text = format!("{}\n", data_line(0x0000, 0x01));
        let reader = BufReader::new(BrokenReader {
            data: Cursor::new(text.into_bytes()),
        });
        let mut sink = VecSink::default();
        let err = load(reader, "fw.hex", &mut sink).unwrap_err();

        assert!(matches!(err, Error::Read { line: 2, .. }));
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(sink.writes.len(), 1);
    }

    #[test]
    fn test_load_file_missing() {
        let mut sink = VecSink::default();
        let err = load_file(Path::new("/nonexistent/fw.hex"), &mut sink).unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_record_past_end_of_space_skipped() {
        let lines = [
            format_data_record(0x0000, &[0x02, 0x00, 0x30]),
            format_data_record(0xFFFE, &[0x11, 0x22, 0x33, 0x44]),
            format_data_record(0x0030, &[0x80, 0xFE]),
            EOF.to_string(),
        ];
        let mut sink = VecSink::default();
        let err = load(image(&lines), "fw.hex", &mut sink).unwrap_err();

        assert!(matches!(err, Error::HexLoad { errors: 1, .. }));
        assert_eq!(
            sink.writes,
            vec![(0x0000, vec![0x02, 0x00, 0x30]), (0x0030, vec![0x80, 0xFE])]
        );
    }

    #[test]
    fn test_overlong_line_rejected_and_skipped() {
        let text = format!(
            "{}\n:{}\n{}\n{}\n",
            data_line(0x0000, 0x01),
            "0".repeat(100_000),
            data_line(0x0004, 0x02),
            EOF
        );
        let lines: Vec<HexLine> = HexLines::new(Cursor::new(text.into_bytes()))
            .collect::<io::Result<_>>()
            .unwrap();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1].record,
            Err(LineError::Format(FormatViolation::TooLong))
        );
        assert_eq!(lines[2].number, 3);
        assert!(matches!(lines[2].record, Ok(Record::Data { address: 0x0004, .. })));
    }

    #[test]
    fn test_longest_record_with_crlf_accepted() {
        let text = format!("{}\r\n{}\r\n", format_data_record(0x0100, &[0x5A; 255]), EOF);
        let mut sink = VecSink::default();
        let summary = load(Cursor::new(text.into_bytes()), "fw.hex", &mut sink).unwrap();
        assert_eq!(summary, LoadSummary { records: 1, bytes: 255 });
    }

    #[test]
    fn test_lines_stop_after_eof() {
        let text = format!("{}\n{}\n{}\n", data_line(0, 1), EOF, data_line(4, 2));
        let lines: Vec<HexLine> = HexLines::new(Cursor::new(text.into_bytes()))
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].number, 2);
        assert_eq!(lines[1].record, Ok(Record::EndOfFile));
    }
}
