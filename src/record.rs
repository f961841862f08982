use std::io::{self, Read};

use memchr::memchr2;
use tracing::trace;

use crate::config::StreamConfig;
use crate::error::StreamError;

/// Longest boundary is `\r\n\r\n`; this many already-scanned bytes must be
/// re-examined after a read in case a boundary straddles it.
const BOUNDARY_OVERLAP: usize = 3;

/// Returns the byte range of the leftmost record boundary in `buf`.
pub(crate) fn find_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    let mut offset = 0;
    while let Some(pos) = memchr2(b'\r', b'\n', &buf[offset..]) {
        let i = offset + pos;
        match &buf[i..] {
            [b'\r', b'\n', b'\r', b'\n', ..] => return Some((i, i + 4)),
            [b'\r', b'\r', ..] | [b'\n', b'\n', ..] => return Some((i, i + 2)),
            _ => offset = i + 1,
        }
    }
    None
}

fn trim_line_endings(buf: &[u8]) -> &[u8] {
    let end = buf
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(0, |pos| pos + 1);
    &buf[..end]
}

/// Splits a byte source into blank-line separated records.
///
/// Records borrow from the internal buffer and stay valid until the next
/// call to [`next_record`](Self::next_record).
pub struct RecordReader<R> {
    reader: Option<R>,
    buf: Vec<u8>,
    start: usize,
    scanned: usize,
    pending_consume: usize,
    chunk_size: usize,
    max_record_len: Option<usize>,
    eof: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(&StreamConfig::default(), reader)
    }

    pub fn with_config(config: &StreamConfig, reader: R) -> Self {
        let chunk_size = config.read_chunk_size.max(1);
        Self {
            reader: Some(reader),
            buf: Vec::with_capacity(chunk_size),
            start: 0,
            scanned: 0,
            pending_consume: 0,
            chunk_size,
            max_record_len: config.max_record_len,
            eof: false,
        }
    }

    /// Returns the next record, or `None` once the source is exhausted.
    pub fn next_record(&mut self) -> Result<Option<&[u8]>, StreamError> {
        if self.pending_consume > 0 {
            self.start += self.pending_consume;
            self.pending_consume = 0;
        }

        loop {
            let unconsumed = &self.buf[self.start..];
            let from = self
                .scanned
                .saturating_sub(BOUNDARY_OVERLAP)
                .min(unconsumed.len());

            if let Some((begin, end)) = find_boundary(&unconsumed[from..]) {
                let (begin, end) = (from + begin, from + end);
                self.scanned = 0;
                self.pending_consume = end;
                trace!(len = begin, "record boundary found");
                return Ok(Some(&self.buf[self.start..self.start + begin]));
            }

            let available = unconsumed.len();
            // A trailing CR/LF run may be the first half of a boundary.
            let len = trim_line_endings(unconsumed).len();
            self.scanned = available;

            if let Some(limit) = self.max_record_len {
                if len > limit {
                    return Err(StreamError::RecordTooLarge { limit });
                }
            }

            if self.eof {
                if available == 0 {
                    return Ok(None);
                }
                self.scanned = 0;
                self.pending_consume = available;
                trace!(len, "final record at end of stream");
                return Ok(Some(&self.buf[self.start..self.start + len]));
            }

            self.fill()?;
        }
    }

    fn fill(&mut self) -> Result<(), StreamError> {
        if self.start > 0 {
            self.buf.drain(..self.start);
            self.start = 0;
        }

        let Some(reader) = self.reader.as_mut() else {
            self.eof = true;
            return Ok(());
        };

        let len = self.buf.len();
        self.buf.resize(len + self.chunk_size, 0);
        loop {
            match reader.read(&mut self.buf[len..]) {
                Ok(n) => {
                    self.buf.truncate(len + n);
                    if n == 0 {
                        self.eof = true;
                    }
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buf.truncate(len);
                    return Err(e.into());
                }
            }
        }
    }

    /// Drops the source and any buffered bytes. Later calls report end of stream.
    pub fn close(&mut self) {
        self.reader = None;
        self.buf = Vec::new();
        self.start = 0;
        self.scanned = 0;
        self.pending_consume = 0;
        self.eof = true;
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    /// Returns the source, unless the reader was closed. Buffered bytes are lost.
    pub fn into_inner(self) -> Option<R> {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect<R: Read>(mut reader: RecordReader<R>) -> Vec<Vec<u8>> {
        let mut records = Vec::new();
        while let Some(record) = reader.next_record().unwrap() {
            records.push(record.to_vec());
        }
        records
    }

    fn small_chunks(data: &'static [u8], chunk: usize) -> RecordReader<Cursor<&'static [u8]>> {
        let config = StreamConfig::new().with_read_chunk_size(chunk);
        RecordReader::with_config(&config, Cursor::new(data))
    }

    #[test]
    fn test_find_boundary_leftmost() {
        assert_eq!(find_boundary(b"a\n\nb\r\rc"), Some((1, 3)));
        assert_eq!(find_boundary(b"a\r\n\r\nb"), Some((1, 5)));
        assert_eq!(find_boundary(b"a\r\rb\n\n"), Some((1, 3)));
        assert_eq!(find_boundary(b"a\r\nb\nc\r"), None);
        assert_eq!(find_boundary(b"a\r\n\r"), None);
        assert_eq!(find_boundary(b""), None);
    }

    #[test]
    fn test_mixed_line_endings_are_not_boundaries() {
        assert_eq!(find_boundary(b"a\n\r\nb"), None);
        assert_eq!(find_boundary(b"a\r\n\rb"), None);
        // `\r\n` followed by `\r\r`: the bare pair wins.
        assert_eq!(find_boundary(b"a\r\n\r\rb"), Some((3, 5)));
    }

    #[test]
    fn test_records_split_on_blank_lines() {
        let records = collect(RecordReader::new(Cursor::new(&b"a:1\n\nb:2\n\n"[..])));
        assert_eq!(records, vec![b"a:1".to_vec(), b"b:2".to_vec()]);
    }

    #[test]
    fn test_trailing_record_is_trimmed() {
        let records = collect(RecordReader::new(Cursor::new(&b"a:1\n\nb:2\r\n"[..])));
        assert_eq!(records, vec![b"a:1".to_vec(), b"b:2".to_vec()]);
    }

    #[test]
    fn test_no_boundary_yields_single_record() {
        let records = collect(RecordReader::new(Cursor::new(&b"data:x\ndata:y"[..])));
        assert_eq!(records, vec![b"data:x\ndata:y".to_vec()]);
    }

    #[test]
    fn test_end_of_stream_after_unterminated_record() {
        let mut reader = RecordReader::new(Cursor::new(&b"data:only"[..]));
        assert_eq!(reader.next_record().unwrap(), Some(&b"data:only"[..]));
        assert!(reader.next_record().unwrap().is_none());
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_end_of_stream_after_trimmed_record_in_small_reads() {
        let mut reader = small_chunks(b"id:1

id:22
", 3);
        assert_eq!(reader.next_record().unwrap(), Some(&b"id:1"[..]));
        assert_eq!(reader.next_record().unwrap(), Some(&b"id:22"[..]));
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_record_at_limit_with_split_boundary() {
        let config = StreamConfig::new()
            .with_read_chunk_size(9)
            .with_max_record_len(Some(8));
        let mut reader =
            RecordReader::with_config(&config, Cursor::new(&b"data:abc

id:1"[..]));
        assert_eq!(reader.next_record().unwrap(), Some(&b"data:abc"[..]));
        assert_eq!(reader.next_record().unwrap(), Some(&b"id:1"[..]));
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_empty_source() {
        let mut reader = RecordReader::new(Cursor::new(&b""[..]));
        assert!(reader.next_record().unwrap().is_none());
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_blank_record() {
        let records = collect(RecordReader::new(Cursor::new(&b"\n\n"[..])));
        assert_eq!(records, vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_lone_line_ending_at_eof() {
        let records = collect(RecordReader::new(Cursor::new(&b"\r\n"[..])));
        assert_eq!(records, vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_boundary_straddling_reads() {
        for chunk in 1..8 {
            let records = collect(small_chunks(b"id:1\r\n\r\nid:2\r\n\r\n", chunk));
            assert_eq!(records, vec![b"id:1".to_vec(), b"id:2".to_vec()], "chunk={chunk}");
        }
    }

    #[test]
    fn test_record_too_large() {
        let config = StreamConfig::new()
            .with_read_chunk_size(4)
            .with_max_record_len(Some(8));
        let mut reader = RecordReader::with_config(&config, Cursor::new(&b"data:0123456789\n\n"[..]));
        assert!(matches!(
            reader.next_record(),
            Err(StreamError::RecordTooLarge { limit: 8 })
        ));
    }

    #[test]
    fn test_close_ends_stream() {
        let mut reader = RecordReader::new(Cursor::new(&b"a:1\n\nb:2\n\n"[..]));
        assert_eq!(reader.next_record().unwrap(), Some(&b"a:1"[..]));
        reader.close();
        assert!(reader.is_closed());
        assert!(reader.next_record().unwrap().is_none());
        reader.close();
        assert!(reader.into_inner().is_none());
    }
}
