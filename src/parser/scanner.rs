//! Byte oriented, buffered line scanning
use std::io::{ErrorKind, Read};

use crate::DEFAULT_CHUNK_SIZE;

/// Reads a byte stream in chunks and hands every line to a callback
///
/// The callback receives the line without the terminating `\n` and returns
/// whether scanning should continue. When it returns `false`, scanning
/// stops immediately and all bytes that were read but not yet handed out
/// stay available through [`LineScanner::available_buffer`].
///
/// Bytes passed to [`LineScanner::push`] are replayed before any further
/// data is read from the underlying reader. This allows to stop at some
/// line, do something else, and continue with a new scanner on the same
/// reader without losing data:
///
/// ```
/// use hpo_assoc::parser::scanner::LineScanner;
///
/// let data = "#header\nfirst\nsecond\nthird";
/// let mut scanner = LineScanner::with_chunk_size(data.as_bytes(), 4);
///
/// // stop at the first line that is not a comment
/// let mut first = Vec::new();
/// scanner.scan(|line| {
///     if line.starts_with(b"#") {
///         return true;
///     }
///     first = line.to_vec();
///     false
/// }).unwrap();
/// assert_eq!(first, b"first");
///
/// // continue with the rest of the data
/// let (reader, rest) = scanner.into_parts();
/// let mut scanner = LineScanner::new(reader);
/// scanner.push(&rest);
///
/// let mut lines = Vec::new();
/// scanner.scan(|line| {
///     lines.push(String::from_utf8(line.to_vec()).unwrap());
///     true
/// }).unwrap();
/// assert_eq!(lines, vec!["second", "third"]);
/// ```
#[derive(Debug)]
pub struct LineScanner<R> {
    reader: R,
    chunk_size: usize,
    buffer: Vec<u8>,
    start: usize,
    end: usize,
    pushback: Vec<u8>,
    pushback_pos: usize,
    eof: bool,
}

impl<R: Read> LineScanner<R> {
    /// Constructs a new [`LineScanner`] with the default chunk size
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Constructs a new [`LineScanner`] that reads `chunk_size` bytes at once
    ///
    /// A `chunk_size` of `0` is treated as `1`. Lines longer than the chunk
    /// size are supported, the buffer grows as needed.
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            reader,
            chunk_size,
            buffer: vec![0; 2 * chunk_size],
            start: 0,
            end: 0,
            pushback: Vec::new(),
            pushback_pos: 0,
            eof: false,
        }
    }

    /// Adds `bytes` to be scanned before reading more data from the reader
    ///
    /// The bytes are scanned after the data that is already buffered.
    pub fn push(&mut self, bytes: &[u8]) {
        self.pushback.extend_from_slice(bytes);
        self.eof = false;
    }

    /// Scans all lines and calls `on_line` for every single one
    ///
    /// A final line without a trailing `\n` is passed to `on_line` once the
    /// end of the input is reached. Calling `scan` again after it was
    /// stopped by the callback continues with the next line.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error of the underlying reader. There are no
    /// retries, except for [`ErrorKind::Interrupted`].
    pub fn scan<F>(&mut self, mut on_line: F) -> std::io::Result<()>
    where
        F: FnMut(&[u8]) -> bool,
    {
        // the number of bytes after `start` that are known to contain no line break
        let mut searched = 0;
        loop {
            while let Some(offset) = self.buffer[self.start + searched..self.end]
                .iter()
                .position(|b| *b == b'\n')
            {
                let line_start = self.start;
                let line_end = self.start + searched + offset;
                self.start = line_end + 1;
                searched = 0;
                if !on_line(&self.buffer[line_start..line_end]) {
                    return Ok(());
                }
            }
            searched = self.end - self.start;

            if self.eof || self.fill()? == 0 {
                self.eof = true;
                if self.start < self.end {
                    let line_start = self.start;
                    self.start = self.end;
                    on_line(&self.buffer[line_start..self.end]);
                }
                return Ok(());
            }
        }
    }

    /// Reads the next chunk into the buffer and returns the number of new bytes
    ///
    /// Returns `0` only at the end of the input.
    fn fill(&mut self) -> std::io::Result<usize> {
        if self.start > 0 {
            self.buffer.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        if self.buffer.len() < self.end + self.chunk_size {
            self.buffer.resize(self.end + self.chunk_size, 0);
        }
        let target = &mut self.buffer[self.end..self.end + self.chunk_size];

        let n = if self.pushback_pos < self.pushback.len() {
            let replay = &self.pushback[self.pushback_pos..];
            let n = replay.len().min(target.len());
            target[..n].copy_from_slice(&replay[..n]);
            self.pushback_pos += n;
            if self.pushback_pos == self.pushback.len() {
                self.pushback.clear();
                self.pushback_pos = 0;
            }
            n
        } else {
            loop {
                match self.reader.read(target) {
                    Ok(n) => break n,
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(err) => return Err(err),
                }
            }
        };

        self.end += n;
        Ok(n)
    }

    /// The bytes that were read but not yet handed to the callback
    ///
    /// This does not include data passed to [`LineScanner::push`] that was
    /// not yet moved into the buffer.
    pub fn available_buffer(&self) -> &[u8] {
        &self.buffer[self.start..self.end]
    }

    /// Returns `true` once the end of the input was reached
    pub fn is_finished(&self) -> bool {
        self.eof && self.start == self.end
    }

    /// Returns the reader and all bytes that were not yet scanned
    ///
    /// The returned bytes contain the buffered data followed by the
    /// pushed-back data that was not yet replayed.
    pub fn into_parts(self) -> (R, Vec<u8>) {
        let mut rest = self.buffer[self.start..self.end].to_vec();
        rest.extend_from_slice(&self.pushback[self.pushback_pos..]);
        (self.reader, rest)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn collect<R: Read>(scanner: &mut LineScanner<R>) -> Vec<String> {
        let mut lines = Vec::new();
        scanner
            .scan(|line| {
                lines.push(String::from_utf8(line.to_vec()).unwrap());
                true
            })
            .expect("reading from memory never fails");
        lines
    }

    #[test]
    fn all_lines() {
        for chunk_size in [1, 2, 3, 7, 1024] {
            let mut scanner = LineScanner::with_chunk_size("a\nbb\n\nccc\n".as_bytes(), chunk_size);
            assert_eq!(collect(&mut scanner), vec!["a", "bb", "", "ccc"]);
            assert!(scanner.is_finished());
        }
    }

    #[test]
    fn final_line_without_newline() {
        for chunk_size in [1, 4, 1024] {
            let mut scanner = LineScanner::with_chunk_size("a\nlast".as_bytes(), chunk_size);
            assert_eq!(collect(&mut scanner), vec!["a", "last"]);
            // the partial line is only flushed once
            assert!(collect(&mut scanner).is_empty());
        }
    }

    #[test]
    fn empty_input() {
        let mut scanner = LineScanner::new("".as_bytes());
        assert!(collect(&mut scanner).is_empty());
        assert!(scanner.available_buffer().is_empty());
    }

    #[test]
    fn long_lines() {
        let long = "x".repeat(100);
        let data = format!("{long}\n{long}{long}\nshort");
        let mut scanner = LineScanner::with_chunk_size(data.as_bytes(), 8);
        let lines = collect(&mut scanner);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 100);
        assert_eq!(lines[1].len(), 200);
        assert_eq!(lines[2], "short");
    }

    #[test]
    fn stop_and_continue() {
        let mut scanner = LineScanner::with_chunk_size("1\n2\n3\n4\n".as_bytes(), 3);
        let mut seen = Vec::new();
        scanner
            .scan(|line| {
                seen.push(line.to_vec());
                line != b"2"
            })
            .unwrap();
        assert_eq!(seen, vec![b"1".to_vec(), b"2".to_vec()]);
        assert!(scanner.available_buffer().starts_with(b"3"));

        assert_eq!(collect(&mut scanner), vec!["3", "4"]);
    }

    #[test]
    fn pushback_is_replayed_first() {
        let mut scanner = LineScanner::with_chunk_size("c\nd\n".as_bytes(), 2);
        scanner.push(b"a\nb");
        scanner.push(b"b\n");
        assert_eq!(collect(&mut scanner), vec!["a", "bb", "c", "d"]);
    }

    #[test]
    fn into_parts_keeps_unscanned_bytes() {
        let mut scanner = LineScanner::with_chunk_size(Cursor::new(b"#a\nb\nc\nd".to_vec()), 4);
        scanner.scan(|line| line.starts_with(b"#")).unwrap();
        let (mut reader, mut rest) = scanner.into_parts();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"c\nd");
    }

    #[test]
    fn into_parts_includes_pending_pushback() {
        let mut scanner = LineScanner::with_chunk_size("".as_bytes(), 2);
        scanner.push(b"ab\ncdef\n");
        scanner.scan(|_| false).unwrap();
        let (_, rest) = scanner.into_parts();
        assert_eq!(rest, b"cdef\n");
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::Other, "broken pipe"))
        }
    }

    #[test]
    fn io_errors_are_returned() {
        let mut scanner = LineScanner::new(FailingReader);
        assert!(scanner.scan(|_| true).is_err());
    }
}
