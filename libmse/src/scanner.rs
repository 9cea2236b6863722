//! Line scanner.
//!
//! Reads one logical line at a time off a byte stream: eats a UTF-8 byte
//! order mark once at stream start, treats `\n`, `\r`, and `\r\n` as a
//! single terminator, and decodes each line as UTF-8. Bytes accumulate in a
//! reusable buffer with inline storage, so lines of ordinary length never
//! touch the heap; longer lines grow geometrically.

use std::io::BufRead;

use smallvec::SmallVec;

use crate::error::{ParseError, Result};

/// Inline capacity of the line buffer; lines longer than this spill over.
const INLINE_LINE_LEN: usize = 1024;

pub(crate) struct LineScanner<R> {
    input: R,
    /// Set once the byte source is exhausted, including on the read that
    /// consumes a final line with no terminator.
    eof: bool,
    buf: SmallVec<[u8; INLINE_LINE_LEN]>,
}

impl<R: BufRead> LineScanner<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            eof: false,
            buf: SmallVec::new(),
        }
    }

    /// Whether the byte source is known to be exhausted.
    pub fn at_eof(&self) -> bool {
        self.eof
    }

    /// Consume a UTF-8 byte order mark if the stream starts with one.
    ///
    /// A partial prefix match is left in place. Only meaningful before the
    /// first `next_line` call.
    pub fn eat_bom(&mut self) -> Result<bool> {
        let buf = self.input.fill_buf()?;
        if buf.starts_with(&[0xEF, 0xBB, 0xBF]) {
            self.input.consume(3);
            return Ok(true);
        }
        Ok(false)
    }

    /// Read the next logical line, or `None` at end of stream.
    ///
    /// `line_number` is used only in the invalid-UTF-8 error message.
    pub fn next_line(&mut self, line_number: u64) -> Result<Option<String>> {
        if self.eof {
            return Ok(None);
        }
        self.buf.clear();
        let terminator = loop {
            let chunk = self.input.fill_buf()?;
            if chunk.is_empty() {
                self.eof = true;
                if self.buf.is_empty() {
                    return Ok(None);
                }
                break None;
            }
            match chunk.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(pos) => {
                    let term = chunk[pos];
                    self.buf.extend_from_slice(&chunk[..pos]);
                    self.input.consume(pos + 1);
                    break Some(term);
                }
                None => {
                    let len = chunk.len();
                    self.buf.extend_from_slice(chunk);
                    self.input.consume(len);
                }
            }
        };
        if terminator == Some(b'\r') {
            // \r\n is one terminator; a lone \r must not swallow what follows
            let next = self.input.fill_buf()?;
            if next.is_empty() {
                self.eof = true;
            } else if next[0] == b'\n' {
                self.input.consume(1);
            }
        }
        match std::str::from_utf8(&self.buf) {
            Ok(text) => Ok(Some(text.to_owned())),
            Err(_) => Err(ParseError::InvalidUtf8(line_number)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scan_all(bytes: &[u8]) -> Vec<String> {
        let mut scanner = LineScanner::new(Cursor::new(bytes));
        scanner.eat_bom().unwrap();
        let mut lines = Vec::new();
        let mut n = 0;
        while let Some(line) = scanner.next_line(n).unwrap() {
            n += 1;
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_terminators() {
        assert_eq!(scan_all(b"a\nb\r\nc\rd"), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_empty_lines() {
        assert_eq!(scan_all(b"a\n\nb\n"), ["a", "", "b"]);
    }

    #[test]
    fn test_trailing_cr() {
        assert_eq!(scan_all(b"a\r"), ["a"]);
    }

    #[test]
    fn test_bom_eaten_once() {
        assert_eq!(scan_all(b"\xEF\xBB\xBFkey"), ["key"]);
    }

    #[test]
    fn test_no_bom() {
        let mut scanner = LineScanner::new(Cursor::new(&b"key"[..]));
        assert!(!scanner.eat_bom().unwrap());
        assert_eq!(scanner.next_line(1).unwrap().unwrap(), "key");
    }

    #[test]
    fn test_eof_flag_on_unterminated_line() {
        let mut scanner = LineScanner::new(Cursor::new(&b"last"[..]));
        assert!(!scanner.at_eof());
        assert_eq!(scanner.next_line(1).unwrap().unwrap(), "last");
        assert!(scanner.at_eof());
    }

    #[test]
    fn test_eof_flag_after_terminated_line() {
        let mut scanner = LineScanner::new(Cursor::new(&b"last\n"[..]));
        assert_eq!(scanner.next_line(1).unwrap().unwrap(), "last");
        assert!(!scanner.at_eof());
        assert_eq!(scanner.next_line(2).unwrap(), None);
        assert!(scanner.at_eof());
    }

    #[test]
    fn test_long_line_growth() {
        let long = "x".repeat(INLINE_LINE_LEN * 3);
        let bytes = format!("{long}\nshort\n");
        assert_eq!(scan_all(bytes.as_bytes()), [long.as_str(), "short"]);
    }

    #[test]
    fn test_invalid_utf8() {
        let mut scanner = LineScanner::new(Cursor::new(&b"ok\n\xFF\xFE\n"[..]));
        assert_eq!(scanner.next_line(1).unwrap().unwrap(), "ok");
        assert!(matches!(
            scanner.next_line(2),
            Err(ParseError::InvalidUtf8(2))
        ));
    }
}
