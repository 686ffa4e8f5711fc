//! Newline framing for inbound byte streams
//!
//! One `Framer` per connection. Bytes are buffered until a `\n` arrives, so
//! messages and multi-byte characters may be split across reads freely.

use tracing::trace;

use crate::error::FrameError;

/// Per-connection line accumulator
#[derive(Debug)]
pub struct Framer {
    buffer: Vec<u8>,
    max_line_length: usize,
}

impl Framer {
    /// Create a framer that rejects partial lines longer than `max_line_length` bytes
    pub fn new(max_line_length: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_line_length,
        }
    }

    /// Append a chunk and return every message it completes
    ///
    /// Messages come back in arrival order, trimmed of surrounding
    /// whitespace (including `\r`). Bytes after the last newline stay
    /// buffered for the next call; `check_pending` reports whether they
    /// have grown past the limit.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut messages = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..pos]);
            messages.push(text.trim().to_string());
        }

        trace!(
            "framed {} message(s), {} byte(s) pending",
            messages.len(),
            self.buffer.len()
        );
        messages
    }

    /// Fails once the unterminated tail exceeds `max_line_length`
    pub fn check_pending(&self) -> Result<(), FrameError> {
        if self.pending() > self.max_line_length {
            return Err(FrameError::LineTooLong {
                limit: self.max_line_length,
            });
        }
        Ok(())
    }

    /// Bytes received since the last newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 1024;

    #[test]
    fn test_single_chunk() {
        let mut framer = Framer::new(LIMIT);
        assert_eq!(framer.feed(b"SAY hi\n"), vec!["SAY hi"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_split_across_chunks_matches_single_chunk() {
        let mut framer = Framer::new(LIMIT);
        assert!(framer.feed(b"SAY ").is_empty());
        assert_eq!(framer.pending(), 4);
        assert_eq!(framer.feed(b"hi\n"), vec!["SAY hi"]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_multiple_messages_in_one_chunk() {
        let mut framer = Framer::new(LIMIT);
        let messages = framer.feed(b"LIST\nSAY a\nSAY b");
        assert_eq!(messages, vec!["LIST", "SAY a"]);
        assert_eq!(framer.feed(b"\n"), vec!["SAY b"]);
    }

    #[test]
    fn test_trims_crlf_and_whitespace() {
        let mut framer = Framer::new(LIMIT);
        assert_eq!(framer.feed(b"  HELP \t\r\n"), vec!["HELP"]);
    }

    #[test]
    fn test_empty_line() {
        let mut framer = Framer::new(LIMIT);
        assert_eq!(framer.feed(b"\n"), vec![""]);
    }

    #[test]
    fn test_utf8_split_inside_character() {
        let mut framer = Framer::new(LIMIT);
        let text = "SAY héllo\n".as_bytes();
        // 'é' is two bytes starting at index 5
        assert!(framer.feed(&text[..6]).is_empty());
        assert_eq!(framer.feed(&text[6..]), vec!["SAY héllo"]);
    }

    #[test]
    fn test_line_too_long() {
        let mut framer = Framer::new(8);
        assert!(framer.feed(b"12345678").is_empty());
        assert_eq!(framer.check_pending(), Ok(()));
        assert!(framer.feed(b"9").is_empty());
        assert_eq!(
            framer.check_pending(),
            Err(FrameError::LineTooLong { limit: 8 })
        );
    }

    #[test]
    fn test_long_chunk_with_newlines_is_fine() {
        let mut framer = Framer::new(8);
        let messages = framer.feed(b"SAY abc\nSAY def\nSAY ghi\n");
        assert_eq!(messages.len(), 3);
        assert_eq!(framer.check_pending(), Ok(()));
    }

    #[test]
    fn test_complete_lines_survive_overlong_tail() {
        let mut framer = Framer::new(4);
        assert_eq!(framer.feed(b"LIST\n123456"), vec!["LIST"]);
        assert_eq!(framer.pending(), 6);
        assert!(framer.check_pending().is_err());
    }
}
