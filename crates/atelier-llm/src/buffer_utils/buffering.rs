use std::collections::VecDeque;

/// Byte buffer that reassembles arbitrarily fragmented input into complete,
/// trimmed text lines. Bytes after the last newline stay buffered until the
/// rest of the line arrives.
pub struct LineBuffer {
    buffer: VecDeque<u8>,
}

impl LineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Append raw bytes to the buffer.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Pop the next complete line, trimmed of surrounding whitespace.
    ///
    /// Returns `None` once no full line remains; a trailing partial line is
    /// never returned. Lines that are not valid UTF-8 are dropped (the line
    /// is consumed and the scan continues with the next one).
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

            match std::str::from_utf8(&line_bytes) {
                Ok(line) => return Some(line.trim().to_string()),
                Err(e) => {
                    tracing::debug!("dropping non-UTF-8 line ({} bytes): {}", line_bytes.len(), e);
                }
            }
        }
    }

    /// Number of buffered bytes still waiting for a newline.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_lines_pop_in_order() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"line1\nline2\n");

        assert_eq!(buffer.next_line().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
    }

    #[test]
    fn partial_line_waits_for_newline() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.len(), 7);

        buffer.extend(b" line\n");
        assert_eq!(buffer.next_line().unwrap(), "partial line");
        assert!(buffer.is_empty());
    }

    #[test]
    fn crlf_endings_are_trimmed() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"data: x\r\n");
        assert_eq!(buffer.next_line().unwrap(), "data: x");
    }

    #[test]
    fn invalid_utf8_line_is_skipped() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(&[0xff, 0xfe, b'\n']);
        buffer.extend(b"ok\n");

        assert_eq!(buffer.next_line().unwrap(), "ok");
        assert!(buffer.next_line().is_none());
    }

    #[test]
    fn multibyte_char_split_across_chunks() {
        let mut buffer = LineBuffer::with_capacity(64);
        let text = "héllo\n".as_bytes();

        buffer.extend(&text[..2]); // cuts é in half
        assert!(buffer.next_line().is_none());

        buffer.extend(&text[2..]);
        assert_eq!(buffer.next_line().unwrap(), "héllo");
    }
}
