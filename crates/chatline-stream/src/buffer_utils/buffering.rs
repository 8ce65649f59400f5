use std::collections::VecDeque;

use crate::error::DecodeError;

/// Circular buffer for line-based parsing of a chunked byte stream.
///
/// Bytes are held until a `\n` arrives, so a line (or a multi-byte UTF-8
/// character) split across any number of chunks comes out whole.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract next line (up to `\n`) from buffer, without its terminator.
    /// Returns None if no complete line is available
    pub fn next_line(&mut self) -> Option<Result<String, DecodeError>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        Some(decode_line_bytes(&line_bytes[..newline_pos]))
    }

    /// Drain whatever is left once the stream has closed.
    ///
    /// Returns None when the buffer is empty.
    pub fn take_remainder(&mut self) -> Option<Result<String, DecodeError>> {
        if self.buffer.is_empty() {
            return None;
        }
        let line_bytes: Vec<u8> = self.buffer.drain(..).collect();
        Some(decode_line_bytes(&line_bytes))
    }

    /// Current buffer size
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn decode_line_bytes(bytes: &[u8]) -> Result<String, DecodeError> {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(DecodeError::InvalidUtf8)
}
