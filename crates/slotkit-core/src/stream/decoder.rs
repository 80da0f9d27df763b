//! Decoding of raw byte reads into text chunks
//!
//! Network reads split text at arbitrary byte offsets. The decoder carries
//! incomplete UTF-8 sequences over to the next read and, in line framing,
//! incomplete lines as well.

use serde::{Deserialize, Serialize};

/// How decoded text is cut into raw chunks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkFraming {
    /// Every read is one chunk
    #[default]
    Raw,
    /// Every non-empty line is one chunk
    Lines,
}

/// Incremental decoder for one stream
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    framing: ChunkFraming,
    /// Trailing bytes of an incomplete UTF-8 sequence
    incomplete_utf8: Vec<u8>,
    /// Text of an unterminated line (line framing only)
    line_buffer: String,
}

impl ChunkDecoder {
    pub fn new(framing: ChunkFraming) -> Self {
        Self {
            framing,
            incomplete_utf8: Vec::new(),
            line_buffer: String::new(),
        }
    }

    /// Feed one read and return the raw chunks it completes
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let combined = if self.incomplete_utf8.is_empty() {
            bytes.to_vec()
        } else {
            let mut combined = std::mem::take(&mut self.incomplete_utf8);
            combined.extend_from_slice(bytes);
            combined
        };

        let (text, remainder) = decode_utf8_with_remainder(&combined);
        self.incomplete_utf8 = remainder;

        match self.framing {
            ChunkFraming::Raw => {
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text]
                }
            }
            ChunkFraming::Lines => {
                self.line_buffer.push_str(&text);
                self.take_lines()
            }
        }
    }

    /// Flush whatever is buffered at end-of-data
    pub fn finish(&mut self) -> Vec<String> {
        let leftover = std::mem::take(&mut self.incomplete_utf8);
        let tail = String::from_utf8_lossy(&leftover).into_owned();

        match self.framing {
            ChunkFraming::Raw => {
                if tail.is_empty() {
                    Vec::new()
                } else {
                    vec![tail]
                }
            }
            ChunkFraming::Lines => {
                self.line_buffer.push_str(&tail);
                let mut chunks = self.take_lines();
                let last = std::mem::take(&mut self.line_buffer);
                let last = last.trim_end_matches('\r');
                if !last.is_empty() {
                    chunks.push(last.to_string());
                }
                chunks
            }
        }
    }

    /// Check if anything is buffered
    pub fn has_remaining(&self) -> bool {
        !self.line_buffer.is_empty() || !self.incomplete_utf8.is_empty()
    }

    fn take_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(end) = self.line_buffer.find('\n') {
            let line: String = self.line_buffer.drain(..=end).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
        lines
    }
}

/// Decode bytes as UTF-8, returning the valid text and any trailing bytes of
/// an incomplete sequence. Invalid bytes in the middle are replaced.
fn decode_utf8_with_remainder(bytes: &[u8]) -> (String, Vec<u8>) {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return (s.to_string(), Vec::new());
    }

    // Scan back at most 3 bytes for the start of a truncated sequence
    let mut valid_end = bytes.len();
    for i in 1..=4.min(bytes.len()) {
        let pos = bytes.len() - i;
        let byte = bytes[pos];

        if !is_continuation_byte(byte) {
            if bytes.len() - pos < utf8_char_len(byte) {
                valid_end = pos;
            }
            break;
        }
    }

    let text = String::from_utf8_lossy(&bytes[..valid_end]).into_owned();
    (text, bytes[valid_end..].to_vec())
}

#[inline]
fn is_continuation_byte(byte: u8) -> bool {
    (byte & 0b1100_0000) == 0b1000_0000
}

#[inline]
fn utf8_char_len(first_byte: u8) -> usize {
    if first_byte & 0b1000_0000 == 0 {
        1
    } else if first_byte & 0b1110_0000 == 0b1100_0000 {
        2
    } else if first_byte & 0b1111_0000 == 0b1110_0000 {
        3
    } else if first_byte & 0b1111_1000 == 0b1111_0000 {
        4
    } else {
        1
    }
}
