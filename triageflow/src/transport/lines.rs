//! Incremental newline splitting for streamed responses.

use crate::errors::DecodeError;

/// Longest line accepted before it is reported and skipped.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One complete line taken from a byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// 1-based line number within the stream.
    pub number: usize,
    /// Line text without the terminator.
    pub text: String,
}

impl RawLine {
    /// Whether the line carries no content.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Buffers chunks and hands out complete lines in arrival order.
///
/// Chunk boundaries may fall anywhere, including inside a multi-byte
/// character; bytes are only decoded once a full line is available. Each
/// byte is scanned for a terminator once. A line longer than the limit is
/// reported as a `DecodeError` and its remaining bytes are discarded up to
/// the next newline.
#[derive(Debug)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    scanned: usize,
    discarding: bool,
    max_line_bytes: usize,
    lines_seen: usize,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::with_max_line_bytes(MAX_LINE_BYTES)
    }
}

impl LineDecoder {
    /// Creates an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty decoder with a custom line limit.
    #[must_use]
    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            discarding: false,
            max_line_bytes,
            lines_seen: 0,
        }
    }

    /// Feeds a chunk and returns every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<RawLine, DecodeError>> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[self.scanned..]
            .iter()
            .position(|byte| *byte == b'\n')
        {
            let end = self.scanned + offset;
            if self.discarding {
                self.discarding = false;
            } else if end - start > self.max_line_bytes {
                lines.push(Err(self.overflow()));
            } else {
                self.lines_seen += 1;
                lines.push(Ok(raw_line(
                    self.lines_seen,
                    strip_cr(&self.buffer[start..end]),
                )));
            }
            start = end + 1;
            self.scanned = start;
        }
        self.buffer.drain(..start);

        if !self.discarding && self.buffer.len() > self.max_line_bytes {
            lines.push(Err(self.overflow()));
            self.discarding = true;
        }
        if self.discarding {
            self.buffer.clear();
        }
        self.scanned = self.buffer.len();
        lines
    }

    /// Flushes a trailing line that had no terminator.
    pub fn finish(&mut self) -> Option<RawLine> {
        self.scanned = 0;
        if std::mem::take(&mut self.discarding) || self.buffer.is_empty() {
            self.buffer.clear();
            return None;
        }
        let buffer = std::mem::take(&mut self.buffer);
        self.lines_seen += 1;
        Some(raw_line(self.lines_seen, strip_cr(&buffer)))
    }

    /// Number of lines handed out so far, rejected ones included.
    #[must_use]
    pub fn lines_seen(&self) -> usize {
        self.lines_seen
    }

    fn overflow(&mut self) -> DecodeError {
        self.lines_seen += 1;
        DecodeError::new(
            self.lines_seen,
            format!("line exceeds {} bytes", self.max_line_bytes),
        )
    }
}

fn raw_line(number: usize, bytes: &[u8]) -> RawLine {
    RawLine {
        number,
        text: String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
