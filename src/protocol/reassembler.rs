//! Chunk-to-payload reassembly for bridge streams.
//!
//! Network reads hand back arbitrary byte chunks; payload boundaries land
//! wherever they land, including inside a multi-byte UTF-8 sequence. The
//! reassembler buffers raw bytes and only cuts at structural boundaries,
//! so any chunking of a stream yields the same payload sequence as
//! feeding it whole.

/// Wire framing the bridge speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Bare newline-delimited JSON payloads.
    Lines,
    /// Server-sent events: `data:` lines in blank-line-terminated blocks.
    Sse,
}

/// Incremental reassembler turning byte chunks into payload strings.
#[derive(Debug)]
pub struct FrameReassembler {
    framing: Framing,
    buffer: Vec<u8>,
    /// `data:` lines of the SSE block currently being collected.
    sse_data: Vec<String>,
}

impl FrameReassembler {
    /// Create a reassembler for the given framing.
    #[must_use]
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            buffer: Vec::new(),
            sse_data: Vec::new(),
        }
    }

    /// Feed one chunk, returning every payload it completed, in order.
    ///
    /// In `Lines` framing every completed line is a payload, blank ones
    /// included (the parser marks those ignorable). In `Sse` framing a
    /// payload is the joined `data:` lines of a block; blocks without any
    /// `data:` line (comments, keep-alives) produce nothing.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(line) = self.take_line() {
            match self.framing {
                Framing::Lines => payloads.push(line),
                Framing::Sse => {
                    if let Some(payload) = self.sse_line(&line) {
                        payloads.push(payload);
                    }
                }
            }
        }
        payloads
    }

    /// Flush the residual at end of stream, if any.
    ///
    /// A final line the peer never terminated still counts as a payload;
    /// in `Sse` framing the unterminated block's `data:` lines are joined
    /// the same as a terminated one.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);

        match self.framing {
            Framing::Lines => {
                if rest.is_empty() {
                    return None;
                }
                Some(into_line(rest))
            }
            Framing::Sse => {
                let mut flushed = None;
                if !rest.is_empty() {
                    flushed = self.sse_line(&into_line(rest));
                }
                flushed.or_else(|| self.take_sse_block())
            }
        }
    }

    /// Remove and return the next complete line from the buffer.
    fn take_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
        line.pop();
        Some(into_line(line))
    }

    /// Process one SSE line; a blank line closes the current block.
    fn sse_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.take_sse_block();
        }
        if let Some(rest) = line.strip_prefix("data:") {
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            self.sse_data.push(rest.to_string());
        }
        None
    }

    /// Join and clear the collected block, if it carried any data.
    fn take_sse_block(&mut self) -> Option<String> {
        if self.sse_data.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.sse_data).join("\n"))
    }
}

/// Trim a trailing `\r` and decode; payload boundaries never land inside
/// a UTF-8 sequence because `\n` cannot be a continuation byte.
fn into_line(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
