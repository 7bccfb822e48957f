//! Incremental decoding of server-sent-event `data:` lines.
//!
//! ```rust
//! use ptransport::SseLineBuffer;
//!
//! let mut buffer = SseLineBuffer::new();
//! assert!(buffer.push("data: {\"delta\":\"he").is_empty());
//! assert_eq!(buffer.push("llo\"}\n\n"), vec!["{\"delta\":\"hello\"}".to_string()]);
//! assert_eq!(buffer.push("data: [DONE]\n"), Vec::<String>::new());
//! assert!(buffer.is_finished());
//! ```

pub const DONE_SENTINEL: &str = "[DONE]";

/// Splits arbitrarily chunked text into complete lines and keeps the payload
/// of every `data:` line. Comments, `event:` and `id:` lines are dropped.
#[derive(Debug, Default, Clone)]
pub struct SseLineBuffer {
    buffer: String,
    finished: bool,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feeds one chunk and returns the payloads completed by it. Once the
    /// `[DONE]` sentinel has been seen, further input is ignored.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        let mut payloads = Vec::new();
        if self.finished {
            return payloads;
        }

        self.buffer.push_str(chunk);
        while let Some(newline_index) = self.buffer.find('\n') {
            let line = self.buffer.drain(..=newline_index).collect::<String>();
            if let Some(payload) = self.accept_line(&line) {
                payloads.push(payload);
            }
            if self.finished {
                self.buffer.clear();
                break;
            }
        }

        payloads
    }

    /// Flushes a trailing line that arrived without a newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.finished || self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        self.accept_line(&line)
    }

    fn accept_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        let payload = line.strip_prefix("data:")?.trim();
        if payload == DONE_SENTINEL {
            self.finished = true;
            return None;
        }
        Some(payload.to_string())
    }
}

/// Drains the longest valid UTF-8 prefix of `pending`, leaving an incomplete
/// trailing code point in place for the next chunk.
pub fn take_utf8_prefix(pending: &mut Vec<u8>) -> Result<String, crate::TransportError> {
    let valid_len = match std::str::from_utf8(pending) {
        Ok(text) => text.len(),
        Err(err) if err.error_len().is_none() => err.valid_up_to(),
        Err(err) => {
            return Err(crate::TransportError::decode(format!(
                "event stream is not valid UTF-8: {err}"
            )));
        }
    };

    let bytes = pending.drain(..valid_len).collect::<Vec<u8>>();
    String::from_utf8(bytes).map_err(|err| crate::TransportError::decode(err.to_string()))
}
