//! Content-Length wire framing
//!
//! Every message is a header block of CRLF-separated lines terminated by
//! a blank CRLF line, where one line (case-insensitive key) declares
//! `Content-Length: <n>`, followed by exactly `n` bytes of UTF-8 JSON:
//!
//! ```text
//! Content-Length: <n>\r\n
//! \r\n
//! <n bytes of JSON>
//! ```

use serde_json::Value;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const LENGTH_KEY: &str = "content-length:";

/// Encode one message as a framed byte sequence
pub fn encode_message(payload: &Value) -> Vec<u8> {
    let body = payload.to_string();
    let mut out = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    out.extend_from_slice(body.as_bytes());
    out
}

/// Incremental frame decoder.
///
/// Fed arbitrary byte chunks, it buffers until complete frames are
/// available and returns every decoded JSON value in arrival order.
/// Chunk boundaries never affect the decoded sequence: a chunk may be
/// empty, split a header line, or carry several frames at once.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and extract every complete frame currently buffered.
    ///
    /// Headers without a length field are discarded and scanning resumes
    /// at the next header boundary; bodies that fail to parse as JSON
    /// are dropped without surfacing an error.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buffer.extend_from_slice(chunk);
        let mut messages = Vec::new();

        loop {
            let Some(header_end) = find(&self.buffer, HEADER_TERMINATOR) else {
                break;
            };

            let header_block = String::from_utf8_lossy(&self.buffer[..header_end]);
            let length = header_block
                .split("\r\n")
                .find(|line| line.to_lowercase().starts_with(LENGTH_KEY))
                .and_then(|line| line[LENGTH_KEY.len()..].trim().parse::<usize>().ok());

            let body_start = header_end + HEADER_TERMINATOR.len();
            let Some(length) = length else {
                tracing::debug!("Discarding header block without Content-Length");
                self.buffer.drain(..body_start);
                continue;
            };

            // Incomplete body: consume nothing and wait for more bytes.
            if self.buffer.len() < body_start + length {
                break;
            }

            let body = &self.buffer[body_start..body_start + length];
            match serde_json::from_slice::<Value>(body) {
                Ok(value) => messages.push(value),
                Err(e) => tracing::debug!("Dropping unparseable frame body: {}", e),
            }
            self.buffer.drain(..body_start + length);
        }

        messages
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
