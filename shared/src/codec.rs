//! Terminator-delimited codec for stream framing
//!
//! All messages are framed as:
//! ```text
//! [ UTF-8 JSON document ][ "<<END>>" ]
//! ```
//!
//! There is no length prefix; the terminator marker preserves message
//! boundaries on the stream. A frame is never handed to the JSON parser
//! until its terminator has been observed.

use bytes::{Bytes, BytesMut};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::TERMINATOR;

/// Maximum frame size (1 MB) to prevent unbounded buffering when a peer
/// never sends a terminator
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Substituted payload when a response fails to serialize
const ENCODE_FALLBACK: &str = r#"{"success":false,"message":"Internal JSON encoding error"}"#;

/// Errors that can occur during frame decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Frame too large: {0} bytes (max: {MAX_FRAME_SIZE})")]
    FrameTooLarge(usize),

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decoder state machine for streaming decoding
///
/// Feed raw bytes with [`extend`](Self::extend), then call
/// [`decode_next`](Self::decode_next) until it returns `Ok(None)` to drain
/// all complete frames. Call [`finish`](Self::finish) once at end of stream.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Partial frame data being accumulated
    buffer: BytesMut,
}

impl FrameDecoder {
    /// Create a new frame decoder
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Add data to the decoder buffer
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next frame from the buffer
    ///
    /// Returns:
    /// - `Ok(Some(value))` if a complete frame was decoded
    /// - `Ok(None)` if more data is needed
    /// - `Err(..)` if a complete frame held malformed JSON; the frame's bytes
    ///   are already consumed, so the stream never desyncs and decoding can
    ///   continue with the next frame
    pub fn decode_next(&mut self) -> Result<Option<Value>, CodecError> {
        loop {
            let Some(pos) = find_terminator(&self.buffer) else {
                if self.buffer.len() > MAX_FRAME_SIZE {
                    let len = self.buffer.len();
                    self.buffer.clear();
                    return Err(CodecError::FrameTooLarge(len));
                }
                return Ok(None);
            };

            // Consume the frame including its terminator
            let frame = self.buffer.split_to(pos + TERMINATOR.len());
            let body = frame[..pos].trim_ascii();

            // Nothing but whitespace between terminators: keep scanning
            if body.is_empty() {
                continue;
            }

            return Ok(Some(serde_json::from_slice(body)?));
        }
    }

    /// Best-effort parse of leftover bytes at end of stream
    ///
    /// Tolerates a peer that closes the stream without emitting a final
    /// terminator. An empty (or all-whitespace) buffer means the stream
    /// ended cleanly.
    pub fn finish(&mut self) -> Result<Option<Value>, CodecError> {
        let leftover = self.buffer.split();
        let body = leftover.trim_ascii();
        if body.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(body)?))
    }

    /// Get the current buffer length (for debugging)
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}

/// Find the first terminator occurrence in the buffer
fn find_terminator(buf: &[u8]) -> Option<usize> {
    let marker = TERMINATOR.as_bytes();
    if buf.len() < marker.len() {
        return None;
    }
    buf.windows(marker.len()).position(|w| w == marker)
}

/// Encode a value into a terminator-delimited frame
///
/// Never fails: if the value cannot be serialized, a fixed fallback error
/// payload is framed instead so the caller always has bytes to write.
pub fn encode_frame<T: Serialize>(value: &T) -> Bytes {
    let payload = match serde_json::to_vec(value) {
        Ok(payload) => payload,
        Err(_) => ENCODE_FALLBACK.as_bytes().to_vec(),
    };

    let mut buf = BytesMut::with_capacity(payload.len() + TERMINATOR.len());
    buf.extend_from_slice(&payload);
    buf.extend_from_slice(TERMINATOR.as_bytes());
    buf.freeze()
}
