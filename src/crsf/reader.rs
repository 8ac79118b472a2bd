//! # CRSF Stream Framing
//!
//! Splits a raw serial byte stream into validated CRSF frames.
//!
//! Bytes before a sync byte are discarded. When a candidate frame has an
//! invalid length or a bad CRC, only its first byte is dropped so the search
//! resumes inside the rejected bytes.

use bytes::{Buf, BytesMut};

use super::decoder::decode_frame;
use super::protocol::*;
use crate::error::Result;

/// Incremental CRSF frame reader
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: BytesMut,
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(CRSF_MAX_FRAME_SIZE * 4),
        }
    }

    /// Append received bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet consumed
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Pull the next frame out of the buffer
    ///
    /// # Returns
    ///
    /// * `None` - More bytes are needed
    /// * `Some(Ok(frame))` - A valid frame was consumed
    /// * `Some(Err(e))` - A candidate frame was rejected and skipped
    pub fn next_frame(&mut self) -> Option<Result<CrsfFrame>> {
        loop {
            let start = self.buffer.iter().position(|&b| is_sync_byte(b));
            match start {
                Some(offset) => self.buffer.advance(offset),
                None => {
                    self.buffer.clear();
                    return None;
                }
            }

            if self.buffer.len() < 2 {
                return None;
            }

            let length = self.buffer[1] as usize;
            if !(CRSF_MIN_LENGTH_FIELD..=CRSF_MAX_LENGTH_FIELD).contains(&length) {
                self.buffer.advance(1);
                continue;
            }

            let frame_len = 2 + length;
            if self.buffer.len() < frame_len {
                return None;
            }

            return match decode_frame(&self.buffer[..frame_len]) {
                Ok(frame) => {
                    self.buffer.advance(frame_len);
                    Some(Ok(frame))
                }
                Err(e) => {
                    self.buffer.advance(1);
                    Some(Err(e))
                }
            };
        }
    }
}
