//! Length-framed message codec.
//!
//! Each wire message is a `(metadata, payload)` pair laid out with strict
//! little-endian byte order and no padding:
//!
//! ```text
//! +-------------------+------------------+-------------------+---------+
//! | metadata_length   | metadata         | payload_length    | payload |
//! | (i16, LE)         | (bytes)          | (i32, LE)         | (bytes) |
//! +-------------------+------------------+-------------------+---------+
//! ```
//!
//! A zero `payload_length` is valid and produces an empty payload. Lengths
//! are validated before any allocation: a negative length, or a payload
//! length at or above [`MAX_PAYLOAD_LENGTH`], fails decoding with
//! [`TransportError::CorruptMessage`] without consuming bytes past the
//! length field, and the connection is expected to be torn down.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::error::{MAX_PAYLOAD_LENGTH, TransportError};

/// Size of the metadata length prefix.
const METADATA_LENGTH_SIZE: usize = 2;

/// Size of the payload length field.
const PAYLOAD_LENGTH_SIZE: usize = 4;

/// One framed wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame metadata (the encoded message-type envelope).
    pub metadata: Bytes,
    /// Frame payload; may be empty.
    pub payload: Bytes,
}

impl Frame {
    /// Creates a frame from metadata and payload bytes.
    #[must_use]
    pub fn new(metadata: impl Into<Bytes>, payload: impl Into<Bytes>) -> Self {
        Self {
            metadata: metadata.into(),
            payload: payload.into(),
        }
    }
}

/// Codec implementing the length-framed wire layout for use with
/// [`tokio_util::codec::Framed`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec;

impl FrameCodec {
    /// Creates the codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, TransportError> {
        if src.len() < METADATA_LENGTH_SIZE {
            return Ok(None);
        }

        let metadata_length = i16::from_le_bytes([src[0], src[1]]);
        // i16 bounds the metadata well below the payload cap; only a
        // negative length can be out of range.
        if metadata_length < 0 {
            return Err(TransportError::CorruptMessage);
        }
        let metadata_length = metadata_length as usize;

        let payload_length_at = METADATA_LENGTH_SIZE + metadata_length;
        if src.len() < payload_length_at + PAYLOAD_LENGTH_SIZE {
            src.reserve(payload_length_at + PAYLOAD_LENGTH_SIZE - src.len());
            return Ok(None);
        }

        let payload_length = i32::from_le_bytes([
            src[payload_length_at],
            src[payload_length_at + 1],
            src[payload_length_at + 2],
            src[payload_length_at + 3],
        ]);
        if payload_length < 0 || payload_length as usize >= MAX_PAYLOAD_LENGTH {
            return Err(TransportError::CorruptMessage);
        }
        let payload_length = payload_length as usize;

        let total = payload_length_at + PAYLOAD_LENGTH_SIZE + payload_length;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(METADATA_LENGTH_SIZE);
        let metadata = src.split_to(metadata_length).freeze();
        src.advance(PAYLOAD_LENGTH_SIZE);
        let payload = src.split_to(payload_length).freeze();

        Ok(Some(Frame { metadata, payload }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = TransportError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), TransportError> {
        if frame.metadata.len() > i16::MAX as usize {
            return Err(TransportError::CorruptMessage);
        }
        if frame.payload.len() >= MAX_PAYLOAD_LENGTH {
            return Err(TransportError::CorruptMessage);
        }

        dst.reserve(
            METADATA_LENGTH_SIZE
                + frame.metadata.len()
                + PAYLOAD_LENGTH_SIZE
                + frame.payload.len(),
        );

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        {
            dst.put_i16_le(frame.metadata.len() as i16);
            dst.extend_from_slice(&frame.metadata);
            dst.put_i32_le(frame.payload.len() as i32);
        }
        dst.extend_from_slice(&frame.payload);

        Ok(())
    }
}
