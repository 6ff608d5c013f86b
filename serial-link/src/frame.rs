//! Wire-format definitions for serial frames.
//!
//! Every message exchanged over the link is a [`Frame`].  This module is
//! responsible for:
//! - Defining the on-wire byte layout (markers, length, payload, checksum).
//! - Computing the XOR checksum over a payload.
//! - Encoding a payload into a frame ready for byte-by-byte transmission.
//! - Decoding a complete frame held in memory, returning errors for malformed
//!   input.
//!
//! No I/O happens here — this is pure data transformation.  Incremental,
//! byte-at-a-time parsing lives in [`crate::receiver`].
//!
//! # Wire format
//!
//! ```text
//!  +-------+--------+---------------------+----------+-----+
//!  | START | LENGTH | PAYLOAD (LENGTH B)  | CHECKSUM | END |
//!  | 0x02  |   1 B  |                     |  1 B XOR | 0x03|
//!  +-------+--------+---------------------+----------+-----+
//!
//!  ACK = 0x06 (single byte, receiver → sender)
//! ```
//!
//! Fields are disambiguated by position only; payload bytes may take any value
//! including the marker values.  There is no escaping.

use thiserror::Error;

/// Start-of-frame marker.
pub const START: u8 = 0x02;
/// End-of-frame marker.
pub const END: u8 = 0x03;
/// Acknowledgement byte sent by the receiver after accepting a frame.
pub const ACK: u8 = 0x06;

/// Bytes added around the payload: start, length, checksum, end.
pub const OVERHEAD: usize = 4;

/// Default maximum payload length in bytes.
pub const DEFAULT_CAPACITY: u8 = 32;

/// One decoded frame: the payload that passed checksum and end-marker
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Payload length as carried in the LENGTH byte.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// XOR checksum of this frame's payload.
    pub fn checksum(&self) -> u8 {
        checksum(&self.payload)
    }

    /// Serialise this frame, rejecting payloads longer than `capacity`.
    pub fn encode(&self, capacity: u8) -> Result<Vec<u8>, FrameError> {
        encode_frame(&self.payload, capacity)
    }
}

/// Errors that can arise when encoding or decoding a whole frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("payload of {len} bytes exceeds capacity of {capacity}")]
    PayloadTooLarge { len: usize, capacity: u8 },
    #[error("buffer too short to contain a frame")]
    Truncated,
    #[error("expected start marker 0x02, found {0:#04x}")]
    BadStart(u8),
    #[error("length field does not match remaining bytes")]
    LengthMismatch,
    #[error("checksum mismatch: computed {expected:#04x}, received {found:#04x}")]
    ChecksumMismatch { expected: u8, found: u8 },
    #[error("expected end marker 0x03, found {0:#04x}")]
    BadEnd(u8),
}

/// XOR-fold all bytes of `payload`.  The checksum of an empty payload is 0.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |acc, b| acc ^ b)
}

/// Encode `payload` into a complete frame.
pub fn encode_frame(payload: &[u8], capacity: u8) -> Result<Vec<u8>, FrameError> {
    let len = u8::try_from(payload.len())
        .ok()
        .filter(|len| *len <= capacity)
        .ok_or(FrameError::PayloadTooLarge {
            len: payload.len(),
            capacity,
        })?;

    let mut buf = Vec::with_capacity(payload.len() + OVERHEAD);
    buf.push(START);
    buf.push(len);
    buf.extend_from_slice(payload);
    buf.push(checksum(payload));
    buf.push(END);
    Ok(buf)
}

/// Parse a [`Frame`] from a buffer holding exactly one frame.
///
/// Returns [`Err`] if:
/// - `buf` is shorter than [`OVERHEAD`] or does not start with [`START`],
/// - the LENGTH byte exceeds `capacity` or disagrees with `buf.len()`,
/// - the checksum does not verify, or
/// - the last byte is not [`END`].
pub fn decode_frame(buf: &[u8], capacity: u8) -> Result<Frame, FrameError> {
    if buf.len() < OVERHEAD {
        return Err(FrameError::Truncated);
    }
    if buf[0] != START {
        return Err(FrameError::BadStart(buf[0]));
    }

    let len = buf[1];
    if len > capacity {
        return Err(FrameError::PayloadTooLarge {
            len: usize::from(len),
            capacity,
        });
    }
    if buf.len() != usize::from(len) + OVERHEAD {
        return Err(FrameError::LengthMismatch);
    }

    let payload = &buf[2..2 + usize::from(len)];
    let expected = checksum(payload);
    let found = buf[2 + usize::from(len)];
    if expected != found {
        return Err(FrameError::ChecksumMismatch { expected, found });
    }

    let end = buf[buf.len() - 1];
    if end != END {
        return Err(FrameError::BadEnd(end));
    }

    Ok(Frame::new(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_of_empty_payload_is_zero() {
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn checksum_is_xor_fold() {
        assert_eq!(checksum(b"OLA"), b'O' ^ b'L' ^ b'A');
        assert_eq!(checksum(&[0xCA, 0xFE]), 0x34);
    }

    #[test]
    fn reordered_payload_shares_checksum_but_not_content() {
        let ab = encode_frame(&[0x41, 0x42], DEFAULT_CAPACITY).unwrap();
        let ba = encode_frame(&[0x42, 0x41], DEFAULT_CAPACITY).unwrap();

        assert_eq!(ab[4], ba[4]);
        assert_ne!(
            decode_frame(&ab, DEFAULT_CAPACITY).unwrap(),
            decode_frame(&ba, DEFAULT_CAPACITY).unwrap()
        );
    }

    #[test]
    fn encode_layout_is_bit_exact() {
        let bytes = encode_frame(b"OLA", DEFAULT_CAPACITY).unwrap();
        assert_eq!(
            bytes,
            vec![START, 3, b'O', b'L', b'A', b'O' ^ b'L' ^ b'A', END]
        );
    }

    #[test]
    fn empty_payload_encodes_to_four_bytes() {
        let bytes = encode_frame(&[], DEFAULT_CAPACITY).unwrap();
        assert_eq!(bytes, vec![START, 0, 0, END]);
        assert_eq!(
            decode_frame(&bytes, DEFAULT_CAPACITY).unwrap(),
            Frame::default()
        );
    }

    #[test]
    fn encode_rejects_oversize_payload() {
        let payload = vec![0u8; 33];
        assert_eq!(
            encode_frame(&payload, 32),
            Err(FrameError::PayloadTooLarge {
                len: 33,
                capacity: 32
            })
        );
        // 256 bytes cannot be described by the LENGTH byte at all.
        assert!(encode_frame(&[0u8; 256], u8::MAX).is_err());
    }

    #[test]
    fn payload_may_contain_marker_values() {
        let payload = [START, END, ACK, START];
        let bytes = encode_frame(&payload, DEFAULT_CAPACITY).unwrap();
        assert_eq!(
            decode_frame(&bytes, DEFAULT_CAPACITY).unwrap().payload,
            payload
        );
    }

    #[test]
    fn decode_short_buffer_returns_error() {
        assert_eq!(decode_frame(&[START, 0, 0], 32), Err(FrameError::Truncated));
    }

    #[test]
    fn decode_bad_start_returns_error() {
        assert_eq!(
            decode_frame(&[0xFF, 0, 0, END], 32),
            Err(FrameError::BadStart(0xFF))
        );
    }

    #[test]
    fn decode_length_mismatch_returns_error() {
        let mut bytes = encode_frame(b"data", 32).unwrap();
        bytes.remove(2);
        assert_eq!(decode_frame(&bytes, 32), Err(FrameError::LengthMismatch));
    }

    #[test]
    fn decode_corrupt_checksum_returns_error() {
        let frame = [START, 2, 0x10, 0x20, 0xFF, END];
        assert_eq!(
            decode_frame(&frame, 32),
            Err(FrameError::ChecksumMismatch {
                expected: 0x30,
                found: 0xFF
            })
        );
    }

    #[test]
    fn decode_bad_end_returns_error() {
        let mut bytes = encode_frame(b"ERR", 32).unwrap();
        *bytes.last_mut().unwrap() = 0xFF;
        assert_eq!(decode_frame(&bytes, 32), Err(FrameError::BadEnd(0xFF)));
    }

    #[test]
    fn frame_encode_respects_capacity() {
        let frame = Frame::new(vec![1, 2, 3]);
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.checksum(), 0);
        assert!(frame.encode(2).is_err());
        assert_eq!(frame.encode(3).unwrap().len(), 3 + OVERHEAD);
    }
}
