//! Wire format constants and encoders.
//!
//! Every frame is a 4-byte length prefix followed by that many payload bytes:
//! ```text
//! ┌──────────────┬──────────────────────┐
//! │ Length (N)   │ Payload              │
//! │ 4 bytes      │ N bytes              │
//! │ uint32 BE    │                      │
//! └──────────────┴──────────────────────┘
//! ```
//!
//! Strings inside a payload carry a 2-byte length and a trailing null byte:
//! ```text
//! ┌──────────┬──────────┬────────────┐
//! │ Length L │ Bytes    │ Terminator │
//! │ uint16 BE│ L bytes  │ 1 byte     │
//! └──────────┴──────────┴────────────┘
//! ```
//!
//! All multi-byte integers are Big Endian.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

/// Length prefix size in bytes (fixed, exactly 4).
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default maximum message size (16 MB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1 << 24;

/// Absolute maximum message size (max i32, the wire length is signed).
pub const ABSOLUTE_MAX_MESSAGE_SIZE: usize = i32::MAX as usize;

/// Default capacity of the buffered stream reader (64 KB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Smallest payload allocation made by a frame reader.
pub const MIN_PAYLOAD_ALLOCATION: usize = 4096;

/// Byte written after every string.
pub const STRING_TERMINATOR: u8 = 0;

/// Encode a frame length prefix (Big Endian).
#[inline]
pub fn encode_length_prefix(length: u32) -> [u8; LENGTH_PREFIX_SIZE] {
    length.to_be_bytes()
}

/// Decode a frame length prefix (Big Endian).
#[inline]
pub fn decode_length_prefix(prefix: [u8; LENGTH_PREFIX_SIZE]) -> u32 {
    u32::from_be_bytes(prefix)
}

/// Build a complete frame (length prefix + payload).
///
/// # Errors
///
/// Returns `MessageSizeExceeded` if the payload is larger than
/// [`ABSOLUTE_MAX_MESSAGE_SIZE`].
///
/// # Example
///
/// ```
/// use kafka_wire::protocol::build_frame;
///
/// let frame = build_frame(b"abc").unwrap();
/// assert_eq!(&frame[..], &[0, 0, 0, 3, b'a', b'b', b'c']);
/// ```
pub fn build_frame(payload: &[u8]) -> Result<Bytes> {
    if payload.len() > ABSOLUTE_MAX_MESSAGE_SIZE {
        return Err(WireError::MessageSizeExceeded {
            size: payload.len(),
            max: ABSOLUTE_MAX_MESSAGE_SIZE,
        });
    }

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.extend_from_slice(payload);
    Ok(buf.freeze())
}

/// Append a length-prefixed, null-terminated string.
///
/// # Errors
///
/// Returns `StringTooLong` if the string does not fit a 2-byte length.
pub fn put_string(buf: &mut BytesMut, value: &str) -> Result<()> {
    let length = u16::try_from(value.len()).map_err(|_| WireError::StringTooLong {
        length: value.len(),
    })?;

    buf.reserve(2 + value.len() + 1);
    buf.put_u16(length);
    buf.extend_from_slice(value.as_bytes());
    buf.put_u8(STRING_TERMINATOR);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_prefix_big_endian() {
        assert_eq!(encode_length_prefix(0x0102_0304), [0x01, 0x02, 0x03, 0x04]);
        assert_eq!(decode_length_prefix([0, 0, 0, 0x0A]), 10);
        assert_eq!(decode_length_prefix([0xFF; 4]), u32::MAX);
    }

    #[test]
    fn test_build_frame_empty_payload() {
        let frame = build_frame(b"").unwrap();
        assert_eq!(&frame[..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_put_string_layout() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, "ABC").unwrap();
        assert_eq!(&buf[..], &[0x00, 0x03, 0x41, 0x42, 0x43, 0x00]);
    }

    #[test]
    fn test_put_string_too_long() {
        let mut buf = BytesMut::new();
        let long = "x".repeat(u16::MAX as usize + 1);
        let err = put_string(&mut buf, &long).unwrap_err();
        assert!(matches!(err, WireError::StringTooLong { length } if length == 65_536));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_constants() {
        assert_eq!(LENGTH_PREFIX_SIZE, 4);
        assert_eq!(DEFAULT_MAX_MESSAGE_SIZE, 16_777_216);
        assert_eq!(ABSOLUTE_MAX_MESSAGE_SIZE, 2_147_483_647);
    }
}
