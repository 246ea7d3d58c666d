//! Protocol module - wire format, framing, and field decoding.
//!
//! This module implements the framing core:
//! - 4-byte Big Endian length prefix and frame encoding
//! - Frame reader with a reusable per-connection payload buffer
//! - Field cursor for typed reads from a frame payload
//! - Request header decoding

mod cursor;
mod frame_reader;
mod header;
mod wire_format;

pub use cursor::{FieldCursor, FixedWidth};
pub use frame_reader::FrameReader;
pub use header::RequestHeader;
pub use wire_format::{
    build_frame, decode_length_prefix, encode_length_prefix, put_string,
    ABSOLUTE_MAX_MESSAGE_SIZE, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_READ_BUFFER_SIZE,
    LENGTH_PREFIX_SIZE, MIN_PAYLOAD_ALLOCATION, STRING_TERMINATOR,
};
