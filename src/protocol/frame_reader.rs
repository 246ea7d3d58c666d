//! Frame reader for length-prefixed messages.
//!
//! Reads one frame at a time from an async byte stream into a payload buffer
//! that is reused for the lifetime of the connection:
//! 1. Read the 4-byte length prefix
//! 2. Reject lengths above the configured maximum before allocating
//! 3. Resize the payload buffer, reusing its capacity when possible
//! 4. Read exactly `length` payload bytes
//!
//! # Example
//!
//! ```
//! use kafka_wire::protocol::FrameReader;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> kafka_wire::Result<()> {
//! let stream: &[u8] = &[0, 0, 0, 2, 0x00, 0x2A];
//! let mut reader = FrameReader::new(stream);
//!
//! let n = reader.read_frame().await?;
//! assert_eq!(n, 2);
//! assert_eq!(reader.cursor().read_u16()?, 42);
//! # Ok(())
//! # }
//! ```

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use super::cursor::FieldCursor;
use super::wire_format::{
    decode_length_prefix, ABSOLUTE_MAX_MESSAGE_SIZE, LENGTH_PREFIX_SIZE, MIN_PAYLOAD_ALLOCATION,
};
use crate::config::ReaderConfig;
use crate::error::{Result, WireError};

/// Reads length-prefixed frames from a byte stream.
///
/// One reader belongs to one connection. The payload of the last frame
/// stays available through [`payload`](Self::payload) and
/// [`cursor`](Self::cursor) until the next call to
/// [`read_frame`](Self::read_frame).
pub struct FrameReader<R> {
    /// Buffered source stream.
    stream: BufReader<R>,
    /// Scratch space for the length prefix, overwritten every frame.
    prefix: [u8; LENGTH_PREFIX_SIZE],
    /// Payload of the current frame. Capacity persists across frames.
    payload: BytesMut,
    /// Maximum allowed declared length.
    max_message_size: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Create a new frame reader with default settings.
    ///
    /// Default max message size: 16MB, read buffer: 64KB.
    pub fn new(stream: R) -> Self {
        Self::with_config(stream, &ReaderConfig::default())
    }

    /// Create a new frame reader with a custom max message size.
    ///
    /// A size of 0 selects the default.
    pub fn with_max_message_size(stream: R, max_message_size: usize) -> Self {
        Self::with_config(
            stream,
            &ReaderConfig {
                max_message_size,
                ..ReaderConfig::default()
            },
        )
    }

    /// Create a new frame reader from a reader configuration.
    ///
    /// Zero values in `config` select the defaults. A max above `i32::MAX`
    /// is capped, so a length with the sign bit set is always rejected.
    pub fn with_config(stream: R, config: &ReaderConfig) -> Self {
        let config = config.normalized();
        Self {
            stream: BufReader::with_capacity(config.read_buffer_size, stream),
            prefix: [0u8; LENGTH_PREFIX_SIZE],
            payload: BytesMut::new(),
            max_message_size: config.max_message_size.min(ABSOLUTE_MAX_MESSAGE_SIZE),
        }
    }

    /// Read the next frame, or `None` if the stream ended cleanly before
    /// the first byte of a length prefix.
    ///
    /// # Errors
    ///
    /// Same as [`read_frame`](Self::read_frame). A stream that ends inside
    /// a prefix or a payload is still an `Io` error.
    pub async fn next_frame(&mut self) -> Result<Option<usize>> {
        if self.stream.fill_buf().await?.is_empty() {
            return Ok(None);
        }
        self.read_frame().await.map(Some)
    }

    /// Read the next frame into the payload buffer.
    ///
    /// Returns the number of payload bytes read, which always equals the
    /// declared length.
    ///
    /// # Errors
    ///
    /// - `Io` if the stream fails or ends while reading the prefix or the
    ///   payload. The error is returned unmodified.
    /// - `MessageSizeExceeded` if the declared length is above the maximum.
    ///   No payload bytes are consumed and the stream is left positioned
    ///   right after the prefix, so the connection cannot be resynchronized.
    pub async fn read_frame(&mut self) -> Result<usize> {
        self.stream.read_exact(&mut self.prefix).await?;

        // Compared unsigned: a length with the sign bit set is simply large.
        let size = decode_length_prefix(self.prefix) as usize;
        if size > self.max_message_size {
            return Err(WireError::MessageSizeExceeded {
                size,
                max: self.max_message_size,
            });
        }

        self.reset(size);
        self.stream.read_exact(&mut self.payload[..]).await?;
        Ok(size)
    }
}

impl<R: AsyncRead> FrameReader<R> {
    /// Set the payload length to exactly `size`.
    ///
    /// Reuses existing capacity when it suffices. Otherwise allocates at
    /// least [`MIN_PAYLOAD_ALLOCATION`] bytes. Bytes of earlier frames are
    /// overwritten, never exposed.
    fn reset(&mut self, size: usize) {
        self.payload.clear();
        if self.payload.capacity() < size {
            self.payload.reserve(size.max(MIN_PAYLOAD_ALLOCATION));
        }
        // Zero-filled so a failed read never exposes an earlier frame
        self.payload.resize(size, 0);
    }

    /// Payload of the most recent frame.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Field cursor positioned at the start of the most recent payload.
    #[inline]
    pub fn cursor(&self) -> FieldCursor<'_> {
        FieldCursor::new(&self.payload)
    }

    /// Maximum declared length accepted by this reader.
    #[inline]
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Current capacity of the reusable payload buffer.
    #[inline]
    pub fn buffer_capacity(&self) -> usize {
        self.payload.capacity()
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &R {
        self.stream.get_ref()
    }

    /// Get a mutable reference to the underlying stream.
    ///
    /// Reading from it directly bypasses buffered bytes and will
    /// desynchronize framing.
    pub fn get_mut(&mut self) -> &mut R {
        self.stream.get_mut()
    }

    /// Unwrap the underlying stream. Buffered, unread bytes are lost.
    pub fn into_inner(self) -> R {
        self.stream.into_inner()
    }
}

impl<R> std::fmt::Debug for FrameReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReader")
            .field("payload_len", &self.payload.len())
            .field("payload_capacity", &self.payload.capacity())
            .field("max_message_size", &self.max_message_size)
            .finish()
    }
}
