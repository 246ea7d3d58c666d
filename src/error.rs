//! Error types for kafka-wire.
//!
//! Errors fall into three protocol-relevant kinds (see [`ErrorKind`]):
//! stream failures from the underlying transport, size violations detected
//! from a frame's length prefix, and insufficient data while decoding fields
//! from a frame. They are never retried or logged by the framing core.

use thiserror::Error;

/// Main error type for all kafka-wire operations.
#[derive(Debug, Error)]
pub enum WireError {
    /// I/O error from the underlying byte stream, passed through unmodified.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame declared a length above the configured maximum.
    #[error("message size {size}, bigger than maximum allowed message size {max}")]
    MessageSizeExceeded { size: usize, max: usize },

    /// A field read needed more bytes than remain in the current frame.
    #[error("insufficient data: {remaining} bytes remaining")]
    InsufficientData { remaining: usize },

    /// A string field does not hold valid UTF-8.
    #[error("malformed string: {0}")]
    MalformedString(#[from] std::str::Utf8Error),

    /// A string is too long to carry a 2-byte length prefix.
    #[error("string of {length} bytes exceeds the 2-byte length prefix")]
    StringTooLong { length: usize },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// JSON configuration could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of a [`WireError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure or orderly close. Fatal to the connection.
    Stream,
    /// Declared frame length above the maximum. Fatal to the connection.
    SizeExceeded,
    /// Field read past the end of the frame. Fatal to the frame.
    InsufficientData,
    /// Field bytes that cannot represent the requested type.
    Malformed,
    /// Configuration or encoding misuse on the local side.
    Usage,
}

impl WireError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WireError::Io(_) => ErrorKind::Stream,
            WireError::MessageSizeExceeded { .. } => ErrorKind::SizeExceeded,
            WireError::InsufficientData { .. } => ErrorKind::InsufficientData,
            WireError::MalformedString(_) => ErrorKind::Malformed,
            WireError::StringTooLong { .. } | WireError::Config(_) | WireError::Json(_) => {
                ErrorKind::Usage
            }
        }
    }

    /// Check if this is a stream (transport) error.
    #[inline]
    pub fn is_stream_error(&self) -> bool {
        self.kind() == ErrorKind::Stream
    }

    /// Check if the stream ended before a read could be completed.
    pub fn is_eof(&self) -> bool {
        matches!(self, WireError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }

    /// Check if this is a size-exceeded error.
    #[inline]
    pub fn is_size_exceeded(&self) -> bool {
        self.kind() == ErrorKind::SizeExceeded
    }

    /// Check if this is an insufficient-data error.
    #[inline]
    pub fn is_insufficient_data(&self) -> bool {
        self.kind() == ErrorKind::InsufficientData
    }

    /// Declared size and configured maximum, if this is a size-exceeded error.
    pub fn size_exceeded(&self) -> Option<(usize, usize)> {
        match self {
            WireError::MessageSizeExceeded { size, max } => Some((*size, *max)),
            _ => None,
        }
    }

    /// Remaining byte count, if this is an insufficient-data error.
    pub fn remaining(&self) -> Option<usize> {
        match self {
            WireError::InsufficientData { remaining } => Some(*remaining),
            _ => None,
        }
    }
}

/// Result type alias using WireError.
pub type Result<T> = std::result::Result<T, WireError>;
