//! Forward-only field cursor over a frame payload.
//!
//! A [`FieldCursor`] borrows the payload of the current frame and hands out
//! typed fields in wire order. It never copies: strings and byte fields are
//! returned as slices of the payload, so they cannot outlive the frame.
//!
//! A failed read leaves the cursor in an unspecified position. Callers must
//! abandon the rest of the frame.
//!
//! # Example
//!
//! ```
//! use kafka_wire::protocol::FieldCursor;
//!
//! let payload = [0x00, 0x01, 0x00, 0x02, 0x41, 0x42, 0x00];
//! let mut cursor = FieldCursor::new(&payload);
//!
//! assert_eq!(cursor.read_u16().unwrap(), 1);
//! assert_eq!(cursor.read_string().unwrap(), "AB");
//! assert!(cursor.is_empty());
//! ```

use bytes::Buf;

use crate::error::{Result, WireError};

/// Fixed-width Big Endian integer that can be read from a cursor.
pub trait FixedWidth: Sized {
    /// Number of bytes on the wire.
    const WIDTH: usize;

    /// Read the value from the front of `buf`.
    ///
    /// `buf` must hold at least `WIDTH` bytes.
    fn get(buf: &mut &[u8]) -> Self;
}

macro_rules! impl_fixed_width {
    ($($ty:ty => $get:ident),* $(,)?) => {
        $(
            impl FixedWidth for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn get(buf: &mut &[u8]) -> Self {
                    buf.$get()
                }
            }
        )*
    };
}

impl_fixed_width! {
    u8 => get_u8,
    u16 => get_u16,
    u32 => get_u32,
    u64 => get_u64,
    i16 => get_i16,
    i32 => get_i32,
    i64 => get_i64,
}

/// Cursor over the unread bytes of a frame payload.
#[derive(Debug, Clone, Copy)]
pub struct FieldCursor<'a> {
    /// Live window of unread bytes.
    buf: &'a [u8],
}

impl<'a> FieldCursor<'a> {
    /// Create a cursor positioned at the start of `payload`.
    pub fn new(payload: &'a [u8]) -> Self {
        Self { buf: payload }
    }

    /// Number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Check if every byte has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The unread bytes, without advancing.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        self.buf
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.len() < needed {
            return Err(WireError::InsufficientData {
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }

    /// Read a fixed-width Big Endian integer and advance past it.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` carrying the remaining byte count when
    /// fewer than `T::WIDTH` bytes are left. The cursor does not move.
    pub fn read_fixed<T: FixedWidth>(&mut self) -> Result<T> {
        self.ensure(T::WIDTH)?;
        Ok(T::get(&mut self.buf))
    }

    /// Read a 2-byte unsigned integer.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_fixed()
    }

    /// Read a 4-byte unsigned integer.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_fixed()
    }

    /// Read exactly `length` raw bytes.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        self.ensure(length)?;
        let (bytes, rest) = self.buf.split_at(length);
        self.buf = rest;
        Ok(bytes)
    }

    /// Read a length-prefixed, null-terminated string.
    ///
    /// The terminator is consumed but not validated or returned. An error
    /// from the 2-byte length read is returned unchanged.
    ///
    /// # Errors
    ///
    /// - `InsufficientData` if the string bytes or the terminator are missing.
    /// - `MalformedString` if the bytes are not UTF-8.
    pub fn read_string(&mut self) -> Result<&'a str> {
        let length = self.read_u16()? as usize;
        self.ensure(length + 1)?;

        let (bytes, rest) = self.buf.split_at(length);
        let value = std::str::from_utf8(bytes)?;
        // Skip the terminator without checking its value
        self.buf = &rest[1..];
        Ok(value)
    }
}
