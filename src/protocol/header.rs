//! Request header carried at the start of every request payload.
//!
//! ```text
//! ┌─────────┬─────────┬─────────────┬───────────────────────────┐
//! │ Key     │ Version │ Correlation │ Client ID                 │
//! │ 2 bytes │ 2 bytes │ 4 bytes     │ uint16 len + bytes + 0x00 │
//! └─────────┴─────────┴─────────────┴───────────────────────────┘
//! ```

use bytes::{BufMut, BytesMut};

use super::cursor::FieldCursor;
use super::wire_format::put_string;
use crate::error::Result;

/// Decoded request header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestHeader {
    /// API key identifying the request type.
    pub key: u16,
    /// API version of the request.
    pub version: u16,
    /// Identifier echoed back in the matching response.
    pub correlation_id: u32,
    /// Client-supplied identifier (owned copy of the payload bytes).
    pub client_id: String,
}

impl RequestHeader {
    /// Create a new header.
    pub fn new(key: u16, version: u16, correlation_id: u32, client_id: impl Into<String>) -> Self {
        Self {
            key,
            version,
            correlation_id,
            client_id: client_id.into(),
        }
    }

    /// Decode a header from the front of `cursor`, in wire order.
    ///
    /// On success the cursor is left at the first byte of the request body.
    ///
    /// # Example
    ///
    /// ```
    /// use kafka_wire::protocol::{FieldCursor, RequestHeader};
    ///
    /// let payload = [0, 1, 0, 2, 0, 0, 0, 5, 0, 3, b'A', b'B', b'C', 0];
    /// let mut cursor = FieldCursor::new(&payload);
    /// let header = RequestHeader::decode(&mut cursor).unwrap();
    ///
    /// assert_eq!(header, RequestHeader::new(1, 2, 5, "ABC"));
    /// assert!(cursor.is_empty());
    /// ```
    pub fn decode(cursor: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            key: cursor.read_u16()?,
            version: cursor.read_u16()?,
            correlation_id: cursor.read_u32()?,
            client_id: cursor.read_string()?.to_owned(),
        })
    }

    /// Append the encoded header to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u16(self.key);
        buf.put_u16(self.version);
        buf.put_u32(self.correlation_id);
        put_string(buf, &self.client_id)
    }

    /// Encoded size in bytes.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        2 + 2 + 4 + 2 + self.client_id.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{build_frame, FrameReader};

    #[test]
    fn test_encode_layout() {
        let header = RequestHeader::new(1, 2, 5, "ABC");
        let mut buf = BytesMut::new();
        header.encode(&mut buf).unwrap();

        assert_eq!(
            &buf[..],
            &[0x00, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x05, 0x00, 0x03, 0x41, 0x42, 0x43, 0x00]
        );
        assert_eq!(buf.len(), header.encoded_len());
    }

    #[test]
    fn test_decode_leaves_body() {
        let header = RequestHeader::new(18, 3, 0xDEAD_BEEF, "consumer-1");
        let mut buf = BytesMut::new();
        header.encode(&mut buf).unwrap();
        buf.extend_from_slice(b"body");

        let mut cursor = FieldCursor::new(&buf);
        assert_eq!(RequestHeader::decode(&mut cursor).unwrap(), header);
        assert_eq!(cursor.rest(), b"body");
    }

    #[test]
    fn test_decode_truncated_fields() {
        // Stops inside the correlation id
        let mut cursor = FieldCursor::new(&[0, 1, 0, 2, 0, 0]);
        let err = RequestHeader::decode(&mut cursor).unwrap_err();
        assert_eq!(err.remaining(), Some(2));

        // Stops after the client id length
        let mut cursor = FieldCursor::new(&[0, 1, 0, 2, 0, 0, 0, 5, 0, 3]);
        let err = RequestHeader::decode(&mut cursor).unwrap_err();
        assert_eq!(err.remaining(), Some(0));
    }

    #[tokio::test]
    async fn test_decode_from_frame() {
        let bytes: [u8; 18] = [
            0x00, 0x00, 0x00, 0x0E, 0x00, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x05, 0x00, 0x03,
            0x41, 0x42, 0x43, 0x00,
        ];
        let mut reader = FrameReader::new(&bytes[..]);
        reader.read_frame().await.unwrap();

        let mut cursor = reader.cursor();
        let header = RequestHeader::decode(&mut cursor).unwrap();

        assert_eq!(header.key, 1);
        assert_eq!(header.version, 2);
        assert_eq!(header.correlation_id, 5);
        assert_eq!(header.client_id, "ABC");
        assert_eq!(cursor.remaining(), 0);
    }

    #[tokio::test]
    async fn test_short_declared_length_cuts_client_id() {
        let bytes: [u8; 18] = [
            0x00, 0x00, 0x00, 0x0A, 0x00, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x05, 0x00, 0x03,
            0x41, 0x42, 0x43, 0x00,
        ];
        let mut reader = FrameReader::new(&bytes[..]);
        reader.read_frame().await.unwrap();

        let err = RequestHeader::decode(&mut reader.cursor()).unwrap_err();
        assert!(err.is_insufficient_data());
        assert_eq!(err.remaining(), Some(0));
    }

    #[tokio::test]
    async fn test_header_survives_next_frame() {
        let mut bytes = Vec::new();
        for (i, client) in ["alpha", "b"].iter().enumerate() {
            let mut payload = BytesMut::new();
            RequestHeader::new(i as u16, 0, i as u32, *client)
                .encode(&mut payload)
                .unwrap();
            bytes.extend_from_slice(&build_frame(&payload).unwrap());
        }

        let mut reader = FrameReader::new(&bytes[..]);
        reader.read_frame().await.unwrap();
        let first = RequestHeader::decode(&mut reader.cursor()).unwrap();

        reader.read_frame().await.unwrap();
        let second = RequestHeader::decode(&mut reader.cursor()).unwrap();

        // The owned client id is unaffected by buffer reuse
        assert_eq!(first.client_id, "alpha");
        assert_eq!(second.client_id, "b");
    }
}
