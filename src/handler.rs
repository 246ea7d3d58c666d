//! Request handlers invoked once per decoded frame.
//!
//! A handler receives the decoded [`RequestHeader`] and a cursor positioned
//! at the request body. The cursor borrows the connection's frame buffer,
//! so anything the handler wants to keep must be copied out.
//!
//! Closures implement [`RequestHandler`] directly:
//!
//! ```
//! use kafka_wire::handler::{HandlerResult, RequestHandler};
//! use kafka_wire::protocol::{FieldCursor, RequestHeader};
//!
//! let handler = |header: &RequestHeader, _body: FieldCursor<'_>| -> HandlerResult {
//!     assert_eq!(header.key, 3);
//!     Ok(())
//! };
//!
//! let header = RequestHeader::new(3, 0, 1, "client");
//! handler.handle(&header, FieldCursor::new(&[])).unwrap();
//! ```

use crate::error::Result;
use crate::protocol::{FieldCursor, RequestHeader};

/// Result type for handler functions.
pub type HandlerResult = Result<()>;

/// Trait for request handlers.
///
/// Returning an error ends the connection the request arrived on.
pub trait RequestHandler: Send + Sync + 'static {
    /// Handle one request.
    fn handle(&self, header: &RequestHeader, body: FieldCursor<'_>) -> HandlerResult;
}

impl<F> RequestHandler for F
where
    F: Fn(&RequestHeader, FieldCursor<'_>) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, header: &RequestHeader, body: FieldCursor<'_>) -> HandlerResult {
        self(header, body)
    }
}

/// Default handler: logs every request header at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRequests;

impl RequestHandler for LogRequests {
    fn handle(&self, header: &RequestHeader, body: FieldCursor<'_>) -> HandlerResult {
        tracing::debug!(
            key = header.key,
            version = header.version,
            correlation_id = header.correlation_id,
            client_id = %header.client_id,
            body_len = body.remaining(),
            "incoming request"
        );
        Ok(())
    }
}
