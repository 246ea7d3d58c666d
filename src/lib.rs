//! # kafka-wire
//!
//! Wire-protocol front end for length-prefixed, request/response protocols
//! in the style of Kafka's binary protocol.
//!
//! ## Architecture
//!
//! - **Frame reader**: reads `[u32 BE length][payload]` frames into a buffer
//!   reused for the lifetime of a connection, rejecting oversized lengths
//!   before allocating
//! - **Field cursor**: typed, forward-only reads over the current payload
//! - **Server**: one tokio task per connection, decoding request headers
//!   and passing them to a [`RequestHandler`]
//!
//! ## Example
//!
//! ```ignore
//! use kafka_wire::Server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::builder()
//!         .max_message_size(1 << 20)
//!         .build()
//!         .unwrap();
//!
//!     server.listen_and_serve("127.0.0.1:9092").await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod protocol;

mod server;

pub use error::{ErrorKind, Result, WireError};
pub use handler::{HandlerResult, LogRequests, RequestHandler};
pub use protocol::{FieldCursor, FrameReader, RequestHeader};
pub use server::{Server, ServerBuilder};
