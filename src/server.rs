//! Server builder and connection loop.
//!
//! The [`ServerBuilder`] provides a fluent API for configuring the reader
//! limits and the request handler. The [`Server`] manages the lifecycle:
//! 1. Bind or receive a TCP listener
//! 2. Accept connections, one task per connection
//! 3. Read frames and decode request headers
//! 4. Pass each request to the handler
//!
//! # Example
//!
//! ```ignore
//! use kafka_wire::{HandlerResult, RequestHeader, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .max_message_size(1 << 20)
//!         .handler(|header: &RequestHeader, _body| -> HandlerResult {
//!             println!("request {} from {}", header.correlation_id, header.client_id);
//!             Ok(())
//!         })
//!         .build()?;
//!
//!     server.listen_and_serve("127.0.0.1:9092").await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

use crate::config::{ReaderConfig, ServerConfig};
use crate::error::Result;
use crate::handler::{LogRequests, RequestHandler};
use crate::protocol::{FrameReader, RequestHeader};

/// Builder for configuring and creating a server.
pub struct ServerBuilder {
    config: ServerConfig,
    handler: Arc<dyn RequestHandler>,
}

impl ServerBuilder {
    /// Create a new server builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            handler: Arc::new(LogRequests),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the address used by [`Server::run`].
    ///
    /// Default: 127.0.0.1:9092
    pub fn listen_address(mut self, address: impl Into<String>) -> Self {
        self.config.listen_address = address.into();
        self
    }

    /// Set the maximum message size a peer may declare.
    ///
    /// 0 selects the default. Default: 16MB
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.reader.max_message_size = size;
        self
    }

    /// Set the capacity of each connection's buffered reader.
    ///
    /// 0 selects the default. Default: 64KB
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.reader.read_buffer_size = size;
        self
    }

    /// Set the request handler.
    ///
    /// Default: [`LogRequests`]
    pub fn handler<H: RequestHandler>(mut self, handler: H) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    /// Validate the configuration and build the server.
    pub fn build(self) -> Result<Server> {
        let config = self.config.validated()?;
        Ok(Server {
            listen_address: Arc::from(config.listen_address),
            reader: config.reader,
            handler: self.handler,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured server. Cheap to clone; clones share the handler.
#[derive(Clone)]
pub struct Server {
    listen_address: Arc<str>,
    reader: ReaderConfig,
    handler: Arc<dyn RequestHandler>,
}

impl Server {
    /// Create a new server builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Reader settings applied to every connection.
    pub fn reader_config(&self) -> &ReaderConfig {
        &self.reader
    }

    /// Configured listen address.
    pub fn listen_address(&self) -> &str {
        &self.listen_address
    }

    /// Bind the configured address and serve until the listener fails.
    pub async fn run(&self) -> Result<()> {
        let address = self.listen_address.clone();
        self.listen_and_serve(&address).await
    }

    /// Bind `address` and serve incoming connections.
    pub async fn listen_and_serve(&self, address: &str) -> Result<()> {
        let listener = TcpListener::bind(address).await?;
        self.serve(listener).await
    }

    /// Accept and serve connections until accepting fails.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        self.serve_with_shutdown(listener, std::future::pending())
            .await
    }

    /// Accept and serve connections until `shutdown` completes.
    ///
    /// Each connection runs in its own task and shares no state with the
    /// others. On shutdown the accept loop stops and the remaining
    /// connection tasks are aborted, which closes their streams.
    ///
    /// # Errors
    ///
    /// Returns the accept error that ended the loop. Connection errors are
    /// logged and never returned.
    pub async fn serve_with_shutdown<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if let Ok(address) = listener.local_addr() {
            tracing::info!("listening on {}", address);
        }

        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => break Ok(()),
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => break Err(e.into()),
                    };
                    let server = self.clone();
                    connections.spawn(async move { server.handle_client(stream, peer).await });
                }
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!("connection task panicked: {}", e);
                        }
                    }
                }
            }
        };

        tracing::info!(
            "shutting down, closing {} open connection(s)",
            connections.len()
        );
        connections.shutdown().await;
        result
    }

    async fn handle_client(&self, stream: TcpStream, peer: SocketAddr) {
        tracing::debug!("accepted connection from {}", peer);
        match self.serve_connection(stream).await {
            Ok(()) => tracing::debug!("connection from {} closed", peer),
            Err(e) => tracing::error!(
                "an unexpected error got returned while serving client {}: {}",
                peer,
                e
            ),
        }
    }

    /// Serve a single connection until it closes.
    ///
    /// Frames are read strictly in arrival order. For each frame the request
    /// header is decoded and the handler is called with the remaining body.
    /// The stream ending at a frame boundary returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns the first stream, size, decoding, or handler error, including
    /// a stream that ends inside a frame. Every one of them is fatal to the connection since frame boundaries cannot be
    /// recovered.
    pub async fn serve_connection<S>(&self, stream: S) -> Result<()>
    where
        S: AsyncRead + Unpin,
    {
        let mut reader = FrameReader::with_config(stream, &self.reader);

        loop {
            if reader.next_frame().await?.is_none() {
                return Ok(());
            }

            let mut cursor = reader.cursor();
            let header = RequestHeader::decode(&mut cursor)?;
            self.handler.handle(&header, cursor)?;
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("listen_address", &self.listen_address)
            .field("reader", &self.reader)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WireError;
    use crate::handler::HandlerResult;
    use crate::protocol::{build_frame, FieldCursor, DEFAULT_MAX_MESSAGE_SIZE};
    use bytes::BytesMut;
    use std::sync::Mutex;

    fn request_frame(header: &RequestHeader, body: &[u8]) -> Vec<u8> {
        let mut payload = BytesMut::new();
        header.encode(&mut payload).unwrap();
        payload.extend_from_slice(body);
        build_frame(&payload).unwrap().to_vec()
    }

    fn recording_server(seen: Arc<Mutex<Vec<(RequestHeader, Vec<u8>)>>>) -> Server {
        Server::builder()
            .handler(move |header: &RequestHeader, body: FieldCursor<'_>| -> HandlerResult {
                seen.lock()
                    .unwrap()
                    .push((header.clone(), body.rest().to_vec()));
                Ok(())
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let server = Server::builder().build().unwrap();
        assert_eq!(server.listen_address(), "127.0.0.1:9092");
        assert_eq!(server.reader_config().max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    }

    #[test]
    fn test_builder_configuration() {
        let server = Server::builder()
            .listen_address("0.0.0.0:19092")
            .max_message_size(1024)
            .read_buffer_size(512)
            .build()
            .unwrap();

        assert_eq!(server.listen_address(), "0.0.0.0:19092");
        assert_eq!(server.reader_config().max_message_size, 1024);
        assert_eq!(server.reader_config().read_buffer_size, 512);
    }

    #[test]
    fn test_builder_zero_means_default() {
        let server = Server::builder().max_message_size(0).build().unwrap();
        assert_eq!(server.reader_config().max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    }

    #[test]
    fn test_builder_rejects_oversized_max() {
        let err = Server::builder()
            .max_message_size(usize::MAX)
            .build()
            .unwrap_err();
        assert!(matches!(err, WireError::Config(_)));
    }

    #[tokio::test]
    async fn test_serve_connection_dispatches_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let server = recording_server(seen.clone());

        let mut bytes = request_frame(&RequestHeader::new(1, 2, 5, "ABC"), b"");
        bytes.extend(request_frame(&RequestHeader::new(3, 0, 6, "other"), b"body"));

        server.serve_connection(&bytes[..]).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, RequestHeader::new(1, 2, 5, "ABC"));
        assert!(seen[0].1.is_empty());
        assert_eq!(seen[1].0.correlation_id, 6);
        assert_eq!(seen[1].1, b"body");
    }

    #[tokio::test]
    async fn test_serve_connection_eof_at_boundary_is_clean() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let server = recording_server(seen.clone());

        let bytes = request_frame(&RequestHeader::new(1, 0, 1, "a"), b"");

        assert!(server.serve_connection(&bytes[..]).await.is_ok());
        let empty: &[u8] = &[];
        assert!(server.serve_connection(empty).await.is_ok());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_serve_connection_eof_mid_frame_is_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let server = recording_server(seen.clone());

        let mut bytes = request_frame(&RequestHeader::new(1, 0, 1, "a"), b"");
        bytes.extend_from_slice(&[0x00, 0x00]);
        let err = server.serve_connection(&bytes[..]).await.unwrap_err();
        assert!(err.is_eof());
        assert_eq!(seen.lock().unwrap().len(), 1);

        let truncated: [u8; 7] = [0x00, 0x00, 0x00, 0x64, 0x01, 0x02, 0x03];
        let err = server.serve_connection(&truncated[..]).await.unwrap_err();
        assert!(err.is_stream_error());
    }

    #[tokio::test]
    async fn test_serve_connection_size_exceeded() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let server = Server::builder()
            .max_message_size(8)
            .handler(move |header: &RequestHeader, _: FieldCursor<'_>| -> HandlerResult {
                seen.lock().unwrap().push(header.clone());
                Ok(())
            })
            .build()
            .unwrap();

        let bytes = request_frame(&RequestHeader::new(1, 0, 1, "client"), b"");
        let err = server.serve_connection(&bytes[..]).await.unwrap_err();

        assert_eq!(err.size_exceeded(), Some((17, 8)));
    }

    #[tokio::test]
    async fn test_serve_connection_truncated_header() {
        let server = Server::builder().build().unwrap();
        let bytes = build_frame(&[0x00, 0x01, 0x00]).unwrap();

        let err = server.serve_connection(&bytes[..]).await.unwrap_err();
        assert!(err.is_insufficient_data());
        assert_eq!(err.remaining(), Some(1));
    }

    #[tokio::test]
    async fn test_handler_error_ends_connection() {
        let calls = Arc::new(Mutex::new(0));
        let calls_clone = calls.clone();
        let server = Server::builder()
            .handler(move |_: &RequestHeader, mut body: FieldCursor<'_>| -> HandlerResult {
                *calls_clone.lock().unwrap() += 1;
                body.read_u32()?;
                Ok(())
            })
            .build()
            .unwrap();

        let mut bytes = request_frame(&RequestHeader::new(1, 0, 1, "a"), b"\x01");
        bytes.extend(request_frame(&RequestHeader::new(1, 0, 2, "a"), b"\x00\x00\x00\x01"));

        let err = server.serve_connection(&bytes[..]).await.unwrap_err();
        assert_eq!(err.remaining(), Some(1));
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
