//! Reader and server configuration.
//!
//! Zero values mean "use the default" and are replaced by [`ReaderConfig::normalized`]
//! before a reader is constructed. Configurations can be loaded from JSON:
//!
//! ```
//! use kafka_wire::config::ServerConfig;
//!
//! let config = ServerConfig::from_json_str(
//!     r#"{ "listen_address": "0.0.0.0:9092", "reader": { "max_message_size": 1048576 } }"#,
//! )
//! .unwrap();
//! assert_eq!(config.reader.max_message_size, 1_048_576);
//! assert_eq!(config.reader.read_buffer_size, 64 * 1024);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WireError};
use crate::protocol::{
    ABSOLUTE_MAX_MESSAGE_SIZE, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_READ_BUFFER_SIZE,
};

/// Default address the server listens on.
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:9092";

/// Configuration for a frame reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Largest payload a peer may declare, in bytes.
    pub max_message_size: usize,
    /// Capacity of the buffered stream reader.
    pub read_buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl ReaderConfig {
    /// Replace zero values with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.max_message_size == 0 {
            self.max_message_size = DEFAULT_MAX_MESSAGE_SIZE;
        }
        if self.read_buffer_size == 0 {
            self.read_buffer_size = DEFAULT_READ_BUFFER_SIZE;
        }
        self
    }

    /// Validate a normalized configuration.
    ///
    /// Checks:
    /// - Maximum message size is not above `i32::MAX`
    pub fn validate(&self) -> Result<()> {
        if self.max_message_size > ABSOLUTE_MAX_MESSAGE_SIZE {
            return Err(WireError::Config(format!(
                "max_message_size {} exceeds absolute maximum {}",
                self.max_message_size, ABSOLUTE_MAX_MESSAGE_SIZE
            )));
        }
        Ok(())
    }
}

/// Configuration for [`Server`](crate::Server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `127.0.0.1:9092`.
    pub listen_address: String,
    /// Per-connection reader settings.
    pub reader: ReaderConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            reader: ReaderConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a configuration from JSON text. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Normalize the reader settings and validate the result.
    pub fn validated(mut self) -> Result<Self> {
        if self.listen_address.is_empty() {
            self.listen_address = DEFAULT_LISTEN_ADDRESS.to_string();
        }
        self.reader = self.reader.normalized();
        self.reader.validate()?;
        Ok(self)
    }
}
