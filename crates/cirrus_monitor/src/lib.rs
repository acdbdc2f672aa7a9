//! Resource monitor transport for cirrus.
//!
//! The deployment engine runs as a separate process and exposes a
//! *resource monitor* service on a local address. This crate is the thin
//! layer between the runtime and that service:
//!
//! - [`ChannelPool`] owns one open [`Channel`] per monitor address. It is
//!   constructed once at start-up and handed to every client.
//! - [`ResourceMonitorClient`] implements the six monitor RPCs of the
//!   [`ResourceMonitor`] trait on top of a pooled channel, with no retries.
//! - [`types`] holds the request and response messages.
//!
//! Channels are opened with [`ChannelConfig::engine`], which raises the
//! message-size ceiling from the 4 MiB default to 400 MiB in both directions
//! and uses plaintext transport, since the engine and the program share a
//! trusted host.
//!
//! # Example
//!
//! ```no_run
//! use cirrus_monitor::{ChannelPool, ResourceMonitor, ResourceMonitorClient};
//! use cirrus_monitor::types::SupportsFeatureRequest;
//!
//! # async fn run() -> Result<(), cirrus_monitor::TransportError> {
//! let pool = ChannelPool::http();
//! let monitor = ResourceMonitorClient::new("127.0.0.1:50051", &pool)?;
//!
//! let response = monitor
//!     .supports_feature(SupportsFeatureRequest::new("secrets"))
//!     .await?;
//! println!("secrets supported: {}", response.has_support);
//! # Ok(())
//! # }
//! ```

mod channel;
mod client;
mod config;
pub mod error;
mod monitor;
mod pool;
pub mod types;

pub use channel::{Channel, Connector, HttpChannel, HttpConnector};
pub use client::ResourceMonitorClient;
pub use config::{ChannelConfig, DEFAULT_MAX_MESSAGE_SIZE, ENGINE_MAX_MESSAGE_SIZE};
pub use error::{Direction, TransportError};
pub use monitor::ResourceMonitor;
pub use pool::ChannelPool;
