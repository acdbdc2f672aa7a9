//! Shared pool of monitor channels.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::channel::{Channel, Connector, HttpConnector};
use crate::config::ChannelConfig;
use crate::error::TransportError;

/// Pool of open channels keyed by monitor address.
///
/// The pool is created once when the program starts and passed to every
/// [`ResourceMonitorClient`](crate::ResourceMonitorClient). Clients asking for
/// the same address string share one channel; each distinct address gets its
/// own. Lookup and insertion happen under a single lock, so two clients racing
/// on a new address still end up with one channel.
///
/// ```
/// use cirrus_monitor::ChannelPool;
///
/// let pool = ChannelPool::http();
/// let a = pool.channel("127.0.0.1:50051").unwrap();
/// let b = pool.channel("127.0.0.1:50051").unwrap();
///
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// assert_eq!(pool.len(), 1);
/// ```
pub struct ChannelPool {
    connector: Arc<dyn Connector>,
    config: ChannelConfig,
    // `None` once the pool has been shut down.
    channels: Mutex<Option<HashMap<String, Arc<dyn Channel>>>>,
}

impl core::fmt::Debug for ChannelPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChannelPool")
            .field("config", &self.config)
            .field("addresses", &self.addresses())
            .finish_non_exhaustive()
    }
}

impl ChannelPool {
    /// Creates an empty pool that opens channels with `connector`.
    ///
    /// Channels use [`ChannelConfig::engine`] unless overridden with
    /// [`with_config`](Self::with_config).
    #[must_use]
    pub fn new<C: Connector>(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            config: ChannelConfig::engine(),
            channels: Mutex::new(Some(HashMap::new())),
        }
    }

    /// Creates an empty pool of HTTP/2 channels.
    #[must_use]
    pub fn http() -> Self {
        Self::new(HttpConnector)
    }

    /// Sets the configuration applied to newly opened channels.
    #[must_use]
    pub fn with_config(mut self, config: ChannelConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configuration applied to newly opened channels.
    #[must_use]
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Returns the channel for `address`, opening it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::PoolClosed`] after [`shutdown`](Self::shutdown),
    /// or the connector's error if the channel cannot be opened.
    pub fn channel(&self, address: &str) -> Result<Arc<dyn Channel>, TransportError> {
        let mut guard = self.channels.lock();
        let channels = guard.as_mut().ok_or(TransportError::PoolClosed)?;

        if let Some(channel) = channels.get(address) {
            return Ok(Arc::clone(channel));
        }

        let channel = self.connector.connect(address, &self.config)?;
        tracing::debug!(
            address,
            max_send = self.config.max_send_message_size,
            max_recv = self.config.max_recv_message_size,
            plaintext = self.config.plaintext,
            "opened monitor channel"
        );
        channels.insert(address.to_string(), Arc::clone(&channel));
        Ok(channel)
    }

    /// Returns `true` if a channel to `address` is open.
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.channels
            .lock()
            .as_ref()
            .is_some_and(|channels| channels.contains_key(address))
    }

    /// Returns the number of open channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.lock().as_ref().map_or(0, HashMap::len)
    }

    /// Returns `true` if no channel is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lists the addresses with an open channel.
    #[must_use]
    pub fn addresses(&self) -> Vec<String> {
        self.channels
            .lock()
            .as_ref()
            .map(|channels| channels.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Closes the pool and drops every channel it holds.
    ///
    /// Clients created earlier keep their channel alive until they are
    /// dropped; new lookups fail with [`TransportError::PoolClosed`].
    pub fn shutdown(&self) {
        if let Some(channels) = self.channels.lock().take() {
            tracing::debug!(channels = channels.len(), "channel pool shut down");
        }
    }

    /// Returns `true` once the pool has been shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.channels.lock().is_none()
    }
}
