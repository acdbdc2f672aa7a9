//! Channel configuration.

use core::time::Duration;

/// Default message-size ceiling of an RPC channel (4 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Message-size ceiling used for engine channels (400 MiB).
///
/// Resource payloads can be far larger than the default allows.
pub const ENGINE_MAX_MESSAGE_SIZE: usize = 400 * 1024 * 1024;

/// Configuration applied when a channel is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Maximum size of a received message in bytes.
    pub max_recv_message_size: usize,
    /// Maximum size of a sent message in bytes.
    pub max_send_message_size: usize,
    /// Whether to use unauthenticated plaintext transport.
    pub plaintext: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            max_recv_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_send_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            plaintext: false,
        }
    }
}

impl ChannelConfig {
    /// Configuration for channels to a co-located engine.
    ///
    /// Raises both ceilings to [`ENGINE_MAX_MESSAGE_SIZE`] and uses plaintext.
    #[must_use]
    pub fn engine() -> Self {
        Self {
            max_recv_message_size: ENGINE_MAX_MESSAGE_SIZE,
            max_send_message_size: ENGINE_MAX_MESSAGE_SIZE,
            plaintext: true,
            ..Self::default()
        }
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the maximum receive message size.
    #[must_use]
    pub fn with_max_recv_message_size(mut self, size: usize) -> Self {
        self.max_recv_message_size = size;
        self
    }

    /// Sets the maximum send message size.
    #[must_use]
    pub fn with_max_send_message_size(mut self, size: usize) -> Self {
        self.max_send_message_size = size;
        self
    }

    /// Enables or disables plaintext transport.
    #[must_use]
    pub fn with_plaintext(mut self, plaintext: bool) -> Self {
        self.plaintext = plaintext;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_small_ceiling() {
        let config = ChannelConfig::default();
        assert_eq!(config.max_recv_message_size, 4_194_304);
        assert_eq!(config.max_send_message_size, 4_194_304);
        assert!(!config.plaintext);
    }

    #[test]
    fn engine_raises_ceiling_both_ways() {
        let config = ChannelConfig::engine();
        assert_eq!(config.max_recv_message_size, 419_430_400);
        assert_eq!(config.max_send_message_size, 419_430_400);
        assert!(config.plaintext);
    }

    #[test]
    fn builders_override_fields() {
        let config = ChannelConfig::engine()
            .with_max_recv_message_size(1024)
            .with_max_send_message_size(2048)
            .with_connect_timeout(Duration::from_millis(250))
            .with_plaintext(false);

        assert_eq!(config.max_recv_message_size, 1024);
        assert_eq!(config.max_send_message_size, 2048);
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert!(!config.plaintext);
    }
}
