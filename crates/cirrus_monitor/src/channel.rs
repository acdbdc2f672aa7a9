//! Channels to the resource monitor.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::config::ChannelConfig;
use crate::error::{Direction, TransportError, check_size};

/// RPC service implemented by the engine's resource monitor.
pub(crate) const SERVICE: &str = "pulumirpc.ResourceMonitor";

/// An open connection to a resource monitor.
///
/// A channel moves encoded messages and nothing else: it does not interpret
/// payloads and does not retry. Implementations must be safe to share between
/// many clients.
#[async_trait]
pub trait Channel: Send + Sync + 'static {
    /// The address this channel is connected to.
    fn address(&self) -> &str;

    /// Sends one unary request for `method` and waits for the response bytes.
    async fn unary(&self, method: &str, payload: Vec<u8>) -> Result<Vec<u8>, TransportError>;
}

/// Opens channels for a [`ChannelPool`](crate::ChannelPool).
pub trait Connector: Send + Sync + 'static {
    /// Opens a new channel to `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is malformed or the channel cannot be
    /// created.
    fn connect(
        &self,
        address: &str,
        config: &ChannelConfig,
    ) -> Result<Arc<dyn Channel>, TransportError>;
}

/// Connector producing HTTP/2 channels.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn connect(
        &self,
        address: &str,
        config: &ChannelConfig,
    ) -> Result<Arc<dyn Channel>, TransportError> {
        Ok(Arc::new(HttpChannel::open(address, config)?))
    }
}

/// HTTP/2 channel to a resource monitor.
///
/// Requests are posted to `/{service}/{method}` on the monitor address. With
/// a plaintext config the channel speaks cleartext HTTP/2 with prior
/// knowledge, which is what a co-located engine expects.
#[derive(Clone)]
pub struct HttpChannel {
    client: reqwest::Client,
    address: String,
    base_url: String,
    max_recv_message_size: usize,
}

impl HttpChannel {
    /// Opens a channel to `address` (`host:port`, no scheme).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidAddress`] for a malformed address and
    /// [`TransportError::Connection`] if the HTTP client cannot be built.
    pub fn open(address: &str, config: &ChannelConfig) -> Result<Self, TransportError> {
        validate_address(address)?;

        let client = reqwest::Client::builder()
            .http2_prior_knowledge()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| TransportError::Connection(err.to_string()))?;

        let scheme = if config.plaintext { "http" } else { "https" };

        Ok(Self {
            client,
            address: address.to_string(),
            base_url: format!("{scheme}://{address}"),
            max_recv_message_size: config.max_recv_message_size,
        })
    }
}

#[async_trait]
impl Channel for HttpChannel {
    fn address(&self) -> &str {
        &self.address
    }

    async fn unary(&self, method: &str, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}/{SERVICE}/{method}", self.base_url);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut response = self
            .client
            .post(&url)
            .headers(headers)
            .body(payload)
            .send()
            .await
            .map_err(|err| TransportError::Connection(err.to_string()))?;

        let status = response.status();
        let mut body = BodyLimit::new(response.content_length(), self.max_recv_message_size)?;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| TransportError::Connection(err.to_string()))?
        {
            body.push(&chunk)?;
        }
        let body = body.into_inner();

        if !status.is_success() {
            return Err(TransportError::Status {
                method: method.to_string(),
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body)
    }
}

/// Response body buffer that refuses to grow past the receive ceiling.
#[derive(Debug)]
struct BodyLimit {
    limit: usize,
    body: Vec<u8>,
}

impl BodyLimit {
    /// Checks the declared length, if the server sent one, up front.
    fn new(declared: Option<u64>, limit: usize) -> Result<Self, TransportError> {
        if let Some(declared) = declared {
            let size = usize::try_from(declared).unwrap_or(usize::MAX);
            check_size(Direction::Receive, size, limit)?;
        }
        Ok(Self {
            limit,
            body: Vec::new(),
        })
    }

    fn push(&mut self, chunk: &[u8]) -> Result<(), TransportError> {
        let size = self.body.len().saturating_add(chunk.len());
        check_size(Direction::Receive, size, self.limit)?;
        self.body.extend_from_slice(chunk);
        Ok(())
    }

    fn into_inner(self) -> Vec<u8> {
        self.body
    }
}

impl core::fmt::Debug for HttpChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HttpChannel")
            .field("address", &self.address)
            .field("base_url", &self.base_url)
            .field("max_recv_message_size", &self.max_recv_message_size)
            .finish()
    }
}

fn validate_address(address: &str) -> Result<(), TransportError> {
    let invalid = |reason: &str| TransportError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    if address.trim().is_empty() {
        return Err(invalid("address is empty"));
    }
    if address.contains("://") {
        return Err(invalid("expected host:port without a scheme"));
    }
    if address.chars().any(char::is_whitespace) {
        return Err(invalid("address contains whitespace"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_address() {
        let err = HttpChannel::open("", &ChannelConfig::engine()).unwrap_err();
        assert!(matches!(err, TransportError::InvalidAddress { .. }));
    }

    #[test]
    fn rejects_address_with_scheme() {
        let err = HttpChannel::open("http://localhost:1", &ChannelConfig::engine()).unwrap_err();
        assert!(matches!(err, TransportError::InvalidAddress { .. }));
    }

    #[test]
    fn plaintext_config_uses_http_scheme() {
        let channel = HttpChannel::open("127.0.0.1:50051", &ChannelConfig::engine()).unwrap();
        assert_eq!(channel.base_url, "http://127.0.0.1:50051");
        assert_eq!(channel.address(), "127.0.0.1:50051");
    }

    #[test]
    fn declared_length_over_the_ceiling_is_rejected() {
        let err = BodyLimit::new(Some(1025), 1024).unwrap_err();
        assert!(matches!(
            err,
            TransportError::MessageTooLarge {
                direction: Direction::Receive,
                size: 1025,
                limit: 1024,
            }
        ));
    }

    #[test]
    fn streamed_body_stops_at_the_ceiling() {
        let mut body = BodyLimit::new(None, 8).unwrap();
        body.push(b"12345").unwrap();

        let err = body.push(b"6789").unwrap_err();
        assert!(matches!(err, TransportError::MessageTooLarge { size: 9, limit: 8, .. }));
        assert_eq!(body.into_inner(), b"12345");
    }

    #[test]
    fn body_within_the_ceiling_is_kept() {
        let mut body = BodyLimit::new(Some(8), 8).unwrap();
        body.push(b"1234").unwrap();
        body.push(b"5678").unwrap();
        assert_eq!(body.into_inner(), b"12345678");
    }

    #[test]
    fn channel_keeps_the_receive_ceiling() {
        let config = ChannelConfig::engine().with_max_recv_message_size(64);
        let channel = HttpChannel::open("127.0.0.1:50051", &config).unwrap();
        assert_eq!(channel.max_recv_message_size, 64);
    }

    #[test]
    fn secure_config_uses_https_scheme() {
        let channel = HttpChannel::open("localhost:443", &ChannelConfig::default()).unwrap();
        assert_eq!(channel.base_url, "https://localhost:443");
    }
}
