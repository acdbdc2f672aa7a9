//! Resource monitor client.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};

use crate::channel::Channel;
use crate::config::ChannelConfig;
use crate::error::{Direction, TransportError, check_size};
use crate::monitor::ResourceMonitor;
use crate::pool::ChannelPool;
use crate::types::{
    CallRequest, CallResponse, InvokeResponse, ReadResourceRequest, ReadResourceResponse,
    RegisterResourceOutputsRequest, RegisterResourceRequest, RegisterResourceResponse,
    ResourceInvokeRequest, SupportsFeatureRequest, SupportsFeatureResponse,
};

/// Client for the engine's resource monitor.
///
/// Construction looks the address up in the [`ChannelPool`]; clients for the
/// same address share a channel. Every RPC is a single unary call. The client
/// enforces the pool's message-size ceilings and otherwise passes errors
/// through untouched.
#[derive(Clone)]
pub struct ResourceMonitorClient {
    address: String,
    channel: Arc<dyn Channel>,
    config: ChannelConfig,
}

impl core::fmt::Debug for ResourceMonitorClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourceMonitorClient")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl ResourceMonitorClient {
    /// Creates a client for the monitor at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool is closed or the channel cannot be opened.
    pub fn new(address: impl Into<String>, pool: &ChannelPool) -> Result<Self, TransportError> {
        let address = address.into();
        let channel = pool.channel(&address)?;
        Ok(Self {
            address,
            channel,
            config: pool.config().clone(),
        })
    }

    /// Returns the monitor address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns `true` if both clients use the same underlying channel.
    #[must_use]
    pub fn shares_channel_with(&self, other: &ResourceMonitorClient) -> bool {
        Arc::ptr_eq(&self.channel, &other.channel)
    }

    async fn unary<Req, Resp>(
        &self,
        method: &'static str,
        request: &Req,
    ) -> Result<Resp, TransportError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(request).map_err(TransportError::Encode)?;
        check_size(Direction::Send, payload.len(), self.config.max_send_message_size)?;

        tracing::trace!(method, bytes = payload.len(), "monitor request");
        let response = self.channel.unary(method, payload).await?;
        check_size(Direction::Receive, response.len(), self.config.max_recv_message_size)?;

        serde_json::from_slice(&response).map_err(TransportError::Decode)
    }
}

#[async_trait]
impl ResourceMonitor for ResourceMonitorClient {
    async fn supports_feature(
        &self,
        request: SupportsFeatureRequest,
    ) -> Result<SupportsFeatureResponse, TransportError> {
        self.unary("SupportsFeature", &request).await
    }

    async fn invoke(
        &self,
        request: ResourceInvokeRequest,
    ) -> Result<InvokeResponse, TransportError> {
        self.unary("Invoke", &request).await
    }

    async fn call(&self, request: CallRequest) -> Result<CallResponse, TransportError> {
        self.unary("Call", &request).await
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequest,
    ) -> Result<ReadResourceResponse, TransportError> {
        self.unary("ReadResource", &request).await
    }

    async fn register_resource(
        &self,
        request: RegisterResourceRequest,
    ) -> Result<RegisterResourceResponse, TransportError> {
        self.unary("RegisterResource", &request).await
    }

    async fn register_resource_outputs(
        &self,
        request: RegisterResourceOutputsRequest,
    ) -> Result<(), TransportError> {
        let _: IgnoredAny = self.unary("RegisterResourceOutputs", &request).await?;
        Ok(())
    }
}
