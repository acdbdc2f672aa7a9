//! The [`ResourceMonitor`] trait.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::types::{
    CallRequest, CallResponse, InvokeResponse, ReadResourceRequest, ReadResourceResponse,
    RegisterResourceOutputsRequest, RegisterResourceRequest, RegisterResourceResponse,
    ResourceInvokeRequest, SupportsFeatureRequest, SupportsFeatureResponse,
};

/// The RPC surface of the engine's resource monitor.
///
/// [`ResourceMonitorClient`](crate::ResourceMonitorClient) implements it over
/// a pooled channel. Each method is one remote call with no retry; failures
/// are returned as-is.
#[async_trait]
pub trait ResourceMonitor: Send + Sync + 'static {
    /// Queries whether the engine supports a capability.
    async fn supports_feature(
        &self,
        request: SupportsFeatureRequest,
    ) -> Result<SupportsFeatureResponse, TransportError>;

    /// Invokes a provider function.
    async fn invoke(&self, request: ResourceInvokeRequest)
    -> Result<InvokeResponse, TransportError>;

    /// Calls a provider method associated with a resource.
    async fn call(&self, request: CallRequest) -> Result<CallResponse, TransportError>;

    /// Reads an existing resource by id.
    async fn read_resource(
        &self,
        request: ReadResourceRequest,
    ) -> Result<ReadResourceResponse, TransportError>;

    /// Declares a resource, creating or updating it as needed.
    async fn register_resource(
        &self,
        request: RegisterResourceRequest,
    ) -> Result<RegisterResourceResponse, TransportError>;

    /// Submits the final outputs of a component resource.
    async fn register_resource_outputs(
        &self,
        request: RegisterResourceOutputsRequest,
    ) -> Result<(), TransportError>;
}
