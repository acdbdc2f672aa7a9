//! Custom and component resources.

use std::collections::BTreeMap;

use cirrus_output::{Output, ResourceId};
use serde_json::Value;

use crate::handle::{ResourceHandle, ResourceKind};

/// Anything that wraps a [`ResourceHandle`].
///
/// Implemented by [`CustomResource`], [`ComponentResource`] and
/// [`ProviderResource`](crate::ProviderResource), and by user types that wrap
/// one of them.
pub trait Resource: Send + Sync {
    /// Returns the underlying handle.
    fn handle(&self) -> &ResourceHandle;

    /// Returns the process-unique id of the resource.
    fn resource_id(&self) -> ResourceId {
        self.handle().id()
    }

    /// Returns the URN output.
    fn urn(&self) -> Output<String> {
        self.handle().urn()
    }

    /// Returns the type token.
    fn type_token(&self) -> &str {
        self.handle().type_token()
    }

    /// Returns the logical name.
    fn name(&self) -> &str {
        self.handle().name()
    }
}

impl Resource for ResourceHandle {
    fn handle(&self) -> &ResourceHandle {
        self
    }
}

/// A component resource that publishes outputs.
///
/// Concrete components list the outputs they expose; the registration engine
/// submits them as the component's final snapshot. The `urn` key is reserved
/// for the identity output and is never submitted.
///
/// ```
/// use std::collections::BTreeMap;
/// use cirrus_output::Output;
/// use cirrus_resource::{Component, ComponentResource, Resource, ResourceHandle};
/// use serde_json::Value;
///
/// struct Website {
///     base: ComponentResource,
///     endpoint: Output<Value>,
/// }
///
/// impl Resource for Website {
///     fn handle(&self) -> &ResourceHandle {
///         self.base.handle()
///     }
/// }
///
/// impl Component for Website {
///     fn output_properties(&self) -> BTreeMap<String, Output<Value>> {
///         BTreeMap::from([("endpoint".to_string(), self.endpoint.clone())])
///     }
/// }
///
/// let site = Website {
///     base: ComponentResource::new("acme:web:Website", "site"),
///     endpoint: Output::known(Value::from("https://example.com")),
/// };
/// assert_eq!(site.output_properties().len(), 1);
/// ```
pub trait Component: Resource {
    /// Returns the externally visible outputs by property name.
    fn output_properties(&self) -> BTreeMap<String, Output<Value>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// CustomResource
// ─────────────────────────────────────────────────────────────────────────────

/// A resource whose lifecycle is managed by a provider plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomResource {
    handle: ResourceHandle,
}

impl CustomResource {
    /// Declares a custom resource. Nothing is sent until it is registered.
    #[must_use]
    pub fn new(type_token: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            handle: ResourceHandle::new(ResourceKind::Custom, type_token, name),
        }
    }

    /// Returns the provider-assigned id.
    #[must_use]
    pub fn id(&self) -> Output<String> {
        self.handle.custom_id().unwrap_or_else(Output::unknown)
    }

    /// Returns the output property `name`.
    #[must_use]
    pub fn output(&self, name: &str) -> Output<Value> {
        self.handle.output(name)
    }
}

impl Resource for CustomResource {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ComponentResource
// ─────────────────────────────────────────────────────────────────────────────

/// A logical grouping of other resources.
///
/// Remote components are constructed by a provider plugin rather than in this
/// program; their outputs come back in the registration response and can be
/// read with [`output`](Self::output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentResource {
    handle: ResourceHandle,
}

impl ComponentResource {
    /// Declares a local component.
    #[must_use]
    pub fn new(type_token: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            handle: ResourceHandle::new(ResourceKind::Component, type_token, name),
        }
    }

    /// Declares a component constructed by its provider plugin.
    #[must_use]
    pub fn remote(type_token: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            handle: ResourceHandle::new_remote(type_token, name),
        }
    }

    /// Returns `true` for remote components.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.handle.is_remote()
    }

    /// Returns the output property `name` from the registration response.
    #[must_use]
    pub fn output(&self, name: &str) -> Output<Value> {
        self.handle.output(name)
    }
}

impl Resource for ComponentResource {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

impl Component for ComponentResource {
    fn output_properties(&self) -> BTreeMap<String, Output<Value>> {
        BTreeMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_resource_exposes_identity() {
        let bucket = CustomResource::new("aws:s3/bucket:Bucket", "logs");

        assert_eq!(bucket.type_token(), "aws:s3/bucket:Bucket");
        assert_eq!(bucket.name(), "logs");
        assert_eq!(bucket.handle().kind(), ResourceKind::Custom);
        assert_eq!(bucket.resource_id(), bucket.handle().id());
    }

    #[test]
    fn remote_component_keeps_kind() {
        let component = ComponentResource::remote("acme:index:Cluster", "c");

        assert!(component.is_remote());
        assert_eq!(component.handle().kind(), ResourceKind::Component);
        assert!(component.handle().custom_id().is_none());
        assert!(component.output_properties().is_empty());
    }

    #[test]
    fn clones_share_a_handle() {
        let bucket = CustomResource::new("aws:s3/bucket:Bucket", "logs");
        let copy = bucket.clone();
        assert_eq!(bucket, copy);
        assert_ne!(bucket, CustomResource::new("aws:s3/bucket:Bucket", "logs"));
    }
}
