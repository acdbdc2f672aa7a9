//! Options controlling how a resource is registered.

use core::time::Duration;
use std::collections::BTreeMap;

use cirrus_output::ResourceId;

use crate::handle::ResourceHandle;
use crate::provider::ProviderResource;
use crate::resource::Resource;

/// Per-operation timeouts for a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomTimeouts {
    /// Timeout for create.
    pub create: Option<Duration>,
    /// Timeout for update.
    pub update: Option<Duration>,
    /// Timeout for delete.
    pub delete: Option<Duration>,
}

impl CustomTimeouts {
    /// Creates an empty set of timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the create timeout.
    #[must_use]
    pub fn with_create(mut self, timeout: Duration) -> Self {
        self.create = Some(timeout);
        self
    }

    /// Sets the update timeout.
    #[must_use]
    pub fn with_update(mut self, timeout: Duration) -> Self {
        self.update = Some(timeout);
        self
    }

    /// Sets the delete timeout.
    #[must_use]
    pub fn with_delete(mut self, timeout: Duration) -> Self {
        self.delete = Some(timeout);
        self
    }
}

/// Options for a single resource registration.
///
/// # Example
///
/// ```
/// use cirrus_resource::{CustomResource, ProviderResource, ResourceOptions};
///
/// let provider = ProviderResource::new("aws", "west");
/// let network = CustomResource::new("aws:ec2/vpc:Vpc", "net");
///
/// let options = ResourceOptions::new()
///     .with_provider(&provider)
///     .depends_on(&network)
///     .with_protect(true);
///
/// assert!(options.protect);
/// assert_eq!(options.depends_on.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    /// Parent resource, looked up in the registry by id.
    pub parent: Option<ResourceId>,
    /// Resources that must finish registering first.
    pub depends_on: Vec<ResourceHandle>,
    /// Whether deletion is forbidden.
    pub protect: bool,
    /// Provider managing a custom resource.
    pub provider: Option<ProviderResource>,
    /// Providers by package for a component's children.
    pub providers: BTreeMap<String, ProviderResource>,
    /// Previous URNs of this resource.
    pub aliases: Vec<String>,
    /// Per-operation timeouts.
    pub custom_timeouts: Option<CustomTimeouts>,
    /// Provider plugin version.
    pub version: Option<String>,
    /// Properties whose changes are ignored.
    pub ignore_changes: Vec<String>,
    /// Id of an existing resource to adopt.
    pub import_id: Option<String>,
    /// Whether to delete before replacing.
    pub delete_before_replace: bool,
    /// Whether to keep the cloud resource when it is deleted.
    pub retain_on_delete: bool,
    /// Output properties to treat as secret.
    pub additional_secret_outputs: Vec<String>,
    /// Properties whose changes force replacement.
    pub replace_on_changes: Vec<String>,
}

impl ResourceOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the parent resource.
    #[must_use]
    pub fn with_parent(mut self, parent: &impl Resource) -> Self {
        self.parent = Some(parent.resource_id());
        self
    }

    /// Adds an explicit dependency.
    #[must_use]
    pub fn depends_on(mut self, resource: &impl Resource) -> Self {
        self.depends_on.push(resource.handle().clone());
        self
    }

    /// Sets whether deletion is forbidden.
    #[must_use]
    pub fn with_protect(mut self, protect: bool) -> Self {
        self.protect = protect;
        self
    }

    /// Sets the provider for a custom resource.
    #[must_use]
    pub fn with_provider(mut self, provider: &ProviderResource) -> Self {
        self.provider = Some(provider.clone());
        self
    }

    /// Adds a provider for a component's children, keyed by its package.
    #[must_use]
    pub fn with_providers(mut self, provider: &ProviderResource) -> Self {
        self.providers
            .insert(provider.package().to_string(), provider.clone());
        self
    }

    /// Adds an alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Sets custom timeouts.
    #[must_use]
    pub fn with_custom_timeouts(mut self, timeouts: CustomTimeouts) -> Self {
        self.custom_timeouts = Some(timeouts);
        self
    }

    /// Sets the provider plugin version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Ignores changes to `property`.
    #[must_use]
    pub fn with_ignore_changes(mut self, property: impl Into<String>) -> Self {
        self.ignore_changes.push(property.into());
        self
    }

    /// Adopts the existing resource with `id`.
    #[must_use]
    pub fn with_import_id(mut self, id: impl Into<String>) -> Self {
        self.import_id = Some(id.into());
        self
    }

    /// Sets whether to delete before replacing.
    #[must_use]
    pub fn with_delete_before_replace(mut self, enabled: bool) -> Self {
        self.delete_before_replace = enabled;
        self
    }

    /// Sets whether to keep the cloud resource on delete.
    #[must_use]
    pub fn with_retain_on_delete(mut self, enabled: bool) -> Self {
        self.retain_on_delete = enabled;
        self
    }

    /// Treats output `property` as secret.
    #[must_use]
    pub fn with_additional_secret_output(mut self, property: impl Into<String>) -> Self {
        self.additional_secret_outputs.push(property.into());
        self
    }

    /// Forces replacement when `property` changes.
    #[must_use]
    pub fn with_replace_on_changes(mut self, property: impl Into<String>) -> Self {
        self.replace_on_changes.push(property.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ComponentResource, CustomResource};

    #[test]
    fn parent_is_stored_by_id() {
        let group = ComponentResource::new("my:index:Group", "g");
        let options = ResourceOptions::new().with_parent(&group);
        assert_eq!(options.parent, Some(group.resource_id()));
    }

    #[test]
    fn providers_are_keyed_by_package() {
        let aws = ProviderResource::new("aws", "east");
        let gcp = ProviderResource::new("gcp", "main");

        let options = ResourceOptions::new()
            .with_providers(&aws)
            .with_providers(&gcp);

        assert_eq!(options.providers.len(), 2);
        assert_eq!(options.providers["aws"], aws);
    }

    #[test]
    fn builders_accumulate() {
        let a = CustomResource::new("t:a", "a");
        let b = CustomResource::new("t:b", "b");

        let options = ResourceOptions::new()
            .depends_on(&a)
            .depends_on(&b)
            .with_alias("urn:old")
            .with_ignore_changes("tags")
            .with_custom_timeouts(CustomTimeouts::new().with_create(Duration::from_secs(300)));

        assert_eq!(options.depends_on, vec![a.handle().clone(), b.handle().clone()]);
        assert_eq!(options.aliases, vec!["urn:old".to_string()]);
        assert_eq!(options.ignore_changes, vec!["tags".to_string()]);
        assert_eq!(
            options.custom_timeouts.and_then(|t| t.create),
            Some(Duration::from_secs(300))
        );
    }
}
