//! Provider resources and provider references.

use std::sync::Arc;

use cirrus_output::{Output, OutputError};
use futures::future;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::handle::{ResourceHandle, ResourceKind};
use crate::resource::Resource;

/// Placeholder the engine understands as "not known yet".
///
/// Substituted for an empty provider id in references, and used as the wire
/// encoding of unknown property values.
pub const UNKNOWN_VALUE: &str = "04da6b54-80e4-46f7-96ec-b56ff0331ba9";

/// Formats a provider reference as `"{urn}::{id}"`.
///
/// An empty id is replaced by [`UNKNOWN_VALUE`].
///
/// ```
/// use cirrus_resource::{format_provider_reference, UNKNOWN_VALUE};
///
/// assert_eq!(format_provider_reference("urn:a", "id-1"), "urn:a::id-1");
/// assert_eq!(
///     format_provider_reference("urn:a", ""),
///     format!("urn:a::{UNKNOWN_VALUE}"),
/// );
/// ```
#[must_use]
pub fn format_provider_reference(urn: &str, id: &str) -> String {
    let id = if id.is_empty() { UNKNOWN_VALUE } else { id };
    format!("{urn}::{id}")
}

/// Prefix of every provider type token.
pub(crate) const PROVIDER_TYPE_PREFIX: &str = "pulumi:providers:";

/// Returns the type token of providers for `package`.
#[must_use]
pub fn provider_type_token(package: &str) -> String {
    format!("{PROVIDER_TYPE_PREFIX}{package}")
}

/// An instance of a provider plugin.
///
/// Resources select a provider through
/// [`ResourceOptions::with_provider`](crate::ResourceOptions::with_provider);
/// the engine is told which one by the provider's reference string.
#[derive(Clone)]
pub struct ProviderResource {
    handle: ResourceHandle,
    package: String,
    reference: Arc<OnceCell<String>>,
}

impl core::fmt::Debug for ProviderResource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProviderResource")
            .field("package", &self.package)
            .field("name", &self.handle.name())
            .field("reference", &self.reference.get())
            .finish()
    }
}

impl PartialEq for ProviderResource {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for ProviderResource {}

impl ProviderResource {
    /// Declares a provider for `package`, e.g. `"aws"`.
    #[must_use]
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        let package = package.into();
        Self {
            handle: ResourceHandle::new(
                ResourceKind::Provider,
                provider_type_token(&package),
                name,
            ),
            package,
            reference: Arc::new(OnceCell::new()),
        }
    }

    /// Returns the package this provider serves.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
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

    /// Resolves the provider reference.
    ///
    /// The first call waits for both the URN and the id; the string is then
    /// cached, and every later call on this provider or its clones returns it
    /// without waiting.
    ///
    /// # Errors
    ///
    /// Returns the error the URN or id failed with. Failures are not cached.
    pub async fn reference(&self) -> Result<String, OutputError> {
        let reference = self
            .reference
            .get_or_try_init(|| async {
                let (urn, id) = future::try_join(self.urn().data(), self.id().data()).await?;
                let urn = urn.into_value().unwrap_or_default();
                let id = id.into_value().unwrap_or_default();
                Ok::<_, OutputError>(format_provider_reference(&urn, &id))
            })
            .await?;
        Ok(reference.clone())
    }

    /// Returns the reference if it has already been resolved.
    #[must_use]
    pub fn cached_reference(&self) -> Option<&str> {
        self.reference.get().map(String::as_str)
    }
}

impl Resource for ProviderResource {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
