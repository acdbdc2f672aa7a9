//! Shared identity and output state of a declared resource.

use core::sync::atomic::{AtomicBool, Ordering};
use std::collections::BTreeMap;
use std::sync::Arc;

use cirrus_output::{Output, OutputCompleter, OutputData, OutputError, ResourceId};
use hashbrown::HashMap;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::ResourceError;
use crate::provider::PROVIDER_TYPE_PREFIX;

/// What kind of resource a handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A resource whose lifecycle is managed by a provider plugin.
    Custom,
    /// A logical grouping of other resources.
    Component,
    /// A provider plugin instance. Providers are custom resources.
    Provider,
}

impl ResourceKind {
    /// Returns `true` for kinds with provider-managed CRUD.
    #[must_use]
    pub fn is_custom(self) -> bool {
        matches!(self, Self::Custom | Self::Provider)
    }
}

/// The engine's answer to a registration, ready to be applied to a handle.
///
/// Values have already been decoded: unknowns and secrets are expressed
/// through [`OutputData`] flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// URN assigned by the engine.
    pub urn: String,
    /// Provider-assigned id. Ignored for components.
    pub id: OutputData<String>,
    /// Output properties by name.
    pub outputs: BTreeMap<String, OutputData<Value>>,
    /// Data given to properties absent from `outputs`.
    pub missing: OutputData<Value>,
}

impl Registration {
    /// Creates a registration with a known id and no output properties.
    #[must_use]
    pub fn new(urn: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            urn: urn.into(),
            id: OutputData::known(id.into(), false),
            outputs: BTreeMap::new(),
            missing: OutputData::known(Value::Null, false),
        }
    }

    /// Sets the id data.
    #[must_use]
    pub fn with_id(mut self, id: OutputData<String>) -> Self {
        self.id = id;
        self
    }

    /// Sets the output properties.
    #[must_use]
    pub fn with_outputs(mut self, outputs: BTreeMap<String, OutputData<Value>>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Sets the data used for properties the engine did not return.
    #[must_use]
    pub fn with_missing(mut self, missing: OutputData<Value>) -> Self {
        self.missing = missing;
        self
    }
}

type Slot = (Output<Value>, OutputCompleter<Value>);

enum OutputSlots {
    Pending(HashMap<String, Slot>),
    Resolved {
        outputs: BTreeMap<String, OutputData<Value>>,
        missing: OutputData<Value>,
    },
    Failed(OutputError),
}

struct HandleInner {
    id: ResourceId,
    kind: ResourceKind,
    type_token: String,
    name: String,
    urn: Output<String>,
    urn_completer: OutputCompleter<String>,
    custom_id: Option<(Output<String>, OutputCompleter<String>)>,
    outputs: Mutex<OutputSlots>,
    remote: bool,
    registered: AtomicBool,
}

/// Cheaply cloneable handle to a declared resource.
///
/// Every concrete resource type wraps one. The handle owns the resource's
/// identity outputs (`urn`, and `id` for custom resources) together with the
/// completers that resolve them, so they can be resolved exactly once by
/// whoever registers the resource.
///
/// Outputs handed out by a handle carry the handle's [`ResourceId`] in their
/// dependency set.
#[derive(Clone)]
pub struct ResourceHandle {
    inner: Arc<HandleInner>,
}

impl core::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("type_token", &self.inner.type_token)
            .field("name", &self.inner.name)
            .field("registered", &self.is_registered())
            .finish_non_exhaustive()
    }
}

impl PartialEq for ResourceHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ResourceHandle {}

impl ResourceHandle {
    /// Creates a handle with pending identity outputs and a fresh id.
    #[must_use]
    pub fn new(kind: ResourceKind, type_token: impl Into<String>, name: impl Into<String>) -> Self {
        Self::build(kind, type_token.into(), name.into(), false)
    }

    /// Creates a handle for a component constructed by its provider plugin.
    #[must_use]
    pub fn new_remote(type_token: impl Into<String>, name: impl Into<String>) -> Self {
        Self::build(ResourceKind::Component, type_token.into(), name.into(), true)
    }

    fn build(kind: ResourceKind, type_token: String, name: String, remote: bool) -> Self {
        let (urn, urn_completer) = Output::deferred();
        let custom_id = kind.is_custom().then(Output::deferred);

        Self {
            inner: Arc::new(HandleInner {
                id: ResourceId::allocate(),
                kind,
                type_token,
                name,
                urn,
                urn_completer,
                custom_id,
                outputs: Mutex::new(OutputSlots::Pending(HashMap::new())),
                remote,
                registered: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the process-unique id of this resource.
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.inner.id
    }

    /// Returns the resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.inner.kind
    }

    /// Returns the type token.
    #[must_use]
    pub fn type_token(&self) -> &str {
        &self.inner.type_token
    }

    /// Returns the logical name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns `true` for remote components.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.inner.remote
    }

    /// Returns the URN output.
    #[must_use]
    pub fn urn(&self) -> Output<String> {
        self.inner.urn.clone()
    }

    /// Returns the provider-assigned id output, or `None` for components.
    #[must_use]
    pub fn custom_id(&self) -> Option<Output<String>> {
        self.inner.custom_id.as_ref().map(|(id, _)| id.clone())
    }

    /// Returns the output for the property `name`.
    ///
    /// Before registration completes this is a pending output that resolves
    /// with the engine's response.
    #[must_use]
    pub fn output(&self, name: &str) -> Output<Value> {
        let mut slots = self.inner.outputs.lock();
        match &mut *slots {
            OutputSlots::Pending(pending) => pending
                .entry(name.to_string())
                .or_insert_with(Output::deferred)
                .0
                .clone(),
            OutputSlots::Resolved { outputs, missing } => {
                let data = outputs.get(name).unwrap_or(&*missing).clone();
                Output::from_data(data.with_resource(self.inner.id))
            }
            OutputSlots::Failed(error) => Output::failed(error.clone()),
        }
    }

    /// Validates the type token and name.
    ///
    /// # Errors
    ///
    /// Returns an error if either is empty, or if a provider has no package.
    pub fn validate(&self) -> Result<(), ResourceError> {
        if self.inner.type_token.is_empty() {
            return Err(ResourceError::EmptyTypeToken {
                name: self.inner.name.clone(),
            });
        }
        if self.inner.name.is_empty() {
            return Err(ResourceError::EmptyName {
                type_token: self.inner.type_token.clone(),
            });
        }
        if self.inner.kind == ResourceKind::Provider
            && self.inner.type_token.strip_prefix(PROVIDER_TYPE_PREFIX) == Some("")
        {
            return Err(ResourceError::EmptyPackage {
                name: self.inner.name.clone(),
            });
        }
        Ok(())
    }

    /// Marks the resource as registered.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::AlreadyRegistered`] on every call after the
    /// first.
    pub fn mark_registered(&self) -> Result<(), ResourceError> {
        if self.inner.registered.swap(true, Ordering::AcqRel) {
            return Err(ResourceError::AlreadyRegistered {
                type_token: self.inner.type_token.clone(),
                name: self.inner.name.clone(),
            });
        }
        Ok(())
    }

    /// Returns `true` once the resource has been handed to the engine.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.inner.registered.load(Ordering::Acquire)
    }

    /// Resolves the identity and property outputs from a registration.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::AlreadyResolved`] if the handle was already
    /// completed or failed.
    pub fn complete(&self, registration: Registration) -> Result<(), OutputError> {
        let Registration {
            urn,
            id,
            outputs,
            missing,
        } = registration;
        let own = self.inner.id;

        self.inner
            .urn_completer
            .resolve(OutputData::known(urn, false).with_resource(own))?;
        if let Some((_, completer)) = &self.inner.custom_id {
            completer.resolve(id.with_resource(own))?;
        }

        let pending = {
            let mut slots = self.inner.outputs.lock();
            match core::mem::replace(&mut *slots, OutputSlots::Resolved { outputs, missing }) {
                OutputSlots::Pending(pending) => pending,
                previous => {
                    *slots = previous;
                    return Err(OutputError::AlreadyResolved);
                }
            }
        };

        let slots = self.inner.outputs.lock();
        if let OutputSlots::Resolved { outputs, missing } = &*slots {
            for (name, (_, completer)) in pending {
                let data = outputs.get(&name).unwrap_or(missing).clone();
                completer.resolve(data.with_resource(own))?;
            }
        }
        Ok(())
    }

    /// Fails every pending output of the handle with `error`.
    ///
    /// Anything combined with these outputs fails too.
    pub fn fail(&self, error: OutputError) {
        // A completer that already fired keeps its value.
        let _ = self.inner.urn_completer.reject(error.clone());
        if let Some((_, completer)) = &self.inner.custom_id {
            let _ = completer.reject(error.clone());
        }

        let mut slots = self.inner.outputs.lock();
        if let OutputSlots::Pending(pending) = &mut *slots {
            for (_, (_, completer)) in pending.drain() {
                let _ = completer.reject(error.clone());
            }
            *slots = OutputSlots::Failed(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_output::OutputState;
    use serde_json::json;

    #[test]
    fn components_have_no_id() {
        let component = ResourceHandle::new(ResourceKind::Component, "my:index:Group", "g");
        let custom = ResourceHandle::new(ResourceKind::Custom, "aws:s3:Bucket", "b");

        assert!(component.custom_id().is_none());
        assert!(custom.custom_id().is_some());
        assert_ne!(component.id(), custom.id());
    }

    #[test]
    fn identity_starts_pending() {
        let handle = ResourceHandle::new(ResourceKind::Custom, "aws:s3:Bucket", "b");
        assert_eq!(handle.urn().state(), OutputState::Pending);
        assert_eq!(handle.output("arn").state(), OutputState::Pending);
    }

    #[test]
    fn second_registration_is_rejected() {
        let handle = ResourceHandle::new(ResourceKind::Custom, "aws:s3:Bucket", "b");
        handle.mark_registered().unwrap();

        let err = handle.mark_registered().unwrap_err();
        assert!(matches!(err, ResourceError::AlreadyRegistered { .. }));
        assert!(handle.is_registered());
    }

    #[test]
    fn validate_rejects_empty_fields() {
        let nameless = ResourceHandle::new(ResourceKind::Custom, "aws:s3:Bucket", "");
        let typeless = ResourceHandle::new(ResourceKind::Custom, "", "b");

        assert!(matches!(
            nameless.validate(),
            Err(ResourceError::EmptyName { .. })
        ));
        assert!(matches!(
            typeless.validate(),
            Err(ResourceError::EmptyTypeToken { .. })
        ));
    }

    #[tokio::test]
    async fn complete_resolves_identity_and_outputs() {
        let handle = ResourceHandle::new(ResourceKind::Custom, "aws:s3:Bucket", "b");
        let early = handle.output("arn");

        let mut outputs = BTreeMap::new();
        outputs.insert("arn".to_string(), OutputData::known(json!("arn:aws:s3:::b"), false));
        handle
            .complete(
                Registration::new("urn:pulumi:dev::proj::aws:s3:Bucket::b", "b-123")
                    .with_outputs(outputs),
            )
            .unwrap();

        let urn = handle.urn().data().await.unwrap();
        assert_eq!(urn.value().unwrap(), "urn:pulumi:dev::proj::aws:s3:Bucket::b");
        assert!(urn.resources().contains(&handle.id()));

        let id = handle.custom_id().unwrap().get_value(String::new()).await.unwrap();
        assert_eq!(id, "b-123");

        let arn = early.data().await.unwrap();
        assert_eq!(arn.value(), Some(&json!("arn:aws:s3:::b")));
        assert!(arn.resources().contains(&handle.id()));

        // Properties requested after completion resolve immediately.
        assert_eq!(handle.output("missing").state(), OutputState::Resolved);
        assert_eq!(
            handle.output("missing").get_value(json!(1)).await.unwrap(),
            Value::Null
        );
    }

    #[tokio::test]
    async fn missing_properties_follow_registration_default() {
        let handle = ResourceHandle::new(ResourceKind::Custom, "aws:s3:Bucket", "b");
        let pending = handle.output("tags");

        handle
            .complete(
                Registration::new("urn:pulumi:dev::proj::aws:s3:Bucket::b", "")
                    .with_id(OutputData::unknown(false))
                    .with_missing(OutputData::unknown(false)),
            )
            .unwrap();

        assert!(!pending.is_known().await.unwrap());
        assert!(!handle.custom_id().unwrap().is_known().await.unwrap());
    }

    #[tokio::test]
    async fn complete_twice_is_rejected() {
        let handle = ResourceHandle::new(ResourceKind::Component, "my:index:Group", "g");
        handle
            .complete(Registration::new("urn:pulumi:dev::proj::my:index:Group::g", ""))
            .unwrap();

        let err = handle
            .complete(Registration::new("urn:other", ""))
            .unwrap_err();
        assert_eq!(err, OutputError::AlreadyResolved);
        assert_eq!(
            handle.urn().get_value(String::new()).await.unwrap(),
            "urn:pulumi:dev::proj::my:index:Group::g"
        );
    }

    #[tokio::test]
    async fn fail_propagates_to_every_output() {
        let handle = ResourceHandle::new(ResourceKind::Custom, "aws:s3:Bucket", "b");
        let arn = handle.output("arn");
        let derived = Output::combine(&handle.urn(), &arn, |urn, arn| format!("{urn}{arn}"));

        handle.fail(OutputError::failed("quota exceeded"));

        assert_eq!(
            derived.data().await.unwrap_err(),
            OutputError::failed("quota exceeded")
        );
        assert!(handle.custom_id().unwrap().data().await.is_err());
        assert!(handle.output("later").data().await.is_err());
    }
}
