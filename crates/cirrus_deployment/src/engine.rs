//! The registration engine.

use core::time::Duration;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cirrus_monitor::types::{
    CustomTimeouts as WireTimeouts, PropertyDependencies, Properties, ReadResourceRequest,
    RegisterResourceRequest, SupportsFeatureRequest,
};
use cirrus_monitor::{ChannelPool, ResourceMonitor, ResourceMonitorClient, TransportError};
use cirrus_output::{Output, OutputData, OutputError, ResourceId};
use cirrus_resource::{
    CustomTimeouts, ProviderResource, Registration, Resource, ResourceError, ResourceHandle,
    ResourceOptions, ResourceRegistry,
};
use futures::future;
use hashbrown::HashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::DeploymentError;
use crate::properties::{Inputs, SerializedInputs, deserialize_properties, serialize_inputs};
use crate::settings::DeploymentSettings;

type Task = JoinHandle<Result<(), DeploymentError>>;

// ─────────────────────────────────────────────────────────────────────────────
// Engine State
// ─────────────────────────────────────────────────────────────────────────────

/// Ordering of the output snapshots submitted for one component.
#[derive(Default)]
pub(crate) struct OutputSubmissions {
    /// Last generation handed out.
    pub(crate) requested: Mutex<u64>,
    /// Last generation sent to the engine. Held while a snapshot is in flight.
    pub(crate) sent: tokio::sync::Mutex<u64>,
}

#[derive(Default)]
pub(crate) struct EngineState {
    pub(crate) registry: ResourceRegistry,
    tasks: Mutex<Vec<Task>>,
    features: Mutex<HashMap<String, bool>>,
    pub(crate) submissions: Mutex<HashMap<ResourceId, Arc<OutputSubmissions>>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// RegistrationEngine
// ─────────────────────────────────────────────────────────────────────────────

/// Drives resource registration against the engine's resource monitor.
///
/// [`register`](Self::register) validates its arguments, records the
/// resource and returns at once; the `RegisterResource` call runs on a
/// background task that first waits for everything the resource depends on:
///
/// - every resource in [`ResourceOptions::depends_on`],
/// - the parent,
/// - the provider and component providers,
/// - every output used in the inputs, and the resources those outputs were
///   derived from.
///
/// Resources without such a relation register concurrently. When the engine
/// answers, the resource's `urn`, `id` and output properties resolve exactly
/// once; when it fails, they fail, and so does anything derived from them.
///
/// Failures are collected by [`wait_for_completion`](Self::wait_for_completion),
/// which the program driver awaits before exiting.
///
/// Clones share all state.
#[derive(Clone)]
pub struct RegistrationEngine {
    pub(crate) monitor: Arc<dyn ResourceMonitor>,
    pub(crate) state: Arc<EngineState>,
    pub(crate) dry_run: bool,
}

impl core::fmt::Debug for RegistrationEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegistrationEngine")
            .field("dry_run", &self.dry_run)
            .field("resources", &self.state.registry.len())
            .field("pending_tasks", &self.state.tasks.lock().len())
            .finish_non_exhaustive()
    }
}

impl RegistrationEngine {
    /// Creates an engine that talks to `monitor`.
    #[must_use]
    pub fn new<M: ResourceMonitor>(monitor: M) -> Self {
        Self::from_arc(Arc::new(monitor))
    }

    /// Creates an engine from a shared monitor.
    #[must_use]
    pub fn from_arc(monitor: Arc<dyn ResourceMonitor>) -> Self {
        Self {
            monitor,
            state: Arc::new(EngineState::default()),
            dry_run: false,
        }
    }

    /// Connects to the monitor named in `settings` through `pool`.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be opened.
    pub fn connect(
        settings: &DeploymentSettings,
        pool: &ChannelPool,
    ) -> Result<Self, DeploymentError> {
        let client = ResourceMonitorClient::new(settings.monitor_address.as_str(), pool)?;
        tracing::info!(
            monitor = %settings.monitor_address,
            project = %settings.project,
            stack = %settings.stack,
            dry_run = settings.dry_run,
            "connected to resource monitor"
        );
        Ok(Self::new(client).with_dry_run(settings.dry_run))
    }

    /// Sets whether this run is a preview.
    ///
    /// During a preview, ids and properties the engine leaves out resolve as
    /// unknown instead of empty.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns `true` during a preview.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns the registry of every resource handed to this engine.
    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.state.registry
    }

    /// Registers `resource` with the engine.
    ///
    /// Returns as soon as the registration is scheduled.
    ///
    /// # Errors
    ///
    /// Fails synchronously if the resource was already registered, has an
    /// empty type or name, or no tokio runtime is running. The parent, every
    /// `depends_on` entry and every provider must already be registered.
    pub fn register(
        &self,
        resource: &impl Resource,
        inputs: Inputs,
        options: ResourceOptions,
    ) -> Result<(), DeploymentError> {
        let handle = resource.handle().clone();
        let runtime = self.admit(&handle, &options, "RegisterResource")?;

        tracing::debug!(
            type_token = handle.type_token(),
            name = handle.name(),
            custom = handle.kind().is_custom(),
            inputs = inputs.len(),
            "scheduling resource registration"
        );

        let engine = self.clone();
        self.track(runtime.spawn(async move {
            let result = engine.register_remote(&handle, &inputs, &options).await;
            engine.settle(&handle, result)
        }));
        Ok(())
    }

    /// Reads the existing custom resource `id` and adopts its state.
    ///
    /// During a preview an id that is not known yet is read as empty and the
    /// resource's id resolves as unknown. Outside a preview it fails the
    /// read with [`DeploymentError::UnknownValueUsed`].
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register), and fails if `resource` is not
    /// a custom resource.
    pub fn read(
        &self,
        resource: &impl Resource,
        id: Output<String>,
        inputs: Inputs,
        options: ResourceOptions,
    ) -> Result<(), DeploymentError> {
        let handle = resource.handle().clone();
        if !handle.kind().is_custom() {
            return Err(ResourceError::NotCustom {
                type_token: handle.type_token().to_string(),
                name: handle.name().to_string(),
            }
            .into());
        }
        let runtime = self.admit(&handle, &options, "ReadResource")?;

        tracing::debug!(
            type_token = handle.type_token(),
            name = handle.name(),
            "scheduling resource read"
        );

        let engine = self.clone();
        self.track(runtime.spawn(async move {
            let result = engine.read_remote(&handle, id, &inputs, &options).await;
            engine.settle(&handle, result)
        }));
        Ok(())
    }

    /// Queries whether the engine supports `feature`.
    ///
    /// Answers are cached per feature for the life of the engine.
    ///
    /// # Errors
    ///
    /// Returns the transport error of the first query.
    pub async fn supports_feature(&self, feature: &str) -> Result<bool, DeploymentError> {
        let cached = self.state.features.lock().get(feature).copied();
        if let Some(supported) = cached {
            return Ok(supported);
        }

        let response = self
            .monitor
            .supports_feature(SupportsFeatureRequest::new(feature))
            .await?;
        self.state
            .features
            .lock()
            .insert(feature.to_string(), response.has_support);
        tracing::debug!(feature, supported = response.has_support, "engine feature queried");
        Ok(response.has_support)
    }

    /// Waits for every scheduled operation, including ones scheduled while
    /// waiting.
    ///
    /// # Errors
    ///
    /// Returns the first failure in scheduling order. Every operation is
    /// still awaited before returning.
    pub async fn wait_for_completion(&self) -> Result<(), DeploymentError> {
        let mut first_error = None;
        loop {
            let pending = core::mem::take(&mut *self.state.tasks.lock());
            if pending.is_empty() {
                break;
            }

            for task in pending {
                let result = task
                    .await
                    .unwrap_or_else(|err| Err(DeploymentError::Task(err.to_string())));
                if let Err(error) = result
                    && first_error.is_none()
                {
                    first_error = Some(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scheduling
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn runtime(operation: &str) -> Result<Handle, DeploymentError> {
        Handle::try_current().map_err(|_| DeploymentError::NoRuntime(operation.to_string()))
    }

    pub(crate) fn track(&self, task: Task) {
        self.state.tasks.lock().push(task);
    }

    /// Validates a resource and records it as registered.
    fn admit(
        &self,
        handle: &ResourceHandle,
        options: &ResourceOptions,
        operation: &str,
    ) -> Result<Handle, DeploymentError> {
        handle.validate()?;
        if let Some(parent) = options.parent
            && !self.state.registry.contains(parent)
        {
            return Err(ResourceError::UnknownParent(parent).into());
        }
        let providers = options.provider.iter().chain(options.providers.values());
        let mut dependencies = options
            .depends_on
            .iter()
            .chain(providers.map(Resource::handle));
        if let Some(missing) = dependencies.find(|dep| !dep.is_registered()) {
            return Err(ResourceError::UnregisteredDependency {
                type_token: missing.type_token().to_string(),
                name: missing.name().to_string(),
            }
            .into());
        }
        let runtime = Self::runtime(operation)?;

        handle.mark_registered()?;
        self.state.registry.insert(handle.clone(), options.parent)?;
        Ok(runtime)
    }

    fn settle(
        &self,
        handle: &ResourceHandle,
        result: Result<(), DeploymentError>,
    ) -> Result<(), DeploymentError> {
        if let Err(error) = &result {
            tracing::warn!(
                type_token = handle.type_token(),
                name = handle.name(),
                %error,
                "resource registration failed"
            );
            handle.fail(error.to_output_error());
        }
        result
    }

    // ─────────────────────────────────────────────────────────────────────
    // Remote Calls
    // ─────────────────────────────────────────────────────────────────────

    async fn register_remote(
        &self,
        handle: &ResourceHandle,
        inputs: &Inputs,
        options: &ResourceOptions,
    ) -> Result<(), DeploymentError> {
        let prepared = self.prepare(handle, inputs, options).await?;

        let request = RegisterResourceRequest {
            type_token: handle.type_token().to_string(),
            name: handle.name().to_string(),
            parent: prepared.parent,
            custom: handle.kind().is_custom(),
            object: prepared.inputs.properties,
            protect: options.protect,
            dependencies: prepared.dependencies,
            provider: prepared.provider,
            property_dependencies: prepared.property_dependencies,
            delete_before_replace: options.delete_before_replace,
            version: options.version.clone().unwrap_or_default(),
            ignore_changes: options.ignore_changes.clone(),
            accept_secrets: true,
            additional_secret_outputs: options.additional_secret_outputs.clone(),
            aliases: options.aliases.clone(),
            import_id: options.import_id.clone().unwrap_or_default(),
            custom_timeouts: options.custom_timeouts.as_ref().map(wire_timeouts),
            remote: handle.is_remote(),
            accept_resources: false,
            providers: prepared.providers,
            replace_on_changes: options.replace_on_changes.clone(),
            retain_on_delete: options.retain_on_delete,
        };

        tracing::trace!(
            type_token = handle.type_token(),
            name = handle.name(),
            dependencies = request.dependencies.len(),
            "RegisterResource"
        );
        let response = self
            .monitor
            .register_resource(request)
            .await
            .map_err(|err| rejected(handle, err))?;

        let urn = response.urn.clone();
        handle.complete(self.registration(
            response.urn,
            response.id,
            response.object,
            &options.additional_secret_outputs,
        ))?;

        tracing::debug!(urn = %urn, "resource registered");
        Ok(())
    }

    async fn read_remote(
        &self,
        handle: &ResourceHandle,
        id: Output<String>,
        inputs: &Inputs,
        options: &ResourceOptions,
    ) -> Result<(), DeploymentError> {
        // A preview reads with an empty id; the engine answers with unknowns.
        let id = id.data().await?.into_value().unwrap_or_default();
        if id.is_empty() && !self.dry_run {
            return Err(DeploymentError::UnknownValueUsed {
                context: format!("read of {} '{}'", handle.type_token(), handle.name()),
            });
        }
        let prepared = self.prepare(handle, inputs, options).await?;

        let request = ReadResourceRequest {
            id: id.clone(),
            type_token: handle.type_token().to_string(),
            name: handle.name().to_string(),
            parent: prepared.parent,
            properties: prepared.inputs.properties,
            dependencies: prepared.dependencies,
            provider: prepared.provider,
            version: options.version.clone().unwrap_or_default(),
            accept_secrets: true,
            additional_secret_outputs: options.additional_secret_outputs.clone(),
            accept_resources: false,
        };

        tracing::trace!(
            type_token = handle.type_token(),
            name = handle.name(),
            %id,
            "ReadResource"
        );
        let response = self
            .monitor
            .read_resource(request)
            .await
            .map_err(|err| rejected(handle, err))?;

        let urn = response.urn.clone();
        handle.complete(self.registration(
            response.urn,
            id,
            response.properties,
            &options.additional_secret_outputs,
        ))?;

        tracing::debug!(urn = %urn, "resource read");
        Ok(())
    }

    /// Waits for every dependency of a registration and encodes its inputs.
    async fn prepare(
        &self,
        handle: &ResourceHandle,
        inputs: &Inputs,
        options: &ResourceOptions,
    ) -> Result<Prepared, DeploymentError> {
        let parent = match options.parent.and_then(|id| self.state.registry.get(id)) {
            Some(parent) => urn_of(&parent).await?,
            None => String::new(),
        };

        let explicit = future::try_join_all(options.depends_on.iter().map(urn_of)).await?;

        let inputs = serialize_inputs(inputs, true).await?;

        let mut property_dependencies = BTreeMap::new();
        for (name, resources) in &inputs.property_dependencies {
            let urns = self.urns_of(Some(handle.id()), resources).await?;
            property_dependencies.insert(name.clone(), PropertyDependencies::new(urns));
        }

        let implicit = self.urns_of(Some(handle.id()), &inputs.dependencies).await?;
        let dependencies: BTreeSet<String> = explicit.into_iter().chain(implicit).collect();

        let provider = self.provider_reference(options.provider.as_ref()).await?;

        let mut providers = BTreeMap::new();
        for (package, provider) in &options.providers {
            providers.insert(package.clone(), provider.reference().await?);
        }

        Ok(Prepared {
            parent,
            inputs,
            dependencies: dependencies.into_iter().collect(),
            property_dependencies,
            provider,
            providers,
        })
    }

    /// Resolves the URNs of `resources`, skipping `exclude` and anything
    /// this engine never registered.
    pub(crate) async fn urns_of(
        &self,
        exclude: Option<ResourceId>,
        resources: &BTreeSet<ResourceId>,
    ) -> Result<Vec<String>, OutputError> {
        let handles: Vec<_> = resources
            .iter()
            .filter(|id| Some(**id) != exclude)
            .filter_map(|id| self.state.registry.get(*id))
            .collect();
        let urns = future::try_join_all(handles.iter().map(urn_of)).await?;

        let unique: BTreeSet<String> = urns.into_iter().filter(|urn| !urn.is_empty()).collect();
        Ok(unique.into_iter().collect())
    }

    pub(crate) async fn provider_reference(
        &self,
        provider: Option<&ProviderResource>,
    ) -> Result<String, OutputError> {
        match provider {
            Some(provider) => provider.reference().await,
            None => Ok(String::new()),
        }
    }

    fn registration(
        &self,
        urn: String,
        id: String,
        object: Properties,
        secret_outputs: &[String],
    ) -> Registration {
        let mut outputs = deserialize_properties(object);
        for name in secret_outputs {
            if let Some(data) = outputs.remove(name) {
                outputs.insert(name.clone(), data.into_secret());
            }
        }

        let id = if id.is_empty() && self.dry_run {
            OutputData::unknown(false)
        } else {
            OutputData::known(id, false)
        };
        let missing = if self.dry_run {
            OutputData::unknown(false)
        } else {
            OutputData::known(Value::Null, false)
        };

        Registration::new(urn, String::new())
            .with_id(id)
            .with_outputs(outputs)
            .with_missing(missing)
    }
}

struct Prepared {
    parent: String,
    inputs: SerializedInputs,
    dependencies: Vec<String>,
    property_dependencies: BTreeMap<String, PropertyDependencies>,
    provider: String,
    providers: BTreeMap<String, String>,
}

pub(crate) async fn urn_of(handle: &ResourceHandle) -> Result<String, OutputError> {
    Ok(handle.urn().data().await?.into_value().unwrap_or_default())
}

/// Maps an engine rejection of `handle` to a registration failure.
fn rejected(handle: &ResourceHandle, error: TransportError) -> DeploymentError {
    match error {
        TransportError::Status { message, .. } => DeploymentError::Registration {
            type_token: handle.type_token().to_string(),
            name: handle.name().to_string(),
            message,
        },
        other => DeploymentError::Transport(other),
    }
}

fn wire_timeouts(timeouts: &CustomTimeouts) -> WireTimeouts {
    let format = |timeout: Option<Duration>| timeout.map(format_duration).unwrap_or_default();
    WireTimeouts {
        create: format(timeouts.create),
        update: format(timeouts.update),
        delete: format(timeouts.delete),
    }
}

/// Formats a duration the way the engine parses it, e.g. `"300s"`.
fn format_duration(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
