//! Submission of component outputs.

use std::sync::Arc;

use cirrus_monitor::types::RegisterResourceOutputsRequest;
use cirrus_resource::{Component, Resource, ResourceError, ResourceHandle};

use crate::engine::{OutputSubmissions, RegistrationEngine, urn_of};
use crate::error::DeploymentError;
use crate::properties::{Inputs, serialize_inputs};

/// Property name reserved for a resource's identity.
const URN_PROPERTY: &str = "urn";

impl RegistrationEngine {
    /// Submits the outputs a component publishes.
    ///
    /// The outputs come from [`Component::output_properties`], minus the
    /// reserved `urn` entry. Call this once the component has created its
    /// children.
    ///
    /// Submitting again replaces the previous snapshot: whichever call was
    /// made last is what the engine ends up with, even if its outputs
    /// resolve sooner than an earlier call's.
    ///
    /// # Errors
    ///
    /// Fails synchronously if the component has not been registered or no
    /// tokio runtime is running.
    pub fn register_outputs(&self, component: &impl Component) -> Result<(), DeploymentError> {
        let mut outputs = component.output_properties();
        outputs.remove(URN_PROPERTY);
        self.register_output_map(component, outputs)
    }

    /// Submits `outputs` as the final outputs of `resource`.
    ///
    /// Same as [`register_outputs`](Self::register_outputs) with an explicit
    /// mapping.
    ///
    /// # Errors
    ///
    /// Same as [`register_outputs`](Self::register_outputs).
    pub fn register_output_map(
        &self,
        resource: &impl Resource,
        outputs: Inputs,
    ) -> Result<(), DeploymentError> {
        let handle = resource.handle().clone();
        if !handle.is_registered() {
            return Err(ResourceError::NotRegistered {
                type_token: handle.type_token().to_string(),
                name: handle.name().to_string(),
            }
            .into());
        }
        let runtime = Self::runtime("RegisterResourceOutputs")?;

        let submissions = self.submissions(&handle);
        let generation = {
            let mut requested = submissions.requested.lock();
            *requested += 1;
            *requested
        };

        tracing::debug!(
            type_token = handle.type_token(),
            name = handle.name(),
            outputs = outputs.len(),
            generation,
            "scheduling output submission"
        );

        let engine = self.clone();
        self.track(runtime.spawn(async move {
            engine
                .submit_outputs(&handle, &outputs, &submissions, generation)
                .await
        }));
        Ok(())
    }

    fn submissions(&self, handle: &ResourceHandle) -> Arc<OutputSubmissions> {
        let mut submissions = self.state.submissions.lock();
        Arc::clone(submissions.entry(handle.id()).or_default())
    }

    async fn submit_outputs(
        &self,
        handle: &ResourceHandle,
        outputs: &Inputs,
        submissions: &OutputSubmissions,
        generation: u64,
    ) -> Result<(), DeploymentError> {
        let urn = urn_of(handle).await?;
        let serialized = serialize_inputs(outputs, true).await?;

        let mut sent = submissions.sent.lock().await;
        if *sent > generation {
            tracing::trace!(
                %urn,
                generation,
                latest = *sent,
                "skipping superseded output snapshot"
            );
            return Ok(());
        }

        self.monitor
            .register_resource_outputs(RegisterResourceOutputsRequest {
                urn: urn.clone(),
                outputs: serialized.properties,
            })
            .await?;
        *sent = generation;

        tracing::debug!(%urn, generation, "component outputs registered");
        Ok(())
    }
}
