//! Provider functions and resource methods.

use std::collections::BTreeMap;

use cirrus_monitor::types::{
    CallRequest, CheckFailure, PropertyDependencies, Properties, ResourceInvokeRequest,
};
use cirrus_output::{Output, OutputData};
use cirrus_resource::{ProviderResource, Resource, ResourceHandle};
use serde_json::Value;

use crate::engine::RegistrationEngine;
use crate::error::DeploymentError;
use crate::properties::{Inputs, collect_properties, deserialize_properties, serialize_inputs};

/// Argument naming the resource a method is called on.
const SELF_ARGUMENT: &str = "__self__";

/// Options for [`RegistrationEngine::invoke`] and friends.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Provider to run the function with.
    pub provider: Option<ProviderResource>,
    /// Provider plugin version.
    pub version: Option<String>,
}

impl InvokeOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the provider.
    #[must_use]
    pub fn with_provider(mut self, provider: &ProviderResource) -> Self {
        self.provider = Some(provider.clone());
        self
    }

    /// Sets the provider plugin version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Options for [`RegistrationEngine::call`].
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Resource the method is called on, passed as `__self__`.
    pub resource: Option<ResourceHandle>,
    /// Provider to run the method with.
    pub provider: Option<ProviderResource>,
    /// Provider plugin version.
    pub version: Option<String>,
}

impl CallOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls the method on `resource`.
    #[must_use]
    pub fn with_resource(mut self, resource: &impl Resource) -> Self {
        self.resource = Some(resource.handle().clone());
        self
    }

    /// Sets the provider.
    #[must_use]
    pub fn with_provider(mut self, provider: &ProviderResource) -> Self {
        self.provider = Some(provider.clone());
        self
    }

    /// Sets the provider plugin version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl RegistrationEngine {
    /// Invokes the provider function `token` and waits for its result.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentError::UnknownValueUsed`] if an argument is not
    /// known, [`DeploymentError::Invoke`] if the provider reports failures,
    /// and transport or output errors as they occur.
    pub async fn invoke(
        &self,
        token: &str,
        args: &Inputs,
        options: &InvokeOptions,
    ) -> Result<Properties, DeploymentError> {
        let data = self.invoke_data(token, args, options).await?;
        data.into_value().ok_or_else(|| DeploymentError::UnknownValueUsed {
            context: format!("invoke of {token}"),
        })
    }

    /// Invokes the provider function `token` in the background.
    ///
    /// Unknown arguments make the result unknown instead of an error, so
    /// this is safe to use during a preview. The result is secret if any
    /// argument is and depends on every resource the arguments depend on.
    ///
    /// # Errors
    ///
    /// Fails synchronously if no tokio runtime is running. Invoke failures
    /// fail the returned output.
    pub fn invoke_output(
        &self,
        token: impl Into<String>,
        args: Inputs,
        options: InvokeOptions,
    ) -> Result<Output<Properties>, DeploymentError> {
        let token = token.into();
        let runtime = Self::runtime(&token)?;
        let (output, completer) = Output::deferred();

        let engine = self.clone();
        self.track(runtime.spawn(async move {
            match engine.invoke_data(&token, &args, &options).await {
                Ok(data) => {
                    completer.resolve(data)?;
                    Ok(())
                }
                Err(error) => {
                    let _ = completer.reject(error.to_output_error());
                    Err(error)
                }
            }
        }));
        Ok(output)
    }

    /// Calls the provider method `token` in the background.
    ///
    /// With [`CallOptions::with_resource`] the resource's URN is passed as
    /// `__self__`. Unknown arguments make the result unknown.
    ///
    /// # Errors
    ///
    /// Fails synchronously if no tokio runtime is running. Call failures
    /// fail the returned output.
    pub fn call(
        &self,
        token: impl Into<String>,
        args: Inputs,
        options: CallOptions,
    ) -> Result<Output<Properties>, DeploymentError> {
        let token = token.into();
        let runtime = Self::runtime(&token)?;
        let (output, completer) = Output::deferred();

        let engine = self.clone();
        self.track(runtime.spawn(async move {
            match engine.call_data(&token, args, &options).await {
                Ok(data) => {
                    completer.resolve(data)?;
                    Ok(())
                }
                Err(error) => {
                    let _ = completer.reject(error.to_output_error());
                    Err(error)
                }
            }
        }));
        Ok(output)
    }

    async fn invoke_data(
        &self,
        token: &str,
        args: &Inputs,
        options: &InvokeOptions,
    ) -> Result<OutputData<Properties>, DeploymentError> {
        let serialized = serialize_inputs(args, false).await?;
        let resources = serialized.dependencies.clone();
        if serialized.has_unknowns {
            tracing::debug!(token, "skipping invoke with unknown arguments");
            return Ok(OutputData::unknown(serialized.has_secrets).with_resources(resources));
        }

        let provider = self.provider_reference(options.provider.as_ref()).await?;
        tracing::trace!(token, provider = %provider, "Invoke");
        let response = self
            .monitor
            .invoke(ResourceInvokeRequest {
                tok: token.to_string(),
                args: serialized.properties,
                provider,
                version: options.version.clone().unwrap_or_default(),
                accept_resources: false,
            })
            .await?;
        check_failures(token, &response.failures)?;

        let returned =
            collect_properties(deserialize_properties(response.return_value.unwrap_or_default()));
        Ok(mark_secret(returned, serialized.has_secrets).with_resources(resources))
    }

    async fn call_data(
        &self,
        token: &str,
        mut args: Inputs,
        options: &CallOptions,
    ) -> Result<OutputData<Properties>, DeploymentError> {
        if let Some(resource) = &options.resource {
            args.insert(SELF_ARGUMENT.to_string(), resource.urn().apply(Value::String));
        }

        let serialized = serialize_inputs(&args, true).await?;
        let mut resources = serialized.dependencies.clone();
        if serialized.has_unknowns {
            tracing::debug!(token, "skipping call with unknown arguments");
            return Ok(OutputData::unknown(serialized.has_secrets).with_resources(resources));
        }

        let mut arg_dependencies = BTreeMap::new();
        for (name, deps) in &serialized.property_dependencies {
            let urns = self.urns_of(None, deps).await?;
            arg_dependencies.insert(name.clone(), PropertyDependencies::new(urns));
        }

        let provider = self.provider_reference(options.provider.as_ref()).await?;
        tracing::trace!(token, provider = %provider, "Call");
        let response = self
            .monitor
            .call(CallRequest {
                tok: token.to_string(),
                args: serialized.properties,
                arg_dependencies,
                provider,
                version: options.version.clone().unwrap_or_default(),
            })
            .await?;
        check_failures(token, &response.failures)?;

        // Returned properties also depend on whatever the method registered.
        let returned_urns = response.return_dependencies.values().flat_map(|deps| &deps.urns);
        for urn in returned_urns {
            match self.registry().find_by_urn(urn) {
                Some(handle) => {
                    resources.insert(handle.id());
                }
                None => tracing::debug!(token, urn = %urn, "call returned an unknown dependency"),
            }
        }

        let returned =
            collect_properties(deserialize_properties(response.return_value.unwrap_or_default()));
        Ok(mark_secret(returned, serialized.has_secrets).with_resources(resources))
    }
}

fn mark_secret<T>(data: OutputData<T>, is_secret: bool) -> OutputData<T> {
    if is_secret { data.into_secret() } else { data }
}

fn check_failures(token: &str, failures: &[CheckFailure]) -> Result<(), DeploymentError> {
    if failures.is_empty() {
        return Ok(());
    }

    let message = failures
        .iter()
        .map(|failure| format!("{}: {}", failure.property, failure.reason))
        .collect::<Vec<_>>()
        .join("; ");
    Err(DeploymentError::Invoke {
        token: token.to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_joined() {
        let failures = vec![
            CheckFailure {
                property: "name".into(),
                reason: "required".into(),
            },
            CheckFailure {
                property: "region".into(),
                reason: "unsupported".into(),
            },
        ];

        let err = check_failures("aws:index:getAmi", &failures).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invoke of 'aws:index:getAmi' failed: name: required; region: unsupported"
        );
    }

    #[test]
    fn no_failures_is_ok() {
        assert!(check_failures("t", &[]).is_ok());
    }
}
