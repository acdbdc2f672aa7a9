//! Error types for deployments.

use cirrus_monitor::TransportError;
use cirrus_output::OutputError;
use cirrus_resource::ResourceError;

use crate::settings::SettingsError;

/// Errors raised while registering resources or talking to the engine.
#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    /// The channel to the engine failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A value was required but is not known yet.
    ///
    /// Expected during previews; callers in preview mode should degrade to
    /// an unknown result rather than fail the run.
    #[error("'{context}' requires a value that is not known yet")]
    UnknownValueUsed {
        /// What needed the value.
        context: String,
    },

    /// The engine rejected the creation or update of a resource.
    #[error("failed to register '{name}' of type '{type_token}': {message}")]
    Registration {
        /// Type token of the resource.
        type_token: String,
        /// Name of the resource.
        name: String,
        /// The engine's message.
        message: String,
    },

    /// A provider function or method reported failures.
    #[error("invoke of '{token}' failed: {message}")]
    Invoke {
        /// Function or method token.
        token: String,
        /// Combined failure reasons.
        message: String,
    },

    /// A resource or option was misused.
    #[error("invalid argument: {0}")]
    Argument(#[from] ResourceError),

    /// An output this operation depended on failed.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// The deployment settings are invalid.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// No tokio runtime was available to run the operation on.
    #[error("no tokio runtime is available to schedule '{0}'")]
    NoRuntime(String),

    /// A background task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl DeploymentError {
    /// Converts the error into the failure carried by affected outputs.
    ///
    /// Output failures pass through unchanged so the root cause survives
    /// any number of dependent registrations.
    #[must_use]
    pub fn to_output_error(&self) -> OutputError {
        match self {
            Self::Output(error) => error.clone(),
            other => OutputError::failed(other.to_string()),
        }
    }
}
