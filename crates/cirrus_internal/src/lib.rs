//! # Cirrus Internal Library
//!
//! Re-exports the core cirrus crates for convenience.

/// Layer 1: deferred values.
pub use cirrus_output;

/// Layer 1: transport to the engine's resource monitor.
pub use cirrus_monitor;

/// Layer 2: resource types and options.
pub use cirrus_resource;

/// Layer 3: registration, settings and logging.
pub use cirrus_deployment;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use cirrus_deployment::{
        CallOptions, DeploymentError, DeploymentSettings, Inputs, InvokeOptions, LogFormat,
        LoggingConfig, RegistrationEngine,
    };
    pub use cirrus_monitor::{ChannelPool, ResourceMonitor, ResourceMonitorClient};
    pub use cirrus_output::{Output, OutputData, OutputError, ResourceId};
    pub use cirrus_resource::{
        Component, ComponentResource, CustomResource, CustomTimeouts, ProviderResource, Resource,
        ResourceOptions,
    };
}
