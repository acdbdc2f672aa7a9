//! Resource registration for cirrus programs.
//!
//! The [`RegistrationEngine`] turns declared resources into ordered calls to
//! the engine's resource monitor:
//!
//! ```no_run
//! use cirrus_deployment::{DeploymentSettings, Inputs, RegistrationEngine};
//! use cirrus_monitor::ChannelPool;
//! use cirrus_resource::{CustomResource, ResourceOptions};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), cirrus_deployment::DeploymentError> {
//! let settings = DeploymentSettings::from_env()?;
//! let pool = ChannelPool::http();
//! let engine = RegistrationEngine::connect(&settings, &pool)?;
//!
//! let bucket = CustomResource::new("aws:s3/bucket:Bucket", "logs");
//! engine.register(&bucket, Inputs::new(), ResourceOptions::new())?;
//!
//! let mut inputs = Inputs::new();
//! inputs.insert("bucket".into(), bucket.id().apply(|id| json!(id)));
//! let policy = CustomResource::new("aws:s3/bucketPolicy:BucketPolicy", "logs-policy");
//! engine.register(&policy, inputs, ResourceOptions::new())?;
//!
//! engine.wait_for_completion().await?;
//! pool.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! The policy's `RegisterResource` call is only issued once the bucket's id
//! is known, because its input was derived from it.

mod engine;
mod error;
mod invoke;
pub mod logging;
mod outputs;
pub mod properties;
pub mod settings;

pub use engine::RegistrationEngine;
pub use error::DeploymentError;
pub use invoke::{CallOptions, InvokeOptions};
pub use logging::{LogFormat, LoggingConfig};
pub use properties::Inputs;
pub use settings::{DeploymentSettings, SettingsError};
