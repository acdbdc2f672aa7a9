//! Declared resources for cirrus.
//!
//! A program declares infrastructure by constructing resources:
//!
//! - [`CustomResource`]: managed by a provider plugin, has an `id`.
//! - [`ComponentResource`]: groups other resources and publishes outputs
//!   through the [`Component`] trait.
//! - [`ProviderResource`]: a provider plugin instance, referenced by other
//!   resources as `"{urn}::{id}"`.
//!
//! Every resource wraps a [`ResourceHandle`] holding its identity outputs. A
//! handle is completed exactly once, by whoever registers the resource with
//! the engine. Resources live in a [`ResourceRegistry`] keyed by
//! [`ResourceId`](cirrus_output::ResourceId); parents are referenced by id so
//! no handle owns another.

mod error;
mod handle;
mod options;
mod provider;
mod registry;
mod resource;

pub use error::ResourceError;
pub use handle::{Registration, ResourceHandle, ResourceKind};
pub use options::{CustomTimeouts, ResourceOptions};
pub use provider::{ProviderResource, UNKNOWN_VALUE, format_provider_reference, provider_type_token};
pub use registry::ResourceRegistry;
pub use resource::{Component, ComponentResource, CustomResource, Resource};
