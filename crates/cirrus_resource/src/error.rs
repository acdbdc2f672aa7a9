//! Error types for resource declaration.

use cirrus_output::ResourceId;

/// Misuse of a resource or the resource registry.
///
/// These are argument errors: they are reported synchronously, at the point
/// of misuse, rather than through an output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// The resource has no type token.
    #[error("resource '{name}' has an empty type token")]
    EmptyTypeToken {
        /// Name of the resource.
        name: String,
    },

    /// The resource has no name.
    #[error("resource of type '{type_token}' has an empty name")]
    EmptyName {
        /// Type token of the resource.
        type_token: String,
    },

    /// A provider was declared without a package.
    #[error("provider '{name}' has an empty package name")]
    EmptyPackage {
        /// Name of the provider.
        name: String,
    },

    /// The resource was already registered.
    #[error("resource '{name}' of type '{type_token}' is already registered")]
    AlreadyRegistered {
        /// Type token of the resource.
        type_token: String,
        /// Name of the resource.
        name: String,
    },

    /// An operation that needs a registered resource got one that is not.
    #[error("resource '{name}' of type '{type_token}' has not been registered")]
    NotRegistered {
        /// Type token of the resource.
        type_token: String,
        /// Name of the resource.
        name: String,
    },

    /// A resource was depended on, or used as a provider, before it was
    /// registered. Its outputs would never resolve.
    #[error("dependency '{name}' of type '{type_token}' has not been registered")]
    UnregisteredDependency {
        /// Type token of the dependency.
        type_token: String,
        /// Name of the dependency.
        name: String,
    },

    /// An operation that only applies to custom resources got another kind.
    #[error("resource '{name}' of type '{type_token}' is not a custom resource")]
    NotCustom {
        /// Type token of the resource.
        type_token: String,
        /// Name of the resource.
        name: String,
    },

    /// The registry already holds a resource with this id.
    #[error("{0} is already present in the registry")]
    DuplicateId(ResourceId),

    /// A parent was given that the registry does not know about.
    #[error("parent {0} has not been registered")]
    UnknownParent(ResourceId),
}
