//! A runtime for declaring cloud resources as a dependency graph in Rust.
//!
//! Programs declare resources with [`prelude::RegistrationEngine`]; every
//! resource's identity and properties are [`prelude::Output`]s that resolve
//! once the engine has created or updated it.

pub use cirrus_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use cirrus_internal::prelude::*;
}
