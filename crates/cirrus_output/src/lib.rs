//! Deferred, dependency-tracked values for cirrus.
//!
//! Property values of declared resources are usually not known when the
//! program builds them: a bucket's ARN only exists once the engine has created
//! the bucket. `cirrus_output` models such values as [`Output<T>`], an
//! asynchronous container that eventually resolves to an [`OutputData<T>`]
//! carrying:
//!
//! - the value itself, when it is known,
//! - whether the value is *known* (during a preview many values never are),
//! - whether the value is *secret*,
//! - the set of [`ResourceId`]s the value was derived from.
//!
//! # Combinators
//!
//! Outputs compose with [`Output::apply`], [`Output::combine`] and
//! [`Output::combine_all`]. Combining always unions the resource sets, ANDs
//! the known flags and ORs the secret flags. A failed input fails the
//! combination; no partial results are produced.
//!
//! # Example
//!
//! ```
//! use cirrus_output::{Output, ResourceId};
//!
//! # futures::executor::block_on(async {
//! let bucket = ResourceId::new(1);
//! let host = Output::known("example.com".to_string()).with_dependency(bucket);
//! let port = Output::secret(443_u16);
//!
//! let url = Output::combine(&host, &port, |host, port| format!("https://{host}:{port}"));
//! let data = url.data().await.unwrap();
//!
//! assert_eq!(data.value(), Some(&"https://example.com:443".to_string()));
//! assert!(data.is_secret());
//! assert!(data.resources().contains(&bucket));
//! # });
//! ```

mod data;
mod deferred;
pub mod error;
mod id;
mod output;

pub use data::OutputData;
pub use deferred::OutputCompleter;
pub use error::OutputError;
pub use id::ResourceId;
pub use output::{Output, OutputState, OutputValue};
