//! The [`Output<T>`] deferred value.

use core::fmt;
use core::future::Future;
use std::collections::BTreeSet;

use futures::FutureExt;
use futures::future::{self, BoxFuture, Shared};

use crate::data::OutputData;
use crate::deferred::OutputCompleter;
use crate::error::OutputError;
use crate::id::ResourceId;

/// Marker trait for types that can flow through an [`Output`].
///
/// Any type that is `Clone + Send + Sync + 'static` automatically implements
/// `OutputValue`. Values are cloned to every consumer of a shared output.
pub trait OutputValue: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> OutputValue for T {}

type SharedData<T> = Shared<BoxFuture<'static, Result<OutputData<T>, OutputError>>>;

/// Resolution state of an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    /// Still waiting on its producer.
    Pending,
    /// Resolved to data (known or unknown). Terminal.
    Resolved,
    /// Failed. Terminal.
    Failed,
}

/// A value that becomes available later, tagged with its provenance.
///
/// Cloning an `Output` is cheap and every clone observes the same resolution.
/// Once resolved, an output never changes.
pub struct Output<T> {
    inner: SharedData<T>,
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: OutputValue> fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<T: OutputValue> From<T> for Output<T> {
    fn from(value: T) -> Self {
        Self::known(value)
    }
}

impl<T: OutputValue> Output<T> {
    fn from_data_future<F>(fut: F) -> Self
    where
        F: Future<Output = Result<OutputData<T>, OutputError>> + Send + 'static,
    {
        Self {
            inner: fut.boxed().shared(),
        }
    }

    /// Creates an output that is already resolved to `data`.
    #[must_use]
    pub fn from_data(data: OutputData<T>) -> Self {
        Self::from_data_future(future::ready(Ok(data)))
    }

    /// Creates a resolved, known, non-secret output with no dependencies.
    #[must_use]
    pub fn known(value: T) -> Self {
        Self::from_data(OutputData::known(value, false))
    }

    /// Creates a resolved, known, secret output with no dependencies.
    #[must_use]
    pub fn secret(value: T) -> Self {
        Self::from_data(OutputData::known(value, true))
    }

    /// Creates a resolved output whose value is unknown.
    ///
    /// Used during previews, where the engine cannot say what a value will be.
    #[must_use]
    pub fn unknown() -> Self {
        Self::from_data(OutputData::unknown(false))
    }

    /// Creates an output that has already failed.
    #[must_use]
    pub fn failed(error: OutputError) -> Self {
        Self::from_data_future(future::ready(Err(error)))
    }

    /// Creates a known output from a future producing the value.
    #[must_use]
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self::from_data_future(fut.map(|value| Ok(OutputData::known(value, false))))
    }

    /// Creates a pending output together with the completer that resolves it.
    ///
    /// The output fails with [`OutputError::Abandoned`] if every clone of the
    /// completer is dropped without resolving it.
    #[must_use]
    pub fn deferred() -> (Self, OutputCompleter<T>) {
        let (completer, rx) = OutputCompleter::channel();
        let output =
            Self::from_data_future(async move { rx.await.unwrap_or(Err(OutputError::Abandoned)) });
        (output, completer)
    }

    /// Waits for the output to resolve and returns its data.
    ///
    /// # Errors
    ///
    /// Returns the error the output failed with.
    pub async fn data(&self) -> Result<OutputData<T>, OutputError> {
        self.inner.clone().await
    }

    /// Returns the data if the output can resolve without waiting.
    #[must_use]
    pub fn try_data(&self) -> Option<Result<OutputData<T>, OutputError>> {
        self.inner.clone().now_or_never()
    }

    /// Returns the current resolution state without waiting.
    #[must_use]
    pub fn state(&self) -> OutputState {
        match self.try_data() {
            None => OutputState::Pending,
            Some(Ok(_)) => OutputState::Resolved,
            Some(Err(_)) => OutputState::Failed,
        }
    }

    /// Waits for the value, substituting `when_unknown` if it is unknown.
    ///
    /// # Errors
    ///
    /// Returns the error the output failed with.
    pub async fn get_value(&self, when_unknown: T) -> Result<T, OutputError> {
        Ok(self.data().await?.into_value().unwrap_or(when_unknown))
    }

    /// Waits for the output and reports whether its value is known.
    ///
    /// # Errors
    ///
    /// Returns the error the output failed with.
    pub async fn is_known(&self) -> Result<bool, OutputError> {
        Ok(self.data().await?.is_known())
    }

    /// Waits for the output and reports whether its value is secret.
    ///
    /// # Errors
    ///
    /// Returns the error the output failed with.
    pub async fn is_secret(&self) -> Result<bool, OutputError> {
        Ok(self.data().await?.is_secret())
    }

    /// Waits for the output and returns the resources it depends on.
    ///
    /// # Errors
    ///
    /// Returns the error the output failed with.
    pub async fn resources(&self) -> Result<BTreeSet<ResourceId>, OutputError> {
        Ok(self.data().await?.resources().clone())
    }

    /// Returns an output with the same value that also depends on `resource`.
    #[must_use]
    pub fn with_dependency(&self, resource: ResourceId) -> Self {
        let inner = self.inner.clone();
        Self::from_data_future(async move { Ok(inner.await?.with_resource(resource)) })
    }

    /// Returns an output with the same value, marked secret.
    #[must_use]
    pub fn as_secret(&self) -> Self {
        let inner = self.inner.clone();
        Self::from_data_future(async move { Ok(inner.await?.into_secret()) })
    }

    /// Transforms the value once it resolves.
    ///
    /// `f` only runs for known values; flags and dependencies carry over.
    #[must_use]
    pub fn apply<R, F>(&self, f: F) -> Output<R>
    where
        R: OutputValue,
        F: FnOnce(T) -> R + Send + 'static,
    {
        let inner = self.inner.clone();
        Output::from_data_future(async move { Ok(inner.await?.map(f)) })
    }

    /// Transforms the value into another output and flattens the result.
    ///
    /// The result depends on everything both this output and the returned
    /// output depend on.
    #[must_use]
    pub fn apply_output<R, F>(&self, f: F) -> Output<R>
    where
        R: OutputValue,
        F: FnOnce(T) -> Output<R> + Send + 'static,
    {
        let inner = self.inner.clone();
        Output::from_data_future(async move {
            let (value, is_secret, resources) = inner.await?.into_parts();
            let Some(value) = value else {
                return Ok(OutputData::unknown(is_secret).with_resources(resources));
            };

            let outer = OutputData::known((), is_secret).with_resources(resources);
            let nested = f(value).data().await?;
            Ok(outer.zip_with(nested, |(), value| value))
        })
    }

    /// Combines two outputs with `f` once both resolve.
    ///
    /// The result is known only if both inputs are, secret if either is, and
    /// depends on the union of both dependency sets. If either input fails,
    /// the combination fails with that error.
    #[must_use]
    pub fn combine<U, R, F>(a: &Output<T>, b: &Output<U>, f: F) -> Output<R>
    where
        U: OutputValue,
        R: OutputValue,
        F: FnOnce(T, U) -> R + Send + 'static,
    {
        let (a, b) = (a.inner.clone(), b.inner.clone());
        Output::from_data_future(async move {
            let (a, b) = future::try_join(a, b).await?;
            Ok(a.zip_with(b, f))
        })
    }

    /// Pairs two outputs.
    #[must_use]
    pub fn zip<U: OutputValue>(&self, other: &Output<U>) -> Output<(T, U)> {
        Output::combine(self, other, |a, b| (a, b))
    }

    /// Combines any number of outputs into one holding every value in order.
    ///
    /// Same rules as [`combine`](Self::combine); an empty input resolves to a
    /// known empty vector.
    #[must_use]
    pub fn combine_all<I>(outputs: I) -> Output<Vec<T>>
    where
        I: IntoIterator<Item = Output<T>>,
    {
        let pending: Vec<_> = outputs.into_iter().map(|output| output.inner).collect();
        Output::from_data_future(async move {
            let all = future::try_join_all(pending).await?;
            Ok(OutputData::collect(all))
        })
    }
}

impl Output<()> {
    /// Creates a known unit output that only records a dependency on `resource`.
    #[must_use]
    pub fn from_dependency(resource: ResourceId) -> Self {
        Self::from_data(OutputData::known((), false).with_resource(resource))
    }
}
