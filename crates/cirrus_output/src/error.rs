//! Error types for deferred values.

/// Errors carried by a failed [`Output`](crate::Output).
///
/// Outputs are shared between many consumers, so the error is cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutputError {
    /// A completer tried to resolve an output a second time.
    #[error("output has already been resolved")]
    AlreadyResolved,

    /// Every completer was dropped before the output resolved.
    #[error("output was abandoned before it resolved")]
    Abandoned,

    /// The producer of the value failed.
    #[error("{0}")]
    Failed(String),
}

impl OutputError {
    /// Creates a [`OutputError::Failed`] from any displayable message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
