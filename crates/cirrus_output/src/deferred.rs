//! One-shot completion of deferred outputs.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::data::OutputData;
use crate::error::OutputError;

type Completion<T> = Result<OutputData<T>, OutputError>;

/// Resolves the [`Output`](crate::Output) it was created with, exactly once.
///
/// Created by [`Output::deferred`](crate::Output::deferred). Clones share the
/// same slot, so whichever clone completes first wins and every later attempt
/// returns [`OutputError::AlreadyResolved`].
pub struct OutputCompleter<T> {
    sender: Arc<Mutex<Option<oneshot::Sender<Completion<T>>>>>,
}

impl<T> Clone for OutputCompleter<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T> core::fmt::Debug for OutputCompleter<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OutputCompleter")
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl<T> OutputCompleter<T> {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Completion<T>>) {
        let (tx, rx) = oneshot::channel();
        let completer = Self {
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        (completer, rx)
    }

    /// Resolves the output with `data`.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::AlreadyResolved`] if the output was already
    /// resolved or rejected.
    pub fn resolve(&self, data: OutputData<T>) -> Result<(), OutputError> {
        self.complete(Ok(data))
    }

    /// Fails the output with `error`.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::AlreadyResolved`] if the output was already
    /// resolved or rejected.
    pub fn reject(&self, error: OutputError) -> Result<(), OutputError> {
        self.complete(Err(error))
    }

    /// Returns `true` once the output has been resolved or rejected.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.sender.lock().is_none()
    }

    fn complete(&self, completion: Completion<T>) -> Result<(), OutputError> {
        let sender = self
            .sender
            .lock()
            .take()
            .ok_or(OutputError::AlreadyResolved)?;

        // Nobody is listening once every output clone is gone; that is fine.
        let _ = sender.send(completion);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_slot() {
        let (completer, _rx) = OutputCompleter::<u8>::channel();
        let other = completer.clone();

        other.resolve(OutputData::known(1, false)).unwrap();
        assert!(completer.is_completed());
        assert_eq!(
            completer.reject(OutputError::Abandoned),
            Err(OutputError::AlreadyResolved)
        );
    }

    #[test]
    fn resolving_without_listener_succeeds() {
        let (completer, rx) = OutputCompleter::<u8>::channel();
        drop(rx);
        assert!(completer.resolve(OutputData::known(1, false)).is_ok());
    }
}
