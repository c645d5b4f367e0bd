//! Protection space interface: asynchronous preconditions on navigation.

use std::fmt;

use tokio::sync::oneshot;

use crate::error::NavigationError;
use crate::utils::completion::Completion;

/// Terminal decision of a protection handler.
#[derive(Debug, Clone)]
pub enum ProtectionOutcome {
    /// Resume the pipeline.
    Unprotected,
    /// Abort the pipeline. Failure observers fire only when an error is present.
    Cancelled(Option<NavigationError>),
}

/// Handle passed to [`ProtectionSpace::protect`].
///
/// Exactly one of [`unprotect`](Self::unprotect) or
/// [`cancel`](Self::cancel)/[`cancel_with`](Self::cancel_with) must be called.
/// Both consume the handle. Dropping it without a decision is treated as a
/// cancel without error.
pub struct ProtectionHandler {
    completion: Completion<ProtectionOutcome>,
}

impl ProtectionHandler {
    pub(crate) fn new() -> (Self, oneshot::Receiver<ProtectionOutcome>) {
        let (completion, receiver) = Completion::channel();
        (Self { completion }, receiver)
    }

    /// Allow the navigation to proceed.
    pub fn unprotect(self) {
        self.completion.complete(ProtectionOutcome::Unprotected);
    }

    /// Abort the navigation silently.
    pub fn cancel(self) {
        self.completion.complete(ProtectionOutcome::Cancelled(None));
    }

    /// Abort the navigation, reporting `error` to failure observers.
    pub fn cancel_with<E>(self, error: E)
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.completion
            .complete(ProtectionOutcome::Cancelled(Some(NavigationError::protection(error))));
    }

    /// Abort with an already-built navigation error.
    pub fn cancel_with_error(self, error: NavigationError) {
        self.completion
            .complete(ProtectionOutcome::Cancelled(Some(error)));
    }
}

impl fmt::Debug for ProtectionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectionHandler").finish_non_exhaustive()
    }
}

/// An asynchronous precondition gate (e.g. authentication).
pub trait ProtectionSpace: Send + Sync {
    /// Whether the gate applies right now. Evaluated once per transition.
    fn should_protect(&self) -> bool;

    /// Start the protection flow. The implementation owns `handler` and must
    /// eventually decide, from any thread or task.
    fn protect(&self, handler: ProtectionHandler);
}
