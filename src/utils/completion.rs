//! One-shot completion handles for callback-style collaborators.
//!
//! External collaborators (resolvers, data sources, protection spaces) are
//! contracted to call back exactly once. `Completion` makes that structural:
//! completing consumes the handle, so a second call does not compile.

use tokio::sync::oneshot;
use tracing::debug;

/// Single-use completion handle.
#[derive(Debug)]
pub struct Completion<T> {
    sender: oneshot::Sender<T>,
}

impl<T> Completion<T> {
    /// Create a completion handle and the receiver awaiting it.
    pub fn channel() -> (Self, oneshot::Receiver<T>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// Deliver the value. Consumes the handle.
    pub fn complete(self, value: T) {
        if self.sender.send(value).is_err() {
            debug!("Completion delivered after its receiver was dropped");
        }
    }

    /// Whether the awaiting side has gone away.
    pub fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }
}
