//! Presentation surface interface.
//!
//! The surface actually displays destinations. Each call resolves once the
//! transition has visually finished; that resolution is the "on complete"
//! signal the executor waits for.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::destination::DestinationRef;

/// How a destination is brought on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Push,
    Present,
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionKind::Push => write!(f, "push"),
            TransitionKind::Present => write!(f, "present"),
        }
    }
}

/// Displays destinations.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// The destination currently on top, reported as the source of the next
    /// transition.
    fn source(&self) -> Option<DestinationRef> {
        None
    }

    /// Push `container` onto the current stack.
    async fn push(&self, container: DestinationRef, animated: bool);

    /// Present `container` modally.
    async fn present(&self, container: DestinationRef, animated: bool);

    /// Reverse transition back to `destination`, skipping `steps` screens.
    async fn back(&self, destination: DestinationRef, steps: usize, animated: bool);
}
