//! Navigation history and back-navigation.
//!
//! The stack records every committed transition. Going back `k` steps removes
//! the `k + 1` newest entries; the oldest of those is navigated back to and
//! becomes the implicit current screen, no longer present in the stack.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::interfaces::{DestinationRef, Presenter, TransitionKind};

/// One committed transition.
#[derive(Debug, Clone)]
pub struct HistoryItem {
    destination: DestinationRef,
    kind: TransitionKind,
    timestamp: DateTime<Utc>,
}

impl HistoryItem {
    pub fn new(destination: DestinationRef, kind: TransitionKind) -> Self {
        Self {
            destination,
            kind,
            timestamp: Utc::now(),
        }
    }

    /// The displayed destination (the container, when embedded).
    pub fn destination(&self) -> &DestinationRef {
        &self.destination
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Drive a reverse transition back to this item.
    pub async fn go_back(&self, presenter: &dyn Presenter, steps: usize, animated: bool) {
        presenter
            .back(self.destination.clone(), steps, animated)
            .await;
    }
}

/// Ordered log of committed transitions.
#[derive(Debug, Default)]
pub struct HistoryStack {
    items: RwLock<Vec<HistoryItem>>,
    capacity: Option<usize>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack keeping at most `capacity` items; the oldest are dropped first.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            capacity,
        }
    }

    pub async fn add(&self, item: HistoryItem) {
        let mut items = self.items.write().await;
        debug!(
            destination = %item.destination.name(),
            kind = %item.kind,
            depth = items.len() + 1,
            "History item added"
        );
        items.push(item);
        if let Some(capacity) = self.capacity {
            if items.len() > capacity {
                let excess = items.len() - capacity;
                items.drain(..excess);
            }
        }
    }

    /// Snapshot of the stack, oldest first.
    pub async fn items(&self) -> Vec<HistoryItem> {
        self.items.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.items.write().await.clear();
    }

    /// Remove the entries covered by going back `steps`, returning the target.
    ///
    /// With `n` items and `n < steps + 1` nothing changes and `None` is
    /// returned. Otherwise the stack keeps only `items[..n - steps - 1]`.
    pub async fn truncate_back(&self, steps: usize) -> Option<HistoryItem> {
        let mut items = self.items.write().await;
        let n = items.len();
        let needed = steps.checked_add(1)?;
        if n < needed {
            debug!(steps, depth = n, "Not enough history to go back");
            return None;
        }
        let index = n - needed;
        let mut removed = items.drain(index..);
        removed.next()
    }

    /// Go back `steps` through `presenter`.
    ///
    /// Returns the item navigated to, once the presenter reports the reverse
    /// transition finished. `None` means nothing happened.
    #[tracing::instrument(name = "navigation.back", skip(self, presenter))]
    pub async fn back(
        &self,
        presenter: &dyn Presenter,
        steps: usize,
        animated: bool,
    ) -> Option<HistoryItem> {
        let target = self.truncate_back(steps).await?;
        target.go_back(presenter, steps, animated).await;
        info!(
            destination = %target.destination.name(),
            "Back navigation completed"
        );
        Some(target)
    }
}
