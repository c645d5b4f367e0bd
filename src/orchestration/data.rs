//! Data promise: the payload delivered to a destination before display.

use std::fmt;

use crate::interfaces::Payload;
use crate::request::{DataPassing, PayloadSource};

/// Payload for one transition, resolved at most once.
pub enum DataPromise {
    /// No data passing configured.
    None,
    /// Already resolved.
    Sync(Payload),
    /// Pending computation.
    Async(PayloadSource),
}

impl DataPromise {
    pub fn new(passing: Option<&DataPassing>) -> Self {
        match passing {
            None => DataPromise::None,
            Some(DataPassing::Sync(payload)) => DataPromise::Sync(payload.clone()),
            Some(DataPassing::Async(source)) => DataPromise::Async(source.clone()),
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, DataPromise::None)
    }

    /// Resolve the payload. `Sync` and `None` never suspend.
    pub async fn resolve(self) -> Option<Payload> {
        match self {
            DataPromise::None => None,
            DataPromise::Sync(payload) => Some(payload),
            DataPromise::Async(source) => source().await,
        }
    }
}

impl fmt::Debug for DataPromise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataPromise::None => f.write_str("None"),
            DataPromise::Sync(payload) => f.debug_tuple("Sync").field(payload).finish(),
            DataPromise::Async(_) => f.write_str("Async"),
        }
    }
}
