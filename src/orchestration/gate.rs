//! Protection gate.
//!
//! Suspends a transition behind a [`ProtectionSpace`] until its handler
//! unprotects or cancels. When the space does not currently protect, the gate
//! is open and passing it never suspends.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::NavigationError;
use crate::interfaces::{ProtectionHandler, ProtectionOutcome, ProtectionSpace};

/// What the pipeline does after the gate.
#[derive(Debug, Clone)]
pub enum GateDecision {
    /// Continue to resolution.
    Proceed,
    /// Stop. Failure observers fire only when an error is present.
    Abort(Option<NavigationError>),
}

/// Gate evaluated for one transition.
pub struct ProtectionGate {
    space: Option<Arc<dyn ProtectionSpace>>,
}

impl ProtectionGate {
    /// Evaluate `should_protect` once. The gate engages only if it returns true.
    pub fn evaluate(space: Option<&Arc<dyn ProtectionSpace>>) -> Self {
        let space = space.filter(|s| s.should_protect()).cloned();
        Self { space }
    }

    /// Whether passing the gate will suspend on the protection handler.
    pub fn is_engaged(&self) -> bool {
        self.space.is_some()
    }

    /// Pass the gate.
    ///
    /// An open gate resolves on first poll. An engaged one hands a fresh
    /// handler to the space and waits for its decision; a handler dropped
    /// without deciding counts as a silent cancel.
    pub async fn pass(self) -> GateDecision {
        let Some(space) = self.space else {
            return GateDecision::Proceed;
        };

        let (handler, decision) = ProtectionHandler::new();
        debug!("Protection engaged");
        space.protect(handler);

        match decision.await {
            Ok(ProtectionOutcome::Unprotected) => {
                debug!("Protection lifted");
                GateDecision::Proceed
            }
            Ok(ProtectionOutcome::Cancelled(error)) => {
                debug!(has_error = error.is_some(), "Protection cancelled");
                GateDecision::Abort(error)
            }
            Err(_) => {
                warn!("Protection handler dropped without a decision, cancelling");
                GateDecision::Abort(None)
            }
        }
    }
}
