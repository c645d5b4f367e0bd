//! Transition executor.
//!
//! Drives one request through the pipeline as straight-line async code:
//!
//! ```text
//! Created ─▶ Protecting ─▶ Resolving ─▶ Caching ─▶ InjectingData ─▶ Presenting ─▶ Completed
//!    │            │             │
//!    └────────────┼─────────────┘ (gate open: Created ─▶ Resolving)
//!                 ▼             ▼
//!              Aborted       Aborted
//! ```
//!
//! Errors surface only through the request's failure observers and the
//! returned outcome. There is no retry: an aborted request is final.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::data::DataPromise;
use super::gate::{GateDecision, ProtectionGate};
use super::resolver::TargetResolver;
use crate::error::NavigationError;
use crate::history::{HistoryItem, HistoryStack};
use crate::interfaces::{DestinationRef, Payload, Presenter, TransitionKind};
use crate::request::NavigationRequest;

/// Pipeline state of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Created,
    Protecting,
    Resolving,
    Caching,
    InjectingData,
    Presenting,
    Completed,
    Aborted,
}

impl TransitionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransitionState::Completed | TransitionState::Aborted)
    }
}

/// Result handed to success observers.
#[derive(Clone)]
pub struct NavigationResult {
    pub request_id: Uuid,
    pub kind: TransitionKind,
    /// Destination on top before the transition, as reported by the presenter.
    pub source: Option<DestinationRef>,
    /// The resolved destination (what received data and was cached).
    pub destination: DestinationRef,
    /// Embedding container that was actually displayed, if any.
    pub container: Option<DestinationRef>,
    pub payload: Option<Payload>,
}

impl fmt::Debug for NavigationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationResult")
            .field("request_id", &self.request_id)
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("container", &self.container)
            .field("payload", &self.payload)
            .finish()
    }
}

/// Terminal outcome of a request.
#[derive(Debug, Clone)]
pub enum NavigationOutcome {
    Completed(NavigationResult),
    /// Aborted by protection or resolution. `None` is a silent cancel.
    Aborted(Option<NavigationError>),
}

impl NavigationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, NavigationOutcome::Completed(_))
    }

    pub fn result(&self) -> Option<&NavigationResult> {
        match self {
            NavigationOutcome::Completed(result) => Some(result),
            NavigationOutcome::Aborted(_) => None,
        }
    }

    pub fn error(&self) -> Option<&NavigationError> {
        match self {
            NavigationOutcome::Aborted(error) => error.as_ref(),
            NavigationOutcome::Completed(_) => None,
        }
    }
}

/// Publishes a transition's state as it advances.
pub struct StateReporter {
    sender: watch::Sender<TransitionState>,
}

impl StateReporter {
    /// Reporter starting at `Created`, and a receiver following it.
    pub fn channel() -> (Self, watch::Receiver<TransitionState>) {
        let (sender, receiver) = watch::channel(TransitionState::Created);
        (Self { sender }, receiver)
    }

    pub fn current(&self) -> TransitionState {
        *self.sender.borrow()
    }

    /// Move to `Aborted` unless already terminal. Returns the state that was
    /// current.
    pub(crate) fn abandon(&self) -> TransitionState {
        let current = self.current();
        if !current.is_terminal() {
            self.advance(TransitionState::Aborted);
        }
        current
    }

    fn advance(&self, state: TransitionState) {
        let previous = self.sender.send_replace(state);
        debug!(from = ?previous, to = ?state, "Transition state changed");
    }
}

/// Runs requests through the navigation pipeline.
pub struct TransitionExecutor {
    resolver: TargetResolver,
    presenter: Arc<dyn Presenter>,
    history: Arc<HistoryStack>,
    default_animated: bool,
}

impl TransitionExecutor {
    pub fn new(
        resolver: TargetResolver,
        presenter: Arc<dyn Presenter>,
        history: Arc<HistoryStack>,
        default_animated: bool,
    ) -> Self {
        Self {
            resolver,
            presenter,
            history,
            default_animated,
        }
    }

    /// Execute `request`, reporting progress through `state`.
    #[tracing::instrument(
        name = "navigation.execute",
        skip_all,
        fields(request_id = %request.id(), kind = %request.kind(), target = request.target().variant())
    )]
    pub async fn execute(
        &self,
        request: &NavigationRequest,
        state: &StateReporter,
    ) -> NavigationOutcome {
        // Protecting
        let gate = ProtectionGate::evaluate(request.protection());
        if gate.is_engaged() {
            state.advance(TransitionState::Protecting);
            if let GateDecision::Abort(error) = gate.pass().await {
                return self.abort(request, state, error);
            }
        }

        // Resolving
        state.advance(TransitionState::Resolving);
        let mut resolved = match self.resolver.resolve(request).await {
            Ok(resolved) => resolved,
            Err(error) => return self.abort(request, state, Some(error)),
        };
        let destination = resolved.destination().clone();
        destination.bind_events(request.events());
        let container = request
            .embedding()
            .map(|embed| embed(Arc::clone(&destination)));

        // Caching
        state.advance(TransitionState::Caching);
        if let (Some(vacancy), Some(policy)) = (resolved.take_vacancy(), request.cache_policy()) {
            vacancy.insert(Arc::clone(&destination), policy.lifetime).await;
        }

        // InjectingData
        state.advance(TransitionState::InjectingData);
        let payload = if destination.data_receiver().is_some() {
            let payload = DataPromise::new(request.data_passing()).resolve().await;
            if let Some(receiver) = destination.data_receiver() {
                receiver.receive_data(payload.clone());
            }
            payload
        } else {
            if request.data_passing().is_some() {
                debug!(
                    destination = %destination.name(),
                    "Destination does not receive data, skipping data resolution"
                );
            }
            None
        };

        // Presenting
        state.advance(TransitionState::Presenting);
        let source = self.presenter.source();
        let animated = request.animated_override().unwrap_or(self.default_animated);
        let displayed = container.clone().unwrap_or_else(|| Arc::clone(&destination));
        match request.kind() {
            TransitionKind::Push => self.presenter.push(displayed.clone(), animated).await,
            TransitionKind::Present => self.presenter.present(displayed.clone(), animated).await,
        }

        // Completed
        let result = NavigationResult {
            request_id: request.id(),
            kind: request.kind(),
            source,
            destination,
            container,
            payload,
        };
        state.advance(TransitionState::Completed);
        for observer in request.success_observers() {
            observer(&result);
        }
        self.history
            .add(HistoryItem::new(displayed, request.kind()))
            .await;

        info!(
            destination = %result.destination.name(),
            embedded = result.container.is_some(),
            has_payload = result.payload.is_some(),
            "Navigation completed"
        );
        NavigationOutcome::Completed(result)
    }

    fn abort(
        &self,
        request: &NavigationRequest,
        state: &StateReporter,
        error: Option<NavigationError>,
    ) -> NavigationOutcome {
        let stage = state.current();
        state.advance(TransitionState::Aborted);
        match &error {
            Some(error) => {
                warn!(
                    ?stage,
                    error.kind = error.kind(),
                    error = %error,
                    "Navigation aborted"
                );
                for observer in request.failure_observers() {
                    observer(error);
                }
            }
            None => info!(?stage, "Navigation cancelled"),
        }
        NavigationOutcome::Aborted(error)
    }
}
