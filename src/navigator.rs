//! Navigator service.
//!
//! Bundles the execution queue, destination cache, history stack and
//! presentation surface into one explicitly constructed service. Nothing here
//! is global: each `Navigator` owns its own queue worker and state.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::cache::DestinationCache;
use crate::config::NavigatorConfig;
use crate::error::NavigationError;
use crate::history::{HistoryItem, HistoryStack};
use crate::interfaces::Presenter;
use crate::orchestration::executor::{
    NavigationOutcome, StateReporter, TransitionExecutor, TransitionState,
};
use crate::orchestration::queue::{ExecutionQueue, Task, TaskHandle, TaskState};
use crate::orchestration::resolver::TargetResolver;
use crate::request::NavigationRequest;

/// Tracks one scheduled navigation.
pub struct NavigationHandle {
    request_id: Uuid,
    task: TaskHandle,
    state: watch::Receiver<TransitionState>,
    outcome: oneshot::Receiver<NavigationOutcome>,
}

impl NavigationHandle {
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Current pipeline state.
    pub fn state(&self) -> TransitionState {
        *self.state.borrow()
    }

    /// Current queue task state.
    pub fn task_state(&self) -> TaskState {
        self.task.state()
    }

    /// Wait until the pipeline reaches `state` or a terminal state.
    pub async fn wait_for_state(&mut self, state: TransitionState) -> TransitionState {
        let reached = self
            .state
            .wait_for(|s| *s == state || s.is_terminal())
            .await
            .map(|current| *current);
        match reached {
            Ok(current) => current,
            Err(_) => *self.state.borrow(),
        }
    }

    /// Wait for the terminal outcome.
    ///
    /// If the navigation was dropped before running (its queue shut down),
    /// this reports a silent abort.
    pub async fn outcome(self) -> NavigationOutcome {
        self.outcome
            .await
            .unwrap_or(NavigationOutcome::Aborted(None))
    }
}

impl fmt::Debug for NavigationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationHandle")
            .field("request_id", &self.request_id)
            .field("state", &self.state())
            .field("task_state", &self.task_state())
            .finish()
    }
}

/// Entry point for navigation.
pub struct Navigator {
    queue: ExecutionQueue,
    executor: Arc<TransitionExecutor>,
    cache: Arc<DestinationCache>,
    history: Arc<HistoryStack>,
    presenter: Arc<dyn Presenter>,
    config: NavigatorConfig,
}

impl Navigator {
    /// Create a navigator with fresh cache and history.
    ///
    /// Spawns the queue worker, so this must run inside a tokio runtime.
    pub fn new(presenter: Arc<dyn Presenter>, config: NavigatorConfig) -> Self {
        let cache = Arc::new(DestinationCache::new());
        let history = Arc::new(HistoryStack::with_capacity(config.history.capacity));
        Self::with_services(presenter, cache, history, config)
    }

    /// Create a navigator over existing cache and history services.
    pub fn with_services(
        presenter: Arc<dyn Presenter>,
        cache: Arc<DestinationCache>,
        history: Arc<HistoryStack>,
        config: NavigatorConfig,
    ) -> Self {
        let resolver_cache = config.cache.enabled.then(|| Arc::clone(&cache));
        let executor = Arc::new(TransitionExecutor::new(
            TargetResolver::new(resolver_cache),
            Arc::clone(&presenter),
            Arc::clone(&history),
            config.animated,
        ));

        info!(
            animated = config.animated,
            cache_enabled = config.cache.enabled,
            history_capacity = ?config.history.capacity,
            "Navigator initialized"
        );

        Self {
            queue: ExecutionQueue::new(),
            executor,
            cache,
            history,
            presenter,
            config,
        }
    }

    /// Schedule `request`.
    ///
    /// Safe requests join the execution queue and commit in submission order.
    /// Unsafe requests start immediately, independent of the queue.
    /// A panic anywhere in the pipeline ends the request with
    /// [`NavigationError::Panicked`]; observers are not called for it.
    pub fn navigate(&self, request: NavigationRequest) -> NavigationHandle {
        let request_id = request.id();
        let is_safe = request.is_safe();
        let (reporter, state) = StateReporter::channel();
        let (outcome_tx, outcome) = oneshot::channel();

        let executor = Arc::clone(&self.executor);
        let work = async move {
            let execution = AssertUnwindSafe(executor.execute(&request, &reporter));
            let result = match execution.catch_unwind().await {
                Ok(result) => result,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    let stage = reporter.abandon();
                    error!(%request_id, ?stage, %message, "Navigation panicked");
                    NavigationOutcome::Aborted(Some(NavigationError::Panicked(message)))
                }
            };
            if outcome_tx.send(result).is_err() {
                debug!(%request_id, "Navigation handle dropped before outcome");
            }
        };
        let (task, task_handle) = Task::new(request_id, work);

        if is_safe {
            self.queue.enqueue(task);
        } else {
            debug!(%request_id, "Unsafe navigation bypassing queue");
            task.spawn_detached();
        }

        NavigationHandle {
            request_id,
            task: task_handle,
            state,
            outcome,
        }
    }

    /// Go back `steps` through the history.
    ///
    /// Returns the item navigated to, or `None` when there is not enough
    /// history. Resolves once the presenter finishes the reverse transition.
    pub async fn back(&self, steps: usize, animated: bool) -> Option<HistoryItem> {
        self.history
            .back(self.presenter.as_ref(), steps, animated)
            .await
    }

    /// Clear cache and history.
    pub async fn reset(&self) {
        self.cache.clear().await;
        self.history.clear().await;
        debug!("Navigator reset");
    }

    pub fn cache(&self) -> &Arc<DestinationCache> {
        &self.cache
    }

    pub fn history(&self) -> &Arc<HistoryStack> {
        &self.history
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Safe navigations queued or running.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("queue", &self.queue)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
