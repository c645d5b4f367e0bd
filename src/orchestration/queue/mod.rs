//! Execution queue for safe navigations.
//!
//! A single worker task drains an unbounded FIFO and runs one [`Task`] at a
//! time to completion before starting the next. Tasks are never reordered or
//! dropped; a panicking task is logged and still finishes, so the worker never
//! stalls.
//!
//! Unsafe navigations do not go through the queue: [`Task::spawn_detached`]
//! starts them immediately alongside whatever the worker is doing.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Lifecycle of a queued task. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Finished,
}

/// One unit of queued work.
pub struct Task {
    id: Uuid,
    state: watch::Sender<TaskState>,
    work: BoxFuture<'static, ()>,
}

impl Task {
    /// Wrap `work`, returning the task and a handle observing it.
    pub fn new<F>(id: Uuid, work: F) -> (Self, TaskHandle)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (state, receiver) = watch::channel(TaskState::Pending);
        let task = Self {
            id,
            state,
            work: work.boxed(),
        };
        (task, TaskHandle { id, state: receiver })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run to completion. Always ends in `Finished`, even if the work panics.
    pub async fn run(self) {
        self.state.send_replace(TaskState::Running);
        debug!(task_id = %self.id, "Task running");

        if AssertUnwindSafe(self.work).catch_unwind().await.is_err() {
            error!(task_id = %self.id, "Task panicked; marking finished");
        }

        self.state.send_replace(TaskState::Finished);
        debug!(task_id = %self.id, "Task finished");
    }

    /// Run outside any queue, starting immediately on the runtime.
    pub fn spawn_detached(self) {
        tokio::spawn(self.run());
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Observes a task's state.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: Uuid,
    state: watch::Receiver<TaskState>,
}

impl TaskHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    /// Wait until the task is finished.
    ///
    /// Also returns if the task was dropped without running (queue closed).
    pub async fn finished(&mut self) {
        let _ = self.state.wait_for(|s| *s == TaskState::Finished).await;
    }
}

/// Single-worker FIFO.
pub struct ExecutionQueue {
    sender: mpsc::UnboundedSender<Task>,
    outstanding: Arc<AtomicUsize>,
}

impl ExecutionQueue {
    /// Create the queue and spawn its worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Task>();
        let outstanding = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&outstanding);
        tokio::spawn(async move {
            while let Some(task) = receiver.recv().await {
                task.run().await;
                counter.fetch_sub(1, Ordering::SeqCst);
            }
            debug!("Execution queue closed, worker stopping");
        });

        Self {
            sender,
            outstanding,
        }
    }

    /// Append a task. Returns false if the worker is gone.
    pub fn enqueue(&self, task: Task) -> bool {
        let id = task.id();
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        match self.sender.send(task) {
            Ok(()) => {
                debug!(task_id = %id, "Task queued");
                true
            }
            Err(mpsc::error::SendError(task)) => {
                self.outstanding.fetch_sub(1, Ordering::SeqCst);
                warn!(task_id = %task.id(), "Execution queue closed, task dropped");
                false
            }
        }
    }

    /// Tasks queued or running.
    pub fn len(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ExecutionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionQueue")
            .field("outstanding", &self.len())
            .finish()
    }
}
