//! Test utilities and mock implementations.
//!
//! Recording collaborators for exercising the navigation pipeline without a
//! real presentation surface.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::error::NavigationError;
use crate::interfaces::{
    DataReceiver, Destination, DestinationRef, EventBindings, Payload, Presenter,
    ProtectionHandler, ProtectionSpace,
};
use crate::request::TargetSpec;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared, ordered log of pipeline events, for ordering assertions.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        lock(&self.entries).push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }

    /// Index of the first entry equal to `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        lock(&self.entries).iter().position(|e| e == entry)
    }
}

/// Destination that records what happens to it.
pub struct TestScreen {
    name: String,
    receives_data: bool,
    log: Option<EventLog>,
    received: Mutex<Vec<Option<Payload>>>,
    events: Mutex<Option<EventBindings>>,
}

impl TestScreen {
    /// Screen that does not accept data.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            receives_data: false,
            log: None,
            received: Mutex::new(Vec::new()),
            events: Mutex::new(None),
        }
    }

    /// Screen that accepts data.
    pub fn receiving(name: impl Into<String>) -> Self {
        Self {
            receives_data: true,
            ..Self::new(name)
        }
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Payloads received, in order.
    pub fn received(&self) -> Vec<Option<Payload>> {
        lock(&self.received).clone()
    }

    /// Fire a bound lifecycle event, returning how many callbacks ran.
    pub fn emit(&self, event: &str) -> usize {
        lock(&self.events)
            .as_ref()
            .map(|events| events.emit(event))
            .unwrap_or(0)
    }
}

impl Destination for TestScreen {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind_events(&self, events: &EventBindings) {
        *lock(&self.events) = Some(events.clone());
    }

    fn data_receiver(&self) -> Option<&dyn DataReceiver> {
        if self.receives_data {
            Some(self)
        } else {
            None
        }
    }
}

impl DataReceiver for TestScreen {
    fn receive_data(&self, payload: Option<Payload>) {
        if let Some(log) = &self.log {
            log.record(format!("data:{}", self.name));
        }
        lock(&self.received).push(payload);
    }
}

/// `Default` destination, for destination-type factories.
#[derive(Debug, Default)]
pub struct BlankScreen;

impl Destination for BlankScreen {
    fn name(&self) -> &str {
        "blank"
    }
}

/// Container produced by embedding.
pub struct ContainerScreen {
    pub inner: DestinationRef,
}

impl Destination for ContainerScreen {
    fn name(&self) -> &str {
        "container"
    }
}

/// One call made to a [`RecordingPresenter`].
#[derive(Debug, Clone)]
pub enum PresenterCall {
    Push {
        destination: DestinationRef,
        animated: bool,
    },
    Present {
        destination: DestinationRef,
        animated: bool,
    },
    Back {
        destination: DestinationRef,
        steps: usize,
        animated: bool,
    },
}

impl PresenterCall {
    pub fn destination(&self) -> &DestinationRef {
        match self {
            PresenterCall::Push { destination, .. }
            | PresenterCall::Present { destination, .. }
            | PresenterCall::Back { destination, .. } => destination,
        }
    }
}

/// Presenter recording every call.
///
/// Optionally sleeps per call, or holds presentations of specific
/// destinations until a permit is released on their semaphore.
#[derive(Default)]
pub struct RecordingPresenter {
    calls: Mutex<Vec<PresenterCall>>,
    top: Mutex<Option<DestinationRef>>,
    delay: Option<Duration>,
    holds: HashMap<String, Arc<Semaphore>>,
    log: Option<EventLog>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Hold forward presentations of `name` until a permit is added to the
    /// returned semaphore.
    pub fn hold(mut self, name: &str) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.holds.insert(name.to_string(), gate.clone());
        (self, gate)
    }

    pub fn calls(&self) -> Vec<PresenterCall> {
        lock(&self.calls).clone()
    }

    /// Names of forward-presented destinations, in order.
    pub fn displayed_names(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter(|c| !matches!(c, PresenterCall::Back { .. }))
            .map(|c| c.destination().name().to_string())
            .collect()
    }

    async fn perform(&self, call: PresenterCall) {
        let name = call.destination().name().to_string();
        if let Some(log) = &self.log {
            log.record(format!("present:{name}"));
        }
        if !matches!(call, PresenterCall::Back { .. }) {
            if let Some(gate) = self.holds.get(&name) {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        *lock(&self.top) = Some(call.destination().clone());
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    fn source(&self) -> Option<DestinationRef> {
        lock(&self.top).clone()
    }

    async fn push(&self, container: DestinationRef, animated: bool) {
        self.perform(PresenterCall::Push {
            destination: container,
            animated,
        })
        .await;
    }

    async fn present(&self, container: DestinationRef, animated: bool) {
        self.perform(PresenterCall::Present {
            destination: container,
            animated,
        })
        .await;
    }

    async fn back(&self, destination: DestinationRef, steps: usize, animated: bool) {
        self.perform(PresenterCall::Back {
            destination,
            steps,
            animated,
        })
        .await;
    }
}

/// What a [`ScriptedProtection`] does with its handler.
#[derive(Debug, Clone)]
pub enum ProtectionScript {
    Unprotect,
    Cancel,
    CancelWith(String),
    /// Drop the handler without deciding.
    Drop,
    /// Keep the handler until released by the test.
    Defer,
}

/// Protection space following a fixed script.
pub struct ScriptedProtection {
    active: AtomicBool,
    script: ProtectionScript,
    protect_calls: AtomicUsize,
    deferred: Mutex<Vec<ProtectionHandler>>,
}

impl ScriptedProtection {
    pub fn new(script: ProtectionScript) -> Self {
        Self {
            active: AtomicBool::new(true),
            script,
            protect_calls: AtomicUsize::new(0),
            deferred: Mutex::new(Vec::new()),
        }
    }

    /// `should_protect` returns false.
    pub fn inactive() -> Self {
        let space = Self::new(ProtectionScript::Unprotect);
        space.set_active(false);
        space
    }

    pub fn unprotecting() -> Self {
        Self::new(ProtectionScript::Unprotect)
    }

    pub fn cancelling() -> Self {
        Self::new(ProtectionScript::Cancel)
    }

    pub fn cancelling_with(message: &str) -> Self {
        Self::new(ProtectionScript::CancelWith(message.to_string()))
    }

    pub fn dropping() -> Self {
        Self::new(ProtectionScript::Drop)
    }

    pub fn deferred() -> Self {
        Self::new(ProtectionScript::Defer)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn protect_calls(&self) -> usize {
        self.protect_calls.load(Ordering::SeqCst)
    }

    /// Unprotect the oldest deferred handler. False if none is waiting.
    pub fn release_unprotect(&self) -> bool {
        match self.take_deferred() {
            Some(handler) => {
                handler.unprotect();
                true
            }
            None => false,
        }
    }

    /// Cancel the oldest deferred handler. False if none is waiting.
    pub fn release_cancel(&self, error: Option<NavigationError>) -> bool {
        match self.take_deferred() {
            Some(handler) => {
                match error {
                    Some(error) => handler.cancel_with_error(error),
                    None => handler.cancel(),
                }
                true
            }
            None => false,
        }
    }

    fn take_deferred(&self) -> Option<ProtectionHandler> {
        let mut deferred = lock(&self.deferred);
        if deferred.is_empty() {
            None
        } else {
            Some(deferred.remove(0))
        }
    }
}

impl ProtectionSpace for ScriptedProtection {
    fn should_protect(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn protect(&self, handler: ProtectionHandler) {
        self.protect_calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            ProtectionScript::Unprotect => handler.unprotect(),
            ProtectionScript::Cancel => handler.cancel(),
            ProtectionScript::CancelWith(message) => {
                handler.cancel_with_error(NavigationError::protection_msg(message.clone()))
            }
            ProtectionScript::Drop => drop(handler),
            ProtectionScript::Defer => lock(&self.deferred).push(handler),
        }
    }
}

/// Lazy factory producing a fresh `TestScreen` per call, counting calls.
pub fn counting_factory(name: &str, calls: Arc<AtomicUsize>) -> TargetSpec {
    let name = name.to_string();
    TargetSpec::factory(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        let destination: DestinationRef = Arc::new(TestScreen::new(name.clone()));
        async move { Ok(destination) }
    })
}

/// Lazy factory that always fails with `message`.
pub fn failing_factory(message: &str) -> TargetSpec {
    let message = message.to_string();
    TargetSpec::factory(move || {
        let message = message.clone();
        async move { Err(NavigationError::resolution_msg(message)) }
    })
}
