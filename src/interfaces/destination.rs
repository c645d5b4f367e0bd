//! Destination interface: the screen or object being navigated to.

use std::fmt;
use std::sync::Arc;

/// Data handed to a destination before it is displayed.
pub type Payload = serde_json::Value;

/// Shared handle to a destination.
pub type DestinationRef = Arc<dyn Destination>;

/// Something that can be navigated to.
///
/// The orchestration core never renders a destination; it only resolves,
/// caches, feeds and hands it to the [`Presenter`](super::Presenter).
pub trait Destination: Send + Sync + 'static {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Receive the request's event callbacks.
    ///
    /// Called once per transition, right after resolution and before the
    /// destination is cached, fed or displayed.
    fn bind_events(&self, _events: &EventBindings) {}

    /// Data-receiving capability, if this destination accepts data.
    ///
    /// Returning `None` skips data resolution entirely for the transition.
    fn data_receiver(&self) -> Option<&dyn DataReceiver> {
        None
    }
}

impl fmt::Debug for dyn Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Destination").field(&self.name()).finish()
    }
}

/// Capability of a destination to receive a payload.
pub trait DataReceiver: Send + Sync {
    /// Deliver the resolved payload. Called strictly before presentation.
    fn receive_data(&self, payload: Option<Payload>);
}

/// Identity comparison of two destination handles.
pub fn same_destination(a: &DestinationRef, b: &DestinationRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// A destination "type": a named no-argument constructor.
///
/// Produced by lazy class factories and routing lookups; instantiated by the
/// resolver.
#[derive(Clone, Copy)]
pub struct DestinationType {
    name: &'static str,
    construct: fn() -> DestinationRef,
}

fn construct_default<T: Destination + Default>() -> DestinationRef {
    Arc::new(T::default())
}

impl DestinationType {
    /// Destination type for any `Default` destination.
    pub fn of<T: Destination + Default>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            construct: construct_default::<T>,
        }
    }

    /// Destination type with an explicit constructor.
    pub fn new(name: &'static str, construct: fn() -> DestinationRef) -> Self {
        Self { name, construct }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Create a fresh instance.
    pub fn instantiate(&self) -> DestinationRef {
        (self.construct)()
    }
}

impl fmt::Debug for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DestinationType").field(&self.name).finish()
    }
}

/// Callback bound to a named destination event.
pub type EventCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Named event callbacks carried by a request.
///
/// Destinations keep a clone and call [`EventBindings::emit`] when the
/// corresponding lifecycle event happens on their side.
#[derive(Clone, Default)]
pub struct EventBindings {
    bindings: Vec<(String, EventCallback)>,
}

impl EventBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for `event`.
    pub fn on(&mut self, event: impl Into<String>, callback: EventCallback) {
        self.bindings.push((event.into(), callback));
    }

    /// Invoke every callback registered for `event`, in registration order.
    ///
    /// Returns the number of callbacks invoked.
    pub fn emit(&self, event: &str) -> usize {
        let mut invoked = 0;
        for (name, callback) in &self.bindings {
            if name == event {
                callback(event);
                invoked += 1;
            }
        }
        invoked
    }

    /// Names of all bound events, in registration order.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for EventBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.events()).finish()
    }
}
