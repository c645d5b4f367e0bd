//! Navigation requests.
//!
//! A `NavigationRequest` is the immutable description of one "go to X"
//! intent. It is assembled with the chaining methods below and becomes
//! read-only once handed to the [`Navigator`](crate::Navigator).

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use uuid::Uuid;

use crate::cache::Lifetime;
use crate::error::{NavigationError, Result};
use crate::interfaces::{
    Destination, DestinationRef, DestinationType, EventBindings, Payload, ProtectionSpace, Router,
    TransitionKind,
};
use crate::orchestration::executor::NavigationResult;
use crate::utils::completion::Completion;

/// Future yielding a destination.
pub type DestinationFuture = BoxFuture<'static, Result<DestinationRef>>;
/// Future yielding a destination type.
pub type DestinationTypeFuture = BoxFuture<'static, Result<DestinationType>>;
/// Future yielding an optional payload.
pub type PayloadFuture = BoxFuture<'static, Option<Payload>>;

/// Lazily produces a destination.
pub type DestinationFactory = Arc<dyn Fn() -> DestinationFuture + Send + Sync>;
/// Lazily produces a destination type.
pub type DestinationTypeFactory = Arc<dyn Fn() -> DestinationTypeFuture + Send + Sync>;
/// Lazily produces a payload.
pub type PayloadSource = Arc<dyn Fn() -> PayloadFuture + Send + Sync>;

/// Wraps a resolved destination in a container before display.
pub type Embedding = Arc<dyn Fn(DestinationRef) -> DestinationRef + Send + Sync>;

/// Called with the result of a completed transition.
pub type SuccessObserver = Arc<dyn Fn(&NavigationResult) + Send + Sync>;
/// Called with the error of an aborted transition.
pub type FailureObserver = Arc<dyn Fn(&NavigationError) + Send + Sync>;

/// Where the destination comes from.
#[derive(Clone)]
pub enum TargetSpec {
    /// A ready instance.
    Direct(DestinationRef),
    /// An async factory returning an instance.
    LazyFactory(DestinationFactory),
    /// An async factory returning a type, instantiated with no arguments.
    LazyClassFactory(DestinationTypeFactory),
}

impl TargetSpec {
    pub fn direct(destination: impl Destination) -> Self {
        TargetSpec::Direct(Arc::new(destination))
    }

    pub fn factory<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<DestinationRef>> + Send + 'static,
    {
        TargetSpec::LazyFactory(Arc::new(move || factory().boxed()))
    }

    pub fn class_factory<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<DestinationType>> + Send + 'static,
    {
        TargetSpec::LazyClassFactory(Arc::new(move || factory().boxed()))
    }

    /// Lazy factory for a known destination type.
    pub fn of_type(ty: DestinationType) -> Self {
        Self::class_factory(move || async move { Ok(ty) })
    }

    /// Lazy factory driven by a callback-style resolver.
    ///
    /// The resolver receives a [`Completion`] it must complete exactly once.
    /// Dropping it without completing fails the resolution.
    pub fn from_callback<F>(resolver: F) -> Self
    where
        F: Fn(Completion<Result<DestinationRef>>) + Send + Sync + 'static,
    {
        let resolver = Arc::new(resolver);
        Self::factory(move || {
            let resolver = Arc::clone(&resolver);
            async move {
                let (completion, receiver) = Completion::channel();
                resolver(completion);
                receiver.await.unwrap_or_else(|_| {
                    Err(NavigationError::resolution_msg(
                        "resolver dropped its completion",
                    ))
                })
            }
        })
    }

    /// Lazy factory backed by a routing lookup.
    ///
    /// A miss fails the request with [`NavigationError::RoutingMiss`].
    pub fn routed(router: Arc<dyn Router>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self::factory(move || {
            let route = router.route(&path);
            let path = path.clone();
            async move {
                route
                    .map(|route| route.into_destination())
                    .ok_or(NavigationError::RoutingMiss(path))
            }
        })
    }

    /// Variant name, used as a log field.
    pub fn variant(&self) -> &'static str {
        match self {
            TargetSpec::Direct(_) => "direct",
            TargetSpec::LazyFactory(_) => "lazy_factory",
            TargetSpec::LazyClassFactory(_) => "lazy_class_factory",
        }
    }
}

impl fmt::Debug for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::Direct(d) => f.debug_tuple("Direct").field(d).finish(),
            other => f.write_str(other.variant()),
        }
    }
}

/// Cache identifier and lifetime for a request's destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub identifier: String,
    pub lifetime: Lifetime,
}

/// Payload handed to the destination before display.
#[derive(Clone)]
pub enum DataPassing {
    /// Already available.
    Sync(Payload),
    /// Computed on demand, once per transition.
    Async(PayloadSource),
}

impl DataPassing {
    pub fn sync(payload: impl Into<Payload>) -> Self {
        DataPassing::Sync(payload.into())
    }

    pub fn from_future<F, Fut>(source: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Payload>> + Send + 'static,
    {
        DataPassing::Async(Arc::new(move || source().boxed()))
    }

    /// Payload produced by a callback-style source.
    ///
    /// Dropping the completion without calling it yields no payload.
    pub fn from_callback<F>(source: F) -> Self
    where
        F: Fn(Completion<Option<Payload>>) + Send + Sync + 'static,
    {
        let source = Arc::new(source);
        Self::from_future(move || {
            let source = Arc::clone(&source);
            async move {
                let (completion, receiver) = Completion::channel();
                source(completion);
                receiver.await.unwrap_or(None)
            }
        })
    }
}

impl fmt::Debug for DataPassing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataPassing::Sync(payload) => f.debug_tuple("Sync").field(payload).finish(),
            DataPassing::Async(_) => f.write_str("Async"),
        }
    }
}

/// Immutable description of one navigation intent.
#[derive(Clone)]
pub struct NavigationRequest {
    id: Uuid,
    target: TargetSpec,
    kind: TransitionKind,
    animated: Option<bool>,
    cache_policy: Option<CachePolicy>,
    protection: Option<Arc<dyn ProtectionSpace>>,
    data_passing: Option<DataPassing>,
    embedding: Option<Embedding>,
    events: EventBindings,
    is_safe: bool,
    success_observers: Vec<SuccessObserver>,
    failure_observers: Vec<FailureObserver>,
}

impl NavigationRequest {
    /// New safe request with no options.
    pub fn new(kind: TransitionKind, target: TargetSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            kind,
            animated: None,
            cache_policy: None,
            protection: None,
            data_passing: None,
            embedding: None,
            events: EventBindings::new(),
            is_safe: true,
            success_observers: Vec::new(),
            failure_observers: Vec::new(),
        }
    }

    pub fn push(target: TargetSpec) -> Self {
        Self::new(TransitionKind::Push, target)
    }

    pub fn present(target: TargetSpec) -> Self {
        Self::new(TransitionKind::Present, target)
    }

    /// Override the navigator's default animation flag.
    pub fn animated(mut self, animated: bool) -> Self {
        self.animated = Some(animated);
        self
    }

    /// Cache the resolved destination under `identifier`.
    pub fn cache(mut self, identifier: impl Into<String>, lifetime: Lifetime) -> Self {
        self.cache_policy = Some(CachePolicy {
            identifier: identifier.into(),
            lifetime,
        });
        self
    }

    /// Gate the transition behind `space`.
    pub fn protect(mut self, space: Arc<dyn ProtectionSpace>) -> Self {
        self.protection = Some(space);
        self
    }

    pub fn pass_data(mut self, data: DataPassing) -> Self {
        self.data_passing = Some(data);
        self
    }

    /// Display the destination inside the container built by `embed`.
    pub fn embed<F>(mut self, embed: F) -> Self
    where
        F: Fn(DestinationRef) -> DestinationRef + Send + Sync + 'static,
    {
        self.embedding = Some(Arc::new(embed));
        self
    }

    pub fn on_event<F>(mut self, event: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.events.on(event, Arc::new(callback));
        self
    }

    /// Bypass the execution queue. No ordering guarantee applies.
    pub fn unsafe_navigation(mut self) -> Self {
        self.is_safe = false;
        self
    }

    pub fn on_success<F>(mut self, observer: F) -> Self
    where
        F: Fn(&NavigationResult) + Send + Sync + 'static,
    {
        self.success_observers.push(Arc::new(observer));
        self
    }

    pub fn on_failure<F>(mut self, observer: F) -> Self
    where
        F: Fn(&NavigationError) + Send + Sync + 'static,
    {
        self.failure_observers.push(Arc::new(observer));
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target(&self) -> &TargetSpec {
        &self.target
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn animated_override(&self) -> Option<bool> {
        self.animated
    }

    pub fn cache_policy(&self) -> Option<&CachePolicy> {
        self.cache_policy.as_ref()
    }

    pub fn protection(&self) -> Option<&Arc<dyn ProtectionSpace>> {
        self.protection.as_ref()
    }

    pub fn data_passing(&self) -> Option<&DataPassing> {
        self.data_passing.as_ref()
    }

    pub fn embedding(&self) -> Option<&Embedding> {
        self.embedding.as_ref()
    }

    pub fn events(&self) -> &EventBindings {
        &self.events
    }

    pub fn is_safe(&self) -> bool {
        self.is_safe
    }

    pub fn success_observers(&self) -> &[SuccessObserver] {
        &self.success_observers
    }

    pub fn failure_observers(&self) -> &[FailureObserver] {
        &self.failure_observers
    }
}

impl fmt::Debug for NavigationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationRequest")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("kind", &self.kind)
            .field("animated", &self.animated)
            .field("cache_policy", &self.cache_policy)
            .field("protected", &self.protection.is_some())
            .field("data_passing", &self.data_passing)
            .field("embedded", &self.embedding.is_some())
            .field("events", &self.events)
            .field("is_safe", &self.is_safe)
            .finish()
    }
}
