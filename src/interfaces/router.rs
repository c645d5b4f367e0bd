//! Routing lookup interface.
//!
//! A router maps a path descriptor to a destination or destination type.
//! Lookups are synchronous; the resolver wraps them in its async flow.

use std::fmt;

use super::destination::{DestinationRef, DestinationType};

/// Result of a successful routing lookup.
#[derive(Clone)]
pub enum Route {
    /// A ready destination instance.
    Instance(DestinationRef),
    /// A destination type to instantiate.
    Type(DestinationType),
}

impl Route {
    /// Materialize the route into a destination.
    pub fn into_destination(self) -> DestinationRef {
        match self {
            Route::Instance(destination) => destination,
            Route::Type(ty) => ty.instantiate(),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Instance(d) => f.debug_tuple("Instance").field(d).finish(),
            Route::Type(t) => f.debug_tuple("Type").field(t).finish(),
        }
    }
}

/// Looks up destinations by path.
pub trait Router: Send + Sync {
    /// Find the route for `path`, or `None` on a miss.
    fn route(&self, path: &str) -> Option<Route>;
}
