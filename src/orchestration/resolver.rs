//! Target resolution.
//!
//! Turns a request's [`TargetSpec`] into a destination, consulting the
//! [`DestinationCache`] first when the request carries a cache policy. On a
//! hit the target spec is never evaluated.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheEntry, DestinationCache, VacantEntry};
use crate::error::Result;
use crate::interfaces::DestinationRef;
use crate::request::{NavigationRequest, TargetSpec};

/// Where a resolved destination came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOrigin {
    Cache,
    Target,
}

/// A resolved destination, plus the cache claim to fill when it was a miss.
pub struct Resolved {
    destination: DestinationRef,
    origin: ResolutionOrigin,
    vacancy: Option<VacantEntry>,
}

impl Resolved {
    pub fn destination(&self) -> &DestinationRef {
        &self.destination
    }

    pub fn origin(&self) -> ResolutionOrigin {
        self.origin
    }

    /// The outstanding cache claim, if the request is cached and missed.
    ///
    /// Holding it keeps concurrent requests for the same identifier waiting.
    pub fn take_vacancy(&mut self) -> Option<VacantEntry> {
        self.vacancy.take()
    }
}

/// Resolves request targets.
pub struct TargetResolver {
    cache: Option<Arc<DestinationCache>>,
}

impl TargetResolver {
    /// Resolver backed by `cache`. With `None`, cache policies are ignored.
    pub fn new(cache: Option<Arc<DestinationCache>>) -> Self {
        Self { cache }
    }

    /// Resolve the destination for `request`.
    pub async fn resolve(&self, request: &NavigationRequest) -> Result<Resolved> {
        let policy = request.cache_policy();
        let claim = match (&self.cache, policy) {
            (Some(cache), Some(policy)) => Some(cache.entry(&policy.identifier).await),
            _ => None,
        };

        let vacancy = match claim {
            Some(CacheEntry::Occupied(destination)) => {
                debug!(
                    destination = %destination.name(),
                    "Destination served from cache"
                );
                return Ok(Resolved {
                    destination,
                    origin: ResolutionOrigin::Cache,
                    vacancy: None,
                });
            }
            Some(CacheEntry::Vacant(vacancy)) => Some(vacancy),
            None => None,
        };

        // On error the vacancy is dropped here, releasing the claim.
        let destination = Self::evaluate(request.target()).await?;
        debug!(
            destination = %destination.name(),
            target = request.target().variant(),
            "Destination resolved"
        );
        Ok(Resolved {
            destination,
            origin: ResolutionOrigin::Target,
            vacancy,
        })
    }

    /// Evaluate a target spec, bypassing any cache.
    pub async fn evaluate(target: &TargetSpec) -> Result<DestinationRef> {
        match target {
            TargetSpec::Direct(destination) => Ok(Arc::clone(destination)),
            TargetSpec::LazyFactory(factory) => factory().await,
            TargetSpec::LazyClassFactory(factory) => {
                let ty = factory().await?;
                debug!(destination_type = ty.name(), "Instantiating destination type");
                Ok(ty.instantiate())
            }
        }
    }
}
