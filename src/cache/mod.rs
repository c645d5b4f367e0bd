//! Destination cache.
//!
//! Maps identifiers to resolved destinations with a lifetime policy declared
//! at add time. All access is serialized through one async lock, so a lookup
//! racing an add for the same identifier sees either the old state or the
//! new one.
//!
//! Cached resolution goes through [`DestinationCache::entry`], which holds a
//! per-identifier flight lock while the destination is being resolved. A
//! second request for the same identifier waits for the first to insert (or
//! give up) instead of resolving again. Flight locks only live while some
//! claim holds or waits on them.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::Instant;
use tracing::debug;

use crate::interfaces::DestinationRef;

/// How long a cached destination remains retrievable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Kept until removed or overwritten.
    Forever,
    /// Evicted after this many cache hits.
    Uses(u32),
    /// Evicted once this much time has passed since the add. A duration too
    /// large to represent as a deadline never expires.
    Timeout(Duration),
}

impl Lifetime {
    /// Evicted after the first hit.
    pub fn once() -> Self {
        Lifetime::Uses(1)
    }
}

struct CacheSlot {
    destination: DestinationRef,
    lifetime: Lifetime,
    remaining_uses: Option<u32>,
    expires_at: Option<Instant>,
}

impl CacheSlot {
    fn new(destination: DestinationRef, lifetime: Lifetime) -> Self {
        let (remaining_uses, expires_at) = match lifetime {
            Lifetime::Forever => (None, None),
            Lifetime::Uses(n) => (Some(n), None),
            Lifetime::Timeout(ttl) => (None, Instant::now().checked_add(ttl)),
        };
        Self {
            destination,
            lifetime,
            remaining_uses,
            expires_at,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        if self.remaining_uses == Some(0) {
            return false;
        }
        match self.expires_at {
            Some(deadline) => now < deadline,
            None => true,
        }
    }
}

/// Result of claiming a cache identifier.
pub enum CacheEntry {
    /// A live destination was found (and one use consumed).
    Occupied(DestinationRef),
    /// Nothing cached; the holder is the only resolver for this identifier
    /// until it inserts or drops the entry.
    Vacant(VacantEntry),
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheEntry::Occupied(d) => f.debug_tuple("Occupied").field(d).finish(),
            CacheEntry::Vacant(v) => f.debug_tuple("Vacant").field(&v.identifier()).finish(),
        }
    }
}

/// Exclusive claim on a missing identifier.
pub struct VacantEntry {
    _flight: OwnedMutexGuard<()>,
    claim: FlightClaim,
}

impl VacantEntry {
    pub fn identifier(&self) -> &str {
        &self.claim.identifier
    }

    /// Fill the entry, releasing the claim afterwards.
    pub async fn insert(self, destination: DestinationRef, lifetime: Lifetime) {
        self.claim
            .cache
            .add(self.claim.identifier.clone(), destination, lifetime)
            .await;
    }
}

struct Flight {
    lock: Arc<Mutex<()>>,
    claims: usize,
}

/// Registration on an identifier's flight lock, held while waiting for the
/// lock and for as long as it is owned. The last registration to go removes
/// the lock.
struct FlightClaim {
    cache: Arc<DestinationCache>,
    identifier: String,
}

impl Drop for FlightClaim {
    fn drop(&mut self) {
        let mut flights = self.cache.lock_flights();
        if let Some(flight) = flights.get_mut(&self.identifier) {
            flight.claims = flight.claims.saturating_sub(1);
            if flight.claims == 0 {
                flights.remove(&self.identifier);
            }
        }
    }
}

/// Identifier → destination store with per-entry lifetimes.
#[derive(Default)]
pub struct DestinationCache {
    entries: RwLock<HashMap<String, CacheSlot>>,
    flights: std::sync::Mutex<HashMap<String, Flight>>,
}

impl DestinationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite the entry for `identifier`.
    pub async fn add(
        &self,
        identifier: impl Into<String>,
        destination: DestinationRef,
        lifetime: Lifetime,
    ) {
        let identifier = identifier.into();
        let mut entries = self.entries.write().await;
        if lifetime == Lifetime::Uses(0) {
            entries.remove(&identifier);
            debug!(%identifier, "Zero-use cache entry discarded");
            return;
        }
        debug!(
            %identifier,
            destination = %destination.name(),
            ?lifetime,
            "Destination cached"
        );
        entries.insert(identifier, CacheSlot::new(destination, lifetime));
    }

    /// Look up a live destination, consuming one use for `Uses` entries.
    ///
    /// Expired or exhausted entries are evicted on the way.
    pub async fn lookup(&self, identifier: &str) -> Option<DestinationRef> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let slot = entries.get_mut(identifier)?;
        if !slot.is_live(now) {
            entries.remove(identifier);
            debug!(%identifier, "Expired cache entry evicted");
            return None;
        }

        let destination = slot.destination.clone();
        if let Some(remaining) = slot.remaining_uses.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                entries.remove(identifier);
                debug!(%identifier, "Cache entry used up and evicted");
            }
        }
        Some(destination)
    }

    /// Whether a live entry exists, without consuming a use.
    pub async fn contains(&self, identifier: &str) -> bool {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .get(identifier)
            .is_some_and(|slot| slot.is_live(now))
    }

    /// Lifetime declared for a live entry.
    pub async fn lifetime(&self, identifier: &str) -> Option<Lifetime> {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .get(identifier)
            .filter(|slot| slot.is_live(now))
            .map(|slot| slot.lifetime)
    }

    /// Remove an entry regardless of its lifetime.
    ///
    /// An outstanding claim on `identifier` is unaffected and may still
    /// insert.
    pub async fn remove(&self, identifier: &str) -> Option<DestinationRef> {
        let removed = self.entries.write().await.remove(identifier);
        removed.map(|slot| slot.destination)
    }

    /// Drop every entry. Outstanding claims are unaffected.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|slot| slot.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Claim `identifier` for resolution.
    ///
    /// Waits while another claim on the same identifier is outstanding, then
    /// returns the cached destination if one appeared in the meantime.
    pub async fn entry(self: &Arc<Self>, identifier: &str) -> CacheEntry {
        let (claim, lock) = self.claim_flight(identifier);
        let guard = lock.lock_owned().await;

        match self.lookup(identifier).await {
            Some(destination) => CacheEntry::Occupied(destination),
            None => CacheEntry::Vacant(VacantEntry {
                _flight: guard,
                claim,
            }),
        }
    }

    fn claim_flight(self: &Arc<Self>, identifier: &str) -> (FlightClaim, Arc<Mutex<()>>) {
        let lock = {
            let mut flights = self.lock_flights();
            let flight = flights
                .entry(identifier.to_string())
                .or_insert_with(|| Flight {
                    lock: Arc::new(Mutex::new(())),
                    claims: 0,
                });
            flight.claims += 1;
            Arc::clone(&flight.lock)
        };
        let claim = FlightClaim {
            cache: Arc::clone(self),
            identifier: identifier.to_string(),
        };
        (claim, lock)
    }

    fn lock_flights(&self) -> MutexGuard<'_, HashMap<String, Flight>> {
        self.flights.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
