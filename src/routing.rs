//! Exact-match route table.
//!
//! Paths are normalized by trimming trailing slashes, so `/settings/` and
//! `/settings` name the same route.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::interfaces::{DestinationRef, DestinationType, Route, Router};

/// In-memory [`Router`] keyed by path.
#[derive(Default)]
pub struct RouteTable {
    routes: RwLock<HashMap<String, Route>>,
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `path` to a shared instance.
    pub fn register_instance(self, path: &str, destination: DestinationRef) -> Self {
        self.insert(path, Route::Instance(destination));
        self
    }

    /// Route `path` to a fresh instance of `ty` per lookup.
    pub fn register_type(self, path: &str, ty: DestinationType) -> Self {
        self.insert(path, Route::Type(ty));
        self
    }

    /// Add or replace a route.
    pub fn insert(&self, path: &str, route: Route) {
        let path = normalize(path).to_string();
        debug!(%path, ?route, "Route registered");
        match self.routes.write() {
            Ok(mut routes) => {
                routes.insert(path, route);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(path, route);
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.routes.read() {
            Ok(routes) => routes.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Router for RouteTable {
    fn route(&self, path: &str) -> Option<Route> {
        let path = normalize(path);
        let found = match self.routes.read() {
            Ok(routes) => routes.get(path).cloned(),
            Err(poisoned) => poisoned.into_inner().get(path).cloned(),
        };
        if found.is_none() {
            debug!(%path, "Route not found");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::same_destination;
    use crate::test_utils::{BlankScreen, TestScreen};
    use std::sync::Arc;

    #[test]
    fn test_instance_route_returns_same_instance() {
        let d: DestinationRef = Arc::new(TestScreen::new("home"));
        let table = RouteTable::new().register_instance("/home", d.clone());

        let found = table.route("/home").unwrap().into_destination();
        assert!(same_destination(&found, &d));
    }

    #[test]
    fn test_type_route_instantiates_each_time() {
        let table = RouteTable::new().register_type("/blank", DestinationType::of::<BlankScreen>());

        let a = table.route("/blank").unwrap().into_destination();
        let b = table.route("/blank").unwrap().into_destination();
        assert_eq!(a.name(), "blank");
        assert!(!same_destination(&a, &b));
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let table = RouteTable::new().register_type("/settings/", DestinationType::of::<BlankScreen>());
        assert!(table.route("/settings").is_some());
        assert!(table.route("/settings//").is_some());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_root_path() {
        let table = RouteTable::new().register_type("/", DestinationType::of::<BlankScreen>());
        assert!(table.route("/").is_some());
        assert!(table.route("").is_some());
    }

    #[test]
    fn test_miss() {
        let table = RouteTable::new();
        assert!(table.is_empty());
        assert!(table.route("/nowhere").is_none());
    }
}
