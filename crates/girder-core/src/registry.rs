//! The handler registry.
//!
//! A single reader/writer lock guards the whole table: binding takes the
//! write lock, resolution the read lock, so concurrent lookups never block
//! each other and never observe a half-written entry. The lock is held only
//! for the map operation itself.

use parking_lot::RwLock;
use tracing::trace;

use crate::handler::HandlerItem;
use crate::key::{CompositeKey, RouteTable};
use crate::method::{Method, MethodFilter};

/// Maps composite keys to bound targets.
#[derive(Default)]
pub struct HandlerRegistry {
    table: RwLock<RouteTable<HandlerItem>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `item` for every verb covered by `methods`.
    ///
    /// A key that is already bound is overwritten; the last writer wins.
    pub fn set(&self, domain: &str, methods: MethodFilter, uri: &str, item: HandlerItem) {
        let mut table = self.table.write();
        for method in methods.methods() {
            if table
                .insert(domain, method, uri, item.clone())
                .is_some()
            {
                trace!(key = %CompositeKey::new(domain, method, uri), "Replaced existing handler");
            }
        }
    }

    /// Returns the target bound to the exact key, if any.
    pub fn get(&self, domain: &str, method: Method, uri: &str) -> Option<HandlerItem> {
        self.table.read().get(domain, method, uri).cloned()
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every stored key, sorted.
    pub fn keys(&self) -> Vec<CompositeKey> {
        self.table.read().keys()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::handler::into_handler;
    use crate::request::Request;

    fn item() -> HandlerItem {
        HandlerItem::Direct(into_handler(|_req: Arc<Request>| async {}))
    }

    #[test]
    fn test_wildcard_expands_to_nine_entries() {
        let registry = HandlerRegistry::new();
        let item = item();
        registry.set("default", MethodFilter::All, "/ping", item.clone());

        assert_eq!(registry.len(), 9);
        let expected = item.as_direct().unwrap();
        for method in Method::ALL {
            let found = registry.get("default", method, "/ping").unwrap();
            assert!(Arc::ptr_eq(found.as_direct().unwrap(), expected));
        }
    }

    #[test]
    fn test_single_verb() {
        let registry = HandlerRegistry::new();
        registry.set("a.com", MethodFilter::Only(Method::Post), "/user", item());

        assert_eq!(registry.len(), 1);
        assert!(registry.get("a.com", Method::Post, "/user").is_some());
        assert!(registry.get("A.COM", Method::Post, "/user").is_some());
        assert!(registry.get("a.com", Method::Get, "/user").is_none());
        assert!(registry.get("b.com", Method::Post, "/user").is_none());
    }

    #[test]
    fn test_last_writer_wins() {
        let registry = HandlerRegistry::new();
        let first = item();
        let second = item();
        registry.set("default", MethodFilter::Only(Method::Get), "/x", first);
        registry.set("default", MethodFilter::Only(Method::Get), "/x", second.clone());

        assert_eq!(registry.len(), 1);
        let found = registry.get("default", Method::Get, "/x").unwrap();
        assert!(Arc::ptr_eq(
            found.as_direct().unwrap(),
            second.as_direct().unwrap()
        ));
    }

    #[test]
    fn test_keys_render_composite_form() {
        let registry = HandlerRegistry::new();
        registry.set("Example.com", MethodFilter::Only(Method::Delete), "/item", item());
        let keys: Vec<String> = registry.keys().iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["DELETE:/item@example.com"]);
    }

    #[test]
    fn test_concurrent_set_and_get() {
        let registry = HandlerRegistry::new();
        let pool: Vec<HandlerItem> = (0..8).map(|_| item()).collect();
        let known = |found: &HandlerItem| {
            pool.iter()
                .any(|p| Arc::ptr_eq(p.as_direct().unwrap(), found.as_direct().unwrap()))
        };

        std::thread::scope(|scope| {
            for writer in 0..2 {
                let (registry, pool) = (&registry, &pool);
                scope.spawn(move || {
                    for round in 0..200 {
                        let next = pool[(writer + round) % pool.len()].clone();
                        registry.set("default", MethodFilter::All, "/x", next);
                    }
                });
            }
            for _ in 0..4 {
                let registry = &registry;
                scope.spawn(move || {
                    for _ in 0..200 {
                        for method in Method::ALL {
                            if let Some(found) = registry.get("default", method, "/x") {
                                assert!(known(&found));
                            }
                        }
                        let len = registry.len();
                        assert!(len == 0 || len == 9, "{len}");
                    }
                });
            }
        });

        assert_eq!(registry.len(), 9);
        let last = registry.get("default", Method::Get, "/x").unwrap();
        for method in Method::ALL {
            let found = registry.get("default", method, "/x").unwrap();
            assert!(Arc::ptr_eq(found.as_direct().unwrap(), last.as_direct().unwrap()));
        }
    }
}
