//! Composite route keys and the table they index.
//!
//! A route is identified by (verb, URI, lower-cased domain). The canonical
//! string form is `GET:/user@example.com`, but keys are stored structurally:
//!
//! ```text
//! domain ──▶ uri ──▶ [Option<T>; Method::COUNT]
//! ```
//!
//! so a lookup hashes the borrowed domain and URI directly and indexes the
//! verb slot, without building a key string.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use crate::method::Method;

/// A fully resolved route key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    /// The verb.
    pub method: Method,
    /// The URI path, case-preserved.
    pub uri: String,
    /// The domain, lower-cased.
    pub domain: String,
}

impl CompositeKey {
    /// Builds a key, folding the domain to lower case.
    pub fn new(domain: &str, method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            domain: fold_domain(domain).into_owned(),
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.method, self.uri, self.domain)
    }
}

/// Lower-cases a domain, borrowing when it is already lower case.
pub(crate) fn fold_domain(domain: &str) -> Cow<'_, str> {
    if domain.bytes().any(|b| b.is_ascii_uppercase()) || !domain.is_ascii() {
        Cow::Owned(domain.to_lowercase())
    } else {
        Cow::Borrowed(domain)
    }
}

type VerbSlots<T> = [Option<T>; Method::COUNT];

/// A map from [`CompositeKey`] to `T`, stored as nested domain/URI tables.
#[derive(Debug)]
pub(crate) struct RouteTable<T> {
    domains: HashMap<String, HashMap<String, VerbSlots<T>>>,
    len: usize,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self {
            domains: HashMap::new(),
            len: 0,
        }
    }
}

impl<T> RouteTable<T> {
    fn slots_mut<'a>(
        domains: &'a mut HashMap<String, HashMap<String, VerbSlots<T>>>,
        domain: &str,
        uri: &str,
    ) -> &'a mut VerbSlots<T> {
        domains
            .entry(fold_domain(domain).into_owned())
            .or_default()
            .entry(uri.to_string())
            .or_insert_with(|| std::array::from_fn(|_| None))
    }

    /// Stores `value`, returning the entry it replaced.
    pub(crate) fn insert(&mut self, domain: &str, method: Method, uri: &str, value: T) -> Option<T> {
        let previous = Self::slots_mut(&mut self.domains, domain, uri)[method.index()].replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Returns the entry for the key, inserting `init()` first if absent.
    pub(crate) fn get_or_insert_with(
        &mut self,
        domain: &str,
        method: Method,
        uri: &str,
        init: impl FnOnce() -> T,
    ) -> &mut T {
        let slot = &mut Self::slots_mut(&mut self.domains, domain, uri)[method.index()];
        if slot.is_none() {
            self.len += 1;
        }
        slot.get_or_insert_with(init)
    }

    pub(crate) fn get(&self, domain: &str, method: Method, uri: &str) -> Option<&T> {
        let slots = self.domains.get(&*fold_domain(domain))?.get(uri)?;
        slots[method.index()].as_ref()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Every stored key, sorted.
    pub(crate) fn keys(&self) -> Vec<CompositeKey> {
        let mut keys: Vec<_> = self
            .domains
            .iter()
            .flat_map(|(domain, uris)| {
                uris.iter().flat_map(move |(uri, slots)| {
                    Method::ALL
                        .into_iter()
                        .filter(|m| slots[m.index()].is_some())
                        .map(move |method| CompositeKey {
                            method,
                            uri: uri.clone(),
                            domain: domain.clone(),
                        })
                })
            })
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = CompositeKey::new("Example.COM", Method::Get, "/User");
        assert_eq!(key.to_string(), "GET:/User@example.com");
    }

    #[test]
    fn test_fold_domain_borrows_lowercase() {
        assert!(matches!(fold_domain("a.com"), Cow::Borrowed(_)));
        assert_eq!(fold_domain("A.com"), "a.com");
    }

    #[test]
    fn test_insert_overwrites_and_counts_once() {
        let mut table = RouteTable::default();
        assert_eq!(table.insert("a.com", Method::Get, "/x", 1), None);
        assert_eq!(table.insert("A.COM", Method::Get, "/x", 2), Some(1));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("a.com", Method::Get, "/x"), Some(&2));
        assert_eq!(table.get("a.com", Method::Post, "/x"), None);
        assert_eq!(table.get("a.com", Method::Get, "/X"), None);
    }

    #[test]
    fn test_keys_are_sorted() {
        let mut table = RouteTable::default();
        table.insert("b.com", Method::Post, "/y", ());
        table.insert("a.com", Method::Get, "/x", ());
        let keys: Vec<String> = table.keys().iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["GET:/x@a.com", "POST:/y@b.com"]);
    }
}
