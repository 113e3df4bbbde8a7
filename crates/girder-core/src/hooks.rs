//! The hook registry.
//!
//! Hooks are auxiliary callables run around the primary target of a route:
//!
//! ```text
//! request ─▶ Init hooks ─▶ target ─▶ Shut hooks ─▶ response
//! ```
//!
//! They are keyed exactly like handlers, with the hook point as an extra
//! prefix (`INIT^GET:/user@default`), and are looked up independently of the
//! handler registry. Binding appends; hooks for one key always run in
//! registration order.

use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;

use crate::error::BindError;
use crate::handler::HandlerFunc;
use crate::key::{CompositeKey, RouteTable};
use crate::method::{Method, MethodFilter};

/// The stage at which a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// After the request context is built, before the primary target.
    Init,
    /// After the primary target, before request resources are released.
    Shut,
}

impl HookPoint {
    pub const ALL: [HookPoint; 2] = [HookPoint::Init, HookPoint::Shut];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::Shut => "Shut",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookPoint {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| BindError::UnknownHookPoint(s.to_string()))
    }
}

/// A hook key, rendered as `INIT^GET:/user@default`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookKey {
    pub point: HookPoint,
    pub key: CompositeKey,
}

impl fmt::Display for HookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}^{}", self.point.as_str().to_uppercase(), self.key)
    }
}

/// Maps (hook point, composite key) to ordered hook lists.
#[derive(Default)]
pub struct HookRegistry {
    tables: RwLock<[RouteTable<Vec<HandlerFunc>>; 2]>,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `hook` to the list of every verb covered by `methods`,
    /// creating lists on first use.
    pub fn append(
        &self,
        point: HookPoint,
        domain: &str,
        methods: MethodFilter,
        uri: &str,
        hook: HandlerFunc,
    ) {
        let mut tables = self.tables.write();
        let table = &mut tables[point.index()];
        for method in methods.methods() {
            table
                .get_or_insert_with(domain, method, uri, Vec::new)
                .push(hook.clone());
        }
    }

    /// Returns the hooks for the exact key, in registration order.
    pub fn get(
        &self,
        point: HookPoint,
        domain: &str,
        method: Method,
        uri: &str,
    ) -> Option<Vec<HandlerFunc>> {
        self.tables.read()[point.index()]
            .get(domain, method, uri)
            .cloned()
    }

    /// Returns the number of keys with at least one hook.
    pub fn len(&self) -> usize {
        self.tables.read().iter().map(RouteTable::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every hook key, grouped by hook point.
    pub fn keys(&self) -> Vec<HookKey> {
        let tables = self.tables.read();
        HookPoint::ALL
            .into_iter()
            .flat_map(|point| {
                tables[point.index()]
                    .keys()
                    .into_iter()
                    .map(move |key| HookKey { point, key })
            })
            .collect()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("keys", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::handler::into_handler;
    use crate::request::Request;

    fn hook() -> HandlerFunc {
        into_handler(|_req: Arc<Request>| async {})
    }

    #[test]
    fn test_hook_point_parse() {
        assert_eq!("init".parse::<HookPoint>().unwrap(), HookPoint::Init);
        assert_eq!("SHUT".parse::<HookPoint>().unwrap(), HookPoint::Shut);
        assert_eq!(
            "before".parse::<HookPoint>(),
            Err(BindError::UnknownHookPoint("before".into()))
        );
    }

    #[test]
    fn test_hooks_keep_registration_order() {
        let registry = HookRegistry::new();
        let (h1, h2, h3) = (hook(), hook(), hook());
        for h in [&h1, &h2, &h3] {
            registry.append(
                HookPoint::Init,
                "default",
                MethodFilter::Only(Method::Get),
                "/x",
                Arc::clone(h),
            );
        }

        let hooks = registry
            .get(HookPoint::Init, "default", Method::Get, "/x")
            .unwrap();
        assert_eq!(hooks.len(), 3);
        assert!(Arc::ptr_eq(&hooks[0], &h1));
        assert!(Arc::ptr_eq(&hooks[1], &h2));
        assert!(Arc::ptr_eq(&hooks[2], &h3));
    }

    #[test]
    fn test_points_are_independent() {
        let registry = HookRegistry::new();
        registry.append(HookPoint::Shut, "default", MethodFilter::All, "/x", hook());

        assert_eq!(registry.len(), 9);
        assert!(
            registry
                .get(HookPoint::Init, "default", Method::Get, "/x")
                .is_none()
        );
        for method in Method::ALL {
            let hooks = registry
                .get(HookPoint::Shut, "default", method, "/x")
                .unwrap();
            assert_eq!(hooks.len(), 1);
        }
    }

    #[test]
    fn test_hook_key_display() {
        let registry = HookRegistry::new();
        registry.append(
            HookPoint::Init,
            "A.com",
            MethodFilter::Only(Method::Get),
            "/x",
            hook(),
        );
        let keys: Vec<String> = registry.keys().iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["INIT^GET:/x@a.com"]);
    }
}
