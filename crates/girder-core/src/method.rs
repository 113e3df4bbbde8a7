//! HTTP verbs recognised by the registry.
//!
//! The verb set is closed: the nine methods below are the only ones a route
//! can be bound under. The wildcard sentinel `all` is not a verb; it is
//! expanded into every member of [`Method::ALL`] when a route is stored, so a
//! lookup never has to consider wildcards.

use std::fmt;

/// The verb-wildcard sentinel accepted in patterns.
pub const WILDCARD_METHOD: &str = "all";

/// One of the recognised HTTP verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Patch,
    Head,
    Connect,
    Options,
    Trace,
}

impl Method {
    /// Number of recognised verbs.
    pub const COUNT: usize = 9;

    /// Every recognised verb, in registration order.
    pub const ALL: [Method; Self::COUNT] = [
        Method::Get,
        Method::Put,
        Method::Post,
        Method::Delete,
        Method::Patch,
        Method::Head,
        Method::Connect,
        Method::Options,
        Method::Trace,
    ];

    /// Returns the upper-case token for this verb.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Connect => "CONNECT",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }

    /// Parses a verb token, ignoring ASCII case.
    ///
    /// Returns `None` for anything outside the recognised set, including the
    /// wildcard sentinel.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(token))
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which verbs a binding applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodFilter {
    /// Every recognised verb (the `all` sentinel).
    All,
    /// A single verb.
    Only(Method),
}

impl MethodFilter {
    /// Parses a method prefix as written in a pattern.
    ///
    /// Accepts `all` or any recognised verb, case-insensitively.
    pub fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case(WILDCARD_METHOD) {
            Some(Self::All)
        } else {
            Method::from_token(token).map(Self::Only)
        }
    }

    /// Iterates the concrete verbs this filter expands to.
    pub fn methods(self) -> impl Iterator<Item = Method> {
        let only = match self {
            Self::All => None,
            Self::Only(m) => Some(m),
        };
        Method::ALL
            .into_iter()
            .filter(move |m| only.is_none_or(|o| o == *m))
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        Self::Only(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_token_is_case_insensitive() {
        assert_eq!(Method::from_token("get"), Some(Method::Get));
        assert_eq!(Method::from_token("Options"), Some(Method::Options));
        assert_eq!(Method::from_token("all"), None);
        assert_eq!(Method::from_token("FETCH"), None);
    }

    #[test]
    fn test_wildcard_expands_to_every_verb() {
        let all: Vec<_> = MethodFilter::from_token("ALL").unwrap().methods().collect();
        assert_eq!(all, Method::ALL.to_vec());

        let one: Vec<_> = MethodFilter::from_token("post").unwrap().methods().collect();
        assert_eq!(one, vec![Method::Post]);
    }
}
