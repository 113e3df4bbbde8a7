//! Registration pattern parsing.
//!
//! A pattern has the shape `[METHOD:]URI[@DOMAIN[,DOMAIN...]]`:
//!
//! ```text
//! /user                 → all verbs, /user, domain "default"
//! put:/user             → PUT,       /user, domain "default"
//! POST:/user@a.com      → POST,      /user, domain "a.com"
//! ```
//!
//! Parsing is purely lexical and case-preserving. Case folding and verb
//! validation happen when the composite key is built.

use std::fmt;

use crate::error::{BindError, BindResult};
use crate::method::{MethodFilter, WILDCARD_METHOD};
use crate::naming;

/// Domain used when a pattern has no `@DOMAIN` suffix.
pub const DEFAULT_DOMAIN: &str = "default";

/// A parsed registration pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Domain suffix, or [`DEFAULT_DOMAIN`].
    pub domain: String,
    /// Method prefix as written, or the `all` sentinel.
    pub method: String,
    /// The URI path. Never empty.
    pub uri: String,
}

impl Pattern {
    /// Parses a pattern string.
    ///
    /// Splits once on `@` for the domain, then once on `:` for the method.
    /// An empty domain suffix falls back to [`DEFAULT_DOMAIN`].
    ///
    /// # Errors
    ///
    /// [`BindError::InvalidPattern`] when the URI part is empty.
    pub fn parse(pattern: &str) -> BindResult<Self> {
        let (rest, domain) = match pattern.split_once('@') {
            Some((rest, domain)) if !domain.is_empty() => (rest, domain),
            Some((rest, _)) => (rest, DEFAULT_DOMAIN),
            None => (pattern, DEFAULT_DOMAIN),
        };
        let (method, uri) = rest.split_once(':').unwrap_or((WILDCARD_METHOD, rest));

        if uri.is_empty() {
            return Err(BindError::invalid_pattern(pattern, "empty uri"));
        }

        Ok(Self {
            domain: domain.to_string(),
            method: method.to_string(),
            uri: uri.to_string(),
        })
    }

    /// Resolves the method prefix into the set of verbs it covers.
    ///
    /// # Errors
    ///
    /// [`BindError::InvalidPattern`] when the prefix is neither `all` nor a
    /// recognised verb.
    pub fn method_filter(&self) -> BindResult<MethodFilter> {
        MethodFilter::from_token(&self.method)
            .ok_or_else(|| BindError::invalid_pattern(self.to_string(), "unrecognised method"))
    }

    /// Returns a copy with `name` appended to the URI as a hyphenated path
    /// segment, keeping method and domain.
    ///
    /// `/api` + `GetUserList` becomes `/api/get-user-list/`.
    pub fn with_method_name(&self, name: &str) -> Self {
        Self {
            domain: self.domain.clone(),
            method: self.method.clone(),
            uri: naming::append_method_name(&self.uri, name),
        }
    }

    /// Returns a copy bound to a different method prefix.
    pub fn with_method(&self, method: &str) -> Self {
        Self {
            domain: self.domain.clone(),
            method: method.to_string(),
            uri: self.uri.clone(),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.method, self.uri, self.domain)
    }
}

/// Parses a pattern string. Shorthand for [`Pattern::parse`].
pub fn parse_pattern(pattern: &str) -> BindResult<Pattern> {
    Pattern::parse(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;

    #[test]
    fn test_parse_full_pattern() {
        let p = parse_pattern("GET:/user@a.com").unwrap();
        assert_eq!(p.domain, "a.com");
        assert_eq!(p.method, "GET");
        assert_eq!(p.uri, "/user");
    }

    #[test]
    fn test_parse_defaults() {
        let p = parse_pattern("/user").unwrap();
        assert_eq!(p.domain, "default");
        assert_eq!(p.method, "all");
        assert_eq!(p.uri, "/user");
        assert_eq!(p.method_filter().unwrap(), MethodFilter::All);
    }

    #[test]
    fn test_parse_preserves_case() {
        let p = parse_pattern("put:/User@Example.COM").unwrap();
        assert_eq!(p.method, "put");
        assert_eq!(p.uri, "/User");
        assert_eq!(p.domain, "Example.COM");
        assert_eq!(p.method_filter().unwrap(), MethodFilter::Only(Method::Put));
    }

    #[test]
    fn test_parse_empty_uri_fails() {
        assert!(matches!(
            parse_pattern(""),
            Err(BindError::InvalidPattern { .. })
        ));
        assert!(matches!(
            parse_pattern("GET:@a.com"),
            Err(BindError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_empty_domain_suffix_uses_default() {
        let p = parse_pattern("/x@").unwrap();
        assert_eq!(p.domain, DEFAULT_DOMAIN);
    }

    #[test]
    fn test_domain_list_is_kept_verbatim() {
        let p = parse_pattern("/x@a.com,b.com").unwrap();
        assert_eq!(p.domain, "a.com,b.com");
    }

    #[test]
    fn test_unknown_method_is_rejected_at_filter() {
        let p = parse_pattern("FETCH:/x").unwrap();
        assert!(matches!(
            p.method_filter(),
            Err(BindError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_with_method_name_keeps_prefix_and_domain() {
        let p = parse_pattern("POST:/api/@a.com").unwrap();
        let derived = p.with_method_name("GetUserList");
        assert_eq!(derived.uri, "/api/get-user-list/");
        assert_eq!(derived.method, "POST");
        assert_eq!(derived.domain, "a.com");
    }
}
