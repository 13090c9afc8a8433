//! Route filters — post-match parameter validation and rewriting
//!
//! Filters run after a route's regex has matched and defaults are filled.
//! Each filter either rejects the match outright or hands back a (possibly
//! rewritten) parameter map. They run in attachment order; the first
//! rejection fails the whole match.
//!
//! # Serializable kinds vs. dynamic closures
//!
//! Filters form a closed set of named, serializable kinds so route tables can
//! be cached without closure serialization. A fully dynamic predicate is
//! still possible via [`RouteFilter::Dynamic`], but such a route is
//! setup-time-only: caching it fails with
//! [`RouteError::Uncacheable`](crate::RouteError::Uncacheable). Reusable
//! predicates should instead be registered by id in a [`FilterRegistry`] and
//! referenced with [`RouteFilter::Custom`].

use crate::{Params, Route};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The request context a filter sees.
///
/// Deliberately small: the routing core does not own an HTTP request type,
/// only the fields filters discriminate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    /// HTTP method, uppercase by convention (`GET`, `POST`, ...).
    pub method: String,
    /// Requested host, when known.
    pub host: Option<String>,
}

impl RequestInfo {
    /// Context for the given method, no host.
    #[must_use]
    pub fn method(method: &str) -> Self {
        Self {
            method: method.to_string(),
            host: None,
        }
    }

    /// Context for the given method and host.
    #[must_use]
    pub fn with_host(method: &str, host: &str) -> Self {
        Self {
            method: method.to_string(),
            host: Some(host.to_string()),
        }
    }
}

impl Default for RequestInfo {
    fn default() -> Self {
        Self::method("GET")
    }
}

/// Signature of a custom filter function.
///
/// Receives the route, the parameters accumulated so far, and the request
/// context. Returns `None` to reject the match, or the parameter map to
/// continue with (rewritten or untouched).
pub type FilterFn =
    dyn Fn(&Route, Params, &RequestInfo) -> Option<Params> + Send + Sync + 'static;

/// A route filter.
///
/// All variants except [`Dynamic`](Self::Dynamic) serialize into a route
/// cache; `Custom` serializes as its id and is resolved through a
/// [`FilterRegistry`] on restore.
#[derive(Clone)]
pub enum RouteFilter {
    /// Reject unless the request method equals this one (ASCII case-insensitive).
    MethodIs(String),
    /// Reject unless the request host equals this one.
    HostIs(String),
    /// Insert `value` under `key` when the parameter is absent.
    ParamDefault {
        /// Parameter key to fill.
        key: String,
        /// Value to insert when the key is absent.
        value: String,
    },
    /// A predicate registered by id in a [`FilterRegistry`].
    Custom {
        /// Registry id of the predicate.
        id: String,
        /// The resolved function.
        func: Arc<FilterFn>,
    },
    /// An arbitrary closure. Setup-time-only: cannot be cached.
    Dynamic(Arc<FilterFn>),
}

impl RouteFilter {
    /// Build a `Custom` filter directly from an id and function, without
    /// going through a registry. Useful in tests and setup code.
    pub fn custom<F>(id: &str, func: F) -> Self
    where
        F: Fn(&Route, Params, &RequestInfo) -> Option<Params> + Send + Sync + 'static,
    {
        Self::Custom {
            id: id.to_string(),
            func: Arc::new(func),
        }
    }

    /// Build a `Dynamic` filter from a closure.
    pub fn dynamic<F>(func: F) -> Self
    where
        F: Fn(&Route, Params, &RequestInfo) -> Option<Params> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(func))
    }

    /// Apply this filter.
    ///
    /// Returns `None` to reject the match, or the parameter map to continue
    /// with.
    pub fn apply(&self, route: &Route, params: Params, request: &RequestInfo) -> Option<Params> {
        match self {
            Self::MethodIs(method) => {
                if request.method.eq_ignore_ascii_case(method) {
                    Some(params)
                } else {
                    None
                }
            }
            Self::HostIs(host) => match &request.host {
                Some(h) if h.eq_ignore_ascii_case(host) => Some(params),
                _ => None,
            },
            Self::ParamDefault { key, value } => {
                let mut params = params;
                params
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
                Some(params)
            }
            Self::Custom { func, .. } | Self::Dynamic(func) => func(route, params, request),
        }
    }

    /// Whether this filter can be serialized into a route cache.
    #[must_use]
    pub fn cacheable(&self) -> bool {
        !matches!(self, Self::Dynamic(_))
    }
}

impl fmt::Debug for RouteFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MethodIs(m) => f.debug_tuple("MethodIs").field(m).finish(),
            Self::HostIs(h) => f.debug_tuple("HostIs").field(h).finish(),
            Self::ParamDefault { key, value } => f
                .debug_struct("ParamDefault")
                .field("key", key)
                .field("value", value)
                .finish(),
            Self::Custom { id, .. } => f.debug_tuple("Custom").field(id).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Registry of custom filter predicates, keyed by id.
///
/// Restoring a cached route table resolves every `Custom` filter through
/// this registry; an id with no registration fails the restore with
/// [`RouteError::UnknownFilter`](crate::RouteError::UnknownFilter).
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<FilterFn>>,
}

impl FilterRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predicate under an id. Re-registering an id replaces the
    /// previous predicate.
    pub fn register<F>(&mut self, id: &str, func: F) -> &mut Self
    where
        F: Fn(&Route, Params, &RequestInfo) -> Option<Params> + Send + Sync + 'static,
    {
        self.filters.insert(id.to_string(), Arc::new(func));
        self
    }

    /// Look up a predicate by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<FilterFn>> {
        self.filters.get(id).cloned()
    }

    /// The registered ids, sorted for stable error messages.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.filters.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
