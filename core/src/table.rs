//! RouteTable — insertion-ordered named registry of routes
//!
//! Matching iterates routes in insertion order and the first match wins.
//! Re-registering a name replaces the route but keeps its original position
//! in the iteration order — a name's priority is fixed the first time it is
//! registered.
//!
//! Tables are explicit values, not process-wide state: build one per
//! application (or per test) and pass it through setup and dispatch. The
//! table is read-mostly; registration is expected to finish before concurrent
//! matching begins, so callers that mutate at runtime should wrap the table
//! in a lock or swap immutable snapshots.

use crate::trace::{MatchStep, MatchTrace, StepOutcome};
use crate::{Params, RequestInfo, Route, RouteError};
use std::collections::HashMap;

/// An ordered, named registry of [`Route`]s.
///
/// # Example
///
/// ```
/// use kasane::prelude::*;
///
/// let mut table = RouteTable::new();
/// table.insert("blog", Route::with_patterns("blog/<id>", [("id", r"\d+")]).unwrap());
/// table.insert(
///     "default",
///     Route::new("(<controller>(/<action>))")
///         .unwrap()
///         .defaults([("controller", "welcome"), ("action", "index")]),
/// );
///
/// let (name, params) = table.match_request("blog/7", &RequestInfo::default()).unwrap();
/// assert_eq!(name, "blog");
/// assert_eq!(params["id"], "7");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<(String, Route)>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route under a name.
    ///
    /// A new name appends at the end; an existing name is replaced in place,
    /// keeping its original matching priority.
    pub fn insert(&mut self, name: &str, route: Route) {
        match self.index.get(name) {
            Some(&position) => self.entries[position].1 = route,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), route));
            }
        }
    }

    /// Look up a route by name.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NotFound`] with the requested name.
    pub fn get(&self, name: &str) -> Result<&Route, RouteError> {
        self.index
            .get(name)
            .map(|&position| &self.entries[position].1)
            .ok_or_else(|| RouteError::NotFound {
                name: name.to_string(),
            })
    }

    /// Whether a name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate `(name, route)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Route)> {
        self.entries.iter().map(|(name, route)| (name.as_str(), route))
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Match a request path against the table, first match wins.
    ///
    /// Routes are tried in insertion order; the first whose regex matches
    /// and whose filters all accept yields `(name, params)`.
    pub fn match_request(&self, path: &str, request: &RequestInfo) -> Option<(&str, Params)> {
        for (name, route) in &self.entries {
            if let Some(params) = route.matches(path, request) {
                return Some((name.as_str(), params));
            }
        }
        None
    }

    /// Match with a full trace of every route tried.
    ///
    /// The trace's `result` equals what [`match_request`](Self::match_request)
    /// returns; steps stop at the first match.
    pub fn match_with_trace(&self, path: &str, request: &RequestInfo) -> MatchTrace {
        let mut steps = Vec::new();
        let mut result = None;

        for (name, route) in &self.entries {
            let outcome = route.evaluate(path, request);
            let matched = outcome.matched();
            if let StepOutcome::Matched { params } = &outcome {
                result = Some((name.clone(), params.clone()));
            }
            steps.push(MatchStep {
                name: name.clone(),
                outcome,
            });
            if matched {
                break;
            }
        }

        MatchTrace { result, steps }
    }

    /// Append every route of `other`, after the existing entries.
    ///
    /// Names already present are replaced in place (keeping their original
    /// priority), matching [`insert`](Self::insert) semantics. This is the
    /// "append" half of cache restoration; "replace" is just
    /// [`RouteTable::from_config`](Self::from_config) on a fresh table.
    pub fn append(&mut self, other: RouteTable) {
        for (name, route) in other.entries {
            self.insert(&name, route);
        }
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = (&'a str, &'a Route);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Route)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RouteFilter;

    fn table() -> RouteTable {
        let mut table = RouteTable::new();
        table.insert(
            "blog",
            Route::with_patterns("blog/<id>", [("id", r"\d+")]).unwrap(),
        );
        table.insert(
            "default",
            Route::new("(<controller>(/<action>(/<id>)))")
                .unwrap()
                .defaults([("controller", "welcome"), ("action", "index")]),
        );
        table
    }

    #[test]
    fn first_match_wins_in_insertion_order() {
        let t = table();
        // "blog/7" matches both routes; the earlier registration wins.
        let (name, params) = t.match_request("blog/7", &RequestInfo::default()).unwrap();
        assert_eq!(name, "blog");
        assert_eq!(params["id"], "7");

        let (name, _) = t.match_request("users/list", &RequestInfo::default()).unwrap();
        assert_eq!(name, "default");
    }

    #[test]
    fn get_unknown_name_errors() {
        let t = table();
        assert!(t.get("blog").is_ok());
        assert_eq!(
            t.get("missing").unwrap_err(),
            RouteError::NotFound {
                name: "missing".to_string()
            }
        );
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut t = table();
        // Replace "blog" with a route that no longer requires digits.
        t.insert("blog", Route::new("blog/<id>").unwrap());

        let names: Vec<&str> = t.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["blog", "default"]);

        // Still matched before "default".
        let (name, _) = t.match_request("blog/abc", &RequestInfo::default()).unwrap();
        assert_eq!(name, "blog");
    }

    #[test]
    fn no_route_matches() {
        let mut t = RouteTable::new();
        t.insert("only", Route::new("exact/path").unwrap());
        assert!(t.match_request("other", &RequestInfo::default()).is_none());
    }

    #[test]
    fn trace_agrees_with_match_request() {
        let t = table();
        for path in ["blog/7", "users/list", "blog/abc", "a.b"] {
            let trace = t.match_with_trace(path, &RequestInfo::default());
            let direct = t
                .match_request(path, &RequestInfo::default())
                .map(|(name, params)| (name.to_string(), params));
            assert_eq!(trace.result, direct, "divergence on {path:?}");
        }
    }

    #[test]
    fn trace_records_filter_rejection() {
        let mut t = RouteTable::new();
        t.insert(
            "gated",
            Route::new("<controller>")
                .unwrap()
                .filter(RouteFilter::MethodIs("POST".into())),
        );
        t.insert("open", Route::new("<controller>").unwrap());

        let trace = t.match_with_trace("users", &RequestInfo::method("GET"));
        assert_eq!(trace.steps.len(), 2);
        assert_eq!(
            trace.steps[0].outcome,
            StepOutcome::FilterRejected { index: 0 }
        );
        assert!(trace.steps[1].outcome.matched());
        assert_eq!(trace.result.as_ref().unwrap().0, "open");
    }

    #[test]
    fn trace_stops_after_first_match() {
        let t = table();
        let trace = t.match_with_trace("blog/7", &RequestInfo::default());
        assert_eq!(trace.steps.len(), 1);
    }

    #[test]
    fn append_adds_after_existing() {
        let mut t = table();
        let mut extra = RouteTable::new();
        extra.insert("files", Route::new("files/<path>").unwrap());
        t.append(extra);

        let names: Vec<&str> = t.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["blog", "default", "files"]);
    }
}
