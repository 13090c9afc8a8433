//! Match trace types for debugging route resolution.
//!
//! A trace captures the full resolution path of one request: every route
//! tried in table order, why each one was skipped (regex miss or filter
//! rejection), and the parameters the winning route produced. Use
//! [`RouteTable::match_with_trace`](crate::RouteTable::match_with_trace) when
//! a request lands on the wrong route and the table order is not obvious.
//!
//! # Example
//!
//! ```ignore
//! let trace = table.match_with_trace("users/edit/7", &request);
//! for step in &trace.steps {
//!     println!("{}: {:?}", step.name, step.outcome);
//! }
//! ```

use crate::Params;
use std::fmt;

/// What happened when one route was tried against a path.
#[derive(Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The compiled regex did not match the path.
    NoMatch,
    /// The regex matched but a filter rejected the parameters.
    FilterRejected {
        /// Zero-based index of the rejecting filter in attachment order.
        index: usize,
    },
    /// The route matched; these are the final parameters.
    Matched {
        /// The parameter map after defaults and filters.
        params: Params,
    },
}

impl StepOutcome {
    /// Whether this outcome is a successful match.
    #[must_use]
    pub fn matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

impl fmt::Debug for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch => f.write_str("NoMatch"),
            Self::FilterRejected { index } => {
                f.debug_struct("FilterRejected").field("index", index).finish()
            }
            Self::Matched { params } => f.debug_struct("Matched").field("params", params).finish(),
        }
    }
}

/// One route's evaluation in a table-level trace.
#[derive(Debug, Clone)]
pub struct MatchStep {
    /// The route's registered name.
    pub name: String,
    /// What happened.
    pub outcome: StepOutcome,
}

/// Trace of a full route-table match.
///
/// `result` always equals what
/// [`RouteTable::match_request`](crate::RouteTable::match_request) returns
/// for the same input. Steps stop at the first match (first-match-wins is
/// preserved, not replayed).
pub struct MatchTrace {
    /// The winning route name and its parameters, if any route matched.
    pub result: Option<(String, Params)>,
    /// One step per route tried, in table order.
    pub steps: Vec<MatchStep>,
}

impl fmt::Debug for MatchTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchTrace")
            .field("result", &self.result)
            .field("steps", &self.steps)
            .finish()
    }
}
