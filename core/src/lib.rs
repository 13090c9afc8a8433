//! kasane - cascading route and configuration engine
//!
//! A routing core built around three cooperating pieces:
//!
//! - [`Template`] / [`Route`] — URI templates with `<key>` placeholders and
//!   `(...)` optional groups, compiled to anchored regex matchers and walked
//!   in reverse for URI generation
//! - [`Cascade`] — an ordered list of search roots where earlier roots shadow
//!   later roots' files of the same relative path
//! - [`ConfigCascade`] — named configuration groups deep-merged from an
//!   ordered list of sources, higher-priority sources winning on conflict
//!
//! # Architecture
//!
//! The template is parsed **once** into a small AST (literal, key, optional
//! group). Both matching and reverse routing walk that shared AST — there is
//! no string surgery after parse time. Matching compiles the AST into a single
//! anchored regex with named capture groups; reverse routing recursively
//! propagates "required" status bottom-up so an optional group renders if and
//! only if it (or a descendant) received a non-default value.
//!
//! # Example
//!
//! ```
//! use kasane::prelude::*;
//!
//! let route = Route::new("(<controller>(/<action>(/<id>)))")
//!     .unwrap()
//!     .defaults([("controller", "welcome"), ("action", "index")]);
//!
//! let params = route.matches("users/edit/7", &RequestInfo::default()).unwrap();
//! assert_eq!(params["controller"], "Users");
//! assert_eq!(params["action"], "edit");
//! assert_eq!(params["id"], "7");
//!
//! // Reverse routing elides optional segments left at their defaults.
//! let mut params = Params::new();
//! params.insert("controller".into(), "users".into());
//! assert_eq!(route.uri(&params).unwrap(), "users");
//! ```
//!
//! # Lookup vs. error semantics
//!
//! Lookup-style operations (file resolution, route matching, autoload
//! resolution) return `Option` — absence is routine, not an error. Errors are
//! reserved for programmer mistakes (bad templates, empty group names) and
//! environment problems (uncacheable routes, unconfigured sources), and are
//! caught at construction/load time wherever possible.

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod autoload;
mod cache;
mod cascade;
mod config;
mod filter;
mod message;
mod route;
mod table;
mod template;
mod trace;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

pub use autoload::Autoloader;
pub use cache::{FilterConfig, RouteConfig, TableConfig};
pub use cascade::Cascade;
pub use config::{ConfigCascade, FileFormat, FileSource, MemorySource, Source, WritableSource};
pub use filter::{FilterFn, FilterRegistry, RequestInfo, RouteFilter};
pub use message::MessageCatalog;
pub use route::Route;
pub use table::RouteTable;
pub use template::{Template, TemplateNode};
pub use trace::{MatchStep, MatchTrace, StepOutcome};

/// Parameters produced by a successful match, or fed to reverse routing.
///
/// After a successful [`Route::matches`] the map contains every key named in
/// the template, each either a matched literal or a filled-in default.
pub type Params = std::collections::HashMap<String, String>;

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use kasane::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Autoloader, Cascade, ConfigCascade, ConfigError, FileSource, FilterRegistry, MemorySource,
        MessageCatalog, Params, RequestInfo, Route, RouteError, RouteFilter, RouteTable, Source,
        TableConfig, Template,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Default pattern for a `<key>` placeholder: one URI segment.
///
/// Matches anything except `/`, `.`, `,`, `;`, `?`, and newline. Override
/// per-key via [`Route::with_patterns`].
pub const REGEX_SEGMENT: &str = "[^/.,;?\n]+";

/// Maximum length of a route template.
///
/// Templates compile to a regex, so this bounds compile cost the same way a
/// pattern-length limit would.
pub const MAX_TEMPLATE_LENGTH: usize = 4096;

/// Maximum nesting depth of `(...)` optional groups.
///
/// The reverse-routing walk recurses per group, so depth is bounded at parse
/// time rather than at call time.
pub const MAX_GROUP_DEPTH: usize = 16;

/// Maximum length of a per-key regex override.
pub const MAX_KEY_PATTERN_LENGTH: usize = 4096;

/// Scheme prepended to an external route's host when it carries none.
pub const DEFAULT_PROTOCOL: &str = "http://";

/// Host values that mean "this route is local", not external.
pub const LOCAL_HOSTS: &[&str] = &["", "local", "localhost"];

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from route construction, lookup, reverse routing, and caching.
///
/// Construction errors (`InvalidTemplate`, `InvalidPattern`, limit violations)
/// are caught when the route is built, not when it is matched. Fix the
/// template and rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The template text cannot be parsed.
    InvalidTemplate {
        /// The offending template.
        template: String,
        /// What went wrong (unbalanced group, bad key name, ...).
        reason: String,
    },
    /// A per-key regex override failed to compile.
    InvalidPattern {
        /// The key whose pattern is invalid.
        key: String,
        /// The pattern that failed to compile.
        pattern: String,
        /// The underlying regex error message.
        source: String,
    },
    /// Template exceeds [`MAX_TEMPLATE_LENGTH`].
    TemplateTooLong {
        /// Actual template length.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// Optional groups nest deeper than [`MAX_GROUP_DEPTH`].
    DepthExceeded {
        /// Actual nesting depth.
        depth: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// Reverse routing could not fill a required placeholder.
    MissingParameter {
        /// The first missing key, for diagnostics.
        param: String,
    },
    /// No route registered under this name.
    NotFound {
        /// The requested route name.
        name: String,
    },
    /// The route carries a dynamic filter and cannot be serialized.
    ///
    /// The live route table is unaffected; only the cache save fails.
    Uncacheable {
        /// Name of the offending route.
        route: String,
    },
    /// A cached route references a custom filter id that is not registered.
    UnknownFilter {
        /// The unregistered filter id.
        id: String,
        /// Filter ids that ARE registered (for self-correcting error messages).
        available: Vec<String>,
    },
    /// A serialized route table failed to deserialize or rebuild.
    InvalidConfig {
        /// The underlying error message.
        source: String,
    },
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTemplate { template, reason } => {
                write!(f, "invalid route template \"{template}\": {reason}")
            }
            Self::InvalidPattern {
                key,
                pattern,
                source,
            } => {
                write!(f, "invalid pattern \"{pattern}\" for key <{key}>: {source}")
            }
            Self::TemplateTooLong { len, max } => {
                write!(f, "template length is {len}, but maximum allowed is {max}")
            }
            Self::DepthExceeded { depth, max } => {
                write!(
                    f,
                    "optional groups nest {depth} deep, but maximum allowed is {max}"
                )
            }
            Self::MissingParameter { param } => {
                write!(f, "required route parameter not passed: {param}")
            }
            Self::NotFound { name } => {
                write!(f, "no route registered under the name \"{name}\"")
            }
            Self::Uncacheable { route } => {
                write!(
                    f,
                    "route \"{route}\" has a dynamic filter and cannot be cached \
                     — register the filter by id instead, or exclude the route from the cached table"
                )
            }
            Self::UnknownFilter { id, available } => {
                write!(f, "unknown custom filter id \"{id}\"")?;
                if available.is_empty() {
                    write!(f, " — no custom filters are registered")
                } else {
                    write!(f, " — registered: {}", available.join(", "))
                }
            }
            Self::InvalidConfig { source } => {
                write!(f, "invalid route table config: {source}")
            }
        }
    }
}

impl std::error::Error for RouteError {}

/// Errors from the configuration cascade.
///
/// These are caller errors, fatal to the calling operation and never retried.
/// Routine misses (a group no source knows about) are not errors — they merge
/// to an empty group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `load()` was called with no attached sources.
    NoSources,
    /// The group name is empty.
    EmptyGroupName,
    /// A source failed while reading or writing a group.
    Source {
        /// The group being accessed.
        group: String,
        /// The underlying error message.
        source: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSources => {
                write!(f, "no configuration sources attached — attach one first")
            }
            Self::EmptyGroupName => write!(f, "configuration group name is empty"),
            Self::Source { group, source } => {
                write!(
                    f,
                    "configuration source failed for group \"{group}\": {source}"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
