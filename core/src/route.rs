//! Route — a compiled URI template with defaults, filters, and reverse routing
//!
//! A `Route` pairs a parsed [`Template`] with a compiled anchored regex.
//! Matching runs the regex against a slash-trimmed path and folds in
//! defaults; reverse routing walks the same template AST bottom-up,
//! propagating "required" status so optional groups render exactly when a
//! non-default value forces them to.
//!
//! # Determinism
//!
//! Compilation is a pure function of (template, key patterns): compiling the
//! same pair twice yields matchers with identical behavior. Routes are
//! immutable after setup — change the template and rebuild rather than
//! mutating.

use crate::template::{Template, TemplateNode};
use crate::trace::StepOutcome;
use crate::{
    Params, RequestInfo, RouteError, RouteFilter, DEFAULT_PROTOCOL, LOCAL_HOSTS,
    MAX_KEY_PATTERN_LENGTH, REGEX_SEGMENT,
};
use regex::Regex;
use std::collections::HashMap;

/// A named URI template compiled into a matcher.
///
/// # Setup
///
/// Routes are built once at table-setup time and read-only thereafter.
/// Builder methods consume and return `self` for chaining:
///
/// ```
/// use kasane::{Route, RouteFilter};
///
/// let route = Route::with_patterns("blog/<id>(/<slug>)", [("id", r"\d+")])
///     .unwrap()
///     .defaults([("controller", "blog"), ("action", "show")])
///     .filter(RouteFilter::MethodIs("GET".into()));
/// ```
#[derive(Debug, Clone)]
pub struct Route {
    template: Template,
    key_patterns: HashMap<String, String>,
    regex: Regex,
    defaults: HashMap<String, String>,
    host: Option<String>,
    filters: Vec<RouteFilter>,
}

impl Route {
    /// Compile a route from a template, using the default segment pattern
    /// ([`REGEX_SEGMENT`]) for every key.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidTemplate`] if the template does not parse
    /// or names the same key twice.
    pub fn new(template: &str) -> Result<Self, RouteError> {
        Self::with_patterns(template, std::iter::empty::<(&str, &str)>())
    }

    /// Compile a route with per-key regex overrides.
    ///
    /// An override replaces the default segment pattern exactly at that key's
    /// placeholder; other occurrences of the same text in the template are
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if an override fails to compile
    /// or exceeds [`MAX_KEY_PATTERN_LENGTH`], [`RouteError::InvalidTemplate`]
    /// for parse failures.
    pub fn with_patterns<K, V>(
        template: &str,
        key_patterns: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, RouteError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let template = Template::parse(template)?;
        let key_patterns: HashMap<String, String> = key_patterns
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        // Duplicate keys would produce duplicate capture-group names; reject
        // with a template error rather than a cryptic regex one.
        let mut seen = std::collections::HashSet::new();
        for key in template.keys() {
            if !seen.insert(key) {
                return Err(RouteError::InvalidTemplate {
                    template: template.raw().to_string(),
                    reason: format!("key <{key}> appears more than once"),
                });
            }
        }

        // Validate each override on its own so errors name the key.
        for (key, pattern) in &key_patterns {
            if pattern.len() > MAX_KEY_PATTERN_LENGTH {
                return Err(RouteError::InvalidPattern {
                    key: key.clone(),
                    pattern: pattern.clone(),
                    source: format!(
                        "pattern length is {}, but maximum allowed is {}",
                        pattern.len(),
                        MAX_KEY_PATTERN_LENGTH
                    ),
                });
            }
            if let Err(e) = Regex::new(&format!("^(?:{pattern})$")) {
                return Err(RouteError::InvalidPattern {
                    key: key.clone(),
                    pattern: pattern.clone(),
                    source: e.to_string(),
                });
            }
        }

        let source = compile_regex(template.nodes(), &key_patterns);
        let regex = Regex::new(&source).map_err(|e| RouteError::InvalidTemplate {
            template: template.raw().to_string(),
            reason: e.to_string(),
        })?;

        let mut defaults = HashMap::new();
        defaults.insert("action".to_string(), "index".to_string());

        Ok(Self {
            template,
            key_patterns,
            regex,
            defaults,
            host: None,
            filters: Vec::new(),
        })
    }

    /// Replace the default parameter map.
    ///
    /// The seed map is `{action: "index"}`; calling this replaces it
    /// wholesale, so include `action` if the route should keep that default.
    #[must_use]
    pub fn defaults<K, V>(mut self, defaults: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.defaults = defaults
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Set the route's host, making it external unless the host is one of
    /// the [`LOCAL_HOSTS`] sentinels.
    #[must_use]
    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// Append a filter. Filters run in attachment order after a successful
    /// regex match.
    #[must_use]
    pub fn filter(mut self, filter: RouteFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// The parsed template.
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// The per-key regex overrides supplied at construction.
    #[must_use]
    pub fn key_patterns(&self) -> &HashMap<String, String> {
        &self.key_patterns
    }

    /// The compiled regex source, for diagnostics.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// The default value for a key, if any.
    #[must_use]
    pub fn default_of(&self, key: &str) -> Option<&str> {
        self.defaults.get(key).map(String::as_str)
    }

    /// The full default parameter map.
    #[must_use]
    pub fn default_params(&self) -> &HashMap<String, String> {
        &self.defaults
    }

    /// The attached filters, in attachment order.
    #[must_use]
    pub fn filters(&self) -> &[RouteFilter] {
        &self.filters
    }

    /// The configured host, if any.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Whether this route points at another host.
    ///
    /// A route is local when it has no host or the host is one of the
    /// [`LOCAL_HOSTS`] sentinels.
    #[must_use]
    pub fn is_external(&self) -> bool {
        match &self.host {
            Some(host) => !LOCAL_HOSTS.contains(&host.to_ascii_lowercase().as_str()),
            None => false,
        }
    }

    /// Match a request path against this route.
    ///
    /// Leading and trailing `/` are stripped before the anchored regex runs.
    /// On success the returned map holds every named key: captured values
    /// first, defaults for keys missing or captured empty. `controller` and
    /// `directory` values are canonicalized to capitalized identifiers
    /// (`admin_user` → `Admin_User`). Filters then run in attachment order;
    /// any rejection fails the whole match.
    pub fn matches(&self, path: &str, request: &RequestInfo) -> Option<Params> {
        match self.evaluate(path, request) {
            StepOutcome::Matched { params } => Some(params),
            _ => None,
        }
    }

    /// Like [`matches`](Self::matches), but reports *why* a path failed:
    /// regex miss vs. which filter rejected. Backs table-level tracing.
    pub fn evaluate(&self, path: &str, request: &RequestInfo) -> StepOutcome {
        let path = path.trim_matches('/');
        let Some(captures) = self.regex.captures(path) else {
            return StepOutcome::NoMatch;
        };

        let mut params = Params::new();
        for name in self.regex.capture_names().flatten() {
            if let Some(m) = captures.name(name) {
                if !m.as_str().is_empty() {
                    params.insert(name.to_string(), m.as_str().to_string());
                }
            }
        }

        for (key, value) in &self.defaults {
            let empty = params.get(key).map_or(true, String::is_empty);
            if empty {
                params.insert(key.clone(), value.clone());
            }
        }

        // URL segments are lowercase-underscore; dispatch wants Capitalized
        // identifiers.
        for key in ["controller", "directory"] {
            if let Some(value) = params.get_mut(key) {
                *value = canonicalize(value);
            }
        }

        let mut params = params;
        for (index, filter) in self.filters.iter().enumerate() {
            match filter.apply(self, params, request) {
                Some(next) => params = next,
                None => return StepOutcome::FilterRejected { index },
            }
        }

        StepOutcome::Matched { params }
    }

    /// Generate a URI from parameters (reverse routing).
    ///
    /// Optional groups render if and only if they, or any nested group,
    /// received a parameter differing from its default; groups left entirely
    /// at their defaults are elided. Repeated `/` are collapsed and the
    /// trailing `/` trimmed. External routes get their host prepended, with
    /// [`DEFAULT_PROTOCOL`] when the host carries no scheme.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::MissingParameter`] naming the first placeholder
    /// that is required but neither supplied nor defaulted.
    pub fn uri(&self, params: &Params) -> Result<String, RouteError> {
        let (mut uri, _) = generate(self.template.nodes(), params, &self.defaults, true)?;

        while uri.contains("//") {
            uri = uri.replace("//", "/");
        }
        let uri = uri.trim_end_matches('/');

        if !self.is_external() {
            return Ok(uri.to_string());
        }

        // is_external() implies a non-sentinel host is set
        let host = self.host.as_deref().unwrap_or_default();
        let host = host.trim_end_matches('/');
        if host.contains("://") {
            Ok(format!("{host}/{uri}"))
        } else {
            Ok(format!("{DEFAULT_PROTOCOL}{host}/{uri}"))
        }
    }
}

/// Compile the template AST into an anchored regex source string.
///
/// Literals are escaped, keys become named capture groups (override pattern
/// or [`REGEX_SEGMENT`]), optional groups become non-capturing `(?:...)?`.
fn compile_regex(nodes: &[TemplateNode], key_patterns: &HashMap<String, String>) -> String {
    fn emit(nodes: &[TemplateNode], key_patterns: &HashMap<String, String>, out: &mut String) {
        for node in nodes {
            match node {
                TemplateNode::Literal(text) => out.push_str(&regex::escape(text)),
                TemplateNode::Key(name) => {
                    let pattern = key_patterns
                        .get(name)
                        .map_or(REGEX_SEGMENT, String::as_str);
                    out.push_str("(?P<");
                    out.push_str(name);
                    out.push('>');
                    out.push_str(pattern);
                    out.push(')');
                }
                TemplateNode::Group(children) => {
                    out.push_str("(?:");
                    emit(children, key_patterns, out);
                    out.push_str(")?");
                }
            }
        }
    }

    let mut source = String::from("^");
    emit(nodes, key_patterns, &mut source);
    source.push('$');
    source
}

/// Recursive reverse-routing walk.
///
/// `required` flows top-down (true at the top level, false entering a group)
/// and is forced true by any supplied non-default value; it propagates back
/// up so a group renders exactly when it or a descendant became required.
/// The missing-parameter check is per level: a missing placeholder only
/// errors when its own portion ended up required.
fn generate(
    nodes: &[TemplateNode],
    params: &Params,
    defaults: &HashMap<String, String>,
    mut required: bool,
) -> Result<(String, bool), RouteError> {
    let mut out = String::new();
    let mut missing: Option<&str> = None;

    for node in nodes {
        match node {
            TemplateNode::Literal(text) => out.push_str(text),
            TemplateNode::Key(name) => {
                if let Some(value) = params.get(name) {
                    if defaults.get(name) != Some(value) {
                        required = true;
                    }
                    out.push_str(value);
                } else if let Some(default) = defaults.get(name) {
                    out.push_str(default);
                } else if missing.is_none() {
                    missing = Some(name);
                }
            }
            TemplateNode::Group(children) => {
                let (text, group_required) = generate(children, params, defaults, false)?;
                if group_required {
                    required = true;
                    out.push_str(&text);
                }
            }
        }
    }

    if required {
        if let Some(param) = missing {
            return Err(RouteError::MissingParameter {
                param: param.to_string(),
            });
        }
    }

    Ok((out, required))
}

/// `admin_user` → `Admin_User`: capitalize each underscore-separated word,
/// preserving the separators.
fn canonicalize(segment: &str) -> String {
    segment
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("_")
}
