//! Serializable route-table configuration.
//!
//! These types mirror the runtime types but are serde round-trippable,
//! enabling route-cache persistence and config-driven table construction.
//! The compiled regex is **not** serialized: compilation is deterministic,
//! so the cache stores the inputs (template + key patterns) and recompiles on
//! restore — same behavior, no regex-serialization fragility.
//!
//! # Relationship to runtime types
//!
//! | Config type | Runtime type |
//! |-------------|--------------|
//! | [`TableConfig`] | [`RouteTable`](crate::RouteTable) |
//! | [`RouteConfig`] | [`Route`](crate::Route) |
//! | [`FilterConfig`] | [`RouteFilter`](crate::RouteFilter) |
//!
//! Filters serialize as a closed set of named kinds; a `Custom` filter
//! serializes as its registry id and is resolved through a
//! [`FilterRegistry`] on restore. A `Dynamic` closure has no serialized
//! form — saving a table containing one fails with
//! [`RouteError::Uncacheable`](crate::RouteError::Uncacheable), leaving the
//! live table untouched.

use crate::{FilterRegistry, Route, RouteError, RouteFilter, RouteTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Serialized form of a whole [`RouteTable`], in table order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// The routes, in registration (= matching priority) order.
    pub routes: Vec<RouteConfig>,
}

/// Serialized form of one named [`Route`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Registered route name.
    pub name: String,
    /// The raw URI template.
    pub template: String,
    /// Per-key regex overrides.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub patterns: HashMap<String, String>,
    /// Default parameters. Serialized in full, including the `action` seed,
    /// so a round trip is exact; a hand-written config with no `defaults`
    /// yields a route with no defaults at all.
    #[serde(default)]
    pub defaults: HashMap<String, String>,
    /// Route host, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Filters, in attachment order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterConfig>,
}

/// Serialized form of a [`RouteFilter`].
///
/// ```yaml
/// filters:
///   - type: method
///     method: POST
///   - type: custom
///     id: require-auth
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FilterConfig {
    /// [`RouteFilter::MethodIs`].
    #[serde(rename = "method")]
    Method {
        /// Required request method.
        method: String,
    },
    /// [`RouteFilter::HostIs`].
    #[serde(rename = "host")]
    Host {
        /// Required request host.
        host: String,
    },
    /// [`RouteFilter::ParamDefault`].
    #[serde(rename = "param_default")]
    ParamDefault {
        /// Parameter key to fill.
        key: String,
        /// Value inserted when absent.
        value: String,
    },
    /// [`RouteFilter::Custom`], by registry id.
    #[serde(rename = "custom")]
    Custom {
        /// Registry id resolved on restore.
        id: String,
    },
}

impl FilterConfig {
    fn from_filter(route_name: &str, filter: &RouteFilter) -> Result<Self, RouteError> {
        match filter {
            RouteFilter::MethodIs(method) => Ok(Self::Method {
                method: method.clone(),
            }),
            RouteFilter::HostIs(host) => Ok(Self::Host { host: host.clone() }),
            RouteFilter::ParamDefault { key, value } => Ok(Self::ParamDefault {
                key: key.clone(),
                value: value.clone(),
            }),
            RouteFilter::Custom { id, .. } => Ok(Self::Custom { id: id.clone() }),
            RouteFilter::Dynamic(_) => Err(RouteError::Uncacheable {
                route: route_name.to_string(),
            }),
        }
    }

    fn into_filter(self, registry: &FilterRegistry) -> Result<RouteFilter, RouteError> {
        match self {
            Self::Method { method } => Ok(RouteFilter::MethodIs(method)),
            Self::Host { host } => Ok(RouteFilter::HostIs(host)),
            Self::ParamDefault { key, value } => Ok(RouteFilter::ParamDefault { key, value }),
            Self::Custom { id } => match registry.get(&id) {
                Some(func) => Ok(RouteFilter::Custom { id, func }),
                None => Err(RouteError::UnknownFilter {
                    id,
                    available: registry.ids(),
                }),
            },
        }
    }
}

impl RouteConfig {
    /// Serialize one named route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Uncacheable`] if the route carries a dynamic
    /// filter.
    pub fn from_route(name: &str, route: &Route) -> Result<Self, RouteError> {
        let filters = route
            .filters()
            .iter()
            .map(|filter| FilterConfig::from_filter(name, filter))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            template: route.template().raw().to_string(),
            patterns: route.key_patterns().clone(),
            defaults: route.default_params().clone(),
            host: route.host_name().map(str::to_string),
            filters,
        })
    }

    /// Rebuild the runtime route, recompiling the template.
    ///
    /// # Errors
    ///
    /// Propagates template/pattern compile errors, and returns
    /// [`RouteError::UnknownFilter`] for a custom filter id missing from the
    /// registry.
    pub fn into_route(self, registry: &FilterRegistry) -> Result<(String, Route), RouteError> {
        let mut route =
            Route::with_patterns(&self.template, self.patterns)?.defaults(self.defaults);
        if let Some(host) = &self.host {
            route = route.host(host);
        }
        for filter in self.filters {
            route = route.filter(filter.into_filter(registry)?);
        }
        Ok((self.name, route))
    }
}

impl RouteTable {
    /// Serialize the whole table for cache persistence.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Uncacheable`] naming the first route with a
    /// dynamic filter. The live table is never modified by a failed save.
    pub fn to_config(&self) -> Result<TableConfig, RouteError> {
        let routes = self
            .iter()
            .map(|(name, route)| RouteConfig::from_route(name, route))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TableConfig { routes })
    }

    /// Rebuild a table from its serialized form.
    ///
    /// Routes are inserted in config order, so matching priority survives
    /// the round trip. Restore-then-[`append`](Self::append) implements the
    /// "append to live table" variant.
    ///
    /// # Errors
    ///
    /// Propagates compile errors and [`RouteError::UnknownFilter`].
    pub fn from_config(config: TableConfig, registry: &FilterRegistry) -> Result<Self, RouteError> {
        let mut table = Self::new();
        for route_config in config.routes {
            let (name, route) = route_config.into_route(registry)?;
            table.insert(&name, route);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Params, RequestInfo};

    fn sample_table() -> RouteTable {
        let mut table = RouteTable::new();
        table.insert(
            "api",
            Route::with_patterns("api/<version>/<action>", [("version", r"v\d+")])
                .unwrap()
                .defaults([("controller", "api"), ("action", "index")])
                .filter(RouteFilter::MethodIs("GET".into())),
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
    fn round_trip_preserves_matching() {
        let table = sample_table();
        let config = table.to_config().unwrap();
        let restored = RouteTable::from_config(config, &FilterRegistry::new()).unwrap();

        for path in ["api/v1/users", "users/edit/7", "", "api/zzz/users"] {
            let a = table
                .match_request(path, &RequestInfo::default())
                .map(|(n, p)| (n.to_string(), p));
            let b = restored
                .match_request(path, &RequestInfo::default())
                .map(|(n, p)| (n.to_string(), p));
            assert_eq!(a, b, "divergence on {path:?}");
        }
    }

    #[test]
    fn round_trip_survives_json() {
        let table = sample_table();
        let json = serde_json::to_string(&table.to_config().unwrap()).unwrap();
        let config: TableConfig = serde_json::from_str(&json).unwrap();
        let restored = RouteTable::from_config(config, &FilterRegistry::new()).unwrap();

        let (name, params) = restored
            .match_request("api/v2/list", &RequestInfo::method("GET"))
            .unwrap();
        assert_eq!(name, "api");
        assert_eq!(params["version"], "v2");

        // The method filter survived serialization: POST is rejected by the
        // restored api route and falls through to the catch-all.
        let (name, _) = restored
            .match_request("api/v2/list", &RequestInfo::method("POST"))
            .unwrap();
        assert_eq!(name, "default");
    }

    #[test]
    fn dynamic_filter_fails_save_without_corrupting_table() {
        let mut table = sample_table();
        table.insert(
            "closure",
            Route::new("x")
                .unwrap()
                .filter(RouteFilter::dynamic(|_, p, _| Some(p))),
        );

        let err = table.to_config().unwrap_err();
        assert_eq!(
            err,
            RouteError::Uncacheable {
                route: "closure".to_string()
            }
        );

        // Live table still matches.
        assert!(table.match_request("x", &RequestInfo::default()).is_some());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn custom_filter_round_trips_through_registry() {
        let mut registry = FilterRegistry::new();
        registry.register("require-json", |_route, params: Params, _req| {
            if params.get("format").map(String::as_str) == Some("json") {
                Some(params)
            } else {
                None
            }
        });

        let mut table = RouteTable::new();
        table.insert(
            "feed",
            Route::new("feed/<format>").unwrap().filter(RouteFilter::Custom {
                id: "require-json".into(),
                func: registry.get("require-json").unwrap(),
            }),
        );

        let config = table.to_config().unwrap();
        let restored = RouteTable::from_config(config, &registry).unwrap();
        assert!(restored
            .match_request("feed/json", &RequestInfo::default())
            .is_some());
        assert!(restored
            .match_request("feed/xml", &RequestInfo::default())
            .is_none());
    }

    #[test]
    fn unknown_custom_filter_id_fails_restore() {
        let config = TableConfig {
            routes: vec![RouteConfig {
                name: "broken".into(),
                template: "<x>".into(),
                patterns: HashMap::new(),
                defaults: HashMap::new(),
                host: None,
                filters: vec![FilterConfig::Custom {
                    id: "nope".into(),
                }],
            }],
        };

        let err = RouteTable::from_config(config, &FilterRegistry::new()).unwrap_err();
        assert!(matches!(err, RouteError::UnknownFilter { .. }));
    }

    #[test]
    fn hand_written_yaml_config_loads() {
        let yaml = r#"
routes:
  - name: blog
    template: blog/<id>(/<slug>)
    patterns:
      id: "\\d+"
    defaults:
      controller: blog
      action: show
  - name: external
    template: <page>
    host: docs.example.com
    filters:
      - type: method
        method: GET
"#;
        let config: TableConfig = serde_yaml::from_str(yaml).unwrap();
        let table = RouteTable::from_config(config, &FilterRegistry::new()).unwrap();

        let (name, params) = table
            .match_request("blog/12/intro", &RequestInfo::default())
            .unwrap();
        assert_eq!(name, "blog");
        assert_eq!(params["slug"], "intro");
        assert_eq!(params["controller"], "Blog");
    }
}
