//! End-to-end routing tests over a realistic route table.
//!
//! These exercise the whole pipeline — table registration order, matching,
//! filters, reverse routing, and a full serialize/restore cycle — the way an
//! application would use it, rather than one module at a time.

use kasane::prelude::*;
use kasane::{RouteFilter, StepOutcome};

/// A table shaped like a typical web application: specific routes first,
/// a catch-all default last.
fn app_table() -> RouteTable {
    let mut table = RouteTable::new();
    table.insert(
        "api",
        Route::with_patterns("api/<version>/<controller>(/<action>(/<id>))", [
            ("version", r"v\d+"),
            ("id", r"\d+"),
        ])
        .unwrap()
        .defaults([("action", "index"), ("format", "json")])
        .filter(RouteFilter::ParamDefault {
            key: "directory".into(),
            value: "api".into(),
        }),
    );
    table.insert(
        "admin",
        Route::new("admin(/<controller>(/<action>))")
            .unwrap()
            .defaults([
                ("directory", "admin"),
                ("controller", "dashboard"),
                ("action", "index"),
            ])
            .filter(RouteFilter::MethodIs("GET".into())),
    );
    table.insert(
        "docs",
        Route::new("docs/<page>")
            .unwrap()
            .defaults([("action", "index")])
            .host("docs.example.com"),
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
fn specific_route_wins_over_catch_all() {
    let table = app_table();

    let (name, params) = table
        .match_request("api/v2/users/list", &RequestInfo::default())
        .unwrap();
    assert_eq!(name, "api");
    assert_eq!(params["version"], "v2");
    assert_eq!(params["controller"], "Users");
    assert_eq!(params["action"], "list");
    // Supplied by the ParamDefault filter.
    assert_eq!(params["directory"], "api");
    // Supplied by the route defaults.
    assert_eq!(params["format"], "json");
}

#[test]
fn catch_all_picks_up_everything_else() {
    let table = app_table();

    let (name, params) = table
        .match_request("blog/show/42", &RequestInfo::default())
        .unwrap();
    assert_eq!(name, "default");
    assert_eq!(params["controller"], "Blog");
    assert_eq!(params["id"], "42");

    let (name, params) = table.match_request("", &RequestInfo::default()).unwrap();
    assert_eq!(name, "default");
    assert_eq!(params["controller"], "Welcome");
    assert_eq!(params["action"], "index");
}

#[test]
fn filtered_route_falls_through_to_later_routes() {
    let table = app_table();

    // GET passes the admin route's method filter.
    let (name, _) = table
        .match_request("admin/users", &RequestInfo::method("GET"))
        .unwrap();
    assert_eq!(name, "admin");

    // POST is rejected by the filter; the catch-all matches the same path.
    let (name, params) = table
        .match_request("admin/users", &RequestInfo::method("POST"))
        .unwrap();
    assert_eq!(name, "default");
    assert_eq!(params["controller"], "Admin");
    assert_eq!(params["action"], "users");
}

#[test]
fn trace_explains_the_fall_through() {
    let table = app_table();
    let trace = table.match_with_trace("admin/users", &RequestInfo::method("POST"));

    assert_eq!(trace.steps[0].name, "api");
    assert!(matches!(trace.steps[0].outcome, StepOutcome::NoMatch));
    assert_eq!(trace.steps[1].name, "admin");
    assert!(matches!(
        trace.steps[1].outcome,
        StepOutcome::FilterRejected { index: 0 }
    ));
    assert_eq!(trace.steps[3].name, "default");
    assert!(trace.steps[3].outcome.matched());

    let (name, _) = trace.result.unwrap();
    assert_eq!(name, "default");
}

#[test]
fn reverse_routing_through_the_table() {
    let table = app_table();

    let mut params = Params::new();
    params.insert("controller".into(), "users".into());
    params.insert("id".into(), "10".into());
    // id forces the enclosing groups, so the defaulted action renders.
    assert_eq!(
        table.get("default").unwrap().uri(&params).unwrap(),
        "users/index/10"
    );

    let mut params = Params::new();
    params.insert("page".into(), "install".into());
    assert_eq!(
        table.get("docs").unwrap().uri(&params).unwrap(),
        "http://docs.example.com/docs/install"
    );
}

#[test]
fn unknown_route_name_is_an_error() {
    let table = app_table();
    let err = table.get("nope").unwrap_err();
    assert_eq!(
        err,
        RouteError::NotFound {
            name: "nope".to_string()
        }
    );
}

#[test]
fn reinsertion_keeps_matching_priority() {
    let mut table = app_table();

    // Replace the api route with a stricter version; it must stay ahead of
    // the catch-all.
    table.insert(
        "api",
        Route::with_patterns("api/<version>/<controller>", [("version", r"v[12]")])
            .unwrap()
            .defaults([("action", "index")]),
    );

    let (name, _) = table
        .match_request("api/v1/users", &RequestInfo::default())
        .unwrap();
    assert_eq!(name, "api");

    // v3 no longer matches the stricter pattern; the catch-all takes it.
    let (name, _) = table
        .match_request("api/v3/users", &RequestInfo::default())
        .unwrap();
    assert_eq!(name, "default");
}

#[test]
fn table_round_trips_through_json_cache() {
    let table = app_table();
    let json = serde_json::to_string_pretty(&table.to_config().unwrap()).unwrap();
    let config: TableConfig = serde_json::from_str(&json).unwrap();
    let restored = RouteTable::from_config(config, &FilterRegistry::new()).unwrap();

    assert_eq!(restored.len(), table.len());

    let corpus = [
        "api/v2/users/list",
        "admin/users",
        "docs/install",
        "blog/show/42",
        "",
        "api/vX/users",
    ];
    for path in corpus {
        for request in [&RequestInfo::method("GET"), &RequestInfo::method("POST")] {
            let a = table
                .match_request(path, request)
                .map(|(n, p)| (n.to_string(), p));
            let b = restored
                .match_request(path, request)
                .map(|(n, p)| (n.to_string(), p));
            assert_eq!(a, b, "divergence on {path:?} {}", request.method);
        }
    }

    // Reverse routing survives too.
    let mut params = Params::new();
    params.insert("page".into(), "intro".into());
    assert_eq!(
        restored.get("docs").unwrap().uri(&params).unwrap(),
        table.get("docs").unwrap().uri(&params).unwrap()
    );
}

#[test]
fn append_restored_routes_behind_live_ones() {
    let mut live = RouteTable::new();
    live.insert(
        "override",
        Route::new("docs/<page>").unwrap().defaults([("source", "live")]),
    );

    let cached = app_table();
    let restored =
        RouteTable::from_config(cached.to_config().unwrap(), &FilterRegistry::new()).unwrap();
    live.append(restored);

    // The live route shadows the cached "docs" route for matching...
    let (name, params) = live
        .match_request("docs/intro", &RequestInfo::default())
        .unwrap();
    assert_eq!(name, "override");
    assert_eq!(params["source"], "live");

    // ...and the cached routes still serve everything else.
    let (name, _) = live
        .match_request("api/v1/users", &RequestInfo::default())
        .unwrap();
    assert_eq!(name, "api");
}
