//! kasane CLI — driving adapter for the kasane routing engine.
//!
//! Subcommands:
//! - `match <routes> <path> [--method M] [--host H] [--trace]` — resolve a path
//! - `uri <routes> <name> [key=value...]` — reverse-route a named route
//! - `check <routes>` — validate a route table file loads without errors
//! - `info <routes>` — print the table in matching order
//!
//! Route files are YAML or JSON serializations of a route table (picked by
//! file extension). Custom filters cannot be resolved from the command line —
//! tables referencing them fail to load here by design.

use std::process;

use kasane::prelude::*;
use kasane::StepOutcome;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "match" => cmd_match(&args[2..]),
        "uri" => cmd_uri(&args[2..]),
        "check" => cmd_check(&args[2..]),
        "info" => cmd_info(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_match(args: &[String]) -> Result<(), String> {
    if args.len() < 2 {
        return Err("match requires a routes file and a path".into());
    }

    let table = load_table(&args[0])?;
    let path = &args[1];
    let (request, trace) = parse_request(&args[2..])?;

    if trace {
        let trace = table.match_with_trace(path, &request);
        for step in &trace.steps {
            match &step.outcome {
                StepOutcome::NoMatch => println!("{}: no match", step.name),
                StepOutcome::FilterRejected { index } => {
                    println!("{}: rejected by filter {index}", step.name);
                }
                StepOutcome::Matched { .. } => println!("{}: matched", step.name),
            }
        }
        match trace.result {
            Some((name, params)) => print_result(&name, &params),
            None => println!("(no match)"),
        }
    } else {
        match table.match_request(path, &request) {
            Some((name, params)) => print_result(name, &params),
            None => println!("(no match)"),
        }
    }

    Ok(())
}

fn cmd_uri(args: &[String]) -> Result<(), String> {
    if args.len() < 2 {
        return Err("uri requires a routes file and a route name".into());
    }

    let table = load_table(&args[0])?;
    let route = table.get(&args[1]).map_err(|e| e.to_string())?;
    let params = parse_params(&args[2..])?;

    let uri = route.uri(&params).map_err(|e| e.to_string())?;
    println!("{uri}");
    Ok(())
}

fn cmd_check(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("check requires a routes file".into());
    }

    let table = load_table(&args[0])?;
    println!("Table valid ({} routes)", table.len());
    Ok(())
}

fn cmd_info(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("info requires a routes file".into());
    }

    let table = load_table(&args[0])?;
    for (name, route) in &table {
        let external = if route.is_external() {
            format!(" -> {}", route.host_name().unwrap_or_default())
        } else {
            String::new()
        };
        println!("{name}: {}{external}", route.template());
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument and file handling
// ═══════════════════════════════════════════════════════════════════════════════

fn load_table(path: &str) -> Result<RouteTable, String> {
    let text =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read \"{path}\": {e}"))?;

    let config: TableConfig = if path.ends_with(".json") {
        serde_json::from_str(&text).map_err(|e| format!("cannot parse \"{path}\": {e}"))?
    } else {
        serde_yaml::from_str(&text).map_err(|e| format!("cannot parse \"{path}\": {e}"))?
    };

    RouteTable::from_config(config, &FilterRegistry::new()).map_err(|e| e.to_string())
}

fn parse_request(args: &[String]) -> Result<(RequestInfo, bool), String> {
    let mut request = RequestInfo::default();
    let mut trace = false;

    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--method" => {
                request.method = args
                    .next()
                    .ok_or("--method requires a value")?
                    .to_string();
            }
            "--host" => {
                request.host = Some(args.next().ok_or("--host requires a value")?.to_string());
            }
            "--trace" => trace = true,
            other => return Err(format!("unknown option \"{other}\"")),
        }
    }

    Ok((request, trace))
}

fn parse_params(args: &[String]) -> Result<Params, String> {
    let mut params = Params::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got \"{arg}\""))?;
        params.insert(key.to_string(), value.to_string());
    }
    Ok(params)
}

fn print_result(name: &str, params: &Params) {
    println!("{name}");
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();
    for key in keys {
        println!("  {key} = {}", params[key]);
    }
}

fn print_usage() {
    eprintln!(
        "kasane — cascading route engine

Usage:
  kasane match <routes> <path> [--method M] [--host H] [--trace]
  kasane uri <routes> <name> [key=value...]
  kasane check <routes>
  kasane info <routes>

Route files are YAML (default) or JSON (.json) route table configs."
    );
}
