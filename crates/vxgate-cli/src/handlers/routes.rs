//! `vxgate routes`: list the route table.

use std::fmt::Write;

use vxgate_core::{RouteRegistry, RouteSpec};

use crate::bootstrap::load_registry;
use crate::commands::RoutesArgs;
use crate::error::CliError;

pub fn execute(args: &RoutesArgs, json: bool) -> Result<(), CliError> {
    let registry = load_registry(args)?;
    if json {
        println!("{}", to_json(&registry)?);
    } else {
        print!("{}", render(&registry));
    }
    Ok(())
}

/// One block per route, in match order.
pub fn render(registry: &RouteRegistry) -> String {
    let mut out = String::new();
    for (i, route) in registry.iter().enumerate() {
        let mode = if route.is_streaming() {
            format!("streaming, {}", route.transform())
        } else {
            "buffered".to_string()
        };
        let _ = writeln!(out, "{}. {} ({mode})", i + 1, route.name());
        let _ = writeln!(out, "   match:    {}", route.pattern().template());
        let _ = writeln!(out, "   upstream: {}", route.endpoint().template());
    }
    out
}

/// The table in routes-file form, loadable with `--routes-file`.
pub fn to_json(registry: &RouteRegistry) -> Result<String, CliError> {
    let specs: Vec<RouteSpec> = registry.iter().map(|r| r.to_spec()).collect();
    Ok(serde_json::to_string_pretty(&specs)?)
}
