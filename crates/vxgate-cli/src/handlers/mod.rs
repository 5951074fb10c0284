//! Subcommand handlers.

pub mod check_auth;
pub mod routes;
pub mod serve;
pub mod shim_pattern;
