//! `vxgate shim-pattern`: print the redirect regex for the browser shim.

use crate::bootstrap::load_registry;
use crate::commands::RoutesArgs;
use crate::error::CliError;

pub fn execute(args: &RoutesArgs) -> Result<(), CliError> {
    let registry = load_registry(args)?;
    println!("{}", registry.shim_pattern());
    Ok(())
}
