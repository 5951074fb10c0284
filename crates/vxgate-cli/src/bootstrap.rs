//! CLI bootstrap - the composition root.
//!
//! The only place where configuration, the route table and the ambient
//! identity are wired into a [`Gateway`].

use std::sync::Arc;

use tracing::{debug, info};
use vxgate_auth::{AdcConfig, AdcCredentialSource, CachedCredentialSource};
use vxgate_core::{CredentialProvider, DeploymentContext, GatewayConfig, RouteRegistry};
use vxgate_proxy::Gateway;

use crate::commands::{RoutesArgs, ServeArgs};
use crate::error::CliError;

/// Build and validate the gateway configuration from `serve` arguments.
pub fn gateway_config(args: &ServeArgs) -> Result<GatewayConfig, CliError> {
    let deployment = DeploymentContext::new(
        args.project.clone().unwrap_or_default(),
        args.location.clone().unwrap_or_default(),
    );
    let config = GatewayConfig::new(deployment)
        .with_max_payload_bytes(args.max_payload)
        .with_max_concurrent_streams(args.max_streams)
        .with_max_buffer_bytes(args.max_buffer);
    config.validate()?;
    Ok(config)
}

/// The routes file if one was given, otherwise the built-in Vertex AI table.
pub fn load_registry(args: &RoutesArgs) -> Result<RouteRegistry, CliError> {
    let registry = match &args.routes_file {
        Some(path) => RouteRegistry::load(path)?,
        None => RouteRegistry::vertex_defaults()?,
    };
    Ok(registry)
}

/// Cached ADC credentials for the given discovery settings.
pub fn credential_provider(config: AdcConfig) -> Result<CredentialProvider, CliError> {
    debug!(
        credentials_path = ?config.credentials_path(),
        well_known_path = ?config.well_known_path(),
        metadata_host = ?config.metadata_host(),
        "Application Default Credentials discovery"
    );
    let source = CachedCredentialSource::new(AdcCredentialSource::new(config)?);
    Ok(CredentialProvider::new(Arc::new(source)))
}

/// Compose a ready-to-serve gateway.
pub fn build_gateway(args: &ServeArgs, adc: AdcConfig) -> Result<Gateway, CliError> {
    let config = gateway_config(args)?;
    let registry = load_registry(&args.routes)?;
    info!(routes = registry.len(), "Route table loaded");
    let credentials = credential_provider(adc)?;
    Ok(Gateway::new(config, registry, credentials)?)
}
