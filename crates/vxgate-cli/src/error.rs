//! CLI error type and exit codes.

use thiserror::Error;
use vxgate_auth::AdcError;
use vxgate_core::{AuthError, ConfigError, RegistryError};
use vxgate_proxy::SetupError;

/// Errors surfaced by `vxgate` subcommands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Route table error: {0}")]
    Routes(#[from] RegistryError),

    #[error("Credential setup failed: {0}")]
    Credentials(#[from] AdcError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Gateway setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize routes: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),
}

impl CliError {
    /// Map error to an exit code (sysexits.h where one fits).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Routes(_) | Self::Setup(_) => 78, // EX_CONFIG
            Self::Auth(AuthError::NotAuthenticated(_)) => 77,        // EX_NOPERM
            Self::Credentials(_) | Self::Auth(_) => 69,               // EX_UNAVAILABLE
            Self::Io(_) => 74,                                        // EX_IOERR
            Self::Serialize(_) => 70,                                 // EX_SOFTWARE
            Self::Server(_) => 1,
        }
    }
}
