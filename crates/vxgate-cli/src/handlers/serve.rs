//! `vxgate serve`: run the gateway until Ctrl-C.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vxgate_auth::AdcConfig;

use crate::bootstrap::build_gateway;
use crate::commands::ServeArgs;
use crate::error::CliError;

/// Execute the serve command.
pub async fn execute(args: ServeArgs) -> Result<(), CliError> {
    let gateway = build_gateway(&args, AdcConfig::from_env())?;

    let addr = SocketAddr::new(args.host, args.port);
    let listener = TcpListener::bind(addr).await?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), cancel.clone()));

    vxgate_proxy::serve(listener, gateway, cancel)
        .await
        .map_err(|e| CliError::Server(format!("{e:#}")))
}

/// Cancel `cancel` once `signal` fires. If the handler cannot be installed
/// the server keeps running and must be stopped some other way.
async fn cancel_on_signal<F>(signal: F, cancel: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("Shutdown requested");
            cancel.cancel();
        }
        Err(e) => warn!("Failed to listen for Ctrl-C, graceful shutdown unavailable: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_cancels() {
        let cancel = CancellationToken::new();
        cancel_on_signal(async { Ok(()) }, cancel.clone()).await;
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_failed_signal_install_keeps_running() {
        let cancel = CancellationToken::new();
        cancel_on_signal(
            async { Err(std::io::Error::other("no signal support")) },
            cancel.clone(),
        )
        .await;
        assert!(!cancel.is_cancelled());
    }
}
