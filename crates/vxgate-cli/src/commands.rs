//! Subcommands and their arguments.
//!
//! Every flag has an environment fallback so the gateway can be configured
//! from a `.env` file alongside the web app it serves.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use vxgate_core::parse_byte_size;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the gateway until interrupted
    Serve(ServeArgs),

    /// List the route table
    Routes {
        #[command(flatten)]
        routes: RoutesArgs,
        /// Print as a JSON routes file instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// Print the URL regex the browser shim uses to pick calls to redirect
    ShimPattern(RoutesArgs),

    /// Check that an access token can be obtained from the ambient identity
    CheckAuth,
}

/// Route table selection.
#[derive(Args, Debug, Clone, Default)]
pub struct RoutesArgs {
    /// JSON routes file replacing the built-in Vertex AI routes
    #[arg(long = "routes-file", env = "VXGATE_ROUTES_FILE")]
    pub routes_file: Option<PathBuf>,
}

/// Arguments for `vxgate serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Google Cloud project billed for Vertex AI calls
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    pub project: Option<String>,

    /// Vertex AI region (e.g. us-central1)
    #[arg(long, env = "GOOGLE_CLOUD_LOCATION")]
    pub location: Option<String>,

    /// Address to bind
    #[arg(long, env = "API_BACKEND_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to bind
    #[arg(short, long, env = "API_BACKEND_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Maximum inbound request size (e.g. 7mb, 512kb)
    #[arg(long = "max-payload", env = "API_PAYLOAD_MAX_SIZE", default_value = "7mb", value_parser = byte_size)]
    pub max_payload: usize,

    /// Maximum simultaneous streaming responses
    #[arg(long = "max-streams", env = "VXGATE_MAX_STREAMS", default_value_t = vxgate_core::DEFAULT_MAX_CONCURRENT_STREAMS)]
    pub max_streams: usize,

    /// Maximum text buffered while re-framing one streamed response
    #[arg(long = "max-buffer", env = "VXGATE_MAX_BUFFER", default_value = "16mb", value_parser = byte_size)]
    pub max_buffer: usize,

    #[command(flatten)]
    pub routes: RoutesArgs,
}

fn byte_size(input: &str) -> Result<usize, String> {
    parse_byte_size(input).map_err(|e| e.to_string())
}
