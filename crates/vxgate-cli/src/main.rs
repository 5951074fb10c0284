//! `vxgate` entry point.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use vxgate_cli::{Cli, CliError, Commands, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.default_log_level()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Err(err) = run(command).await {
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }
    Ok(())
}

async fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Serve(args) => handlers::serve::execute(args).await,
        Commands::Routes { routes, json } => handlers::routes::execute(&routes, json),
        Commands::ShimPattern(args) => handlers::shim_pattern::execute(&args),
        Commands::CheckAuth => handlers::check_auth::execute().await,
    }
}
