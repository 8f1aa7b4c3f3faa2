//! correios-cep entry point.
//!
//! `serve` loads the layered configuration, sets up logging and runs the
//! HTTP server until Ctrl-C or SIGTERM. `version` prints build information.

use anyhow::{Context, Result};
use clap::Parser;
use correios_cep_core::{AppConfig, BuildInfo};
use correios_cep_server::Server;

mod cli;
mod logging;

use cli::{Args, Commands, ServeArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Serve(serve_args) => serve(serve_args).await,
        Commands::Version => version(),
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = AppConfig::load_with(args.into()).context("failed to load configuration")?;

    logging::init(&config.log_level, config.json_logs())?;
    tracing::debug!(?config, "configuration loaded");

    let server = Server::from_config(&config).await.context("failed to start server")?;
    server.run().await.context("server error")?;

    Ok(())
}

fn version() -> Result<()> {
    let info = BuildInfo::current();
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
