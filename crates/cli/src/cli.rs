//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use correios_cep_core::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "correios-cep", version, about = "Brazilian postal code lookup API backed by Correios")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Print build information
    Version,
}

#[derive(clap::Args, Debug, Default)]
pub struct ServeArgs {
    /// TOML config file
    #[arg(long, env = "CORREIOS_CEP_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database
    #[arg(long)]
    pub database_url: Option<String>,

    /// Address to listen on
    #[arg(long)]
    pub addr: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

impl From<ServeArgs> for ConfigOverrides {
    fn from(args: ServeArgs) -> Self {
        ConfigOverrides {
            database_url: args.database_url,
            addr: args.addr,
            log_level: args.log_level,
            log_format: args.log_format,
            config_file: args.config,
        }
    }
}
