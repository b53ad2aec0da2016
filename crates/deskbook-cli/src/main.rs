use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "deskbook")]
#[command(about = "deskbook - claim a library desk through university SSO", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and book the first available desk
    Run {
        /// Configuration file (defaults to ~/.config/deskbook/config.toml)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Book immediately instead of waiting for an imminent release
        #[arg(long)]
        no_wait: bool,
    },
    /// List supported SSO providers
    Providers,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Run { config, no_wait } => commands::run::execute(config, no_wait),
        Commands::Providers => {
            commands::providers::list();
            Ok(ExitCode::SUCCESS)
        }
    }
}
