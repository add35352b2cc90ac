//! Veridicus CLI — local tooling for identities, groups, and proofs.
//!
//! Subcommands: init, identity, group, nullifier, setup, prove, verify.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use veridicus_core::VeridicusConfig;

/// Veridicus — privacy-preserving proofs.
#[derive(Parser, Debug)]
#[command(name = "veridicus", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "veridicus.toml")]
    config: PathBuf,

    /// Override the configured log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Create or recover an identity.
    Identity(commands::identity::IdentityArgs),
    /// Manage a group stored in a JSON export file.
    Group(commands::group::GroupArgs),
    /// Mark or check nullifiers in a JSON registry file.
    Nullifier(commands::nullifier::NullifierArgs),
    /// Mint development artifacts into the artifact directory.
    Setup(commands::setup::SetupArgs),
    /// Generate a proof.
    Prove(commands::prove::ProveArgs),
    /// Verify a proof.
    Verify(commands::verify::VerifyArgs),
}

fn init_tracing(config: &VeridicusConfig, override_level: Option<&str>) {
    let level = override_level.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr; stdout carries command output.
    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if matches!(cli.command, Commands::Init(_)) {
        VeridicusConfig::default()
    } else {
        VeridicusConfig::load(&cli.config)?
    };
    init_tracing(&config, cli.log_level.as_deref());

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &cli.config),
        Commands::Identity(args) => commands::identity::run(args),
        Commands::Group(args) => commands::group::run(args, &config),
        Commands::Nullifier(args) => commands::nullifier::run(args),
        Commands::Setup(args) => commands::setup::run(args, &config).await,
        Commands::Prove(args) => commands::prove::run(args, &config).await,
        Commands::Verify(args) => commands::verify::run(args, &config).await,
    }
}
