//! `veridicus init` — Write a default configuration file.

use std::path::Path;

use clap::Args;

use veridicus_core::VeridicusConfig;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs, config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    VeridicusConfig::default().save(config_path)?;
    tracing::info!(path = %config_path.display(), "wrote default config");
    println!("Wrote {}", config_path.display());
    Ok(())
}
