//! `veridicus setup` — Mint development artifacts into the artifact directory.

use std::path::PathBuf;

use clap::Args;

use veridicus_core::{CircuitId, VeridicusConfig};
use veridicus_proof::{ArtifactStore, CircuitParams, FsArtifactStore, TranscriptBackend};

#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Circuits to set up (comma-separated). Defaults to all of them.
    #[arg(long, value_delimiter = ',')]
    pub circuits: Vec<CircuitId>,

    /// Artifact version. Defaults to `artifacts.version` from the config.
    #[arg(long)]
    pub artifact_version: Option<String>,

    /// Artifact directory. Defaults to `artifacts.dir` from the config.
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

pub async fn run(args: &SetupArgs, config: &VeridicusConfig) -> anyhow::Result<()> {
    let version = args
        .artifact_version
        .clone()
        .unwrap_or_else(|| config.artifacts.version.clone());
    let dir = args.dir.clone().unwrap_or_else(|| config.artifacts.dir.clone());
    let circuits = if args.circuits.is_empty() {
        CircuitId::ALL.to_vec()
    } else {
        args.circuits.clone()
    };
    let params = CircuitParams {
        tree_depth: config.group.tree_depth,
    };

    let backend = TranscriptBackend::new();
    let store = FsArtifactStore::new(&dir);
    eprintln!("Transcript artifacts are for development only; they are not zero-knowledge.");
    for circuit in circuits {
        let artifacts = backend.setup(circuit, &version, &params)?;
        store.store(&artifacts).await?;
        println!(
            "{:<13} {}  {}",
            circuit,
            version,
            artifacts.verification_key.fingerprint()
        );
    }
    println!("Artifacts written to {}", dir.display());
    Ok(())
}
