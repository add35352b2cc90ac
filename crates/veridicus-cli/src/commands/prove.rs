//! `veridicus prove` — Generate a proof from a JSON input file.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use serde::Deserialize;

use veridicus_core::{CircuitId, FieldElement, VeridicusConfig};
use veridicus_proof::{ArtifactStore, FsArtifactStore, ProofService, TranscriptBackend};

#[derive(Args, Debug)]
pub struct ProveArgs {
    /// Circuit to prove: age, authenticity, age_level3, humanity, reputation, anti_sybil.
    #[arg(long)]
    pub circuit: CircuitId,

    /// JSON file with `private` and `public` signal maps (decimal or 0x strings).
    #[arg(short, long)]
    pub inputs: PathBuf,

    /// Write the proof here instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Artifact version. Defaults to `artifacts.version` from the config.
    #[arg(long)]
    pub artifact_version: Option<String>,
}

#[derive(Deserialize)]
struct InputFile {
    #[serde(default)]
    private: BTreeMap<String, FieldElement>,
    #[serde(default)]
    public: BTreeMap<String, FieldElement>,
}

pub async fn run(args: &ProveArgs, config: &VeridicusConfig) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(&args.inputs)
        .map_err(|e| anyhow::anyhow!("read {}: {}", args.inputs.display(), e))?;
    let inputs: InputFile = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid inputs JSON: {}", e))?;

    let version = args
        .artifact_version
        .clone()
        .unwrap_or_else(|| config.artifacts.version.clone());
    let store = FsArtifactStore::new(&config.artifacts.dir);
    let artifacts = store.load(args.circuit, &version).await?;

    let service = ProofService::from_config(Arc::new(TranscriptBackend::new()), config)?;
    let proof = service
        .prove(args.circuit, inputs.private, inputs.public, &artifacts)
        .await?;
    let json = proof.to_json()?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)
                .map_err(|e| anyhow::anyhow!("write {}: {}", path.display(), e))?;
            eprintln!(
                "Proof for {} written to {} at {}",
                args.circuit,
                path.display(),
                chrono::Utc::now().to_rfc3339()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
