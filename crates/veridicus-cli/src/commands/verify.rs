//! `veridicus verify` — Verify a proof, optionally consuming its nullifier.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use serde::Serialize;

use veridicus_core::{FieldElement, Proof, VeridicusConfig};
use veridicus_identity::{NullifierExport, NullifierRegistry};
use veridicus_proof::inputs::timestamp_epoch;
use veridicus_proof::{
    ArtifactStore, FsArtifactStore, ProofService, TranscriptBackend, VerifiedProof,
};

use super::{print_json, read_state, write_state};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Proof JSON file.
    #[arg(short, long)]
    pub proof: PathBuf,

    /// Public signals to check against (JSON array). Defaults to the proof's own.
    #[arg(long)]
    pub signals: Option<PathBuf>,

    /// Consume the named nullifier output in this scope after verifying.
    #[arg(long, requires = "nullifier_output")]
    pub scope: Option<String>,

    /// Output holding the nullifier, e.g. `nullifier` or `epochNullifier`.
    #[arg(long, requires = "scope")]
    pub nullifier_output: Option<String>,

    /// Registry state file used with `--scope`.
    #[arg(long, default_value = "nullifiers.json")]
    pub registry: PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOutput<'a> {
    #[serde(flatten)]
    verdict: &'a VerifiedProof,
    /// Origin of the proof's timestamp signals; age circuits count from 1900.
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp_epoch: Option<&'static str>,
}

pub async fn run(args: &VerifyArgs, config: &VeridicusConfig) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(&args.proof)
        .map_err(|e| anyhow::anyhow!("read {}: {}", args.proof.display(), e))?;
    let proof = Proof::from_json(&contents)?;

    let public_signals: Vec<FieldElement> = match &args.signals {
        Some(path) => read_state(path)?
            .ok_or_else(|| anyhow::anyhow!("{} does not exist", path.display()))?,
        None => proof.public_signals.clone(),
    };

    let store = FsArtifactStore::new(&config.artifacts.dir);
    let key = store
        .load_verification_key(proof.circuit, &proof.version)
        .await?;
    let service = ProofService::from_config(Arc::new(TranscriptBackend::new()), config)?;

    let verdict = match (&args.scope, &args.nullifier_output) {
        (Some(scope), Some(output)) => {
            let registry = match read_state::<NullifierExport>(&args.registry)? {
                Some(export) => NullifierRegistry::import(&export)?,
                None => NullifierRegistry::new(),
            };
            let verdict = service
                .accept(&proof, &public_signals, &key, &registry, scope, output)
                .await?;
            if verdict.valid {
                write_state(&args.registry, &registry.export())?;
            }
            verdict
        }
        _ => {
            service
                .verify_outputs(&proof, &public_signals, &key)
                .await?
        }
    };

    print_json(&VerifyOutput {
        verdict: &verdict,
        timestamp_epoch: timestamp_epoch(proof.circuit),
    })?;
    if !verdict.valid {
        anyhow::bail!("proof rejected");
    }
    Ok(())
}
