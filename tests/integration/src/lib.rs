//! Fixtures shared by the Veridicus integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use veridicus_core::config::ProverConfig;
use veridicus_core::{CircuitId, ProofArtifactSet};
use veridicus_proof::{CircuitParams, ProofService, TranscriptBackend};

/// Tree depth used by the scenarios; small enough to keep paths readable.
pub const TEST_DEPTH: usize = 8;

pub fn params() -> CircuitParams {
    CircuitParams {
        tree_depth: TEST_DEPTH,
    }
}

pub fn service() -> ProofService {
    let prover = ProverConfig {
        max_concurrent_proofs: 2,
        verify_timeout_ms: 5_000,
    };
    match ProofService::new(Arc::new(TranscriptBackend::new()), &prover, params()) {
        Ok(service) => service,
        Err(e) => panic!("test proof service: {}", e),
    }
}

pub fn artifacts(circuit: CircuitId, version: &str) -> ProofArtifactSet {
    match TranscriptBackend::new().setup(circuit, version, &params()) {
        Ok(set) => set,
        Err(e) => panic!("test artifacts for {}: {}", circuit, e),
    }
}

/// A fresh, not yet created directory under the system temp dir.
pub fn temp_dir(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}-{}", prefix, rand::random::<u64>()))
}
