//! Loading circuit artifacts.
//!
//! Artifacts come out of an external compile/setup pipeline. On disk each
//! circuit version lives in its own folder:
//!
//! ```text
//! <root>/<circuit>/<version>/descriptor.bin
//! <root>/<circuit>/<version>/proving_key.bin
//! <root>/<circuit>/<version>/verification_key.json
//! ```
//!
//! The verification key file carries its declared circuit and version so a
//! key copied into the wrong folder is caught on load.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;

use veridicus_core::{CircuitId, ProofArtifactSet, VerificationKey};

use crate::error::ProofError;

const DESCRIPTOR_FILE: &str = "descriptor.bin";
const PROVING_KEY_FILE: &str = "proving_key.bin";
const VERIFICATION_KEY_FILE: &str = "verification_key.json";

/// Read access to artifact sets keyed by circuit and version.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Load the full artifact triple.
    async fn load(&self, circuit: CircuitId, version: &str) -> Result<ProofArtifactSet, ProofError>;

    /// Load only the verification key.
    async fn load_verification_key(
        &self,
        circuit: CircuitId,
        version: &str,
    ) -> Result<VerificationKey, ProofError>;

    async fn store(&self, artifacts: &ProofArtifactSet) -> Result<(), ProofError>;

    /// Check that every required circuit has a verification key.
    ///
    /// Returns the key fingerprints, keyed by circuit.
    async fn ensure_ready(
        &self,
        circuits: &[CircuitId],
        version: &str,
    ) -> Result<BTreeMap<CircuitId, String>, ProofError> {
        let mut fingerprints = BTreeMap::new();
        for circuit in circuits {
            let key = self.load_verification_key(*circuit, version).await?;
            let fingerprint = key.fingerprint();
            tracing::info!(circuit = %circuit, version, fingerprint = %fingerprint, "verification key ready");
            fingerprints.insert(*circuit, fingerprint);
        }
        Ok(fingerprints)
    }
}

fn check_header(
    key: &VerificationKey,
    circuit: CircuitId,
    version: &str,
) -> Result<(), ProofError> {
    if key.circuit != circuit || key.version != version {
        return Err(ProofError::ArtifactMismatch {
            expected: format!("{}@{}", circuit, version),
            found: format!("{}@{}", key.circuit, key.version),
        });
    }
    Ok(())
}

/// Filesystem artifact store.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir_for(&self, circuit: CircuitId, version: &str) -> PathBuf {
        self.root.join(circuit.as_str()).join(version)
    }

    async fn read(path: &Path) -> Result<Vec<u8>, ProofError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ProofError::ArtifactMissing(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn load(&self, circuit: CircuitId, version: &str) -> Result<ProofArtifactSet, ProofError> {
        let dir = self.dir_for(circuit, version);
        let verification_key = self.load_verification_key(circuit, version).await?;
        let proving_key = Self::read(&dir.join(PROVING_KEY_FILE)).await?;
        let circuit_descriptor = Self::read(&dir.join(DESCRIPTOR_FILE)).await?;
        tracing::debug!(circuit = %circuit, version, dir = %dir.display(), "artifacts loaded");
        Ok(ProofArtifactSet {
            circuit,
            version: version.to_string(),
            proving_key,
            verification_key,
            circuit_descriptor,
        })
    }

    async fn load_verification_key(
        &self,
        circuit: CircuitId,
        version: &str,
    ) -> Result<VerificationKey, ProofError> {
        let path = self.dir_for(circuit, version).join(VERIFICATION_KEY_FILE);
        let bytes = Self::read(&path).await?;
        let key: VerificationKey = serde_json::from_slice(&bytes).map_err(|e| {
            ProofError::InvalidInput(format!("{}: {}", path.display(), e))
        })?;
        check_header(&key, circuit, version)?;
        Ok(key)
    }

    async fn store(&self, artifacts: &ProofArtifactSet) -> Result<(), ProofError> {
        if !artifacts.is_consistent() {
            return Err(ProofError::ArtifactMismatch {
                expected: format!("{}@{}", artifacts.circuit, artifacts.version),
                found: format!(
                    "{}@{}",
                    artifacts.verification_key.circuit, artifacts.verification_key.version
                ),
            });
        }
        let dir = self.dir_for(artifacts.circuit, &artifacts.version);
        tokio::fs::create_dir_all(&dir).await?;
        let key_json = serde_json::to_vec_pretty(&artifacts.verification_key)
            .map_err(|e| ProofError::Backend(format!("encode verification key: {}", e)))?;
        tokio::fs::write(dir.join(VERIFICATION_KEY_FILE), key_json).await?;
        tokio::fs::write(dir.join(PROVING_KEY_FILE), &artifacts.proving_key).await?;
        tokio::fs::write(dir.join(DESCRIPTOR_FILE), &artifacts.circuit_descriptor).await?;
        tracing::info!(
            circuit = %artifacts.circuit,
            version = %artifacts.version,
            dir = %dir.display(),
            "artifacts stored"
        );
        Ok(())
    }
}

/// In-memory artifact store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    sets: DashMap<(CircuitId, String), ProofArtifactSet>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn load(&self, circuit: CircuitId, version: &str) -> Result<ProofArtifactSet, ProofError> {
        self.sets
            .get(&(circuit, version.to_string()))
            .map(|set| set.clone())
            .ok_or_else(|| ProofError::ArtifactMissing(format!("{}@{}", circuit, version)))
    }

    async fn load_verification_key(
        &self,
        circuit: CircuitId,
        version: &str,
    ) -> Result<VerificationKey, ProofError> {
        Ok(self.load(circuit, version).await?.verification_key)
    }

    async fn store(&self, artifacts: &ProofArtifactSet) -> Result<(), ProofError> {
        check_header(&artifacts.verification_key, artifacts.circuit, &artifacts.version)?;
        self.sets.insert(
            (artifacts.circuit, artifacts.version.clone()),
            artifacts.clone(),
        );
        Ok(())
    }
}
