//! Proving backends.
//!
//! [`ProvingBackend`] is the seam to an external proving toolkit. The in-tree
//! [`TranscriptBackend`] checks the relation directly and authenticates the
//! public signals with a keyed BLAKE3 MAC. It reveals nothing about the
//! witness in the proof bytes but it is not a zero-knowledge proof system:
//! anyone holding the verification key can forge proofs. Use it for tests and
//! local tooling.

use rand::RngCore;

use veridicus_core::{CircuitId, FieldElement, Proof, ProofArtifactSet, VerificationKey};

use crate::circuits::{self, CircuitParams};
use crate::constraint::{ConstraintSet, Witness};
use crate::error::ProofError;

/// A proving system able to produce and check proofs for constraint sets.
///
/// Implementations are synchronous; the proof service runs them on the
/// blocking thread pool.
pub trait ProvingBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produce proof bytes for a solved witness.
    fn prove(
        &self,
        set: &ConstraintSet,
        witness: &Witness,
        artifacts: &ProofArtifactSet,
    ) -> Result<Vec<u8>, ProofError>;

    /// Check proof bytes against public signals. Malformed input is `Ok(false)`.
    fn verify(
        &self,
        proof: &Proof,
        public_signals: &[FieldElement],
        verification_key: &VerificationKey,
    ) -> Result<bool, ProofError>;
}

const VERIFICATION_KEY_CONTEXT: &str = "veridicus 2024 transcript verification key";
const PROOF_MAGIC: &[u8; 4] = b"VTP1";
const SEED_BYTES: usize = 32;
const TAG_BYTES: usize = 32;

/// Development backend: relation check plus a MAC over the public transcript.
#[derive(Debug, Default, Clone, Copy)]
pub struct TranscriptBackend;

impl TranscriptBackend {
    pub fn new() -> Self {
        Self
    }

    /// Mint a fresh artifact set for `circuit` at `version`.
    pub fn setup(
        &self,
        circuit: CircuitId,
        version: &str,
        params: &CircuitParams,
    ) -> Result<ProofArtifactSet, ProofError> {
        let mut seed = [0u8; SEED_BYTES];
        rand::thread_rng().fill_bytes(&mut seed);
        self.setup_with_seed(circuit, version, params, seed)
    }

    /// Deterministic variant of [`TranscriptBackend::setup`].
    pub fn setup_with_seed(
        &self,
        circuit: CircuitId,
        version: &str,
        params: &CircuitParams,
        seed: [u8; SEED_BYTES],
    ) -> Result<ProofArtifactSet, ProofError> {
        let set = circuits::constraint_set(circuit, params)?;
        let mac_key = blake3::derive_key(VERIFICATION_KEY_CONTEXT, &seed);
        let verification_key = VerificationKey::new(circuit, version, mac_key.to_vec());
        tracing::info!(
            circuit = %circuit,
            version,
            fingerprint = %verification_key.fingerprint(),
            "transcript artifacts minted"
        );
        Ok(ProofArtifactSet {
            circuit,
            version: version.to_string(),
            proving_key: seed.to_vec(),
            verification_key,
            circuit_descriptor: set.to_descriptor()?,
        })
    }

    fn tag(
        key: &[u8; 32],
        circuit: CircuitId,
        version: &str,
        public_signals: &[FieldElement],
    ) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new_keyed(key);
        for part in [circuit.as_str().as_bytes(), version.as_bytes()] {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        hasher.update(&(public_signals.len() as u64).to_le_bytes());
        for signal in public_signals {
            hasher.update(&signal.to_be_bytes());
        }
        hasher.finalize()
    }
}

impl ProvingBackend for TranscriptBackend {
    fn name(&self) -> &'static str {
        "transcript"
    }

    fn prove(
        &self,
        set: &ConstraintSet,
        witness: &Witness,
        artifacts: &ProofArtifactSet,
    ) -> Result<Vec<u8>, ProofError> {
        let seed: [u8; SEED_BYTES] = artifacts.proving_key.as_slice().try_into().map_err(|_| {
            ProofError::ArtifactMismatch {
                expected: format!("{}-byte transcript proving key", SEED_BYTES),
                found: format!("{} bytes", artifacts.proving_key.len()),
            }
        })?;

        let descriptor = ConstraintSet::from_descriptor(&artifacts.circuit_descriptor)?;
        if descriptor != *set {
            return Err(ProofError::ArtifactMismatch {
                expected: format!("descriptor for {}", set.circuit),
                found: format!("descriptor for a different {} layout", descriptor.circuit),
            });
        }
        set.check(witness)?;

        let key = blake3::derive_key(VERIFICATION_KEY_CONTEXT, &seed);
        let tag = Self::tag(&key, artifacts.circuit, &artifacts.version, &witness.public_signals);
        let mut proof = Vec::with_capacity(PROOF_MAGIC.len() + TAG_BYTES);
        proof.extend_from_slice(PROOF_MAGIC);
        proof.extend_from_slice(tag.as_bytes());
        Ok(proof)
    }

    fn verify(
        &self,
        proof: &Proof,
        public_signals: &[FieldElement],
        verification_key: &VerificationKey,
    ) -> Result<bool, ProofError> {
        let Ok(key) = <[u8; 32]>::try_from(verification_key.key.as_slice()) else {
            tracing::debug!(circuit = %proof.circuit, "verification key has wrong length");
            return Ok(false);
        };
        let bytes = &proof.proof_bytes;
        if bytes.len() != PROOF_MAGIC.len() + TAG_BYTES || !bytes.starts_with(PROOF_MAGIC) {
            tracing::debug!(circuit = %proof.circuit, len = bytes.len(), "malformed proof bytes");
            return Ok(false);
        }
        let mut claimed = [0u8; TAG_BYTES];
        claimed.copy_from_slice(&bytes[PROOF_MAGIC.len()..]);

        let expected = Self::tag(&key, proof.circuit, &proof.version, public_signals);
        // blake3::Hash equality is constant time.
        Ok(expected == blake3::Hash::from(claimed))
    }
}
