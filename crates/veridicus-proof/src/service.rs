use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use veridicus_core::config::ProverConfig;
use veridicus_core::{
    CircuitId, FieldElement, Proof, ProofArtifactSet, ProofEvent, ProofState, ProofStateMachine,
    VerificationKey, VeridicusConfig,
};
use veridicus_identity::NullifierRegistry;

use crate::backend::ProvingBackend;
use crate::circuits::{self, CircuitParams};
use crate::constraint::{ConstraintSet, SignalMap};
use crate::error::ProofError;
use crate::inputs::CircuitInputs;

/// Verification verdict with the named public outputs.
///
/// `outputs` is empty when the proof did not verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedProof {
    pub valid: bool,
    pub outputs: BTreeMap<String, FieldElement>,
}

/// Proves and verifies statements for every known circuit.
///
/// Proving runs on the blocking pool, at most `max_concurrent_proofs` at a
/// time. Verification runs there too, bounded by `verify_timeout`.
pub struct ProofService {
    backend: Arc<dyn ProvingBackend>,
    circuits: HashMap<CircuitId, Arc<ConstraintSet>>,
    permits: Arc<Semaphore>,
    verify_timeout: Duration,
    /// Requests that reached each final state.
    outcomes: DashMap<ProofState, u64>,
}

impl ProofService {
    pub fn new(
        backend: Arc<dyn ProvingBackend>,
        prover: &ProverConfig,
        params: CircuitParams,
    ) -> Result<Self, ProofError> {
        if prover.max_concurrent_proofs == 0 {
            return Err(ProofError::InvalidInput(
                "max_concurrent_proofs must be at least 1".into(),
            ));
        }
        let circuits = CircuitId::ALL
            .into_iter()
            .map(|id| circuits::constraint_set(id, &params).map(|set| (id, Arc::new(set))))
            .collect::<Result<HashMap<_, _>, _>>()?;

        tracing::info!(
            backend = backend.name(),
            max_concurrent_proofs = prover.max_concurrent_proofs,
            verify_timeout_ms = prover.verify_timeout_ms,
            tree_depth = params.tree_depth,
            "proof service ready"
        );
        Ok(Self {
            backend,
            circuits,
            permits: Arc::new(Semaphore::new(prover.max_concurrent_proofs)),
            verify_timeout: prover.verify_timeout(),
            outcomes: DashMap::new(),
        })
    }

    pub fn from_config(
        backend: Arc<dyn ProvingBackend>,
        config: &VeridicusConfig,
    ) -> Result<Self, ProofError> {
        let params = CircuitParams {
            tree_depth: config.group.tree_depth,
        };
        Self::new(backend, &config.prover, params)
    }

    pub fn constraint_set(&self, circuit: CircuitId) -> Result<Arc<ConstraintSet>, ProofError> {
        self.circuits
            .get(&circuit)
            .cloned()
            .ok_or_else(|| ProofError::NotFound(format!("circuit {}", circuit)))
    }

    /// Move one request's state forward, counting it once it is final.
    fn advance(&self, state: ProofState, event: ProofEvent) -> Result<ProofState, ProofError> {
        let next = ProofStateMachine::transition(state, event)?;
        if next.is_final() {
            *self.outcomes.entry(next).or_default() += 1;
        }
        Ok(next)
    }

    /// How many requests ended in each final state since the service started.
    pub fn outcomes(&self) -> BTreeMap<ProofState, u64> {
        self.outcomes
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    fn check_artifacts(circuit: CircuitId, artifacts: &ProofArtifactSet) -> Result<(), ProofError> {
        if artifacts.circuit != circuit {
            return Err(ProofError::ArtifactMismatch {
                expected: circuit.to_string(),
                found: artifacts.circuit.to_string(),
            });
        }
        if !artifacts.is_consistent() {
            return Err(ProofError::ArtifactMismatch {
                expected: format!("{}@{}", artifacts.circuit, artifacts.version),
                found: format!(
                    "verification key for {}@{}",
                    artifacts.verification_key.circuit, artifacts.verification_key.version
                ),
            });
        }
        if artifacts.proving_key.is_empty() {
            return Err(ProofError::ArtifactMissing(format!(
                "proving key for {}@{}",
                circuit, artifacts.version
            )));
        }
        Ok(())
    }

    /// Solve the witness and prove it.
    pub async fn prove(
        &self,
        circuit: CircuitId,
        private_witness: SignalMap,
        public_inputs: SignalMap,
        artifacts: &ProofArtifactSet,
    ) -> Result<Proof, ProofError> {
        Self::check_artifacts(circuit, artifacts)?;
        let set = self.constraint_set(circuit)?;

        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| ProofError::Backend(format!("prover unavailable: {}", e)))?;
        let state = self.advance(ProofState::Unproven, ProofEvent::Start)?;

        let backend = Arc::clone(&self.backend);
        let artifacts = artifacts.clone();
        let started = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let witness = set.solve(&private_witness, &public_inputs)?;
            let proof_bytes = backend.prove(&set, &witness, &artifacts)?;
            Ok::<_, ProofError>(Proof {
                circuit,
                version: artifacts.version,
                proof_bytes,
                public_signals: witness.public_signals.clone(),
            })
        })
        .await
        .map_err(|e| ProofError::Backend(format!("proving task failed: {}", e)))?;

        match outcome {
            Ok(proof) => {
                let state = self.advance(state, ProofEvent::Succeed)?;
                tracing::info!(
                    circuit = %circuit,
                    version = %proof.version,
                    state = %state,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "proof generated"
                );
                Ok(proof)
            }
            Err(e) => {
                let state = self.advance(state, ProofEvent::Fail)?;
                tracing::warn!(circuit = %circuit, state = %state, error = %e, "proof generation failed");
                Err(e)
            }
        }
    }

    /// Prove from a typed input struct.
    pub async fn prove_inputs<I>(&self, inputs: &I, artifacts: &ProofArtifactSet) -> Result<Proof, ProofError>
    where
        I: CircuitInputs + ?Sized,
    {
        self.prove(
            inputs.circuit(),
            inputs.private_signals(),
            inputs.public_signals(),
            artifacts,
        )
        .await
    }

    /// Check `proof` against `public_signals` under `verification_key`.
    ///
    /// A proof that simply does not verify is `Ok(false)`. Errors mean the
    /// request itself could not be answered (wrong key header, wrong signal
    /// count) or ran out of time.
    pub async fn verify(
        &self,
        proof: &Proof,
        public_signals: &[FieldElement],
        verification_key: &VerificationKey,
    ) -> Result<bool, ProofError> {
        if proof.circuit != verification_key.circuit || proof.version != verification_key.version {
            return Err(ProofError::ArtifactMismatch {
                expected: format!("{}@{}", verification_key.circuit, verification_key.version),
                found: format!("{}@{}", proof.circuit, proof.version),
            });
        }
        self.constraint_set(proof.circuit)?
            .check_public_count(public_signals)?;

        let backend = Arc::clone(&self.backend);
        let (task_proof, task_signals, task_key) =
            (proof.clone(), public_signals.to_vec(), verification_key.clone());
        let task = tokio::task::spawn_blocking(move || {
            backend.verify(&task_proof, &task_signals, &task_key)
        });

        let valid = match tokio::time::timeout(self.verify_timeout, task).await {
            Err(_) => {
                let ms = self.verify_timeout.as_millis() as u64;
                tracing::warn!(circuit = %proof.circuit, timeout_ms = ms, "verification timed out");
                return Err(ProofError::VerificationTimeout(ms));
            }
            Ok(joined) => {
                joined.map_err(|e| ProofError::Backend(format!("verification task failed: {}", e)))??
            }
        };

        let event = if valid {
            ProofEvent::Accept
        } else {
            ProofEvent::Reject
        };
        // A proof handed in for checking starts out Proved.
        let state = self.advance(ProofState::Proved, event)?;
        if valid {
            tracing::info!(circuit = %proof.circuit, version = %proof.version, state = %state, "proof verified");
        } else {
            tracing::warn!(circuit = %proof.circuit, version = %proof.version, state = %state, "proof rejected");
        }
        Ok(valid)
    }

    /// [`ProofService::verify`] plus the named public outputs.
    pub async fn verify_outputs(
        &self,
        proof: &Proof,
        public_signals: &[FieldElement],
        verification_key: &VerificationKey,
    ) -> Result<VerifiedProof, ProofError> {
        let valid = self.verify(proof, public_signals, verification_key).await?;
        let outputs = if valid {
            self.constraint_set(proof.circuit)?
                .outputs_from(public_signals)?
        } else {
            BTreeMap::new()
        };
        Ok(VerifiedProof { valid, outputs })
    }

    /// Verify, then consume the proof's nullifier in `scope`.
    ///
    /// Invalid proofs consume nothing. A nullifier already used in `scope`
    /// yields [`ProofError::ReplayDetected`].
    pub async fn accept(
        &self,
        proof: &Proof,
        public_signals: &[FieldElement],
        verification_key: &VerificationKey,
        registry: &NullifierRegistry,
        scope: &str,
        nullifier_output: &str,
    ) -> Result<VerifiedProof, ProofError> {
        let set = self.constraint_set(proof.circuit)?;
        if !set.outputs.iter().any(|name| name == nullifier_output) {
            return Err(ProofError::InvalidInput(format!(
                "{} has no output named {}",
                proof.circuit, nullifier_output
            )));
        }

        let verified = self
            .verify_outputs(proof, public_signals, verification_key)
            .await?;
        if !verified.valid {
            return Ok(verified);
        }

        let nullifier = verified
            .outputs
            .get(nullifier_output)
            .copied()
            .ok_or_else(|| ProofError::InvalidInput(format!("missing output {}", nullifier_output)))?;
        if !registry.mark_used(nullifier, scope) {
            tracing::warn!(circuit = %proof.circuit, scope, "replayed proof refused");
            return Err(ProofError::ReplayDetected {
                scope: scope.to_string(),
            });
        }
        Ok(verified)
    }
}
