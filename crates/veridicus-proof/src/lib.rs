//! Veridicus Proof — circuits, proving and verification.
//!
//! Provides:
//! - Constraint sets as data, with a builder that enforces range-checked comparisons
//! - The six circuits: age, authenticity, age_level3, humanity, reputation, anti_sybil
//! - Typed inputs for each circuit
//! - The `ProvingBackend` seam and the in-tree transcript backend
//! - Artifact stores (filesystem and in-memory)
//! - The async proof service with replay protection

pub mod artifacts;
pub mod backend;
pub mod circuits;
pub mod constraint;
pub mod error;
pub mod inputs;
pub mod service;

pub use artifacts::{ArtifactStore, FsArtifactStore, MemoryArtifactStore};
pub use backend::{ProvingBackend, TranscriptBackend};
pub use circuits::{CircuitParams, SECONDS_PER_YEAR};
pub use constraint::{Constraint, ConstraintSet, ConstraintSetBuilder, Expr, SignalMap, Witness};
pub use error::ProofError;
pub use inputs::{
    AgeInputs, AgeLevel3Inputs, AntiSybilInputs, AuthenticityInputs, CircuitInputs,
    HumanityInputs, LivenessEvidence, ReputationInputs,
};
pub use service::{ProofService, VerifiedProof};
