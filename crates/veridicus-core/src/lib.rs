//! Veridicus Core — field elements, proof artifacts, the proof lifecycle
//! state machine, and configuration shared by every Veridicus crate.

pub mod config;
pub mod error;
pub mod field;
pub mod proof_state;
pub mod types;

pub use config::VeridicusConfig;
pub use error::CoreError;
pub use field::FieldElement;
pub use proof_state::{ProofEvent, ProofState, ProofStateMachine};
pub use types::{CircuitId, Proof, ProofArtifactSet, ProofPayload, VerificationKey};
