use crate::proof_state::ProofState;

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid field element: {0}")]
    InvalidFieldElement(String),

    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: ProofState, to: ProofState },

    #[error("unknown circuit: {0}")]
    UnknownCircuit(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
