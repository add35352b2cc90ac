use veridicus_core::{CircuitId, CoreError};

/// Proof system errors.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("witness does not satisfy {circuit}: {constraint}")]
    WitnessUnsatisfiable {
        circuit: CircuitId,
        constraint: String,
    },

    #[error("artifact missing: {0}")]
    ArtifactMissing(String),

    #[error("artifact mismatch: expected {expected}, found {found}")]
    ArtifactMismatch { expected: String, found: String },

    #[error("nullifier already used in scope {scope}")]
    ReplayDetected { scope: String },

    #[error("verification timed out after {0} ms")]
    VerificationTimeout(u64),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] CoreError),
}
