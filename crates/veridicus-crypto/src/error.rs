/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("poseidon arity must be in 1..={max}, got {actual}")]
    InvalidArity { actual: usize, max: usize },

    #[error("hash failed: {0}")]
    Hash(String),

    #[error("invalid merkle path: {0}")]
    InvalidPath(String),
}
