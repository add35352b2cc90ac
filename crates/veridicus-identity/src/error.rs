use veridicus_core::CoreError;
use veridicus_crypto::CryptoError;

/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate member: {0}")]
    DuplicateMember(String),

    #[error("duplicate agent: {0}")]
    DuplicateAgent(String),

    #[error("group is full (capacity {capacity})")]
    GroupFull { capacity: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid identity secret: {0}")]
    InvalidSecret(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),
}
