//! Veridicus Crypto — the hash and tree primitives every commitment,
//! nullifier and circuit relies on. These must match the in-circuit
//! Poseidon bit for bit.

pub mod error;
pub mod kdf;
pub mod merkle;
pub mod poseidon;

pub use error::CryptoError;
pub use kdf::derive_scalar;
pub use merkle::{zero_hashes, MerklePath, MAX_PATH_DEPTH};
pub use poseidon::{hash, hash_pair, try_hash, MAX_ARITY};
