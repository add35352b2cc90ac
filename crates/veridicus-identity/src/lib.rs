//! Veridicus Identity Layer
//!
//! Holder-side and shared-state primitives behind every proof:
//! - Identities (secret scalar + Poseidon commitment), creation and recovery
//! - Incremental Merkle groups of identity commitments
//! - Scoped nullifier registry for at-most-once proof use
//! - Agent reputation ledger feeding the reputation circuit

pub mod error;
pub mod group;
pub mod identity;
pub mod nullifier;
pub mod reputation;

pub use error::IdentityError;
pub use group::{GroupExport, GroupSnapshot, GroupStore, MerkleGroup};
pub use identity::{scope_field, Identity, IdentityManager};
pub use nullifier::{NullifierExport, NullifierRegistry};
pub use reputation::{ReputationLedger, ReputationRecord, ReputationWitness, FIXED_ONE};
