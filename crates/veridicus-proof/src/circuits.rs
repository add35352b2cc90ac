//! The six Veridicus circuits as constraint sets.
//!
//! Public signal order is outputs first, then public inputs, each in the order
//! declared here. Timestamps are whole seconds; every age circuit applies the
//! same policy: `ageSeconds >= minAge * SECONDS_PER_YEAR`.

use veridicus_core::CircuitId;

use crate::constraint::{ConstraintSet, ConstraintSetBuilder, Expr};
use crate::error::ProofError;

/// Mean Gregorian year (365.2425 days) in seconds.
pub const SECONDS_PER_YEAR: u64 = 31_556_952;

/// Width of timestamp and duration range checks.
pub const TIMESTAMP_BITS: u32 = 64;
pub const MIN_AGE_BITS: u32 = 8;
pub const SCORE_BITS: u32 = 32;

/// Shape parameters for circuits that have them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitParams {
    /// Merkle path length of the authenticity circuit.
    pub tree_depth: usize,
}

impl Default for CircuitParams {
    fn default() -> Self {
        Self { tree_depth: 20 }
    }
}

/// Build the constraint set for `circuit`.
pub fn constraint_set(circuit: CircuitId, params: &CircuitParams) -> Result<ConstraintSet, ProofError> {
    match circuit {
        CircuitId::Age => age(),
        CircuitId::Authenticity => authenticity(params.tree_depth),
        CircuitId::AgeLevel3 => age_level3(),
        CircuitId::Humanity => humanity(),
        CircuitId::Reputation => reputation(),
        CircuitId::AntiSybil => anti_sybil(),
    }
}

/// Shared age relation. Returns the `verified` comparison expression.
fn age_relation(b: &mut ConstraintSetBuilder, birth: &Expr, reference: &Expr, min_age: &Expr) -> Expr {
    b.range("birthTs fits 64 bits", birth.clone(), TIMESTAMP_BITS);
    b.range("referenceTs fits 64 bits", reference.clone(), TIMESTAMP_BITS);
    b.range("minAge fits 8 bits", min_age.clone(), MIN_AGE_BITS);
    // A birth after the reference wraps around the field and fails here.
    let age_seconds = b.assign("ageSeconds", reference.clone() - birth.clone());
    b.range("ageSeconds fits 64 bits", age_seconds.clone(), TIMESTAMP_BITS);
    b.greater_eq(
        "ageSeconds >= minAge years",
        age_seconds,
        min_age.clone() * Expr::constant(SECONDS_PER_YEAR),
        TIMESTAMP_BITS,
    )
}

/// Age over a threshold, bound to a document hash.
pub fn age() -> Result<ConstraintSet, ProofError> {
    let mut b = ConstraintSetBuilder::new(CircuitId::Age);
    let birth = b.private("birthTs");
    let salt = b.private("salt");
    let reference = b.public("referenceTs");
    let min_age = b.public("minAge");
    let document = b.public("documentHash");

    let old_enough = age_relation(&mut b, &birth, &reference, &min_age);
    let verified = b.output("verified", old_enough);
    b.equal("verified === 1", verified, Expr::constant(1));
    b.output("ageCommitment", Expr::hash(vec![birth, salt, document]));
    b.build()
}

/// Merkle inclusion of `leaf` under the public `root`.
pub fn authenticity(depth: usize) -> Result<ConstraintSet, ProofError> {
    if depth == 0 {
        return Err(ProofError::InvalidInput(
            "authenticity circuit needs a tree depth of at least 1".into(),
        ));
    }
    let mut b = ConstraintSetBuilder::new(CircuitId::Authenticity);
    let leaf = b.private("leaf");
    let siblings: Vec<Expr> = (0..depth)
        .map(|i| b.private(path_element(i)))
        .collect();
    let indices: Vec<Expr> = (0..depth)
        .map(|i| b.private(path_index(i)))
        .collect();
    let root = b.public("root");

    for (i, index) in indices.iter().enumerate() {
        b.boolean(format!("pathIndices[{}] is boolean", i), index.clone());
    }
    let computed = Expr::MerkleRoot {
        leaf: Box::new(leaf),
        siblings,
        indices,
    };
    b.equal("computed root === root", computed, root);
    b.build()
}

pub fn path_element(level: usize) -> String {
    format!("pathElements[{}]", level)
}

pub fn path_index(level: usize) -> String {
    format!("pathIndices[{}]", level)
}

/// Age over a threshold plus a nullifier bound to the user and document.
pub fn age_level3() -> Result<ConstraintSet, ProofError> {
    let mut b = ConstraintSetBuilder::new(CircuitId::AgeLevel3);
    let birth = b.private("birthTs");
    let salt = b.private("salt");
    let reference = b.public("referenceTs");
    let min_age = b.public("minAge");
    let user = b.public("userID");
    let document = b.public("documentHash");

    let old_enough = age_relation(&mut b, &birth, &reference, &min_age);
    b.output("nullifier", Expr::hash(vec![birth, salt, user, document]));
    let verified = b.output("verified", old_enough);
    b.equal("verified === 1", verified, Expr::constant(1));
    b.build()
}

/// Liveness-backed humanity proof, fresh within `maxAge` seconds.
pub fn humanity() -> Result<ConstraintSet, ProofError> {
    let mut b = ConstraintSetBuilder::new(CircuitId::Humanity);
    let secret = b.private("identitySecret");
    let nonce = b.private("livenessNonce");
    let liveness = b.private("livenessResult");
    let biometric = b.private("biometricHash");
    let credential = b.private("credentialHash");
    let commitment = b.public("identityCommitment");
    let timestamp = b.public("timestamp");
    let max_age = b.public("maxAge");
    let now = b.public("currentTime");
    let scope = b.public("scope");
    let external = b.public("externalNullifier");

    b.equal(
        "identity commitment matches secret",
        Expr::hash(vec![secret.clone()]),
        commitment,
    );
    b.equal("livenessResult === 1", liveness, Expr::constant(1));

    b.range("timestamp fits 64 bits", timestamp.clone(), TIMESTAMP_BITS);
    b.range("currentTime fits 64 bits", now.clone(), TIMESTAMP_BITS);
    b.range("maxAge fits 64 bits", max_age.clone(), TIMESTAMP_BITS);
    let not_future = b.less_eq("timestamp <= currentTime", timestamp.clone(), now.clone(), TIMESTAMP_BITS);
    b.equal("timestamp <= currentTime", not_future, Expr::constant(1));

    let elapsed = b.assign("elapsed", now - timestamp.clone());
    b.range("elapsed fits 64 bits", elapsed.clone(), TIMESTAMP_BITS);
    let fresh = b.less_than("elapsed < maxAge", elapsed, max_age, TIMESTAMP_BITS);
    b.equal("elapsed < maxAge", fresh, Expr::constant(1));

    b.output(
        "nullifierHash",
        Expr::hash(vec![secret.clone(), scope.clone(), external]),
    );
    b.output(
        "humanityCommitment",
        Expr::hash(vec![secret, nonce, biometric, credential]),
    );
    b.output("timestampOut", timestamp);
    b.output("scopeOut", scope);
    b.build()
}

/// Reputation score at or above a public threshold.
pub fn reputation() -> Result<ConstraintSet, ProofError> {
    let mut b = ConstraintSetBuilder::new(CircuitId::Reputation);
    let score = b.private("reputationScore");
    let salt = b.private("salt");
    let interactions = b.private("interactionCount");
    let positives = b.private("positiveCount");
    let threshold = b.public("threshold");
    let agent = b.public("agentDIDHash");
    let timestamp = b.public("timestamp");

    b.range("reputationScore fits 32 bits", score.clone(), SCORE_BITS);
    b.range("threshold fits 32 bits", threshold.clone(), SCORE_BITS);
    let meets = b.greater_eq("reputationScore >= threshold", score.clone(), threshold, SCORE_BITS);

    b.output("nullifier", Expr::hash(vec![agent, salt.clone(), timestamp]));
    let verified = b.output("verified", meets);
    b.equal("verified === 1", verified, Expr::constant(1));
    b.output(
        "commitment",
        Expr::hash(vec![score, interactions, positives, salt]),
    );
    b.build()
}

/// Identity commitment plus epoch- and action-scoped nullifiers.
pub fn anti_sybil() -> Result<ConstraintSet, ProofError> {
    let mut b = ConstraintSetBuilder::new(CircuitId::AntiSybil);
    let secret = b.private("identitySecret");
    let epoch = b.private("epoch");
    let action = b.private("actionId");

    b.output("identityCommitment", Expr::hash(vec![secret.clone()]));
    b.output(
        "epochNullifier",
        Expr::hash(vec![secret.clone(), epoch.clone()]),
    );
    b.output("actionNullifier", Expr::hash(vec![secret, epoch, action]));
    b.build()
}
