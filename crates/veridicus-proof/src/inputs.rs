//! Typed circuit inputs.
//!
//! Each struct knows its circuit and renders the private and public signal
//! maps the constraint set expects, so callers never spell signal names.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use zeroize::{Zeroize, ZeroizeOnDrop};

use veridicus_core::{CircuitId, FieldElement};
use veridicus_crypto::{derive_scalar, MerklePath};
use veridicus_identity::{Identity, ReputationWitness};

use crate::circuits::{path_element, path_index};
use crate::constraint::SignalMap;
use crate::error::ProofError;

const AGENT_DID_CONTEXT: &str = "veridicus 2024 agent did";
const REDACTED: &str = "<redacted>";

/// Signal maps for one proof request.
pub trait CircuitInputs {
    fn circuit(&self) -> CircuitId;
    fn private_signals(&self) -> SignalMap;
    fn public_signals(&self) -> SignalMap;
}

fn signal_map<const N: usize>(pairs: [(&str, FieldElement); N]) -> SignalMap {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Origin of age-circuit timestamps (`birthTs`, `referenceTs`).
pub const AGE_EPOCH: &str = "1900-01-01T00:00:00Z";
/// Origin of humanity and reputation timestamps.
pub const UNIX_EPOCH: &str = "1970-01-01T00:00:00Z";
/// Seconds from [`AGE_EPOCH`] to the Unix epoch.
pub const AGE_EPOCH_OFFSET: u64 = 2_208_988_800;

/// Origin of the timestamp signals `circuit` takes, if it takes any.
pub fn timestamp_epoch(circuit: CircuitId) -> Option<&'static str> {
    match circuit {
        CircuitId::Age | CircuitId::AgeLevel3 => Some(AGE_EPOCH),
        CircuitId::Humanity | CircuitId::Reputation => Some(UNIX_EPOCH),
        CircuitId::Authenticity | CircuitId::AntiSybil => None,
    }
}

/// Seconds since 1900-01-01T00:00:00Z, the origin of age-circuit timestamps.
///
/// Age circuits only look at differences, and a 1900 origin keeps every
/// living person's birth date non-negative. Humanity and reputation
/// circuits take Unix seconds instead; see [`age_timestamp_from_unix`].
pub fn age_timestamp(at: DateTime<Utc>) -> Result<u64, ProofError> {
    let origin = Utc
        .with_ymd_and_hms(1900, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| ProofError::InvalidInput("age timestamp origin".into()))?;
    let seconds = (at - origin).num_seconds();
    u64::try_from(seconds)
        .map_err(|_| ProofError::InvalidInput(format!("{} predates 1900-01-01", at.to_rfc3339())))
}

/// Shift Unix seconds onto the age-circuit origin.
pub fn age_timestamp_from_unix(unix: u64) -> u64 {
    unix.saturating_add(AGE_EPOCH_OFFSET)
}

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// Field encoding of an agent DID for the reputation circuit.
pub fn agent_did_hash(did: &str) -> FieldElement {
    derive_scalar(AGENT_DID_CONTEXT, did.as_bytes())
}

/// Age proof request. Private fields are wiped on drop and hidden from `Debug`.
///
/// `birth_ts` and `reference_ts` count seconds from [`AGE_EPOCH`]
/// (1900-01-01), not from the Unix epoch.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AgeInputs {
    pub birth_ts: u64,
    pub salt: FieldElement,
    pub reference_ts: u64,
    pub min_age: u8,
    pub document_hash: FieldElement,
}

impl AgeInputs {
    pub fn from_dates(
        birth: DateTime<Utc>,
        reference: DateTime<Utc>,
        min_age: u8,
        salt: FieldElement,
        document_hash: FieldElement,
    ) -> Result<Self, ProofError> {
        Ok(Self {
            birth_ts: age_timestamp(birth)?,
            salt,
            reference_ts: age_timestamp(reference)?,
            min_age,
            document_hash,
        })
    }
}

impl fmt::Debug for AgeInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgeInputs")
            .field("birth_ts", &REDACTED)
            .field("salt", &REDACTED)
            .field("reference_ts", &self.reference_ts)
            .field("min_age", &self.min_age)
            .field("document_hash", &self.document_hash)
            .finish()
    }
}

impl CircuitInputs for AgeInputs {
    fn circuit(&self) -> CircuitId {
        CircuitId::Age
    }

    fn private_signals(&self) -> SignalMap {
        signal_map([
            ("birthTs", FieldElement::from_u64(self.birth_ts)),
            ("salt", self.salt),
        ])
    }

    fn public_signals(&self) -> SignalMap {
        signal_map([
            ("referenceTs", FieldElement::from_u64(self.reference_ts)),
            ("minAge", FieldElement::from_u64(u64::from(self.min_age))),
            ("documentHash", self.document_hash),
        ])
    }
}

#[derive(Clone)]
pub struct AuthenticityInputs {
    pub leaf: FieldElement,
    pub path: MerklePath,
    pub root: FieldElement,
}

impl AuthenticityInputs {
    /// Inputs proving `leaf` sits under `root` along `path`.
    pub fn from_path(leaf: FieldElement, path: MerklePath, root: FieldElement) -> Self {
        Self { leaf, path, root }
    }
}

impl Drop for AuthenticityInputs {
    fn drop(&mut self) {
        self.leaf.zeroize();
        self.path.elements.zeroize();
        self.path.indices.zeroize();
    }
}

impl fmt::Debug for AuthenticityInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticityInputs")
            .field("leaf", &REDACTED)
            .field("path", &REDACTED)
            .field("root", &self.root)
            .finish()
    }
}

impl CircuitInputs for AuthenticityInputs {
    fn circuit(&self) -> CircuitId {
        CircuitId::Authenticity
    }

    fn private_signals(&self) -> SignalMap {
        let mut signals = signal_map([("leaf", self.leaf)]);
        for (level, (element, index)) in self.path.elements.iter().zip(&self.path.indices).enumerate() {
            signals.insert(path_element(level), *element);
            signals.insert(path_index(level), FieldElement::from_u64(u64::from(*index)));
        }
        signals
    }

    fn public_signals(&self) -> SignalMap {
        signal_map([("root", self.root)])
    }
}

/// Same timestamp convention as [`AgeInputs`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AgeLevel3Inputs {
    pub birth_ts: u64,
    pub salt: FieldElement,
    pub reference_ts: u64,
    pub min_age: u8,
    pub user_id: FieldElement,
    pub document_hash: FieldElement,
}

impl fmt::Debug for AgeLevel3Inputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgeLevel3Inputs")
            .field("birth_ts", &REDACTED)
            .field("salt", &REDACTED)
            .field("reference_ts", &self.reference_ts)
            .field("min_age", &self.min_age)
            .field("user_id", &self.user_id)
            .field("document_hash", &self.document_hash)
            .finish()
    }
}

impl CircuitInputs for AgeLevel3Inputs {
    fn circuit(&self) -> CircuitId {
        CircuitId::AgeLevel3
    }

    fn private_signals(&self) -> SignalMap {
        signal_map([
            ("birthTs", FieldElement::from_u64(self.birth_ts)),
            ("salt", self.salt),
        ])
    }

    fn public_signals(&self) -> SignalMap {
        signal_map([
            ("referenceTs", FieldElement::from_u64(self.reference_ts)),
            ("minAge", FieldElement::from_u64(u64::from(self.min_age))),
            ("userID", self.user_id),
            ("documentHash", self.document_hash),
        ])
    }
}

/// Output of a liveness check, as handed over by the capture pipeline.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LivenessEvidence {
    pub nonce: FieldElement,
    pub passed: bool,
    pub biometric_hash: FieldElement,
    pub credential_hash: FieldElement,
    /// Unix seconds at which the check ran.
    pub timestamp: u64,
}

impl fmt::Debug for LivenessEvidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LivenessEvidence")
            .field("nonce", &REDACTED)
            .field("passed", &self.passed)
            .field("biometric_hash", &REDACTED)
            .field("credential_hash", &REDACTED)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HumanityInputs {
    pub identity_secret: FieldElement,
    pub liveness_nonce: FieldElement,
    pub liveness_result: bool,
    pub biometric_hash: FieldElement,
    pub credential_hash: FieldElement,
    pub identity_commitment: FieldElement,
    pub timestamp: u64,
    pub max_age: u64,
    pub current_time: u64,
    pub scope: FieldElement,
    pub external_nullifier: FieldElement,
}

impl HumanityInputs {
    pub fn new(
        identity: &Identity,
        evidence: &LivenessEvidence,
        scope: FieldElement,
        external_nullifier: FieldElement,
        max_age: u64,
        current_time: u64,
    ) -> Self {
        Self {
            identity_secret: identity.secret(),
            liveness_nonce: evidence.nonce,
            liveness_result: evidence.passed,
            biometric_hash: evidence.biometric_hash,
            credential_hash: evidence.credential_hash,
            identity_commitment: identity.commitment(),
            timestamp: evidence.timestamp,
            max_age,
            current_time,
            scope,
            external_nullifier,
        }
    }

    /// Same as [`HumanityInputs::new`] with `current_time` taken from the clock.
    pub fn now(
        identity: &Identity,
        evidence: &LivenessEvidence,
        scope: FieldElement,
        external_nullifier: FieldElement,
        max_age: u64,
    ) -> Self {
        Self::new(identity, evidence, scope, external_nullifier, max_age, unix_now())
    }
}

impl fmt::Debug for HumanityInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HumanityInputs")
            .field("identity_secret", &REDACTED)
            .field("liveness_nonce", &REDACTED)
            .field("liveness_result", &REDACTED)
            .field("biometric_hash", &REDACTED)
            .field("credential_hash", &REDACTED)
            .field("identity_commitment", &self.identity_commitment)
            .field("timestamp", &self.timestamp)
            .field("max_age", &self.max_age)
            .field("current_time", &self.current_time)
            .field("scope", &self.scope)
            .field("external_nullifier", &self.external_nullifier)
            .finish()
    }
}

impl CircuitInputs for HumanityInputs {
    fn circuit(&self) -> CircuitId {
        CircuitId::Humanity
    }

    fn private_signals(&self) -> SignalMap {
        signal_map([
            ("identitySecret", self.identity_secret),
            ("livenessNonce", self.liveness_nonce),
            ("livenessResult", FieldElement::from(self.liveness_result)),
            ("biometricHash", self.biometric_hash),
            ("credentialHash", self.credential_hash),
        ])
    }

    fn public_signals(&self) -> SignalMap {
        signal_map([
            ("identityCommitment", self.identity_commitment),
            ("timestamp", FieldElement::from_u64(self.timestamp)),
            ("maxAge", FieldElement::from_u64(self.max_age)),
            ("currentTime", FieldElement::from_u64(self.current_time)),
            ("scope", self.scope),
            ("externalNullifier", self.external_nullifier),
        ])
    }
}

#[derive(Clone, Debug, Zeroize, ZeroizeOnDrop)]
pub struct ReputationInputs {
    pub witness: ReputationWitness,
    pub threshold: u32,
    pub agent_did_hash: FieldElement,
    pub timestamp: u64,
}

impl CircuitInputs for ReputationInputs {
    fn circuit(&self) -> CircuitId {
        CircuitId::Reputation
    }

    fn private_signals(&self) -> SignalMap {
        signal_map([
            ("reputationScore", self.witness.reputation_score),
            ("salt", self.witness.salt),
            ("interactionCount", self.witness.interaction_count),
            ("positiveCount", self.witness.positive_count),
        ])
    }

    fn public_signals(&self) -> SignalMap {
        signal_map([
            ("threshold", FieldElement::from_u64(u64::from(self.threshold))),
            ("agentDIDHash", self.agent_did_hash),
            ("timestamp", FieldElement::from_u64(self.timestamp)),
        ])
    }
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AntiSybilInputs {
    pub identity_secret: FieldElement,
    pub epoch: u64,
    pub action_id: FieldElement,
}

impl AntiSybilInputs {
    pub fn for_identity(identity: &Identity, epoch: u64, action_id: FieldElement) -> Self {
        Self {
            identity_secret: identity.secret(),
            epoch,
            action_id,
        }
    }
}

impl fmt::Debug for AntiSybilInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AntiSybilInputs")
            .field("identity_secret", &REDACTED)
            .field("epoch", &self.epoch)
            .field("action_id", &self.action_id)
            .finish()
    }
}

impl CircuitInputs for AntiSybilInputs {
    fn circuit(&self) -> CircuitId {
        CircuitId::AntiSybil
    }

    fn private_signals(&self) -> SignalMap {
        signal_map([
            ("identitySecret", self.identity_secret),
            ("epoch", FieldElement::from_u64(self.epoch)),
            ("actionId", self.action_id),
        ])
    }

    fn public_signals(&self) -> SignalMap {
        SignalMap::new()
    }
}
