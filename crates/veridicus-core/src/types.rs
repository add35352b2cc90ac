use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::field::FieldElement;

/// The proof schemes Veridicus knows how to build witnesses for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitId {
    /// Age over a threshold, bound to a document hash.
    Age,
    /// Merkle inclusion of a leaf under a public root.
    Authenticity,
    /// Age over a threshold with a replay-protection nullifier bound to a user.
    AgeLevel3,
    /// Liveness-backed humanity proof scoped by an external nullifier.
    Humanity,
    /// Reputation score at or above a public threshold.
    Reputation,
    /// Identity commitment plus epoch- and action-scoped nullifiers.
    AntiSybil,
}

impl CircuitId {
    pub const ALL: [CircuitId; 6] = [
        CircuitId::Age,
        CircuitId::Authenticity,
        CircuitId::AgeLevel3,
        CircuitId::Humanity,
        CircuitId::Reputation,
        CircuitId::AntiSybil,
    ];

    /// Stable name used in artifact paths and wire payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Authenticity => "authenticity",
            Self::AgeLevel3 => "age_level3",
            Self::Humanity => "humanity",
            Self::Reputation => "reputation",
            Self::AntiSybil => "anti_sybil",
        }
    }
}

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CircuitId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| CoreError::UnknownCircuit(s.to_string()))
    }
}

/// Serde helper: bytes as standard base64.
pub mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

/// A verification key blob together with the circuit version it was produced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey {
    pub circuit: CircuitId,
    pub version: String,
    /// Backend-specific key material, opaque to Veridicus.
    #[serde(with = "b64")]
    pub key: Vec<u8>,
}

impl VerificationKey {
    pub fn new(circuit: CircuitId, version: impl Into<String>, key: Vec<u8>) -> Self {
        Self {
            circuit,
            version: version.into(),
            key,
        }
    }

    /// BLAKE3 fingerprint of the key bytes, hex-encoded.
    pub fn fingerprint(&self) -> String {
        blake3::hash(&self.key).to_hex().to_string()
    }
}

/// The (descriptor, proving key, verification key) triple for one circuit version.
///
/// Produced by the external compilation/setup pipeline and loaded read-only.
#[derive(Debug, Clone)]
pub struct ProofArtifactSet {
    pub circuit: CircuitId,
    pub version: String,
    pub proving_key: Vec<u8>,
    pub verification_key: VerificationKey,
    pub circuit_descriptor: Vec<u8>,
}

impl ProofArtifactSet {
    /// Whether the header and the verification key agree on circuit and version.
    pub fn is_consistent(&self) -> bool {
        self.verification_key.circuit == self.circuit && self.verification_key.version == self.version
    }
}

/// A generated proof with its public signals (outputs first, then public inputs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ProofPayload", try_from = "ProofPayload")]
pub struct Proof {
    pub circuit: CircuitId,
    pub version: String,
    pub proof_bytes: Vec<u8>,
    pub public_signals: Vec<FieldElement>,
}

/// Wire shape of a proof: base64 proof bytes and decimal-string public signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofPayload {
    pub circuit: CircuitId,
    pub version: String,
    #[serde(with = "b64")]
    pub proof: Vec<u8>,
    pub public_signals: Vec<String>,
}

impl From<Proof> for ProofPayload {
    fn from(proof: Proof) -> Self {
        Self {
            circuit: proof.circuit,
            version: proof.version,
            proof: proof.proof_bytes,
            public_signals: proof.public_signals.iter().map(|s| s.to_decimal()).collect(),
        }
    }
}

impl TryFrom<ProofPayload> for Proof {
    type Error = CoreError;

    fn try_from(payload: ProofPayload) -> Result<Self, Self::Error> {
        let public_signals = payload
            .public_signals
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<FieldElement>, _>>()?;
        Ok(Self {
            circuit: payload.circuit,
            version: payload.version,
            proof_bytes: payload.proof,
            public_signals,
        })
    }
}

impl Proof {
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}
