use std::fmt;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use veridicus_core::FieldElement;

use crate::error::IdentityError;

/// Fixed-point one: a weight of `FIXED_ONE` is 1.0, a score of `FIXED_ONE` is one point.
pub const FIXED_ONE: u32 = 10_000;
pub const INITIAL_SCORE: u32 = 50 * FIXED_ONE;
pub const MAX_SCORE: u32 = 100 * FIXED_ONE;
const POSITIVE_STEP: u32 = 5;
const NEGATIVE_STEP: u32 = 10;

/// Reputation state of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationRecord {
    /// Score in units of `1 / FIXED_ONE` points.
    pub score: u32,
    pub interactions: u64,
    pub positive: u64,
    pub negative: u64,
}

impl ReputationRecord {
    /// Score rounded down to whole points, the unit thresholds are given in.
    pub fn points(&self) -> u32 {
        self.score / FIXED_ONE
    }
}

impl Default for ReputationRecord {
    fn default() -> Self {
        Self {
            score: INITIAL_SCORE,
            interactions: 0,
            positive: 0,
            negative: 0,
        }
    }
}

/// Private inputs of the reputation circuit for one agent.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ReputationWitness {
    pub reputation_score: FieldElement,
    pub salt: FieldElement,
    pub interaction_count: FieldElement,
    pub positive_count: FieldElement,
}

impl fmt::Debug for ReputationWitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReputationWitness")
            .field("reputation_score", &"<redacted>")
            .field("salt", &"<redacted>")
            .field("interaction_count", &"<redacted>")
            .field("positive_count", &"<redacted>")
            .finish()
    }
}

/// Per-agent interaction scores in `[0, 100]` points.
///
/// Positive outcomes add `5 * weight` points, negative ones subtract
/// `10 * weight`, both saturating at the bounds. Weights are fixed-point
/// with [`FIXED_ONE`] meaning 1.0, so a weight of 0.5 adds exactly 2.5
/// points or removes exactly 5.
#[derive(Debug, Default)]
pub struct ReputationLedger {
    records: DashMap<String, ReputationRecord>,
}

impl ReputationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, agent: &str) -> Result<ReputationRecord, IdentityError> {
        use dashmap::mapref::entry::Entry;

        match self.records.entry(agent.to_string()) {
            Entry::Occupied(_) => Err(IdentityError::DuplicateAgent(agent.to_string())),
            Entry::Vacant(slot) => {
                let record = ReputationRecord::default();
                slot.insert(record);
                tracing::info!(agent, score = record.score, "agent registered");
                Ok(record)
            }
        }
    }

    pub fn get(&self, agent: &str) -> Option<ReputationRecord> {
        self.records.get(agent).map(|r| *r)
    }

    /// Apply one interaction outcome. `weight` is fixed-point, `FIXED_ONE` = 1.0.
    pub fn record_interaction(
        &self,
        agent: &str,
        positive: bool,
        weight: u32,
    ) -> Result<ReputationRecord, IdentityError> {
        let mut record = self
            .records
            .get_mut(agent)
            .ok_or_else(|| IdentityError::NotFound(format!("agent {}", agent)))?;

        record.interactions += 1;
        if positive {
            let delta = POSITIVE_STEP
                .saturating_mul(weight)
                .min(MAX_SCORE - record.score);
            record.score += delta;
            record.positive += 1;
        } else {
            let delta = NEGATIVE_STEP.saturating_mul(weight).min(record.score);
            record.score -= delta;
            record.negative += 1;
        }

        tracing::debug!(
            agent,
            positive,
            weight,
            score = record.score,
            "reputation updated"
        );
        Ok(*record)
    }

    /// Whether the score reaches `threshold` whole points.
    pub fn meets_threshold(&self, agent: &str, threshold: u32) -> Result<bool, IdentityError> {
        self.get(agent)
            .map(|r| r.points() >= threshold)
            .ok_or_else(|| IdentityError::NotFound(format!("agent {}", agent)))
    }

    /// Private half of the reputation circuit inputs for `agent`.
    ///
    /// The circuit sees whole points; for an integer threshold `t`,
    /// `floor(score) >= t` exactly when `score >= t`.
    pub fn witness_for(
        &self,
        agent: &str,
        salt: FieldElement,
    ) -> Result<ReputationWitness, IdentityError> {
        let record = self
            .get(agent)
            .ok_or_else(|| IdentityError::NotFound(format!("agent {}", agent)))?;
        Ok(ReputationWitness {
            reputation_score: FieldElement::from_u64(u64::from(record.points())),
            salt,
            interaction_count: FieldElement::from_u64(record.interactions),
            positive_count: FieldElement::from_u64(record.positive),
        })
    }
}
