use std::fmt;

use crate::error::CoreError;

/// The states of a single proof request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum ProofState {
    /// Witness accepted, nothing computed yet.
    Unproven,
    /// The backend is producing the proof.
    Proving,
    /// A proof exists and awaits verification.
    Proved,
    /// Proving failed (unsatisfiable witness, missing artifact, backend error). Final state.
    Failed,
    /// The proof verified against its key and public signals. Final state.
    Verified,
    /// The proof did not verify. Final state.
    Rejected,
}

impl ProofState {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Failed | Self::Verified | Self::Rejected)
    }
}

impl fmt::Display for ProofState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unproven => write!(f, "Unproven"),
            Self::Proving => write!(f, "Proving"),
            Self::Proved => write!(f, "Proved"),
            Self::Failed => write!(f, "Failed"),
            Self::Verified => write!(f, "Verified"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Events that drive proof state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofEvent {
    /// Hand the witness to the proving backend.
    Start,
    /// The backend returned a proof.
    Succeed,
    /// Proving aborted.
    Fail,
    /// Verification passed.
    Accept,
    /// Verification failed.
    Reject,
}

/// Proof lifecycle transitions.
///
/// Valid transitions:
/// - Unproven → Proving (Start)
/// - Proving → Proved (Succeed)
/// - Proving → Failed (Fail)
/// - Proved → Verified (Accept)
/// - Proved → Rejected (Reject)
pub struct ProofStateMachine;

impl ProofStateMachine {
    /// Attempt a state transition based on an event.
    pub fn transition(current: ProofState, event: ProofEvent) -> Result<ProofState, CoreError> {
        let new_state = match (current, event) {
            (ProofState::Unproven, ProofEvent::Start) => ProofState::Proving,
            (ProofState::Proving, ProofEvent::Succeed) => ProofState::Proved,
            (ProofState::Proving, ProofEvent::Fail) => ProofState::Failed,
            (ProofState::Proved, ProofEvent::Accept) => ProofState::Verified,
            (ProofState::Proved, ProofEvent::Reject) => ProofState::Rejected,
            _ => {
                let target = match event {
                    ProofEvent::Start => ProofState::Proving,
                    ProofEvent::Succeed => ProofState::Proved,
                    ProofEvent::Fail => ProofState::Failed,
                    ProofEvent::Accept => ProofState::Verified,
                    ProofEvent::Reject => ProofState::Rejected,
                };
                return Err(CoreError::InvalidStateTransition {
                    from: current,
                    to: target,
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %new_state,
            event = ?event,
            "proof state transition"
        );

        Ok(new_state)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: ProofState, event: ProofEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
