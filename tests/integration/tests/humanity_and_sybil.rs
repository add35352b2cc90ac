//! Integration test: humanity, anti-sybil and reputation proofs.

use veridicus_core::{CircuitId, FieldElement};
use veridicus_identity::{
    scope_field, IdentityManager, NullifierRegistry, ReputationLedger, FIXED_ONE,
};
use veridicus_integration_tests::{artifacts, service};
use veridicus_proof::inputs::agent_did_hash;
use veridicus_proof::{
    AntiSybilInputs, HumanityInputs, LivenessEvidence, ProofError, ReputationInputs,
};

const NOW: u64 = 1_750_000_000;

fn evidence(timestamp: u64) -> LivenessEvidence {
    LivenessEvidence {
        nonce: FieldElement::from_u64(91),
        passed: true,
        biometric_hash: FieldElement::from_u64(92),
        credential_hash: FieldElement::from_u64(93),
        timestamp,
    }
}

// =========================================================================
// Humanity
// =========================================================================

#[tokio::test]
async fn test_humanity_fresh_evidence_proves() {
    let service = service();
    let artifacts = artifacts(CircuitId::Humanity, "1");
    let identity = IdentityManager::create(Some(b"human")).unwrap();
    let scope = scope_field("airdrop-2024");
    let external = FieldElement::from_u64(7);

    let inputs = HumanityInputs::new(&identity, &evidence(NOW - 60), scope, external, 3_600, NOW);
    let proof = service.prove_inputs(&inputs, &artifacts).await.unwrap();
    let verified = service
        .verify_outputs(&proof, &proof.public_signals, &artifacts.verification_key)
        .await
        .unwrap();
    assert!(verified.valid);
    assert_eq!(
        verified.outputs["nullifierHash"],
        identity.nullifier(scope, &[external]).unwrap()
    );
    assert_eq!(
        verified.outputs["timestampOut"],
        FieldElement::from_u64(NOW - 60)
    );
    assert_eq!(verified.outputs["scopeOut"], scope);
}

#[tokio::test]
async fn test_humanity_stale_future_or_failed_evidence_rejected() {
    let service = service();
    let artifacts = artifacts(CircuitId::Humanity, "1");
    let identity = IdentityManager::create(Some(b"human")).unwrap();
    let scope = scope_field("airdrop-2024");
    let external = FieldElement::from_u64(7);

    // elapsed == maxAge is already too old.
    let stale = HumanityInputs::new(&identity, &evidence(NOW - 3_600), scope, external, 3_600, NOW);
    // Evidence from the future.
    let future = HumanityInputs::new(&identity, &evidence(NOW + 1), scope, external, 3_600, NOW);
    let mut failed_evidence = evidence(NOW - 10);
    failed_evidence.passed = false;
    let failed = HumanityInputs::new(&identity, &failed_evidence, scope, external, 3_600, NOW);

    for inputs in [stale, future, failed] {
        assert!(matches!(
            service.prove_inputs(&inputs, &artifacts).await,
            Err(ProofError::WitnessUnsatisfiable {
                circuit: CircuitId::Humanity,
                ..
            })
        ));
    }
}

#[tokio::test]
async fn test_humanity_wrong_commitment_rejected() {
    let service = service();
    let artifacts = artifacts(CircuitId::Humanity, "1");
    let identity = IdentityManager::create(Some(b"human")).unwrap();
    let other = IdentityManager::create(Some(b"someone else")).unwrap();

    let mut inputs = HumanityInputs::new(
        &identity,
        &evidence(NOW - 5),
        scope_field("s"),
        FieldElement::from_u64(1),
        3_600,
        NOW,
    );
    inputs.identity_commitment = other.commitment();
    let err = service.prove_inputs(&inputs, &artifacts).await.unwrap_err();
    match err {
        ProofError::WitnessUnsatisfiable { constraint, .. } => {
            assert_eq!(constraint, "identity commitment matches secret");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_humanity_one_claim_per_scope() {
    let service = service();
    let artifacts = artifacts(CircuitId::Humanity, "1");
    let registry = NullifierRegistry::new();
    let vk = &artifacts.verification_key;
    let identity = IdentityManager::create(Some(b"human")).unwrap();
    let scope = scope_field("airdrop-2024");
    let external = FieldElement::from_u64(7);

    let first = HumanityInputs::new(&identity, &evidence(NOW - 60), scope, external, 3_600, NOW);
    let proof = service.prove_inputs(&first, &artifacts).await.unwrap();
    service
        .accept(&proof, &proof.public_signals, vk, &registry, "airdrop-2024", "nullifierHash")
        .await
        .unwrap();

    // New liveness evidence does not change the nullifier.
    let second = HumanityInputs::new(&identity, &evidence(NOW - 5), scope, external, 3_600, NOW);
    let proof = service.prove_inputs(&second, &artifacts).await.unwrap();
    assert!(matches!(
        service
            .accept(&proof, &proof.public_signals, vk, &registry, "airdrop-2024", "nullifierHash")
            .await,
        Err(ProofError::ReplayDetected { .. })
    ));
    assert_eq!(registry.scope_len("airdrop-2024"), 1);
}

// =========================================================================
// Anti-sybil
// =========================================================================

#[tokio::test]
async fn test_anti_sybil_epoch_nullifiers() {
    let service = service();
    let artifacts = artifacts(CircuitId::AntiSybil, "1");
    let registry = NullifierRegistry::new();
    let vk = &artifacts.verification_key;
    let identity = IdentityManager::create(Some(b"voter")).unwrap();

    let vote = |epoch: u64, action: u64| {
        AntiSybilInputs::for_identity(&identity, epoch, FieldElement::from_u64(action))
    };

    // Two actions in the same epoch share the epoch nullifier.
    let a = service.prove_inputs(&vote(1, 10), &artifacts).await.unwrap();
    let b = service.prove_inputs(&vote(1, 11), &artifacts).await.unwrap();
    assert_eq!(a.public_signals[0], identity.commitment());
    assert_eq!(a.public_signals[1], b.public_signals[1]);
    assert_ne!(a.public_signals[2], b.public_signals[2]);

    service
        .accept(&a, &a.public_signals, vk, &registry, "epoch-votes", "epochNullifier")
        .await
        .unwrap();
    assert!(matches!(
        service
            .accept(&b, &b.public_signals, vk, &registry, "epoch-votes", "epochNullifier")
            .await,
        Err(ProofError::ReplayDetected { .. })
    ));

    // Per-action scope still accepts the second action.
    service
        .accept(&b, &b.public_signals, vk, &registry, "actions", "actionNullifier")
        .await
        .unwrap();

    // Next epoch is fresh.
    let c = service.prove_inputs(&vote(2, 10), &artifacts).await.unwrap();
    service
        .accept(&c, &c.public_signals, vk, &registry, "epoch-votes", "epochNullifier")
        .await
        .unwrap();
    assert_eq!(registry.scope_len("epoch-votes"), 2);
}

#[tokio::test]
async fn test_tampered_proof_consumes_nothing() {
    let service = service();
    let artifacts = artifacts(CircuitId::AntiSybil, "1");
    let registry = NullifierRegistry::new();
    let identity = IdentityManager::create(Some(b"voter")).unwrap();

    let proof = service
        .prove_inputs(
            &AntiSybilInputs::for_identity(&identity, 1, FieldElement::from_u64(1)),
            &artifacts,
        )
        .await
        .unwrap();
    let mut signals = proof.public_signals.clone();
    signals[1] = FieldElement::from_u64(12345);

    let verified = service
        .accept(
            &proof,
            &signals,
            &artifacts.verification_key,
            &registry,
            "epoch-votes",
            "epochNullifier",
        )
        .await
        .unwrap();
    assert!(!verified.valid);
    assert!(verified.outputs.is_empty());
    assert!(registry.is_empty());
}

// =========================================================================
// Reputation
// =========================================================================

#[tokio::test]
async fn test_reputation_ledger_to_proof() {
    let service = service();
    let artifacts = artifacts(CircuitId::Reputation, "1");
    let ledger = ReputationLedger::new();
    let agent = "did:veridicus:agent-7";

    ledger.register(agent).unwrap();
    for _ in 0..4 {
        ledger.record_interaction(agent, true, 2 * FIXED_ONE).unwrap();
    }
    ledger.record_interaction(agent, false, FIXED_ONE / 2).unwrap();
    // 50 + 4 * 10 - 5
    assert_eq!(ledger.get(agent).unwrap().points(), 85);

    let inputs = ReputationInputs {
        witness: ledger.witness_for(agent, FieldElement::from_u64(31337)).unwrap(),
        threshold: 75,
        agent_did_hash: agent_did_hash(agent),
        timestamp: NOW,
    };
    let proof = service.prove_inputs(&inputs, &artifacts).await.unwrap();
    let verified = service
        .verify_outputs(&proof, &proof.public_signals, &artifacts.verification_key)
        .await
        .unwrap();
    assert!(verified.valid);
    assert_eq!(verified.outputs["verified"], FieldElement::one());

    // The threshold the verifier sees is the one the prover used.
    let threshold_at = proof.public_signals.len() - 3;
    assert_eq!(proof.public_signals[threshold_at], FieldElement::from_u64(75));

    let mut too_high = inputs.clone();
    too_high.threshold = 86;
    assert!(matches!(
        service.prove_inputs(&too_high, &artifacts).await,
        Err(ProofError::WitnessUnsatisfiable { .. })
    ));
}
