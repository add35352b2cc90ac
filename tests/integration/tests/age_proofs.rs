//! Integration test: age and identity-bound age proofs through the service.

use chrono::{TimeZone, Utc};
use veridicus_core::{CircuitId, FieldElement, Proof};
use veridicus_identity::NullifierRegistry;
use veridicus_integration_tests::{artifacts, service};
use veridicus_proof::{AgeInputs, AgeLevel3Inputs, ProofError, SECONDS_PER_YEAR};

const REFERENCE: u64 = 3_900_000_000;

fn age_inputs(birth_ts: u64, min_age: u8) -> AgeInputs {
    AgeInputs {
        birth_ts,
        salt: FieldElement::from_u64(424242),
        reference_ts: REFERENCE,
        min_age,
        document_hash: FieldElement::from_u64(1001),
    }
}

// =========================================================================
// Age
// =========================================================================

#[tokio::test]
async fn test_age_boundary_exact_passes_one_second_short_fails() {
    let service = service();
    let artifacts = artifacts(CircuitId::Age, "1");
    let exactly = REFERENCE - 18 * SECONDS_PER_YEAR;

    let proof = service
        .prove_inputs(&age_inputs(exactly, 18), &artifacts)
        .await
        .unwrap();
    let verified = service
        .verify_outputs(&proof, &proof.public_signals, &artifacts.verification_key)
        .await
        .unwrap();
    assert!(verified.valid);
    assert_eq!(verified.outputs["verified"], FieldElement::one());

    let err = service
        .prove_inputs(&age_inputs(exactly + 1, 18), &artifacts)
        .await
        .unwrap_err();
    assert!(matches!(err, ProofError::WitnessUnsatisfiable { .. }));
}

#[tokio::test]
async fn test_age_from_calendar_dates() {
    let service = service();
    let artifacts = artifacts(CircuitId::Age, "1");
    let inputs = AgeInputs::from_dates(
        Utc.with_ymd_and_hms(1948, 7, 4, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 7, 4, 0, 0, 0).unwrap(),
        75,
        FieldElement::from_u64(3),
        FieldElement::from_u64(4),
    )
    .unwrap();
    let proof = service.prove_inputs(&inputs, &artifacts).await.unwrap();
    assert!(service
        .verify(&proof, &proof.public_signals, &artifacts.verification_key)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_age_proof_survives_wire_format() {
    let service = service();
    let artifacts = artifacts(CircuitId::Age, "1");
    let proof = service
        .prove_inputs(&age_inputs(REFERENCE - 40 * SECONDS_PER_YEAR, 21), &artifacts)
        .await
        .unwrap();

    let json = proof.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["circuit"], "age");
    assert_eq!(value["publicSignals"][0], "1");
    assert_eq!(value["publicSignals"][3], "21");

    let decoded = Proof::from_json(&json).unwrap();
    assert_eq!(decoded, proof);
    assert!(service
        .verify(&decoded, &decoded.public_signals, &artifacts.verification_key)
        .await
        .unwrap());
}

// =========================================================================
// Age level 3 (replay protected)
// =========================================================================

#[tokio::test]
async fn test_age_level3_replay_rejected() {
    let service = service();
    let artifacts = artifacts(CircuitId::AgeLevel3, "1");
    let registry = NullifierRegistry::new();
    let vk = &artifacts.verification_key;

    let inputs = AgeLevel3Inputs {
        birth_ts: REFERENCE - 25 * SECONDS_PER_YEAR,
        salt: FieldElement::from_u64(8),
        reference_ts: REFERENCE,
        min_age: 21,
        user_id: FieldElement::from_u64(555),
        document_hash: FieldElement::from_u64(1001),
    };
    let proof = service.prove_inputs(&inputs, &artifacts).await.unwrap();

    let first = service
        .accept(&proof, &proof.public_signals, vk, &registry, "bar-entry", "nullifier")
        .await
        .unwrap();
    assert!(first.valid);

    // A fresh proof from the same witness carries the same nullifier.
    let again = service.prove_inputs(&inputs, &artifacts).await.unwrap();
    assert!(matches!(
        service
            .accept(&again, &again.public_signals, vk, &registry, "bar-entry", "nullifier")
            .await,
        Err(ProofError::ReplayDetected { .. })
    ));

    // A different scope is independent.
    let other = service
        .accept(&again, &again.public_signals, vk, &registry, "online-store", "nullifier")
        .await
        .unwrap();
    assert!(other.valid);
}
