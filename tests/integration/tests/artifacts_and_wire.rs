//! Integration test: artifact storage, proof wire format and state export.

use std::sync::Arc;

use veridicus_core::config::VeridicusConfig;
use veridicus_core::{CircuitId, FieldElement, Proof};
use veridicus_identity::{IdentityManager, NullifierExport, NullifierRegistry};
use veridicus_integration_tests::{artifacts, params, service, temp_dir, TEST_DEPTH};
use veridicus_proof::{
    AntiSybilInputs, ArtifactStore, FsArtifactStore, ProofError, ProofService, TranscriptBackend,
};

// =========================================================================
// Artifacts on disk
// =========================================================================

#[tokio::test]
async fn test_setup_store_load_prove() {
    let root = temp_dir("veridicus-it-artifacts");
    let mut config = VeridicusConfig::default();
    config.group.tree_depth = TEST_DEPTH;
    config.artifacts.dir = root.clone();
    config.artifacts.required = vec![CircuitId::AntiSybil, CircuitId::Authenticity];

    let backend = TranscriptBackend::new();
    let store = FsArtifactStore::new(&config.artifacts.dir);
    for circuit in &config.artifacts.required {
        let set = backend
            .setup(*circuit, &config.artifacts.version, &params())
            .unwrap();
        store.store(&set).await.unwrap();
    }

    let ready = store
        .ensure_ready(&config.artifacts.required, &config.artifacts.version)
        .await
        .unwrap();
    assert_eq!(ready.len(), 2);

    let service = ProofService::from_config(Arc::new(backend), &config).unwrap();
    let loaded = store
        .load(CircuitId::AntiSybil, &config.artifacts.version)
        .await
        .unwrap();
    let identity = IdentityManager::create(Some(b"disk")).unwrap();
    let proof = service
        .prove_inputs(
            &AntiSybilInputs::for_identity(&identity, 3, FieldElement::from_u64(4)),
            &loaded,
        )
        .await
        .unwrap();

    // A verifier only needs the verification key.
    let vk = store
        .load_verification_key(CircuitId::AntiSybil, &config.artifacts.version)
        .await
        .unwrap();
    assert_eq!(vk.fingerprint(), ready[&CircuitId::AntiSybil]);
    assert!(service
        .verify(&proof, &proof.public_signals, &vk)
        .await
        .unwrap());

    assert!(matches!(
        store.ensure_ready(&[CircuitId::Humanity], &config.artifacts.version).await,
        Err(ProofError::ArtifactMissing(_))
    ));
    std::fs::remove_dir_all(&root).ok();
}

#[tokio::test]
async fn test_proving_with_wrong_circuit_artifacts_fails() {
    let service = service();
    let identity = IdentityManager::create(Some(b"mixup")).unwrap();
    let inputs = AntiSybilInputs::for_identity(&identity, 1, FieldElement::from_u64(1));
    assert!(matches!(
        service
            .prove_inputs(&inputs, &artifacts(CircuitId::Age, "1"))
            .await,
        Err(ProofError::ArtifactMismatch { .. })
    ));
}

// =========================================================================
// Verification request checks
// =========================================================================

#[tokio::test]
async fn test_verify_request_errors() {
    let service = service();
    let v1 = artifacts(CircuitId::AntiSybil, "1");
    let v2 = artifacts(CircuitId::AntiSybil, "2");
    let identity = IdentityManager::create(Some(b"versions")).unwrap();
    let proof = service
        .prove_inputs(
            &AntiSybilInputs::for_identity(&identity, 1, FieldElement::from_u64(1)),
            &v1,
        )
        .await
        .unwrap();

    assert!(matches!(
        service
            .verify(&proof, &proof.public_signals, &v2.verification_key)
            .await,
        Err(ProofError::ArtifactMismatch { .. })
    ));
    assert!(matches!(
        service
            .verify(&proof, &proof.public_signals[..2], &v1.verification_key)
            .await,
        Err(ProofError::InvalidInput(_))
    ));

    // Same header, different key material: simply invalid.
    let reminted = artifacts(CircuitId::AntiSybil, "1");
    assert!(!service
        .verify(&proof, &proof.public_signals, &reminted.verification_key)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_wire_proof_with_corrupted_bytes_is_invalid() {
    let service = service();
    let artifacts = artifacts(CircuitId::AntiSybil, "1");
    let identity = IdentityManager::create(Some(b"wire")).unwrap();
    let proof = service
        .prove_inputs(
            &AntiSybilInputs::for_identity(&identity, 9, FieldElement::from_u64(9)),
            &artifacts,
        )
        .await
        .unwrap();

    let mut value: serde_json::Value = serde_json::from_str(&proof.to_json().unwrap()).unwrap();
    assert!(value["proof"].is_string());
    assert_eq!(value["publicSignals"].as_array().unwrap().len(), 3);
    value["proof"] = serde_json::Value::String("AAAA".into());

    let corrupted = Proof::from_json(&value.to_string()).unwrap();
    assert!(!service
        .verify(&corrupted, &corrupted.public_signals, &artifacts.verification_key)
        .await
        .unwrap());

    value["publicSignals"][0] = serde_json::Value::String("not a number".into());
    assert!(Proof::from_json(&value.to_string()).is_err());
}

// =========================================================================
// Registry persistence
// =========================================================================

#[tokio::test]
async fn test_registry_export_keeps_replay_protection() {
    let service = service();
    let artifacts = artifacts(CircuitId::AntiSybil, "1");
    let vk = &artifacts.verification_key;
    let identity = IdentityManager::create(Some(b"persist")).unwrap();
    let proof = service
        .prove_inputs(
            &AntiSybilInputs::for_identity(&identity, 5, FieldElement::from_u64(5)),
            &artifacts,
        )
        .await
        .unwrap();

    let registry = NullifierRegistry::new();
    service
        .accept(&proof, &proof.public_signals, vk, &registry, "poll", "actionNullifier")
        .await
        .unwrap();

    let json = serde_json::to_string(&registry.export()).unwrap();
    let export: NullifierExport = serde_json::from_str(&json).unwrap();
    let restored = NullifierRegistry::import(&export).unwrap();
    assert!(restored.is_used(&proof.public_signals[2], "poll"));

    assert!(matches!(
        service
            .accept(&proof, &proof.public_signals, vk, &restored, "poll", "actionNullifier")
            .await,
        Err(ProofError::ReplayDetected { .. })
    ));
}
