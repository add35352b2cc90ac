//! Integration test: identity → group → authenticity proof → removal.
//!
//! Exercises veridicus-identity and veridicus-proof together through the
//! proof service.

use veridicus_core::{CircuitId, FieldElement};
use veridicus_identity::{GroupExport, GroupStore, IdentityError, IdentityManager};
use veridicus_integration_tests::{artifacts, service, TEST_DEPTH};
use veridicus_proof::{AuthenticityInputs, CircuitInputs, ProofError};

// =========================================================================
// End-to-end membership
// =========================================================================

#[tokio::test]
async fn test_member_proves_then_removal_invalidates() {
    let service = service();
    let artifacts = artifacts(CircuitId::Authenticity, "1");
    let vk = &artifacts.verification_key;

    let group = GroupStore::new(TEST_DEPTH).unwrap();
    let alice = IdentityManager::create(Some(b"alice")).unwrap();
    let bob = IdentityManager::create(Some(b"bob")).unwrap();
    group.add_member(alice.commitment()).unwrap();
    group.add_member(bob.commitment()).unwrap();

    // Prove membership under the current root.
    let path = group.path_for(&alice.commitment()).unwrap();
    let inputs = AuthenticityInputs::from_path(alice.commitment(), path.clone(), group.root());
    let proof = service.prove_inputs(&inputs, &artifacts).await.unwrap();
    assert_eq!(proof.public_signals, vec![group.root()]);
    assert!(service
        .verify(&proof, &proof.public_signals, vk)
        .await
        .unwrap());

    // Remove alice; the verifier now checks against the new root.
    let old_root = group.root();
    group.remove_member(&alice.commitment()).unwrap();
    let new_root = group.root();
    assert_ne!(old_root, new_root);
    assert!(!service.verify(&proof, &[new_root], vk).await.unwrap());

    // A stale path cannot produce a proof for the new root.
    let stale = AuthenticityInputs::from_path(alice.commitment(), path, new_root);
    assert!(matches!(
        service.prove_inputs(&stale, &artifacts).await,
        Err(ProofError::WitnessUnsatisfiable {
            circuit: CircuitId::Authenticity,
            ..
        })
    ));
    assert!(matches!(
        group.path_for(&alice.commitment()),
        Err(IdentityError::NotFound(_))
    ));

    // Bob is unaffected.
    let bob_path = group.path_for(&bob.commitment()).unwrap();
    let bob_inputs = AuthenticityInputs::from_path(bob.commitment(), bob_path, new_root);
    let bob_proof = service.prove_inputs(&bob_inputs, &artifacts).await.unwrap();
    assert!(service
        .verify(&bob_proof, &[new_root], vk)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_non_member_cannot_prove() {
    let service = service();
    let artifacts = artifacts(CircuitId::Authenticity, "1");

    let group = GroupStore::new(TEST_DEPTH).unwrap();
    let member = IdentityManager::create(Some(b"member")).unwrap();
    let outsider = IdentityManager::create(Some(b"outsider")).unwrap();
    group.add_member(member.commitment()).unwrap();

    // Borrow the member's path for the outsider's leaf.
    let path = group.path_for(&member.commitment()).unwrap();
    let inputs = AuthenticityInputs::from_path(outsider.commitment(), path, group.root());
    assert!(matches!(
        service.prove_inputs(&inputs, &artifacts).await,
        Err(ProofError::WitnessUnsatisfiable { .. })
    ));
}

// =========================================================================
// Group store properties
// =========================================================================

#[test]
fn test_every_member_path_reaches_root() {
    let group = GroupStore::new(TEST_DEPTH).unwrap();
    let members: Vec<FieldElement> = (0..40u32)
        .map(|i| IdentityManager::create(Some(&i.to_le_bytes())).unwrap().commitment())
        .collect();
    for m in &members {
        group.add_member(*m).unwrap();
    }
    for i in (0..40).step_by(3) {
        group.remove_member(&members[i]).unwrap();
    }

    let root = group.root();
    for (i, m) in members.iter().enumerate() {
        if i % 3 == 0 {
            assert!(group.path_for(m).is_err());
        } else {
            assert!(group.path_for(m).unwrap().verify(*m, root));
        }
    }
}

#[test]
fn test_group_export_survives_json() {
    let group = GroupStore::new(TEST_DEPTH).unwrap();
    for seed in [b"a", b"b", b"c"] {
        group
            .add_member(IdentityManager::create(Some(seed)).unwrap().commitment())
            .unwrap();
    }
    group
        .remove_member(&IdentityManager::create(Some(b"b")).unwrap().commitment())
        .unwrap();

    let json = serde_json::to_string(&group.export()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["leaves"][1], "0");

    let export: GroupExport = serde_json::from_str(&json).unwrap();
    let restored = GroupStore::from_export(&export).unwrap();
    assert_eq!(restored.snapshot(), group.snapshot());
}

#[test]
fn test_identity_roundtrip_keeps_membership() {
    let group = GroupStore::new(TEST_DEPTH).unwrap();
    let identity = IdentityManager::create(None).unwrap();
    group.add_member(identity.commitment()).unwrap();

    let recovered = IdentityManager::recover(&identity.export_secret()).unwrap();
    assert!(group.contains(&recovered.commitment()));
    let inputs = AuthenticityInputs::from_path(
        recovered.commitment(),
        group.path_for(&recovered.commitment()).unwrap(),
        group.root(),
    );
    assert_eq!(inputs.private_signals().len(), 1 + 2 * TEST_DEPTH);
}
