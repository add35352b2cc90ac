//! Circomlib-compatible Poseidon over the BN254 scalar field.
//!
//! Parameters are the circom ones (`x^5` S-box, 8 full rounds, width-dependent
//! partial rounds), so every commitment computed here matches the value the
//! circuits compute for the same inputs.

use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher};

use veridicus_core::FieldElement;

use crate::error::CryptoError;

/// Largest number of inputs a single Poseidon call accepts.
pub const MAX_ARITY: usize = 12;

/// Hash `1..=MAX_ARITY` field elements.
pub fn try_hash(inputs: &[FieldElement]) -> Result<FieldElement, CryptoError> {
    if inputs.is_empty() || inputs.len() > MAX_ARITY {
        return Err(CryptoError::InvalidArity {
            actual: inputs.len(),
            max: MAX_ARITY,
        });
    }

    let mut hasher =
        Poseidon::<Fr>::new_circom(inputs.len()).map_err(|e| CryptoError::Hash(e.to_string()))?;
    let elements: Vec<Fr> = inputs.iter().map(FieldElement::inner).collect();
    let digest = hasher
        .hash(&elements)
        .map_err(|e| CryptoError::Hash(e.to_string()))?;
    Ok(FieldElement::from(digest))
}

/// Hash a fixed-arity input.
///
/// # Panics
///
/// Panics when `inputs` is empty or longer than [`MAX_ARITY`]. Arity is fixed
/// at every call site, so a wrong length is a programming error.
pub fn hash(inputs: &[FieldElement]) -> FieldElement {
    match try_hash(inputs) {
        Ok(digest) => digest,
        Err(e) => panic!("poseidon contract violation: {}", e),
    }
}

/// Merkle node hash: `Poseidon(left, right)`.
pub fn hash_pair(left: FieldElement, right: FieldElement) -> FieldElement {
    hash(&[left, right])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    #[test]
    fn test_circomlib_vector() {
        let expected: FieldElement =
            "7853200120776062878684798364095072458815029376092732009249414926327459813530"
                .parse()
                .unwrap();
        assert_eq!(hash(&[fe(1), fe(2)]), expected);
    }

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash(&[fe(42)]), hash(&[fe(42)]));
    }

    #[test]
    fn test_arity_changes_digest() {
        // Zero padding must not collide with a shorter input.
        assert_ne!(hash(&[fe(5)]), hash(&[fe(5), FieldElement::zero()]));
    }

    #[test]
    fn test_order_matters() {
        assert_ne!(hash_pair(fe(1), fe(2)), hash_pair(fe(2), fe(1)));
    }

    #[test]
    fn test_try_hash_rejects_bad_arity() {
        assert!(matches!(
            try_hash(&[]),
            Err(CryptoError::InvalidArity { actual: 0, .. })
        ));
        let too_many = vec![fe(1); MAX_ARITY + 1];
        assert!(try_hash(&too_many).is_err());
        assert!(try_hash(&vec![fe(1); MAX_ARITY]).is_ok());
    }

    #[test]
    #[should_panic(expected = "poseidon contract violation")]
    fn test_hash_panics_on_empty() {
        hash(&[]);
    }
}
