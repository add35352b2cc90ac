use veridicus_core::FieldElement;

/// Derive a non-zero field scalar from key material with BLAKE3 `derive_key`.
///
/// The 32-byte output is reduced mod r. A zero result (probability ~2^-254)
/// is re-derived with an appended counter so callers never get the sentinel.
pub fn derive_scalar(context: &str, material: &[u8]) -> FieldElement {
    let mut counter: u32 = 0;
    loop {
        let mut input = Vec::with_capacity(material.len() + 4);
        input.extend_from_slice(material);
        if counter > 0 {
            input.extend_from_slice(&counter.to_le_bytes());
        }
        let okm = blake3::derive_key(context, &input);
        let scalar = FieldElement::from_be_bytes_mod_order(&okm);
        if !scalar.is_zero() {
            return scalar;
        }
        counter += 1;
    }
}
