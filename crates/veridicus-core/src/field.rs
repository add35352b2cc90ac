//! BN254 scalar-field element used by every commitment, nullifier and circuit signal.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;
use std::sync::OnceLock;

use ark_bn254::Fr;
use ark_ff::{BigInteger, One, PrimeField, Zero};
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use crate::error::CoreError;

/// Size of a canonical big-endian encoding.
pub const FIELD_BYTES: usize = 32;

/// Largest bit width a comparison gadget can safely decompose (BN254 has 254-bit modulus).
pub const MAX_COMPARISON_BITS: u32 = 252;

/// An element of the BN254 scalar field, always in canonical form.
///
/// Text parsing is strict: decimal or `0x`-hex strings that encode a value
/// `>= r` are rejected rather than reduced. Byte input goes through
/// [`FieldElement::from_be_bytes_mod_order`], which reduces explicitly.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement(Fr);

impl FieldElement {
    pub fn zero() -> Self {
        Self(Fr::zero())
    }

    pub fn one() -> Self {
        Self(Fr::one())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    /// Reduce arbitrary big-endian bytes modulo the field prime.
    pub fn from_be_bytes_mod_order(bytes: &[u8]) -> Self {
        Self(Fr::from_be_bytes_mod_order(bytes))
    }

    /// Build from an integer, rejecting values that are not canonical.
    pub fn from_biguint(value: &BigUint) -> Result<Self, CoreError> {
        if value >= modulus() {
            return Err(CoreError::InvalidFieldElement(format!(
                "value {} is not below the field modulus",
                value
            )));
        }
        Ok(Self(Fr::from_be_bytes_mod_order(&value.to_bytes_be())))
    }

    /// Canonical 32-byte big-endian encoding.
    pub fn to_be_bytes(&self) -> [u8; FIELD_BYTES] {
        let raw = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; FIELD_BYTES];
        out[FIELD_BYTES - raw.len()..].copy_from_slice(&raw);
        out
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.to_be_bytes())
    }

    pub fn to_decimal(&self) -> String {
        self.to_biguint().to_string()
    }

    /// `0x`-prefixed, zero-padded 64 hex chars.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_be_bytes()))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whether the canonical integer representative is below `2^bits`.
    pub fn fits_in_bits(&self, bits: u32) -> bool {
        self.to_biguint().bits() <= u64::from(bits)
    }

    /// The underlying arkworks element.
    pub fn inner(&self) -> Fr {
        self.0
    }
}

/// The BN254 scalar-field modulus `r`.
pub fn modulus() -> &'static BigUint {
    static MODULUS: OnceLock<BigUint> = OnceLock::new();
    MODULUS.get_or_init(|| BigUint::from_bytes_be(&Fr::MODULUS.to_bytes_be()))
}

impl From<Fr> for FieldElement {
    fn from(value: Fr) -> Self {
        Self(value)
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<bool> for FieldElement {
    fn from(value: bool) -> Self {
        if value {
            Self::one()
        } else {
            Self::zero()
        }
    }
}

impl Add for FieldElement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for FieldElement {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul for FieldElement {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl Neg for FieldElement {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Zeroize for FieldElement {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl FromStr for FieldElement {
    type Err = CoreError;

    /// Parse a decimal string or a `0x`-prefixed hex string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = if let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(CoreError::InvalidFieldElement(format!("invalid hex: {:?}", s)));
            }
            BigUint::parse_bytes(digits.as_bytes(), 16)
        } else {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(CoreError::InvalidFieldElement(format!(
                    "invalid decimal: {:?}",
                    s
                )));
            }
            BigUint::parse_bytes(s.as_bytes(), 10)
        };

        let value =
            parsed.ok_or_else(|| CoreError::InvalidFieldElement(format!("unparsable: {:?}", s)))?;
        Self::from_biguint(&value)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_decimal())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
