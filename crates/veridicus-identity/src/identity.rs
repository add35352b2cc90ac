use std::fmt;

use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use veridicus_core::FieldElement;
use veridicus_crypto::{derive_scalar, poseidon};

use crate::error::IdentityError;

/// KDF context for identity secrets. Changing it changes every identity.
pub const IDENTITY_SECRET_CONTEXT: &str = "veridicus 2024 identity secret";
const LINKED_IDENTITY_CONTEXT: &str = "veridicus 2024 linked identity";
const SCOPE_CONTEXT: &str = "veridicus 2024 nullifier scope";
const ENTROPY_BYTES: usize = 32;

/// A holder identity: a secret scalar and its public Poseidon commitment.
///
/// The secret never leaves the holder except through [`Identity::export_secret`].
/// It is wiped from memory when the identity is dropped.
#[derive(Clone)]
pub struct Identity {
    secret: FieldElement,
    commitment: FieldElement,
}

impl Identity {
    /// Rebuild an identity from its secret scalar.
    pub fn from_secret(secret: FieldElement) -> Result<Self, IdentityError> {
        if secret.is_zero() {
            return Err(IdentityError::InvalidSecret(
                "secret scalar must be non-zero".into(),
            ));
        }
        Ok(Self {
            commitment: poseidon::hash(&[secret]),
            secret,
        })
    }

    /// `Poseidon(secret)`, the value published in groups.
    pub fn commitment(&self) -> FieldElement {
        self.commitment
    }

    /// The secret scalar, for witness assembly only.
    pub fn secret(&self) -> FieldElement {
        self.secret
    }

    /// Secret as `0x`-prefixed big-endian hex, accepted by [`IdentityManager::recover`].
    pub fn export_secret(&self) -> String {
        self.secret.to_hex()
    }

    /// `Poseidon(secret, scope, ...context)`.
    pub fn nullifier(
        &self,
        scope: FieldElement,
        context: &[FieldElement],
    ) -> Result<FieldElement, IdentityError> {
        let mut inputs = Vec::with_capacity(2 + context.len());
        inputs.push(self.secret);
        inputs.push(scope);
        inputs.extend_from_slice(context);
        Ok(poseidon::try_hash(&inputs)?)
    }
}

impl Drop for Identity {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("secret", &"<redacted>")
            .field("commitment", &self.commitment)
            .finish()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.commitment == other.commitment
    }
}

impl Eq for Identity {}

/// Creates and recovers identities. Holds no state.
pub struct IdentityManager;

impl IdentityManager {
    /// Create an identity from caller entropy, or 32 fresh CSPRNG bytes.
    ///
    /// Caller entropy must be non-empty; an empty slice would give every
    /// caller the same identity.
    pub fn create(entropy: Option<&[u8]>) -> Result<Identity, IdentityError> {
        let secret = match entropy {
            Some([]) => {
                return Err(IdentityError::InvalidInput(
                    "identity entropy must not be empty".into(),
                ))
            }
            Some(material) => derive_scalar(IDENTITY_SECRET_CONTEXT, material),
            None => {
                let mut fresh = Zeroizing::new([0u8; ENTROPY_BYTES]);
                rand::thread_rng().fill_bytes(&mut fresh[..]);
                derive_scalar(IDENTITY_SECRET_CONTEXT, &fresh[..])
            }
        };
        let identity = Identity {
            commitment: poseidon::hash(&[secret]),
            secret,
        };
        tracing::debug!(commitment = %identity.commitment, "identity created");
        Ok(identity)
    }

    /// Recover an identity from an exported secret (decimal or `0x` hex).
    pub fn recover(exported: &str) -> Result<Identity, IdentityError> {
        let secret: FieldElement = exported
            .trim()
            .parse()
            .map_err(|e| IdentityError::InvalidSecret(format!("{}", e)))?;
        Identity::from_secret(secret)
    }

    /// Derive an identity from an externally known commitment and a salt.
    ///
    /// Anyone holding `salt` and the external commitment can recompute the
    /// secret, so the result is linkable to the external identity.
    #[deprecated(note = "linkable to the external commitment; use IdentityManager::create")]
    pub fn derive_linked(external_commitment: FieldElement, salt: &[u8]) -> Identity {
        tracing::warn!(
            external = %external_commitment,
            "deriving linked identity; it can be correlated with its source"
        );
        let mut material = Zeroizing::new(Vec::with_capacity(32 + salt.len()));
        material.extend_from_slice(&external_commitment.to_be_bytes());
        material.extend_from_slice(salt);
        let secret = derive_scalar(LINKED_IDENTITY_CONTEXT, &material[..]);
        Identity {
            commitment: poseidon::hash(&[secret]),
            secret,
        }
    }
}

/// Map a human-readable scope name (e.g. `"vote-2024"`) to a field element.
pub fn scope_field(scope: &str) -> FieldElement {
    derive_scalar(SCOPE_CONTEXT, scope.as_bytes())
}
