//! Ed25519 keys and the signing provider built on them.
//!
//! Operator addresses are the 32 raw bytes of the operator's verification key,
//! so a signature can be checked from the sender's address alone.

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

use core::fmt;

use ibft_core_types::{Address, Context, SigningProvider};

pub use ed25519_consensus::Error;

/// An Ed25519 signature.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature([u8; 64]);

impl Signature {
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(&self) -> [u8; 64] {
        self.0
    }

    fn inner(&self) -> ed25519_consensus::Signature {
        ed25519_consensus::Signature::from(self.0)
    }
}

impl From<ed25519_consensus::Signature> for Signature {
    fn from(signature: ed25519_consensus::Signature) -> Self {
        Self(signature.to_bytes())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

/// An Ed25519 signing key.
#[derive(Clone)]
pub struct PrivateKey(ed25519_consensus::SigningKey);

impl PrivateKey {
    #[cfg(feature = "rand")]
    pub fn generate<R>(rng: R) -> Self
    where
        R: rand::RngCore + rand::CryptoRng,
    {
        Self(ed25519_consensus::SigningKey::new(rng))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verification_key())
    }

    pub fn sign(&self, payload: &[u8]) -> Signature {
        Signature::from(self.0.sign(payload))
    }

    pub fn inner(&self) -> &ed25519_consensus::SigningKey {
        &self.0
    }
}

impl From<[u8; 32]> for PrivateKey {
    fn from(seed: [u8; 32]) -> Self {
        Self(ed25519_consensus::SigningKey::from(seed))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKey").field(&self.public_key()).finish()
    }
}

/// An Ed25519 verification key.
#[derive(Copy, Clone)]
pub struct PublicKey(ed25519_consensus::VerificationKey);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        ed25519_consensus::VerificationKey::try_from(bytes).map(Self)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn verify(&self, payload: &[u8], signature: &Signature) -> bool {
        self.0.verify(&signature.inner(), payload).is_ok()
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(")?;
        for byte in &self.to_bytes()[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

/// Signs with the local operator's key, verifies against the key encoded in the sender's address.
#[derive(Clone, Debug)]
pub struct Ed25519Provider {
    private_key: PrivateKey,
}

impl Ed25519Provider {
    pub fn new(private_key: PrivateKey) -> Self {
        Self { private_key }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }
}

impl<Ctx> SigningProvider<Ctx> for Ed25519Provider
where
    Ctx: Context<Signature = Signature>,
{
    fn sign(&self, payload: &[u8]) -> Signature {
        self.private_key.sign(payload)
    }

    fn verify(&self, sender: &Ctx::Address, payload: &[u8], signature: &Signature) -> bool {
        PublicKey::from_bytes(sender.as_bytes())
            .map(|public_key| public_key.verify(payload, signature))
            .unwrap_or(false)
    }
}
