use alloc::vec::Vec;
use core::fmt::{self, Debug};

use sha3::{Digest, Sha3_256};

/// Content-addressed identifier of a proposed value.
///
/// Quorum logic compares digests, never the values themselves.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueDigest([u8; 32]);

impl ValueDigest {
    /// The all-zero digest, used in signing bytes in place of an absent value.
    pub const ZERO: ValueDigest = ValueDigest([0; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Compute the SHA3-256 digest of the given bytes.
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        Self(Sha3_256::digest(bytes.as_ref()).into())
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for ValueDigest {
    fn from(bytes: [u8; 32]) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Display for ValueDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Debug for ValueDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Eight hex digits are enough to tell digests apart in logs.
        write!(f, "ValueDigest(")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// The value to agree upon, ie. the execution payload of a duty.
pub trait Value
where
    Self: Clone + Debug + PartialEq + Eq + Send + Sync + 'static,
{
    /// The content digest of this value.
    fn digest(&self) -> ValueDigest;

    /// The encoded value, as carried on the wire.
    fn to_bytes(&self) -> Vec<u8>;
}
