use core::fmt;

use bytes::Bytes;

use ibft_core_types::ValueDigest;

/// The value to agree on: an opaque duty payload.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Value(Bytes);

impl Value {
    pub fn new(value: u64) -> Self {
        Self(Bytes::copy_from_slice(&value.to_be_bytes()))
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn id(&self) -> ValueDigest {
        ValueDigest::of(&self.0)
    }
}

impl ibft_core_types::Value for Value {
    fn digest(&self) -> ValueDigest {
        self.id()
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value(0x{})", hex::encode(&self.0))
    }
}
