use crate::{Address, PublicKey, TestContext};

/// A committee member with its verification key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Operator {
    pub address: Address,
    pub public_key: PublicKey,
}

impl Operator {
    pub fn new(public_key: PublicKey) -> Self {
        Self {
            address: Address::from_public_key(&public_key),
            public_key,
        }
    }
}

impl ibft_core_types::Operator<TestContext> for Operator {
    fn address(&self) -> &Address {
        &self.address
    }
}

/// An ordered committee. The order is the leader rotation order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Committee {
    operators: Vec<Operator>,
}

impl Committee {
    pub fn new(operators: impl IntoIterator<Item = Operator>) -> Self {
        Self {
            operators: operators.into_iter().collect(),
        }
    }
}

impl ibft_core_types::Committee<TestContext> for Committee {
    fn operators(&self) -> &[Operator] {
        &self.operators
    }
}
