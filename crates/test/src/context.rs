use ibft_core_types::Context;

use crate::{Address, Committee, Ed25519Provider, Operator, PrivateKey, Signature, Value};

/// The context of one operator: its key and the types it runs consensus over.
#[derive(Clone, Debug)]
pub struct TestContext {
    address: Address,
    provider: Ed25519Provider,
}

impl TestContext {
    pub fn new(private_key: PrivateKey) -> Self {
        Self {
            address: Address::from_public_key(&private_key.public_key()),
            provider: Ed25519Provider::new(private_key),
        }
    }

    pub fn private_key(&self) -> &PrivateKey {
        self.provider.private_key()
    }
}

impl Context for TestContext {
    type Address = Address;
    type Value = Value;
    type Operator = Operator;
    type Committee = Committee;
    type Signature = Signature;
    type SigningProvider = Ed25519Provider;

    fn signing_provider(&self) -> &Ed25519Provider {
        &self.provider
    }

    fn address(&self) -> &Address {
        &self.address
    }
}
