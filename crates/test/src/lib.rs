#![forbid(unsafe_code)]

mod address;
mod committee;
mod context;
mod network;
mod value;

pub mod utils;

pub use address::Address;
pub use committee::{Committee, Operator};
pub use context::TestContext;
pub use network::{Envelope, Network, Node, Rejected, TestInstance};
pub use value::Value;

pub use ibft_signing_ed25519::{Ed25519Provider, PrivateKey, PublicKey, Signature};

pub type Message = ibft_core_types::Message<TestContext>;
pub type SignedMessage = ibft_core_types::SignedMessage<TestContext>;
pub type DecidedRecord = ibft_core_types::DecidedRecord<TestContext>;
pub type PreparedValue = ibft_core_types::PreparedValue<TestContext>;
pub type PrepareJustification = ibft_core_types::PrepareJustification<TestContext>;
pub type RoundChangeJustification = ibft_core_types::RoundChangeJustification<TestContext>;
