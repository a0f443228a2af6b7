use alloc::vec::Vec;

use derive_where::derive_where;

use crate::{Context, Height, Round, Signature, ValueDigest};

/// A Commit signature from one operator.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct CommitSignature<Ctx: Context> {
    pub address: Ctx::Address,
    pub signature: Signature<Ctx>,
}

impl<Ctx: Context> CommitSignature<Ctx> {
    pub fn new(address: Ctx::Address, signature: Signature<Ctx>) -> Self {
        Self { address, signature }
    }
}

/// The durable outcome of a height: a value digest backed by a Commit quorum.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct DecidedRecord<Ctx: Context> {
    pub height: Height,
    pub round: Round,
    pub value_id: ValueDigest,
    pub commit_signatures: Vec<CommitSignature<Ctx>>,
}

impl<Ctx: Context> DecidedRecord<Ctx> {
    pub fn new(
        height: Height,
        round: Round,
        value_id: ValueDigest,
        commit_signatures: Vec<CommitSignature<Ctx>>,
    ) -> Self {
        Self {
            height,
            round,
            value_id,
            commit_signatures,
        }
    }
}
