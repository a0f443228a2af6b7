//! Proof bundles carried by ChangeRound and PrePrepare messages.

use alloc::vec::Vec;

use derive_where::derive_where;

use crate::{Context, Round, SignedMessage, ValueDigest};

/// The bundle a ChangeRound carries: either empty (never prepared), or the Prepare quorum
/// for the value the sender last prepared.
#[derive_where(Clone, Debug, PartialEq, Eq, Default)]
pub struct PrepareJustification<Ctx: Context> {
    pub prepares: Vec<SignedMessage<Ctx>>,
}

impl<Ctx: Context> PrepareJustification<Ctx> {
    pub fn new(prepares: Vec<SignedMessage<Ctx>>) -> Self {
        Self { prepares }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.prepares.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prepares.len()
    }

    /// The round of the first Prepare, if any.
    pub fn round(&self) -> Option<Round> {
        self.prepares.first().map(|p| p.round())
    }

    /// The digest of the first Prepare, if any.
    pub fn value_id(&self) -> Option<ValueDigest> {
        self.prepares.first().and_then(|p| p.value_id())
    }
}

/// The ChangeRound quorum a leader attaches to a PrePrepare for a round above the first,
/// so that every receiver can check the proposed value against the highest prepared one.
#[derive_where(Clone, Debug, PartialEq, Eq, Default)]
pub struct RoundChangeJustification<Ctx: Context> {
    pub change_rounds: Vec<SignedMessage<Ctx>>,
}

impl<Ctx: Context> RoundChangeJustification<Ctx> {
    pub fn new(change_rounds: Vec<SignedMessage<Ctx>>) -> Self {
        Self { change_rounds }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.change_rounds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.change_rounds.len()
    }
}
