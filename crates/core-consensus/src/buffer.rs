use alloc::collections::btree_map::{BTreeMap, Entry};
use alloc::vec::Vec;

use derive_where::derive_where;

use ibft_core_types::{Context, MessageKind, Round, SignedMessage};

/// Messages for rounds the instance has not reached yet.
///
/// Holds at most one message per (round, kind, sender); the first one wins.
#[derive_where(Clone, Debug, Default)]
pub struct FutureBuffer<Ctx: Context> {
    rounds: BTreeMap<Round, BTreeMap<(MessageKind, Ctx::Address), SignedMessage<Ctx>>>,
}

impl<Ctx: Context> FutureBuffer<Ctx> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a message. Returns `false` if a message for the same slot is already held.
    pub fn insert(&mut self, message: SignedMessage<Ctx>) -> bool {
        let slot = (message.kind(), message.sender().clone());

        match self.rounds.entry(message.round()).or_default().entry(slot) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(message);
                true
            }
        }
    }

    /// Remove and return the messages for the given round, PrePrepares first.
    pub fn take_round(&mut self, round: Round) -> Vec<SignedMessage<Ctx>> {
        self.rounds
            .remove(&round)
            .map(|messages| messages.into_values().collect())
            .unwrap_or_default()
    }

    /// Drop every message for a round below the given one.
    pub fn discard_below(&mut self, round: Round) {
        self.rounds = self.rounds.split_off(&round);
    }

    /// The number of buffered messages.
    pub fn len(&self) -> usize {
        self.rounds.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.rounds.clear();
    }
}
