//! One-message-per-operator tallies.

use alloc::collections::btree_map::{BTreeMap, Entry};

use derive_where::derive_where;

use ibft_core_types::{Context, SignedMessage, ValueDigest};

/// The outcome of recording a message in a [`MessageCount`].
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum Recorded<Ctx: Context> {
    /// First message from that operator.
    New,

    /// A message with the same signed content was already recorded. Nothing changed.
    Duplicate,

    /// A different message from the same operator replaced the earlier one,
    /// which is returned.
    Replaced(SignedMessage<Ctx>),
}

/// Tallies messages of a single kind in a single round, keeping one message per operator.
#[derive_where(Clone, Debug, Default)]
pub struct MessageCount<Ctx: Context> {
    messages: BTreeMap<Ctx::Address, SignedMessage<Ctx>>,
}

impl<Ctx: Context> MessageCount<Ctx> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message, replacing any earlier message from the same operator.
    pub fn record(&mut self, message: SignedMessage<Ctx>) -> Recorded<Ctx> {
        match self.messages.entry(message.sender().clone()) {
            Entry::Vacant(entry) => {
                entry.insert(message);
                Recorded::New
            }
            Entry::Occupied(entry) if entry.get().same_signed_content(&message) => Recorded::Duplicate,
            Entry::Occupied(mut entry) => Recorded::Replaced(entry.insert(message)),
        }
    }

    /// The number of distinct operators with a message for the given digest.
    pub fn count_for(&self, value_id: &ValueDigest) -> usize {
        self.messages
            .values()
            .filter(|m| m.value_id().as_ref() == Some(value_id))
            .count()
    }

    /// The number of distinct operators, whatever their messages carry.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, address: &Ctx::Address) -> Option<&SignedMessage<Ctx>> {
        self.messages.get(address)
    }

    /// All recorded messages, ordered by sender.
    pub fn iter(&self) -> impl Iterator<Item = &SignedMessage<Ctx>> {
        self.messages.values()
    }

    /// The recorded messages for the given digest, ordered by sender.
    pub fn iter_for<'a>(
        &'a self,
        value_id: &'a ValueDigest,
    ) -> impl Iterator<Item = &'a SignedMessage<Ctx>> + 'a {
        self.messages
            .values()
            .filter(move |m| m.value_id().as_ref() == Some(value_id))
    }
}
