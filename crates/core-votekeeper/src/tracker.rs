//! For tracking Prepare, Commit and ChangeRound quorums across the rounds of one height.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use derive_where::derive_where;
use thiserror::Error;
use tracing::debug;

use ibft_core_types::{Context, Height, MessageKind, Round, SignedMessage, ValueDigest};

use crate::count::Recorded;
use crate::evidence::EvidenceMap;
use crate::round_messages::RoundMessages;
use crate::Threshold;

/// Errors which can occur when adding a message to the tracker.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum QuorumError {
    /// The message belongs to another height.
    #[error("Message for height {message} cannot be tracked at height {tracker}")]
    WrongHeight { tracker: Height, message: Height },

    /// PrePrepares are not tallied.
    #[error("Messages of kind {0} are not tallied")]
    NotTallied(MessageKind),

    /// Two different values both reached a Commit quorum in the same round.
    #[error(
        "Conflicting Commit quorums at height {height}, round {round}: {existing} and {conflicting}"
    )]
    ConflictingCommitQuorum {
        height: Height,
        round: Round,
        existing: ValueDigest,
        conflicting: ValueDigest,
    },
}

/// Keeps track of messages and reports when quorums are reached.
///
/// Each (round, kind) holds at most one message per operator.
#[derive_where(Clone, Debug)]
pub struct QuorumTracker<Ctx>
where
    Ctx: Context,
{
    height: Height,
    quorum: usize,
    rounds: BTreeMap<Round, RoundMessages<Ctx>>,

    /// The digest that reached a Prepare quorum, per round.
    prepared: BTreeMap<Round, ValueDigest>,

    /// The digest that reached a Commit quorum, per round.
    committed: BTreeMap<Round, ValueDigest>,

    evidence: EvidenceMap<Ctx>,
}

impl<Ctx> QuorumTracker<Ctx>
where
    Ctx: Context,
{
    pub fn new(height: Height, quorum: usize) -> Self {
        Self {
            height,
            quorum,
            rounds: BTreeMap::new(),
            prepared: BTreeMap::new(),
            committed: BTreeMap::new(),
            evidence: EvidenceMap::new(),
        }
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Add a message and return the threshold it completes for the first time, if any.
    ///
    /// Adding a message that is already recorded changes nothing and yields
    /// [`Threshold::Unreached`]. A different message from the same operator for the same
    /// round and kind replaces the earlier one, and the pair is kept as evidence.
    pub fn add(&mut self, message: SignedMessage<Ctx>) -> Result<Threshold, QuorumError> {
        if message.height() != self.height {
            return Err(QuorumError::WrongHeight {
                tracker: self.height,
                message: message.height(),
            });
        }

        let kind = message.kind();
        if kind == MessageKind::PrePrepare {
            return Err(QuorumError::NotTallied(kind));
        }

        let round = message.round();
        let quorum = self.quorum;
        let messages = self
            .rounds
            .entry(round)
            .or_insert_with(|| RoundMessages::new(round, quorum));

        let (recorded, threshold) = messages.add(message.clone());

        if let Recorded::Replaced(existing) = recorded {
            debug!(
                height = %self.height, %round, %kind, sender = %message.sender(),
                "Replacing earlier message from the same operator"
            );
            self.evidence.add(existing, message);
        }

        match (kind, threshold) {
            (MessageKind::Prepare, Threshold::Value(value_id)) => {
                self.prepared.entry(round).or_insert(value_id);
            }

            (MessageKind::Commit, Threshold::Value(value_id)) => {
                if let Some(&existing) = self.committed.get(&round) {
                    if existing != value_id {
                        return Err(QuorumError::ConflictingCommitQuorum {
                            height: self.height,
                            round,
                            existing,
                            conflicting: value_id,
                        });
                    }
                }

                self.committed.insert(round, value_id);
            }

            _ => (),
        }

        Ok(threshold)
    }

    /// Record two conflicting messages from the same operator
    /// without touching the tallies.
    pub fn record_equivocation(&mut self, existing: SignedMessage<Ctx>, conflicting: SignedMessage<Ctx>) {
        self.evidence.add(existing, conflicting);
    }

    /// The highest round at which a Prepare quorum was observed, with its digest.
    pub fn highest_prepared(&self) -> Option<(Round, ValueDigest)> {
        self.prepared
            .iter()
            .next_back()
            .map(|(&round, &value_id)| (round, value_id))
    }

    /// The digest that reached a Prepare quorum at the given round, if any.
    pub fn prepared_at(&self, round: Round) -> Option<ValueDigest> {
        self.prepared.get(&round).copied()
    }

    /// The digest that reached a Commit quorum at the given round, if any.
    pub fn committed_at(&self, round: Round) -> Option<ValueDigest> {
        self.committed.get(&round).copied()
    }

    /// Whether a quorum of messages of the given kind agree on the digest at the given round.
    pub fn has_quorum(&self, round: Round, kind: MessageKind, value_id: &ValueDigest) -> bool {
        self.count(round, kind, value_id) >= self.quorum
    }

    /// The number of distinct operators with a message of the given kind for the digest.
    pub fn count(&self, round: Round, kind: MessageKind, value_id: &ValueDigest) -> usize {
        self.rounds
            .get(&round)
            .and_then(|r| r.count(kind))
            .map_or(0, |c| c.count_for(value_id))
    }

    /// The number of distinct operators with a message of the given kind at the given round.
    pub fn senders(&self, round: Round, kind: MessageKind) -> usize {
        self.rounds
            .get(&round)
            .and_then(|r| r.count(kind))
            .map_or(0, |c| c.len())
    }

    /// The message recorded for the operator at the given round and kind, if any.
    pub fn get(
        &self,
        round: Round,
        kind: MessageKind,
        sender: &Ctx::Address,
    ) -> Option<&SignedMessage<Ctx>> {
        self.rounds
            .get(&round)
            .and_then(|r| r.count(kind))
            .and_then(|c| c.get(sender))
    }

    /// All messages of the given kind at the given round, ordered by sender.
    pub fn messages(&self, round: Round, kind: MessageKind) -> Vec<SignedMessage<Ctx>> {
        self.rounds
            .get(&round)
            .and_then(|r| r.count(kind))
            .map(|c| c.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The messages of the given kind at the given round for the digest, ordered by sender.
    pub fn messages_for(
        &self,
        round: Round,
        kind: MessageKind,
        value_id: &ValueDigest,
    ) -> Vec<SignedMessage<Ctx>> {
        self.rounds
            .get(&round)
            .and_then(|r| r.count(kind))
            .map(|c| c.iter_for(value_id).cloned().collect())
            .unwrap_or_default()
    }

    /// Whether the operator sent a message of the given kind at any round at or above `from`.
    pub fn sent_at_or_above(&self, from: Round, kind: MessageKind, sender: &Ctx::Address) -> bool {
        self.rounds
            .range(from..)
            .filter_map(|(_, r)| r.count(kind))
            .any(|c| c.get(sender).is_some())
    }

    pub fn evidence(&self) -> &EvidenceMap<Ctx> {
        &self.evidence
    }
}
