use alloc::collections::BTreeSet;

use derive_where::derive_where;

use ibft_core_types::{Context, MessageKind, Round, SignedMessage};

use crate::count::{MessageCount, Recorded};
use crate::Threshold;

/// Tracks all the Prepare, Commit and ChangeRound messages for a single round.
#[derive_where(Clone, Debug)]
pub struct RoundMessages<Ctx: Context> {
    round: Round,
    quorum: usize,

    prepares: MessageCount<Ctx>,
    commits: MessageCount<Ctx>,
    change_rounds: MessageCount<Ctx>,

    emitted: BTreeSet<(MessageKind, Threshold)>,
}

impl<Ctx: Context> RoundMessages<Ctx> {
    pub fn new(round: Round, quorum: usize) -> Self {
        Self {
            round,
            quorum,
            prepares: MessageCount::new(),
            commits: MessageCount::new(),
            change_rounds: MessageCount::new(),
            emitted: BTreeSet::new(),
        }
    }

    pub fn round(&self) -> Round {
        self.round
    }

    /// The tally for the given kind. PrePrepares are not tallied.
    pub fn count(&self, kind: MessageKind) -> Option<&MessageCount<Ctx>> {
        match kind {
            MessageKind::Prepare => Some(&self.prepares),
            MessageKind::Commit => Some(&self.commits),
            MessageKind::ChangeRound => Some(&self.change_rounds),
            MessageKind::PrePrepare => None,
        }
    }

    fn count_mut(&mut self, kind: MessageKind) -> Option<&mut MessageCount<Ctx>> {
        match kind {
            MessageKind::Prepare => Some(&mut self.prepares),
            MessageKind::Commit => Some(&mut self.commits),
            MessageKind::ChangeRound => Some(&mut self.change_rounds),
            MessageKind::PrePrepare => None,
        }
    }

    /// Record a message and return the threshold it completes, if it completes one
    /// that was not reported before.
    pub fn add(&mut self, message: SignedMessage<Ctx>) -> (Recorded<Ctx>, Threshold) {
        let kind = message.kind();
        let value_id = message.value_id();
        let quorum = self.quorum;

        let Some(count) = self.count_mut(kind) else {
            return (Recorded::Duplicate, Threshold::Unreached);
        };

        let recorded = count.record(message);
        if recorded == Recorded::Duplicate {
            return (recorded, Threshold::Unreached);
        }

        let threshold = match (kind, value_id) {
            (MessageKind::ChangeRound, _) if count.len() >= quorum => Threshold::Any,
            (MessageKind::Prepare | MessageKind::Commit, Some(value_id))
                if count.count_for(&value_id) >= quorum =>
            {
                Threshold::Value(value_id)
            }
            _ => Threshold::Unreached,
        };

        if threshold == Threshold::Unreached || !self.emitted.insert((kind, threshold)) {
            return (recorded, Threshold::Unreached);
        }

        (recorded, threshold)
    }

    /// Whether the given kind has already reported the given threshold in this round.
    pub fn emitted(&self, kind: MessageKind, threshold: Threshold) -> bool {
        self.emitted.contains(&(kind, threshold))
    }
}
