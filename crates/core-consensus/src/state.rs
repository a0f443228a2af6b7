use alloc::collections::BTreeMap;

use derive_where::derive_where;

use ibft_core_types::{Context, DecidedRecord, Height, Payload, Phase, Round, SignedMessage};
use ibft_core_votekeeper::QuorumTracker;

use crate::FutureBuffer;

/// The mutable state of one instance. Only the owning instance touches it.
#[derive_where(Clone, Debug)]
pub struct State<Ctx>
where
    Ctx: Context,
{
    pub height: Height,
    pub round: Round,
    pub phase: Phase,

    /// The round the pending round timer waits on.
    pub timer_round: Option<Round>,

    /// The round this instance asked to move to, while changing round.
    pub target_round: Option<Round>,

    /// The ChangeRound this instance last broadcast for [`State::target_round`].
    pub own_change_round: Option<SignedMessage<Ctx>>,

    /// The PrePrepare accepted in each round.
    pub proposals: BTreeMap<Round, SignedMessage<Ctx>>,

    pub tracker: QuorumTracker<Ctx>,
    pub buffer: FutureBuffer<Ctx>,

    pub decided: Option<DecidedRecord<Ctx>>,
    pub started: bool,
    pub halted: bool,
}

impl<Ctx> State<Ctx>
where
    Ctx: Context,
{
    pub fn new(height: Height, quorum: usize) -> Self {
        Self {
            height,
            round: Round::FIRST,
            phase: Phase::Idle,
            timer_round: None,
            target_round: None,
            own_change_round: None,
            proposals: BTreeMap::new(),
            tracker: QuorumTracker::new(height, quorum),
            buffer: FutureBuffer::new(),
            decided: None,
            started: false,
            halted: false,
        }
    }

    /// The value proposed by the PrePrepare accepted in the given round, if any.
    pub fn proposed_value(&self, round: Round) -> Option<&Ctx::Value> {
        match self.proposals.get(&round).map(|p| &p.message.payload) {
            Some(Payload::PrePrepare { value, .. }) => Some(value),
            _ => None,
        }
    }
}
