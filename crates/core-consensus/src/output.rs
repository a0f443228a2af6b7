use derive_where::derive_where;

use ibft_core_types::{
    Context, DecidedRecord, Height, MessageKind, Phase, Round, SignedMessage, Timeout,
};

use crate::Rejection;

/// Side effects requested by an instance, in the order they must be performed.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum Output<Ctx>
where
    Ctx: Context,
{
    /// The instance entered a new phase, or a new round.
    PhaseEntered {
        height: Height,
        round: Round,
        phase: Phase,
    },

    /// Send this message to the rest of the committee.
    Broadcast(SignedMessage<Ctx>),

    /// Start the round timer. Replaces any pending round timer.
    ScheduleTimeout(Timeout),

    /// The height is decided. Terminal.
    Decided {
        record: DecidedRecord<Ctx>,
        value: Ctx::Value,
    },

    /// An inbound message was dropped.
    Rejected {
        sender: Ctx::Address,
        kind: MessageKind,
        round: Round,
        reason: Rejection,
    },

    /// An inbound message for a later round was put aside.
    Buffered {
        sender: Ctx::Address,
        kind: MessageKind,
        round: Round,
    },
}
