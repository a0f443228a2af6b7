use derive_where::derive_where;

use ibft_core_types::{Context, DecidedRecord, Height, Phase, Round, SignedMessage, Timeout};

/// Notifications published while an instance runs.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum InstanceEvent<Ctx: Context> {
    /// A new instance started for the height.
    Started { height: Height },

    /// The instance entered a phase.
    PhaseEntered {
        height: Height,
        round: Round,
        phase: Phase,
    },

    /// The instance broadcast one of its own messages.
    Broadcast(SignedMessage<Ctx>),

    /// A round timer of the instance fired.
    TimedOut(Timeout),

    /// The height was decided and the decision stored.
    Decided {
        record: DecidedRecord<Ctx>,
        value: Ctx::Value,
    },
}

impl<Ctx: Context> InstanceEvent<Ctx> {
    pub const STARTED: &'static str = "started";
    pub const PHASE: &'static str = "phase";
    pub const BROADCAST: &'static str = "broadcast";
    pub const TIMEOUT: &'static str = "timeout";
    pub const DECIDED: &'static str = "decided";

    /// The name this event is published under.
    pub const fn name(&self) -> &'static str {
        match self {
            InstanceEvent::Started { .. } => Self::STARTED,
            InstanceEvent::PhaseEntered { .. } => Self::PHASE,
            InstanceEvent::Broadcast(_) => Self::BROADCAST,
            InstanceEvent::TimedOut(_) => Self::TIMEOUT,
            InstanceEvent::Decided { .. } => Self::DECIDED,
        }
    }

    pub fn height(&self) -> Height {
        match self {
            InstanceEvent::Started { height } => *height,
            InstanceEvent::PhaseEntered { height, .. } => *height,
            InstanceEvent::Broadcast(message) => message.height(),
            InstanceEvent::TimedOut(timeout) => timeout.height,
            InstanceEvent::Decided { record, .. } => record.height,
        }
    }
}
