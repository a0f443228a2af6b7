use derive_where::derive_where;

use ibft_core_types::{Context, SignedMessage};
use ibft_events::DutyEvent;

/// Everything the engine task reacts to, in arrival order.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum Msg<Ctx: Context> {
    /// A message received from another operator.
    Network(SignedMessage<Ctx>),

    /// A duty to run, or a round timer that fired.
    Duty(DutyEvent<Ctx>),

    /// Stop the engine after the messages already queued.
    Shutdown,
}

impl<Ctx: Context> From<SignedMessage<Ctx>> for Msg<Ctx> {
    fn from(message: SignedMessage<Ctx>) -> Self {
        Msg::Network(message)
    }
}

impl<Ctx: Context> From<DutyEvent<Ctx>> for Msg<Ctx> {
    fn from(event: DutyEvent<Ctx>) -> Self {
        Msg::Duty(event)
    }
}
