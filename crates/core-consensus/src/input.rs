use derive_where::derive_where;

use ibft_core_types::{Context, SignedMessage, Timeout};

/// Events an instance reacts to, delivered one at a time.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum Input<Ctx>
where
    Ctx: Context,
{
    /// Enter the first round: schedule its timer and, if leader, propose the duty value.
    Start,

    /// A signed message from the network, possibly a duplicate, late or early.
    Message(SignedMessage<Ctx>),

    /// A round timer expired.
    TimeoutElapsed(Timeout),
}
