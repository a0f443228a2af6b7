use derive_where::derive_where;
use thiserror::Error;

use ibft_core_types::{CommitteeError, Context, Height, Round, ValueDigest};
use ibft_core_votekeeper::QuorumError;

/// The set of fatal errors that can halt an instance.
///
/// Per-message problems are not errors, see [`Rejection`](crate::Rejection).
#[derive_where(Clone, Debug, PartialEq, Eq)]
#[derive(Error)]
pub enum Error<Ctx>
where
    Ctx: Context,
{
    /// Two different values reached a Commit quorum in the same round.
    /// Either the committee or the thresholds are misconfigured, or safety is broken.
    #[error(
        "Safety violation at height {height}, round {round}: \
         both {existing} and {conflicting} reached a Commit quorum"
    )]
    SafetyViolation {
        height: Height,
        round: Round,
        existing: ValueDigest,
        conflicting: ValueDigest,
    },

    /// The instance already hit a fatal error and refuses further input.
    #[error("Instance for height {0} is halted")]
    Halted(Height),

    /// The committee cannot run consensus.
    #[error("Invalid committee: {0}")]
    Committee(#[from] CommitteeError),

    /// The local operator is not part of the committee it is asked to run with.
    #[error("Local operator {0} is not a member of the committee")]
    NotAMember(Ctx::Address),

    /// The quorum tracker refused a message the instance had admitted.
    #[error("Quorum tracker error: {0}")]
    Tracker(QuorumError),
}

impl<Ctx: Context> From<QuorumError> for Error<Ctx> {
    fn from(error: QuorumError) -> Self {
        match error {
            QuorumError::ConflictingCommitQuorum {
                height,
                round,
                existing,
                conflicting,
            } => Error::SafetyViolation {
                height,
                round,
                existing,
                conflicting,
            },
            other => Error::Tracker(other),
        }
    }
}
