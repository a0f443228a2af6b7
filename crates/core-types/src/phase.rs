use core::fmt;

/// The phase of an instance within its current round.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Waiting for the leader's PrePrepare.
    #[default]
    Idle,

    /// Accepted the PrePrepare and sent a Prepare.
    PrePrepared,

    /// Observed a Prepare quorum.
    Prepared,

    /// Sent a Commit, waiting for a Commit quorum.
    Committed,

    /// Observed a Commit quorum. Terminal.
    Decided,

    /// Gave up on the round, waiting for a ChangeRound quorum.
    ChangingRound,
}

impl Phase {
    pub const fn is_decided(&self) -> bool {
        matches!(self, Phase::Decided)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::PrePrepared => "pre_prepared",
            Phase::Prepared => "prepared",
            Phase::Committed => "committed",
            Phase::Decided => "decided",
            Phase::ChangingRound => "changing_round",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
