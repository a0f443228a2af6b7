use core::fmt;

/// An attempt number within a height.
///
/// Rounds start at [`Round::FIRST`] and only advance, either on a change-round quorum
/// or when the local instance gives up on the current round.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Round(u64);

impl Round {
    /// The round every height starts in.
    pub const FIRST: Round = Round(1);

    /// Create a new round.
    ///
    /// Round numbers below one are clamped to [`Round::FIRST`].
    pub const fn new(round: u64) -> Self {
        if round == 0 {
            Self::FIRST
        } else {
            Self(round)
        }
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The round following this one.
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The round `n` rounds after this one.
    pub const fn add(&self, n: u64) -> Self {
        Self(self.0.saturating_add(n))
    }

    /// How many rounds separate this round from the first one.
    pub const fn offset(&self) -> u64 {
        self.0.saturating_sub(1)
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
