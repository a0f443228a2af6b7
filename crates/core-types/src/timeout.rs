use core::{fmt, time::Duration};

use crate::{Height, Round};

/// A round timer, identified by the height and the round it is waiting on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timeout {
    /// The height the timer belongs to.
    pub height: Height,

    /// The round the timer is waiting on.
    pub round: Round,
}

impl Timeout {
    pub const fn new(height: Height, round: Round) -> Self {
        Self { height, round }
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoundTimeout({}/{})", self.height, self.round)
    }
}

/// Round timer durations, growing linearly with the round number.
///
/// `duration(r) = min(round_timeout + round_timeout_delta * (r - 1), max_round_timeout)`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LinearTimeouts {
    /// How long the first round lasts before the instance asks for a round change
    pub round_timeout: Duration,

    /// How much the round timeout increases with each round
    pub round_timeout_delta: Duration,

    /// Upper bound on any round timeout
    pub max_round_timeout: Duration,
}

impl LinearTimeouts {
    /// The duration of the timer for the given round.
    pub fn duration(&self, round: Round) -> Duration {
        let rounds = u32::try_from(round.offset()).unwrap_or(u32::MAX);
        let extra = self
            .round_timeout_delta
            .checked_mul(rounds)
            .unwrap_or(self.max_round_timeout);

        self.round_timeout
            .saturating_add(extra)
            .min(self.max_round_timeout)
    }
}

impl Default for LinearTimeouts {
    fn default() -> Self {
        Self {
            round_timeout: Duration::from_secs(2),
            round_timeout_delta: Duration::from_millis(500),
            max_round_timeout: Duration::from_secs(30),
        }
    }
}
