/// How many rounds ahead of the current one messages are still kept.
pub const DEFAULT_FUTURE_ROUND_TOLERANCE: u64 = 2;

/// Consensus parameters that do not change within a height.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Params {
    /// PrePrepare, Prepare and Commit messages up to this many rounds ahead are buffered
    /// and ChangeRound messages are tracked. Anything further ahead is rejected.
    pub future_round_tolerance: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            future_round_tolerance: DEFAULT_FUTURE_ROUND_TOLERANCE,
        }
    }
}
