use ibft_core_types::MessageKind;

/// Why an inbound message was not admitted.
///
/// Rejections are local to the message: they are logged and counted, never fatal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum Rejection {
    #[error("signature does not verify")]
    InvalidSignature,

    #[error("sender is not the leader of the round")]
    WrongLeader,

    #[error("round is behind the current round")]
    Stale,

    /// Buffered until the instance reaches the round.
    #[error("round is ahead of the current round")]
    FutureRound,

    #[error("round is beyond the future-round tolerance")]
    BeyondFutureTolerance,

    #[error("value was never pre-prepared in that round")]
    UnknownValue,

    /// The same message was already admitted.
    #[error("duplicate message")]
    DuplicateIgnored,

    #[error("sender already sent a different message of that kind in that round")]
    Equivocation,

    #[error("justification does not verify")]
    MalformedJustification,

    #[error("justification holds a {0} message")]
    WrongKind(MessageKind),

    #[error("proposed value differs from the highest justified prepared value")]
    UnjustifiedValue,

    #[error("height is already decided")]
    AlreadyDecided,

    #[error("sender is not a member of the committee")]
    UnknownSender,

    #[error("message is for another height")]
    WrongHeight,
}

impl Rejection {
    /// Whether the rejection points at a faulty or misbehaving sender, as opposed to
    /// ordinary asynchrony (reordering, duplication, late delivery).
    pub const fn is_failure(&self) -> bool {
        !matches!(
            self,
            Rejection::FutureRound | Rejection::DuplicateIgnored | Rejection::AlreadyDecided
        )
    }

    /// A stable label, for metrics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Rejection::InvalidSignature => "invalid_signature",
            Rejection::WrongLeader => "wrong_leader",
            Rejection::Stale => "stale",
            Rejection::FutureRound => "future_round",
            Rejection::BeyondFutureTolerance => "beyond_future_tolerance",
            Rejection::UnknownValue => "unknown_value",
            Rejection::DuplicateIgnored => "duplicate_ignored",
            Rejection::Equivocation => "equivocation",
            Rejection::MalformedJustification => "malformed_justification",
            Rejection::WrongKind(_) => "wrong_kind",
            Rejection::UnjustifiedValue => "unjustified_value",
            Rejection::AlreadyDecided => "already_decided",
            Rejection::UnknownSender => "unknown_sender",
            Rejection::WrongHeight => "wrong_height",
        }
    }
}

