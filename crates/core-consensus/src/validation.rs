//! Per-kind admission checks for inbound messages.

use alloc::collections::BTreeMap;

use ibft_core_types::{
    Context, Height, MessageKind, Payload, Phase, Round, SignedMessage, SigningProvider, Value,
    ValueDigest,
};
use ibft_core_votekeeper::QuorumTracker;

use crate::{Justifier, Rejection};

/// A read-only view of an instance, handed to the validators.
pub struct View<'a, Ctx: Context> {
    pub height: Height,
    pub round: Round,
    pub phase: Phase,
    pub quorum: usize,
    pub committee: &'a Ctx::Committee,
    pub verifier: &'a Ctx::SigningProvider,
    pub proposals: &'a BTreeMap<Round, SignedMessage<Ctx>>,
    pub tracker: &'a QuorumTracker<Ctx>,
}

impl<'a, Ctx: Context> View<'a, Ctx> {
    pub fn justifier(&self) -> Justifier<'a, Ctx> {
        Justifier::new(self.committee, self.verifier, self.height, self.quorum)
    }

    /// The digest of the PrePrepare accepted at the given round, if any.
    pub fn proposal_id(&self, round: Round) -> Option<ValueDigest> {
        self.proposals.get(&round).and_then(|p| p.value_id())
    }
}

/// Round acceptance policy.
///
/// - Anything below the current round is `Stale`.
/// - PrePrepare, Prepare and Commit for the current round pass. Up to `tolerance` rounds
///   ahead they are `FutureRound`, to be buffered.
/// - ChangeRound only makes sense for a round above the current one, and passes up to
///   `tolerance` rounds ahead.
/// - Anything further ahead is `BeyondFutureTolerance`.
pub fn check_round(
    kind: MessageKind,
    round: Round,
    current: Round,
    tolerance: u64,
) -> Result<(), Rejection> {
    if round > current.add(tolerance) {
        return Err(Rejection::BeyondFutureTolerance);
    }

    match kind {
        MessageKind::ChangeRound if round <= current => Err(Rejection::Stale),
        MessageKind::ChangeRound => Ok(()),
        _ if round < current => Err(Rejection::Stale),
        _ if round > current => Err(Rejection::FutureRound),
        _ => Ok(()),
    }
}

/// Check the message's signature with the external verification capability.
pub fn verify_signature<Ctx: Context>(
    verifier: &Ctx::SigningProvider,
    message: &SignedMessage<Ctx>,
) -> Result<(), Rejection> {
    let bytes = message.message.to_sign_bytes();

    if verifier.verify(message.sender(), &bytes, &message.signature) {
        Ok(())
    } else {
        Err(Rejection::InvalidSignature)
    }
}

/// A PrePrepare must come from the round's leader. In the first round it carries no
/// justification. In later rounds it carries a valid ChangeRound quorum for its round and
/// proposes the highest prepared value among them, if any of them carries one.
pub fn validate_pre_prepare<Ctx: Context>(
    view: &View<'_, Ctx>,
    leader: Option<&Ctx::Address>,
    message: &SignedMessage<Ctx>,
) -> Result<(), Rejection> {
    if leader != Some(message.sender()) {
        return Err(Rejection::WrongLeader);
    }

    let Payload::PrePrepare {
        value,
        justification,
    } = &message.message.payload
    else {
        return Err(Rejection::WrongKind(message.kind()));
    };

    if message.round() == Round::FIRST {
        return if justification.is_empty() {
            Ok(())
        } else {
            Err(Rejection::MalformedJustification)
        };
    }

    let justified = view
        .justifier()
        .verify_round_change(justification, message.round())?;

    match justified {
        Some(value_id) if value.digest() != value_id => Err(Rejection::UnjustifiedValue),
        _ => Ok(()),
    }
}

/// A Prepare must match the digest of the PrePrepare accepted in its round.
pub fn validate_prepare<Ctx: Context>(
    view: &View<'_, Ctx>,
    message: &SignedMessage<Ctx>,
) -> Result<(), Rejection> {
    match (view.proposal_id(message.round()), message.value_id()) {
        (Some(proposed), Some(value_id)) if proposed == value_id => Ok(()),
        _ => Err(Rejection::UnknownValue),
    }
}

/// A Commit must be for the value this instance has prepared in its round, that is the
/// digest for which a local Prepare quorum was observed.
pub fn validate_commit<Ctx: Context>(
    view: &View<'_, Ctx>,
    message: &SignedMessage<Ctx>,
) -> Result<(), Rejection> {
    match (view.tracker.prepared_at(message.round()), message.value_id()) {
        (Some(prepared), Some(value_id)) if prepared == value_id => Ok(()),
        _ => Err(Rejection::UnknownValue),
    }
}

/// A ChangeRound's bundle must verify and agree with its claimed prepared value.
///
/// An empty bundle cannot be disproved remotely. The best local check is that the
/// sender has not sent a Commit at or above the current round, since a Commit implies
/// the sender observed a Prepare quorum.
pub fn validate_change_round<Ctx: Context>(
    view: &View<'_, Ctx>,
    message: &SignedMessage<Ctx>,
) -> Result<(), Rejection> {
    let Payload::ChangeRound {
        prepared,
        justification,
    } = &message.message.payload
    else {
        return Err(Rejection::WrongKind(message.kind()));
    };

    view.justifier()
        .verify_prepared(prepared.as_ref(), justification, message.round())?;

    if prepared.is_none()
        && view
            .tracker
            .sent_at_or_above(view.round, MessageKind::Commit, message.sender())
    {
        return Err(Rejection::MalformedJustification);
    }

    Ok(())
}
