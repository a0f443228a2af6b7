//! Building and verifying the proof bundles carried by ChangeRound and PrePrepare messages.

use alloc::collections::{BTreeMap, BTreeSet};

use ibft_core_types::{
    Committee, Context, Height, MessageKind, Payload, PrepareJustification, PreparedValue, Round,
    RoundChangeJustification, SignedMessage, SigningProvider, ValueDigest,
};
use ibft_core_votekeeper::QuorumTracker;

use crate::Rejection;

/// Verifies justification bundles against a committee, for one height.
pub struct Justifier<'a, Ctx: Context> {
    committee: &'a Ctx::Committee,
    verifier: &'a Ctx::SigningProvider,
    height: Height,
    quorum: usize,
}

impl<'a, Ctx: Context> Justifier<'a, Ctx> {
    pub fn new(
        committee: &'a Ctx::Committee,
        verifier: &'a Ctx::SigningProvider,
        height: Height,
        quorum: usize,
    ) -> Self {
        Self {
            committee,
            verifier,
            height,
            quorum,
        }
    }

    /// The prepared value and bundle for the local instance's own ChangeRound.
    ///
    /// Bundles the Prepare quorum of the highest prepared round if there is one,
    /// otherwise returns no value and an empty bundle.
    pub fn build(
        tracker: &QuorumTracker<Ctx>,
        proposals: &BTreeMap<Round, SignedMessage<Ctx>>,
    ) -> (Option<PreparedValue<Ctx>>, PrepareJustification<Ctx>) {
        let Some((round, value_id)) = tracker.highest_prepared() else {
            return (None, PrepareJustification::empty());
        };

        let value = match proposals.get(&round).map(|p| &p.message.payload) {
            Some(Payload::PrePrepare { value, .. }) => value.clone(),
            _ => return (None, PrepareJustification::empty()),
        };

        let prepares = tracker.messages_for(round, MessageKind::Prepare, &value_id);

        (
            Some(PreparedValue::new(round, value)),
            PrepareJustification::new(prepares),
        )
    }

    /// Whether the bundle is valid for a ChangeRound to `claimed_round`.
    ///
    /// An empty bundle is always valid. A non-empty one must hold at least a quorum of
    /// Prepares for this height, all from the same round below `claimed_round`, all for
    /// the same digest, from distinct committee members, and all correctly signed.
    pub fn verify(&self, bundle: &PrepareJustification<Ctx>, claimed_round: Round) -> bool {
        let Some(first) = bundle.prepares.first() else {
            return true;
        };

        if bundle.len() < self.quorum {
            return false;
        }

        let round = first.round();
        let Some(value_id) = first.value_id() else {
            return false;
        };

        if round >= claimed_round {
            return false;
        }

        let mut senders = BTreeSet::new();

        bundle.prepares.iter().all(|prepare| {
            prepare.kind() == MessageKind::Prepare
                && prepare.height() == self.height
                && prepare.round() == round
                && prepare.value_id() == Some(value_id)
                && self.committee.contains(prepare.sender())
                && senders.insert(prepare.sender().clone())
                && self.verify_signature(prepare)
        })
    }

    /// Check that a ChangeRound's claimed prepared value agrees with its bundle.
    pub fn verify_prepared(
        &self,
        prepared: Option<&PreparedValue<Ctx>>,
        bundle: &PrepareJustification<Ctx>,
        claimed_round: Round,
    ) -> Result<(), Rejection> {
        match prepared {
            None if bundle.is_empty() => Ok(()),
            None => Err(Rejection::MalformedJustification),
            Some(_) if bundle.is_empty() => Err(Rejection::MalformedJustification),
            Some(prepared) => {
                let consistent = bundle.round() == Some(prepared.round)
                    && bundle.value_id() == Some(prepared.value_id());

                if consistent && self.verify(bundle, claimed_round) {
                    Ok(())
                } else {
                    Err(Rejection::MalformedJustification)
                }
            }
        }
    }

    /// Verify the ChangeRound quorum attached to a PrePrepare for `round`.
    ///
    /// Returns the digest the PrePrepare must propose, if any of the ChangeRounds
    /// carries a prepared value.
    pub fn verify_round_change(
        &self,
        justification: &RoundChangeJustification<Ctx>,
        round: Round,
    ) -> Result<Option<ValueDigest>, Rejection> {
        if justification.len() < self.quorum {
            return Err(Rejection::MalformedJustification);
        }

        let mut senders = BTreeSet::new();

        for change_round in &justification.change_rounds {
            let Payload::ChangeRound {
                prepared,
                justification: bundle,
            } = &change_round.message.payload
            else {
                return Err(Rejection::WrongKind(change_round.kind()));
            };

            let well_formed = change_round.height() == self.height
                && change_round.round() == round
                && self.committee.contains(change_round.sender())
                && senders.insert(change_round.sender().clone())
                && self.verify_signature(change_round);

            if !well_formed {
                return Err(Rejection::MalformedJustification);
            }

            self.verify_prepared(prepared.as_ref(), bundle, round)?;
        }

        Ok(select_proposal_value(&justification.change_rounds).map(|p| p.value_id()))
    }

    fn verify_signature(&self, message: &SignedMessage<Ctx>) -> bool {
        self.verifier.verify(
            message.sender(),
            &message.message.to_sign_bytes(),
            &message.signature,
        )
    }
}

/// The value a new leader must re-propose, given the ChangeRound quorum for its round.
///
/// The prepared value from the highest round wins. Two different values prepared in the
/// same round can only come from a broken quorum; the lowest digest is picked so that
/// every operator still agrees. Returns `None` if no ChangeRound carries a prepared value.
pub fn select_proposal_value<Ctx: Context>(
    change_rounds: &[SignedMessage<Ctx>],
) -> Option<&PreparedValue<Ctx>> {
    change_rounds
        .iter()
        .filter_map(|m| match &m.message.payload {
            Payload::ChangeRound {
                prepared: Some(prepared),
                ..
            } => Some(prepared),
            _ => None,
        })
        .max_by(|a, b| {
            a.round
                .cmp(&b.round)
                .then_with(|| b.value_id().cmp(&a.value_id()))
        })
}
