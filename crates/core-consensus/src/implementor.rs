use ibft_core_types::{Committee, Context, Height, Operator, Round, SignedMessage};

use crate::validation::{self, View};
use crate::{LeaderElector, Rejection, RoundRobin};

/// The protocol capability injected into an instance: who leads a round, how big a
/// quorum is, and whether each kind of message may be admitted.
///
/// The default methods implement standard IBFT validation; an implementor only has to
/// say who the leader is.
pub trait Implementor<Ctx>
where
    Self: Clone + Send + Sync,
    Ctx: Context,
{
    /// The leader of the given round.
    fn leader<'a>(
        &self,
        committee: &'a Ctx::Committee,
        height: Height,
        round: Round,
    ) -> Option<&'a Ctx::Address>;

    fn is_leader(
        &self,
        committee: &Ctx::Committee,
        height: Height,
        round: Round,
        address: &Ctx::Address,
    ) -> bool {
        self.leader(committee, height, round) == Some(address)
    }

    /// The number of matching messages needed for a phase to complete.
    fn quorum(&self, committee: &Ctx::Committee) -> usize {
        committee.quorum_size()
    }

    fn validate_pre_prepare(
        &self,
        view: &View<'_, Ctx>,
        message: &SignedMessage<Ctx>,
    ) -> Result<(), Rejection> {
        let leader = self.leader(view.committee, view.height, message.round());
        validation::validate_pre_prepare(view, leader, message)
    }

    fn validate_prepare(
        &self,
        view: &View<'_, Ctx>,
        message: &SignedMessage<Ctx>,
    ) -> Result<(), Rejection> {
        validation::validate_prepare(view, message)
    }

    fn validate_commit(
        &self,
        view: &View<'_, Ctx>,
        message: &SignedMessage<Ctx>,
    ) -> Result<(), Rejection> {
        validation::validate_commit(view, message)
    }

    fn validate_change_round(
        &self,
        view: &View<'_, Ctx>,
        message: &SignedMessage<Ctx>,
    ) -> Result<(), Rejection> {
        validation::validate_change_round(view, message)
    }
}

/// Standard IBFT validation with a pluggable leader election.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StandardImplementor<L = RoundRobin> {
    elector: L,
}

impl<L> StandardImplementor<L> {
    pub fn new(elector: L) -> Self {
        Self { elector }
    }

    pub fn elector(&self) -> &L {
        &self.elector
    }
}

impl<Ctx, L> Implementor<Ctx> for StandardImplementor<L>
where
    Ctx: Context,
    L: LeaderElector<Ctx>,
{
    fn leader<'a>(
        &self,
        committee: &'a Ctx::Committee,
        height: Height,
        round: Round,
    ) -> Option<&'a Ctx::Address> {
        self.elector
            .leader(committee, height, round)
            .map(|operator| operator.address())
    }
}
