use ibft_core_types::{Committee, Context, Height, Round};

/// Deterministic mapping from (height, round) to the operator expected to propose.
///
/// Every honest operator must compute the same leader from the same committee.
pub trait LeaderElector<Ctx>
where
    Self: Clone + Send + Sync,
    Ctx: Context,
{
    fn leader<'a>(
        &self,
        committee: &'a Ctx::Committee,
        height: Height,
        round: Round,
    ) -> Option<&'a Ctx::Operator>;
}

/// Round-robin over the committee order, starting at index `(height + round) mod n`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundRobin;

impl RoundRobin {
    /// The leader's position in a committee of size `n`.
    ///
    /// Computed as `((height mod n) + (round mod n)) mod n` so that it never overflows.
    pub fn leader_index(n: usize, height: Height, round: Round) -> Option<usize> {
        let n = u64::try_from(n).ok().filter(|&n| n > 0)?;
        let index = ((height.as_u64() % n) + (round.as_u64() % n)) % n;
        usize::try_from(index).ok()
    }
}

impl<Ctx: Context> LeaderElector<Ctx> for RoundRobin {
    fn leader<'a>(
        &self,
        committee: &'a Ctx::Committee,
        height: Height,
        round: Round,
    ) -> Option<&'a Ctx::Operator> {
        Self::leader_index(committee.len(), height, round)
            .and_then(|index| committee.get_by_index(index))
    }
}
