//! Equivocation records, per operator and per (round, kind).

use alloc::collections::btree_map::BTreeMap;
use alloc::vec::Vec;

use derive_where::derive_where;

use ibft_core_types::{Context, MessageKind, Round, SignedMessage};

/// Two messages signed by one operator for the same height, round and kind, whose signed
/// contents differ. The first one is the message that was admitted.
pub type DoubleMessage<Ctx> = (SignedMessage<Ctx>, SignedMessage<Ctx>);

type Slot = (Round, MessageKind);

/// The equivocations observed at one height.
#[derive_where(Clone, Debug, Default)]
pub struct EvidenceMap<Ctx>
where
    Ctx: Context,
{
    map: BTreeMap<Ctx::Address, BTreeMap<Slot, Vec<DoubleMessage<Ctx>>>>,
}

impl<Ctx> EvidenceMap<Ctx>
where
    Ctx: Context,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The number of recorded pairs, over all operators.
    pub fn len(&self) -> usize {
        self.map
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Record a pair of conflicting messages and return whether it was new.
    ///
    /// Nothing is recorded if the messages are not from the same operator, not for the
    /// same round and kind, or carry the same signed content. A pair already recorded,
    /// in either order, is not recorded again.
    pub fn add(&mut self, existing: SignedMessage<Ctx>, conflicting: SignedMessage<Ctx>) -> bool {
        if existing.sender() != conflicting.sender()
            || existing.round() != conflicting.round()
            || existing.kind() != conflicting.kind()
            || existing.same_signed_content(&conflicting)
        {
            return false;
        }

        let slot = (existing.round(), existing.kind());
        let pairs = self
            .map
            .entry(existing.sender().clone())
            .or_default()
            .entry(slot)
            .or_default();

        let known = pairs.iter().any(|(a, b)| {
            (a.same_signed_content(&existing) && b.same_signed_content(&conflicting))
                || (a.same_signed_content(&conflicting) && b.same_signed_content(&existing))
        });

        if known {
            return false;
        }

        pairs.push((existing, conflicting));
        true
    }

    /// The pairs recorded against an operator for the given round and kind.
    pub fn conflicts(&self, address: &Ctx::Address, round: Round, kind: MessageKind) -> &[DoubleMessage<Ctx>] {
        self.map
            .get(address)
            .and_then(|slots| slots.get(&(round, kind)))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Every pair recorded against an operator, ordered by round then kind.
    pub fn of<'a>(&'a self, address: &Ctx::Address) -> impl Iterator<Item = &'a DoubleMessage<Ctx>> + 'a {
        self.map
            .get(address)
            .into_iter()
            .flat_map(BTreeMap::values)
            .flatten()
    }

    /// The operators with at least one recorded equivocation.
    pub fn offenders(&self) -> impl Iterator<Item = &Ctx::Address> {
        self.map.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::vec;

    use ibft_test::utils::{commit, make_committee, prepare};
    use ibft_test::{TestContext, Value};

    #[test]
    fn pairs_are_kept_per_round_and_kind() {
        let (_, ctxs) = make_committee(4);
        let (a, b) = (Value::new(1).id(), Value::new(2).id());
        let address = *ibft_core_types::Context::address(&ctxs[1]);

        let mut evidence = EvidenceMap::<TestContext>::new();
        assert!(evidence.add(prepare(&ctxs[1], 5, 1, a), prepare(&ctxs[1], 5, 1, b)));
        assert!(evidence.add(commit(&ctxs[1], 5, 1, a), commit(&ctxs[1], 5, 1, b)));
        assert!(evidence.add(prepare(&ctxs[1], 5, 2, a), prepare(&ctxs[1], 5, 2, b)));

        // The same pair in the other order.
        assert!(!evidence.add(prepare(&ctxs[1], 5, 1, b), prepare(&ctxs[1], 5, 1, a)));

        assert_eq!(evidence.len(), 3);
        assert_eq!(evidence.conflicts(&address, Round::FIRST, MessageKind::Prepare).len(), 1);
        assert_eq!(evidence.conflicts(&address, Round::FIRST, MessageKind::Commit).len(), 1);
        assert!(evidence.conflicts(&address, Round::new(2), MessageKind::Commit).is_empty());
        assert_eq!(evidence.of(&address).count(), 3);
        assert_eq!(evidence.offenders().collect::<Vec<_>>(), vec![&address]);
    }

    #[test]
    fn messages_that_do_not_conflict_are_not_recorded() {
        let (_, ctxs) = make_committee(4);
        let a = Value::new(1).id();

        let mut evidence = EvidenceMap::<TestContext>::new();
        let cases = [
            (prepare(&ctxs[1], 5, 1, a), prepare(&ctxs[1], 5, 1, a)),
            (prepare(&ctxs[1], 5, 1, a), prepare(&ctxs[2], 5, 1, a)),
            (prepare(&ctxs[1], 5, 1, a), commit(&ctxs[1], 5, 1, a)),
            (prepare(&ctxs[1], 5, 1, a), prepare(&ctxs[1], 5, 2, a)),
        ];

        for (existing, conflicting) in cases {
            assert!(!evidence.add(existing, conflicting));
        }

        assert!(evidence.is_empty());
    }
}
