use core::fmt::{Debug, Display};
use core::hash::Hash;

use crate::Context;

/// Stable identifier of an operator, derived from its public key.
pub trait Address
where
    Self: Clone + Debug + Display + Eq + Ord + Hash + Send + Sync + 'static,
{
    /// The raw bytes of the identifier, as committed to in signing bytes.
    fn as_bytes(&self) -> &[u8];
}

/// One member of the consensus committee.
pub trait Operator<Ctx>
where
    Self: Clone + Debug + PartialEq + Eq + Send + Sync,
    Ctx: Context,
{
    /// The identifier of the operator.
    fn address(&self) -> &Ctx::Address;
}

/// Errors raised when a committee cannot run consensus.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommitteeError {
    /// Fewer than `3f + 1` operators for `f = 1`.
    #[error("Committee of {size} operators is too small, at least 4 are required")]
    TooSmall { size: usize },

    /// The same operator appears twice in the ordered list.
    #[error("Operator at position {index} appears more than once in the committee")]
    DuplicateOperator { index: usize },
}

/// The static, ordered view of the operators for one instance.
///
/// The order is the order used by the leader rotation and must be identical on all operators.
pub trait Committee<Ctx>
where
    Self: Clone + Debug + PartialEq + Eq + Send + Sync,
    Ctx: Context,
{
    /// The operators, in committee order.
    fn operators(&self) -> &[Ctx::Operator];

    /// The number of operators in the committee.
    fn len(&self) -> usize {
        self.operators().len()
    }

    /// Whether the committee has no operators.
    fn is_empty(&self) -> bool {
        self.operators().is_empty()
    }

    /// The operator at the given position, if any.
    fn get_by_index(&self, index: usize) -> Option<&Ctx::Operator> {
        self.operators().get(index)
    }

    /// The operator with the given address, if any.
    fn get_by_address(&self, address: &Ctx::Address) -> Option<&Ctx::Operator> {
        self.operators().iter().find(|op| op.address() == address)
    }

    /// Whether the given address belongs to the committee.
    fn contains(&self, address: &Ctx::Address) -> bool {
        self.get_by_address(address).is_some()
    }

    /// The number of faulty operators `f` the committee tolerates.
    fn fault_tolerance(&self) -> usize {
        fault_tolerance(self.len())
    }

    /// The quorum size `q = 2f + 1`.
    fn quorum_size(&self) -> usize {
        quorum_size(self.len())
    }

    /// Check that the committee is large enough and has no duplicate operators.
    fn check(&self) -> Result<(), CommitteeError> {
        let operators = self.operators();

        if operators.len() < 4 {
            return Err(CommitteeError::TooSmall {
                size: operators.len(),
            });
        }

        for (index, op) in operators.iter().enumerate() {
            if operators[..index]
                .iter()
                .any(|other| other.address() == op.address())
            {
                return Err(CommitteeError::DuplicateOperator { index });
            }
        }

        Ok(())
    }
}

/// `f = (n - 1) / 3`, the largest `f` such that `n >= 3f + 1`.
pub const fn fault_tolerance(n: usize) -> usize {
    n.saturating_sub(1) / 3
}

/// `q = 2f + 1`.
pub const fn quorum_size(n: usize) -> usize {
    2 * fault_tolerance(n) + 1
}
