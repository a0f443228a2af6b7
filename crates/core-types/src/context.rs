use core::fmt::Debug;

use crate::{Address, Committee, Operator, SigningProvider, Value};

/// This trait allows to abstract over the various datatypes
/// that are used in the consensus core.
pub trait Context
where
    Self: Sized + Clone + Send + Sync + 'static,
{
    /// The type of address of an operator.
    type Address: Address;

    /// The type of value that can be proposed.
    type Value: Value;

    /// The type of operator.
    type Operator: Operator<Self>;

    /// The type of committee.
    type Committee: Committee<Self>;

    /// The type of signatures over messages.
    type Signature: Clone + Debug + PartialEq + Eq + Send + Sync + 'static;

    /// The signing and verification capability.
    type SigningProvider: SigningProvider<Self>;

    /// The signing provider of the local operator.
    fn signing_provider(&self) -> &Self::SigningProvider;

    /// The address of the local operator.
    fn address(&self) -> &Self::Address;
}
