//! Core types and capability traits for the IBFT consensus core.

#![no_std]
#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    // missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    variant_size_differences
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

extern crate alloc;

mod committee;
mod context;
mod decided;
mod height;
mod justification;
mod message;
mod phase;
mod round;
mod signing;
mod timeout;
mod value;

pub use committee::{fault_tolerance, quorum_size, Address, Committee, CommitteeError, Operator};
pub use context::Context;
pub use decided::{CommitSignature, DecidedRecord};
pub use height::Height;
pub use justification::{PrepareJustification, RoundChangeJustification};
pub use message::{Message, MessageKind, Payload, PreparedValue, SignedMessage};
pub use phase::Phase;
pub use round::Round;
pub use signing::SigningProvider;
pub use timeout::{LinearTimeouts, Timeout};
pub use value::{Value, ValueDigest};

/// Type alias to make it easier to refer the `Signature` type of a given `Context`.
pub type Signature<Ctx> = <Ctx as Context>::Signature;
