//! Tally consensus messages per round and per kind, and report quorums.

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

pub mod count;
pub mod evidence;
pub mod round_messages;
pub mod tracker;

pub use evidence::EvidenceMap;
pub use tracker::{QuorumError, QuorumTracker};

use ibft_core_types::ValueDigest;

/// Represents the different quorum thresholds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Threshold {
    /// No quorum has been reached yet
    Unreached,

    /// Quorum of distinct senders, regardless of the values they carry
    Any,

    /// Quorum for a value
    Value(ValueDigest),
}

impl Threshold {
    pub const fn is_reached(&self) -> bool {
        !matches!(self, Threshold::Unreached)
    }
}
