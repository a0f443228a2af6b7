//! The IBFT agreement instance: leader election, message validation, justification
//! and the phase state machine for one height.

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

mod buffer;
mod error;
mod implementor;
mod input;
mod instance;
mod leader;
mod output;
mod params;
mod rejection;
mod state;

pub mod justification;
pub mod validation;

pub use buffer::FutureBuffer;
pub use error::Error;
pub use implementor::{Implementor, StandardImplementor};
pub use input::Input;
pub use instance::Instance;
pub use justification::{select_proposal_value, Justifier};
pub use leader::{LeaderElector, RoundRobin};
pub use output::Output;
pub use params::{Params, DEFAULT_FUTURE_ROUND_TOLERANCE};
pub use rejection::Rejection;
pub use state::State;
pub use validation::View;

pub use ibft_core_votekeeper::{EvidenceMap, QuorumTracker, Threshold};
