//! Tokio runtime around the consensus instance: one task per operator owns the instance of
//! the current height and serializes every input through a single queue.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    variant_size_differences
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

mod controller;
mod engine;
mod error;
mod handle;
mod msg;
mod store;
mod timers;

pub use controller::{HeightController, Route};
pub use engine::{Engine, EngineConfig};
pub use error::{EngineError, StoreError};
pub use handle::InstanceHandle;
pub use msg::Msg;
pub use store::{DecidedStore, InMemoryStore};
pub use timers::Timers;
