//! Duty triggers, instance notifications and the bus that carries them.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    variant_size_differences
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

mod bus;
mod duty;
mod instance;

pub use bus::{EventBus, Subscription};
pub use duty::{CommitteeDuty, Duty, DutyEvent, TimeoutData};
pub use instance::InstanceEvent;
