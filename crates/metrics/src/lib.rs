//! Prometheus metrics of the consensus engine.

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

mod consensus;
mod registry;

pub use consensus::{Metrics, RejectionLabels};
pub use registry::{export, SharedRegistry};

pub use prometheus_client::metrics::counter::Counter;
pub use prometheus_client::metrics::family::Family;
pub use prometheus_client::metrics::gauge::Gauge;
pub use prometheus_client::metrics::histogram::{exponential_buckets, linear_buckets, Histogram};
pub use prometheus_client::registry::Registry;
