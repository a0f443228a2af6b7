use derive_where::derive_where;

use ibft_core_types::{Context, Height};

/// Reasons the engine task stopped.
#[derive_where(Debug)]
#[derive(thiserror::Error)]
pub enum EngineError<Ctx: Context> {
    /// The instance hit a fatal error, eg. a safety violation.
    #[error("Consensus error: {0}")]
    Consensus(#[from] ibft_core_consensus::Error<Ctx>),

    /// The engine task is gone and cannot take any more input.
    #[error("Engine is stopped")]
    Stopped,

    /// The ingress queue is full.
    #[error("Engine queue is full")]
    QueueFull,
}

/// A decision could not be persisted.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A different decision is already stored for the height.
    #[error("A different decision is already stored for height {0}")]
    Conflict(Height),

    #[error("Store failure: {0}")]
    Backend(String),
}
