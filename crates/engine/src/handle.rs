use derive_where::derive_where;
use tokio::sync::mpsc::{self, error::TrySendError};

use ibft_core_types::{Context, SignedMessage};
use ibft_events::{CommitteeDuty, Duty, DutyEvent};

use crate::{EngineError, Msg};

/// Input side of an engine. Clones feed the same queue.
#[derive_where(Clone, Debug)]
pub struct InstanceHandle<Ctx: Context> {
    tx: mpsc::Sender<Msg<Ctx>>,
}

impl<Ctx: Context> InstanceHandle<Ctx> {
    pub(crate) fn new(tx: mpsc::Sender<Msg<Ctx>>) -> Self {
        Self { tx }
    }

    /// Queue an input, waiting for room if the queue is full.
    pub async fn send(&self, msg: impl Into<Msg<Ctx>>) -> Result<(), EngineError<Ctx>> {
        self.tx
            .send(msg.into())
            .await
            .map_err(|_| EngineError::Stopped)
    }

    /// Queue an input without waiting, for callers outside of an async context.
    pub fn try_send(&self, msg: impl Into<Msg<Ctx>>) -> Result<(), EngineError<Ctx>> {
        self.tx.try_send(msg.into()).map_err(|e| match e {
            TrySendError::Full(_) => EngineError::QueueFull,
            TrySendError::Closed(_) => EngineError::Stopped,
        })
    }

    pub async fn deliver(&self, message: SignedMessage<Ctx>) -> Result<(), EngineError<Ctx>> {
        self.send(Msg::Network(message)).await
    }

    pub async fn execute_duty(&self, duty: Duty<Ctx>) -> Result<(), EngineError<Ctx>> {
        self.send(DutyEvent::ExecuteDuty(duty)).await
    }

    pub async fn execute_committee_duty(
        &self,
        duty: CommitteeDuty<Ctx>,
    ) -> Result<(), EngineError<Ctx>> {
        self.send(DutyEvent::ExecuteCommitteeDuty(duty)).await
    }

    /// Ask the engine to stop once it has handled what is already queued.
    pub async fn shutdown(&self) -> Result<(), EngineError<Ctx>> {
        self.send(Msg::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
