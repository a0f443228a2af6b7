use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use ibft_core_consensus::{Implementor, Input, Instance, Output, Params};
use ibft_core_types::{Context, Height, LinearTimeouts, Round, SignedMessage, Timeout};
use ibft_events::{DutyEvent, EventBus, InstanceEvent};
use ibft_metrics::Metrics;

use crate::controller::{HeightController, Route};
use crate::{DecidedStore, EngineError, InstanceHandle, Msg, Timers};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub params: Params,
    pub timeouts: LinearTimeouts,

    /// Capacity of the ingress queue
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            params: Params::default(),
            timeouts: LinearTimeouts::default(),
            queue_capacity: 1024,
        }
    }
}

/// Runs the consensus instance of the current height on a single task.
///
/// Network messages, duties and timer expiries are all delivered through one queue, so the
/// instance only ever sees one input at a time. Outputs are published on the event bus.
pub struct Engine<Ctx, I, S>
where
    Ctx: Context,
{
    ctx: Ctx,
    committee: Ctx::Committee,
    implementor: I,
    params: Params,
    store: S,
    bus: EventBus<InstanceEvent<Ctx>>,
    metrics: Metrics,
    controller: HeightController<Ctx, I>,
    timers: Timers<Ctx>,
    rx: mpsc::Receiver<Msg<Ctx>>,
    started_at: Instant,
    round: Round,
}

impl<Ctx, I, S> Engine<Ctx, I, S>
where
    Ctx: Context,
    I: Implementor<Ctx> + 'static,
    S: DecidedStore<Ctx>,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ctx: Ctx,
        committee: Ctx::Committee,
        implementor: I,
        config: EngineConfig,
        store: S,
        bus: EventBus<InstanceEvent<Ctx>>,
        metrics: Metrics,
    ) -> (Self, InstanceHandle<Ctx>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let timers = Timers::new(config.timeouts, &tx);

        let engine = Self {
            ctx,
            committee,
            implementor,
            params: config.params,
            store,
            bus,
            metrics,
            controller: HeightController::new(),
            timers,
            rx,
            started_at: Instant::now(),
            round: Round::FIRST,
        };

        (engine, InstanceHandle::new(tx))
    }

    pub fn spawn(self) -> JoinHandle<Result<(), EngineError<Ctx>>> {
        tokio::spawn(self.run())
    }

    /// Handle inputs until shutdown, until every handle is dropped, or until the instance
    /// hits a fatal error, which is returned.
    pub async fn run(mut self) -> Result<(), EngineError<Ctx>> {
        let address = self.ctx.address().clone();
        info!(%address, "Engine started");

        while let Some(msg) = self.rx.recv().await {
            let result = match msg {
                Msg::Shutdown => break,
                Msg::Network(message) => self.on_message(message).await,
                Msg::Duty(event) => self.on_duty(event).await,
            };

            if let Err(e) = result {
                self.timers.reset().await;
                error!(%address, height = ?self.controller.height(), "Engine stopped: {e}");
                return Err(e);
            }
        }

        self.timers.reset().await;
        info!(%address, "Engine stopped");

        Ok(())
    }

    async fn on_duty(&mut self, event: DutyEvent<Ctx>) -> Result<(), EngineError<Ctx>> {
        match event {
            DutyEvent::Timeout(data) => self.on_timeout(Timeout::from(data)).await,
            DutyEvent::ExecuteDuty(duty) => self.start_height(duty.height, duty.value, None).await,
            DutyEvent::ExecuteCommitteeDuty(duty) => {
                self.start_height(duty.height, duty.value, Some(duty.committee))
                    .await
            }
        }
    }

    async fn start_height(
        &mut self,
        height: Height,
        value: Ctx::Value,
        committee: Option<Ctx::Committee>,
    ) -> Result<(), EngineError<Ctx>> {
        if !self.controller.accepts(height) {
            debug!(%height, current = ?self.controller.height(), "Ignoring duty for a height that is not ahead");
            return Ok(());
        }

        let committee = committee.unwrap_or_else(|| self.committee.clone());

        let instance = match Instance::new(
            self.ctx.clone(),
            committee.clone(),
            height,
            self.params,
            self.implementor.clone(),
            value,
        ) {
            Ok(instance) => instance,
            Err(e) => {
                warn!(%height, "Cannot run duty: {e}");
                return Ok(());
            }
        };

        self.timers.reset().await;

        if let Err(current) = self.controller.replace(instance) {
            debug!(%height, %current, "Height did not move forward");
            return Ok(());
        }

        self.committee = committee;
        self.started_at = Instant::now();
        self.round = Round::FIRST;
        self.metrics.set_height(height.as_u64());

        info!(%height, "Starting height");
        self.publish(InstanceEvent::Started { height });

        self.process(height, Input::Start).await
    }

    async fn on_message(&mut self, message: SignedMessage<Ctx>) -> Result<(), EngineError<Ctx>> {
        let height = message.height();

        match self.controller.route(height) {
            Route::Current => self.process(height, Input::Message(message)).await,

            route => {
                debug!(
                    %height,
                    current = ?self.controller.height(),
                    sender = %message.sender(),
                    kind = %message.kind(),
                    ?route,
                    "Dropping message for another height"
                );

                Ok(())
            }
        }
    }

    async fn on_timeout(&mut self, timeout: Timeout) -> Result<(), EngineError<Ctx>> {
        if self.controller.route(timeout.height) != Route::Current {
            debug!(%timeout, "Ignoring timeout for another height");
            return Ok(());
        }

        self.metrics.timeouts.inc();
        self.publish(InstanceEvent::TimedOut(timeout));

        self.process(timeout.height, Input::TimeoutElapsed(timeout))
            .await
    }

    async fn process(&mut self, height: Height, input: Input<Ctx>) -> Result<(), EngineError<Ctx>> {
        let Some(instance) = self.controller.get_mut(height) else {
            return Ok(());
        };

        let outputs = instance.process(input)?;

        for output in outputs {
            self.on_output(output).await;
        }

        Ok(())
    }

    async fn on_output(&mut self, output: Output<Ctx>) {
        match output {
            Output::PhaseEntered {
                height,
                round,
                phase,
            } => {
                if round > self.round {
                    self.round = round;
                    self.metrics.round_changes.inc();
                }

                self.publish(InstanceEvent::PhaseEntered {
                    height,
                    round,
                    phase,
                });
            }

            Output::Broadcast(message) => {
                self.publish(InstanceEvent::Broadcast(message));
            }

            Output::ScheduleTimeout(timeout) => {
                self.timers.replace(timeout).await;
            }

            Output::Decided { record, value } => {
                self.timers.reset().await;

                if let Err(e) = self.store.store(&record, &value) {
                    error!(
                        height = %record.height,
                        round = %record.round,
                        value_id = %record.value_id,
                        "Failed to store decision, not announcing it: {e}"
                    );
                    return;
                }

                self.metrics
                    .observe_decision(record.round.as_u64(), self.started_at.elapsed());

                self.publish(InstanceEvent::Decided { record, value });
            }

            Output::Rejected { reason, .. } => {
                self.metrics.observe_rejection(reason);
            }

            Output::Buffered { .. } => {
                self.metrics.buffered_messages.inc();
            }
        }
    }

    fn publish(&self, event: InstanceEvent<Ctx>) {
        self.bus.notify(event.name(), &event);
    }
}
