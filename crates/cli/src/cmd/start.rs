use color_eyre::eyre::{bail, eyre, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn, Instrument};

use ibft_config::Config;
use ibft_core_consensus::{Params, RoundRobin, StandardImplementor};
use ibft_core_types::{Committee as _, Height, Value as _};
use ibft_engine::{Engine, EngineConfig, EngineError, InMemoryStore, InstanceHandle};
use ibft_events::{Duty, EventBus, InstanceEvent, Subscription};
use ibft_metrics::{Metrics, SharedRegistry};
use ibft_test::utils::make_committee;
use ibft_test::{DecidedRecord, TestContext, Value};

use crate::metrics;

type Event = InstanceEvent<TestContext>;

struct Operator {
    index: usize,
    handle: InstanceHandle<TestContext>,
    decided: UnboundedReceiver<Event>,
    store: InMemoryStore<TestContext>,
    join: JoinHandle<Result<(), EngineError<TestContext>>>,
    _subscriptions: Vec<Subscription>,
}

/// Run every operator of the configured committee in this process, connected through their
/// event buses, and drive them through the configured number of heights.
pub async fn run(config: Config) -> Result<()> {
    let span = tracing::error_span!("node", moniker = %config.moniker);
    run_committee(config).instrument(span).await
}

async fn run_committee(config: Config) -> Result<()> {
    let simulation = &config.simulation;
    let (committee, contexts) = make_committee(simulation.operators);
    committee.check()?;

    if let Some(index) = simulation.silent.iter().find(|&&i| i >= simulation.operators) {
        bail!("Silent operator {index} is not part of a committee of {}", simulation.operators);
    }

    if simulation.silent.len() > committee.fault_tolerance() {
        warn!(
            silent = simulation.silent.len(),
            tolerated = committee.fault_tolerance(),
            "More operators are silent than the committee tolerates, no height will be decided"
        );
    }

    let registry = SharedRegistry::global();
    let metrics = Metrics::register(registry);

    if config.metrics.enabled {
        tokio::spawn(
            metrics::serve(config.metrics.listen_addr, registry.clone()).in_current_span(),
        );
    }

    let engine_config = EngineConfig {
        params: Params {
            future_round_tolerance: config.consensus.future_round_tolerance,
        },
        timeouts: config.timeouts.linear(),
        queue_capacity: config.consensus.queue_capacity,
    };

    let mut operators = Vec::new();
    let mut buses = Vec::new();

    for (index, ctx) in contexts.into_iter().enumerate() {
        if simulation.silent.contains(&index) {
            info!(index, "Operator is silent");
            continue;
        }

        let bus = EventBus::new();
        let store = InMemoryStore::new();
        let (decided, subscription) = bus.channel(Event::DECIDED);

        let (engine, handle) = Engine::new(
            ctx,
            committee.clone(),
            StandardImplementor::<RoundRobin>::default(),
            engine_config,
            store.clone(),
            bus.clone(),
            metrics.clone(),
        );

        let join = tokio::spawn(
            engine
                .run()
                .instrument(info_span!("operator", index))
                .in_current_span(),
        );

        buses.push(bus);
        operators.push(Operator {
            index,
            handle,
            decided,
            store,
            join,
            _subscriptions: vec![subscription],
        });
    }

    connect(&mut operators, &buses);

    info!(operators = simulation.operators, heights = simulation.heights, "Committee is starting");

    for h in 1..=simulation.heights {
        let height = Height::new(h);

        for op in &operators {
            op.handle.execute_duty(Duty::new(height, Value::new(h))).await?;
        }

        tokio::select! {
            result = decide(height, &mut operators) => result?,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
        }
    }

    for op in operators {
        op.handle.shutdown().await?;
        op.join.await??;

        info!(index = op.index, decided = op.store.len(), "Operator stopped");
    }

    for bus in buses {
        bus.shutdown();
    }

    Ok(())
}

/// Forward every broadcast of an operator to all the others.
fn connect(operators: &mut [Operator], buses: &[EventBus<Event>]) {
    let handles: Vec<_> = operators.iter().map(|op| op.handle.clone()).collect();

    for (i, (operator, bus)) in operators.iter_mut().zip(buses).enumerate() {
        for (j, handle) in handles.iter().enumerate() {
            if i == j {
                continue;
            }

            let handle = handle.clone();
            let subscription = bus.on(Event::BROADCAST, move |event| {
                if let Event::Broadcast(message) = event {
                    if let Err(e) = handle.try_send(message) {
                        warn!("Dropping broadcast: {e}");
                    }
                }
            });

            operator._subscriptions.push(subscription);
        }
    }
}

/// Wait for every running operator to decide `height` and check that they agree.
async fn decide(height: Height, operators: &mut [Operator]) -> Result<()> {
    let mut decided: Option<DecidedRecord> = None;

    for op in operators.iter_mut() {
        let (record, value) = loop {
            match op.decided.recv().await {
                Some(Event::Decided { record, value }) if record.height == height => {
                    break (record, value)
                }
                Some(_) => continue,
                None => return Err(eyre!("Operator {} stopped before deciding", op.index)),
            }
        };

        info!(
            index = op.index,
            %height,
            round = %record.round,
            value_id = %value.digest(),
            "Decided"
        );

        match decided.as_ref().map(|first| first.value_id) {
            Some(first) if first != record.value_id => {
                bail!(
                    "Operators disagree at height {height}: {first} and {}",
                    record.value_id
                );
            }
            Some(_) => {}
            None => decided = Some(record),
        }
    }

    Ok(())
}
