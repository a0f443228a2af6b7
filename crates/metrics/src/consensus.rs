use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, linear_buckets, Histogram};

use ibft_core_consensus::Rejection;

use crate::SharedRegistry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RejectionLabels {
    pub reason: String,
}

#[derive(Clone, Debug)]
pub struct Metrics(Arc<Inner>);

impl Deref for Metrics {
    type Target = Inner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub struct Inner {
    /// Number of heights decided
    pub decisions: Counter,

    /// Time from the start of a height to its decision, in seconds
    pub decision_latency: Histogram,

    /// The round each height was decided in
    pub decision_round: Histogram,

    /// Number of times the committee moved to a new round
    pub round_changes: Counter,

    /// Number of round timers that fired
    pub timeouts: Counter,

    /// Number of inbound messages rejected, by reason
    pub rejections: Family<RejectionLabels, Counter>,

    /// Number of inbound messages put aside for a later round
    pub buffered_messages: Counter,

    /// Number of operators caught sending two different messages
    pub equivocations: Counter,

    /// The height currently running
    pub height: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self(Arc::new(Inner {
            decisions: Counter::default(),
            decision_latency: Histogram::new(exponential_buckets(0.05, 2.0, 12)),
            decision_round: Histogram::new(linear_buckets(1.0, 1.0, 16)),
            round_changes: Counter::default(),
            timeouts: Counter::default(),
            rejections: Family::default(),
            buffered_messages: Counter::default(),
            equivocations: Counter::default(),
            height: Gauge::default(),
        }))
    }

    pub fn register(registry: &SharedRegistry) -> Self {
        let metrics = Self::new();

        registry.with_prefix("ibft_consensus", |registry| {
            registry.register(
                "decisions",
                "Number of heights decided",
                metrics.decisions.clone(),
            );

            registry.register(
                "decision_latency",
                "Time from the start of a height to its decision, in seconds",
                metrics.decision_latency.clone(),
            );

            registry.register(
                "decision_round",
                "The round each height was decided in",
                metrics.decision_round.clone(),
            );

            registry.register(
                "round_changes",
                "Number of times the committee moved to a new round",
                metrics.round_changes.clone(),
            );

            registry.register(
                "timeouts",
                "Number of round timers that fired",
                metrics.timeouts.clone(),
            );

            registry.register(
                "rejections",
                "Number of inbound messages rejected, by reason",
                metrics.rejections.clone(),
            );

            registry.register(
                "buffered_messages",
                "Number of inbound messages put aside for a later round",
                metrics.buffered_messages.clone(),
            );

            registry.register(
                "equivocations",
                "Number of operators caught sending two different messages",
                metrics.equivocations.clone(),
            );

            registry.register(
                "height",
                "The height currently running",
                metrics.height.clone(),
            );
        });

        metrics
    }

    pub fn observe_decision(&self, round: u64, latency: Duration) {
        self.decisions.inc();
        self.decision_round.observe(round as f64);
        self.decision_latency.observe(latency.as_secs_f64());
    }

    pub fn observe_rejection(&self, reason: Rejection) {
        if reason == Rejection::Equivocation {
            self.equivocations.inc();
        }

        self.rejections
            .get_or_create(&RejectionLabels {
                reason: reason.as_str().to_string(),
            })
            .inc();
    }

    pub fn set_height(&self, height: u64) {
        self.height.set(i64::try_from(height).unwrap_or(i64::MAX));
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
