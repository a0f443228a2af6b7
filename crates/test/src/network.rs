//! A deterministic in-memory committee for driving many instances at once.

use std::collections::VecDeque;

use rand::Rng;
use tracing::debug;

use ibft_core_consensus::{
    Error, Input, Instance, Output, Params, Rejection, RoundRobin, StandardImplementor,
};
use ibft_core_types::{Height, MessageKind, Phase, Round, Timeout};

use crate::utils::make_committee;
use crate::{Address, Committee, DecidedRecord, SignedMessage, TestContext, Value};

pub type TestInstance = Instance<TestContext, StandardImplementor<RoundRobin>>;

/// A message in flight between two nodes.
#[derive(Clone, Debug)]
pub struct Envelope {
    pub from: usize,
    pub to: usize,
    pub message: SignedMessage,
}

/// A rejection observed by a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejected {
    pub sender: Address,
    pub kind: MessageKind,
    pub round: Round,
    pub reason: Rejection,
}

/// One operator of the simulated committee.
pub struct Node {
    pub context: TestContext,
    pub instance: TestInstance,
    pub silent: bool,
    pub pending_timeout: Option<Timeout>,
    pub decision: Option<(DecidedRecord, Value)>,
    pub rejections: Vec<Rejected>,
    pub buffered: usize,
    pub broadcasts: Vec<SignedMessage>,
    pub phases: Vec<(Round, Phase)>,
    pub error: Option<Error<TestContext>>,
}

impl Node {
    pub fn address(&self) -> Address {
        *self.instance.address()
    }

    /// The messages of the given kind this node broadcast.
    pub fn sent(&self, kind: MessageKind) -> Vec<&SignedMessage> {
        self.broadcasts.iter().filter(|m| m.kind() == kind).collect()
    }

    pub fn rejected(&self, reason: Rejection) -> usize {
        self.rejections.iter().filter(|r| r.reason == reason).count()
    }
}

type DropFilter = Box<dyn FnMut(&Envelope) -> bool>;

/// A committee of nodes connected by a single FIFO queue.
///
/// Nothing happens on its own: the test decides when messages are delivered and when
/// timers fire.
pub struct Network {
    committee: Committee,
    nodes: Vec<Node>,
    queue: VecDeque<Envelope>,
    drop_filter: Option<DropFilter>,
    delivered: usize,
}

impl Network {
    /// `n` nodes at `height`, node `i` proposing `value(i)` when it leads.
    pub fn new(n: usize, height: u64, value: impl Fn(usize) -> Value) -> Self {
        Self::with_params(n, height, Params::default(), value)
    }

    pub fn with_params(
        n: usize,
        height: u64,
        params: Params,
        value: impl Fn(usize) -> Value,
    ) -> Self {
        let (committee, contexts) = make_committee(n);

        let nodes = contexts
            .into_iter()
            .enumerate()
            .map(|(i, context)| {
                let instance = Instance::new(
                    context.clone(),
                    committee.clone(),
                    Height::new(height),
                    params,
                    StandardImplementor::default(),
                    value(i),
                )
                .expect("valid committee");

                Node {
                    context,
                    instance,
                    silent: false,
                    pending_timeout: None,
                    decision: None,
                    rejections: Vec::new(),
                    buffered: 0,
                    broadcasts: Vec::new(),
                    phases: Vec::new(),
                    error: None,
                }
            })
            .collect();

        Self {
            committee,
            nodes,
            queue: VecDeque::new(),
            drop_filter: None,
            delivered: 0,
        }
    }

    pub fn committee(&self) -> &Committee {
        &self.committee
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn context(&self, index: usize) -> &TestContext {
        &self.nodes[index].context
    }

    /// The index of the node leading the given round.
    pub fn leader(&self, round: u64) -> usize {
        let address = *self.nodes[0]
            .instance
            .leader(Round::new(round))
            .expect("non-empty committee");

        self.index_of(&address).expect("leader is a member")
    }

    pub fn index_of(&self, address: &Address) -> Option<usize> {
        self.nodes.iter().position(|n| n.address() == *address)
    }

    /// A silent node sends nothing and receives nothing.
    pub fn silence(&mut self, index: usize) {
        self.nodes[index].silent = true;
    }

    /// Drop every message for which `filter` returns `true`.
    pub fn drop_where(&mut self, filter: impl FnMut(&Envelope) -> bool + 'static) {
        self.drop_filter = Some(Box::new(filter));
    }

    pub fn clear_filter(&mut self) {
        self.drop_filter = None;
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Start every node that is not silent.
    pub fn start(&mut self) {
        for index in 0..self.nodes.len() {
            if !self.nodes[index].silent {
                self.process(index, Input::Start);
            }
        }
    }

    /// Feed an input directly to a node, bypassing the queue.
    pub fn process(&mut self, index: usize, input: Input<TestContext>) {
        if self.nodes[index].silent {
            return;
        }

        match self.nodes[index].instance.process(input) {
            Ok(outputs) => {
                for output in outputs {
                    self.handle(index, output);
                }
            }
            Err(e) => {
                debug!(node = index, error = %e, "Instance error");
                self.nodes[index].error = Some(e);
            }
        }
    }

    /// Deliver a message to one node, bypassing the queue.
    pub fn inject(&mut self, to: usize, message: SignedMessage) {
        self.process(to, Input::Message(message));
    }

    fn handle(&mut self, index: usize, output: Output<TestContext>) {
        let len = self.nodes.len();
        let node = &mut self.nodes[index];

        match output {
            Output::PhaseEntered { round, phase, .. } => node.phases.push((round, phase)),

            Output::Broadcast(message) => {
                node.broadcasts.push(message.clone());

                for to in (0..len).filter(|&to| to != index) {
                    self.queue.push_back(Envelope {
                        from: index,
                        to,
                        message: message.clone(),
                    });
                }
            }

            Output::ScheduleTimeout(timeout) => node.pending_timeout = Some(timeout),

            Output::Decided { record, value } => {
                node.pending_timeout = None;
                node.decision = Some((record, value));
            }

            Output::Rejected {
                sender,
                kind,
                round,
                reason,
            } => node.rejections.push(Rejected {
                sender,
                kind,
                round,
                reason,
            }),

            Output::Buffered { .. } => node.buffered += 1,
        }
    }

    /// Deliver the message at the head of the queue. Returns `false` if the queue is empty.
    pub fn step(&mut self) -> bool {
        match self.queue.pop_front() {
            Some(envelope) => {
                self.deliver(envelope);
                true
            }
            None => false,
        }
    }

    /// Deliver a random pending message, duplicating it with probability `duplicate`.
    pub fn step_random(&mut self, rng: &mut impl Rng, duplicate: f64) -> bool {
        if self.queue.is_empty() {
            return false;
        }

        let index = rng.gen_range(0..self.queue.len());
        let Some(envelope) = self.queue.remove(index) else {
            return false;
        };

        if rng.gen_bool(duplicate) {
            self.queue.push_back(envelope.clone());
        }

        self.deliver(envelope);
        true
    }

    fn deliver(&mut self, envelope: Envelope) {
        if let Some(filter) = self.drop_filter.as_mut() {
            if filter(&envelope) {
                return;
            }
        }

        if self.nodes[envelope.from].silent {
            return;
        }

        self.delivered += 1;
        self.process(envelope.to, Input::Message(envelope.message));
    }

    /// Deliver messages until the queue is empty, at most `limit` of them.
    pub fn run_until_quiet(&mut self, limit: usize) {
        for _ in 0..limit {
            if !self.step() {
                return;
            }
        }
    }

    /// Fire the pending round timer of every node.
    pub fn fire_timeouts(&mut self) {
        for index in 0..self.nodes.len() {
            if let Some(timeout) = self.nodes[index].pending_timeout.take() {
                self.process(index, Input::TimeoutElapsed(timeout));
            }
        }
    }

    /// The decision of every node, in committee order.
    pub fn decisions(&self) -> Vec<Option<&DecidedRecord>> {
        self.nodes
            .iter()
            .map(|n| n.decision.as_ref().map(|(record, _)| record))
            .collect()
    }

    /// The decisions of the nodes that are not silent.
    pub fn live_decisions(&self) -> Vec<Option<&DecidedRecord>> {
        self.nodes
            .iter()
            .filter(|n| !n.silent)
            .map(|n| n.decision.as_ref().map(|(record, _)| record))
            .collect()
    }

    pub fn all_live_decided(&self) -> bool {
        self.live_decisions().iter().all(Option::is_some)
    }
}
