//! The agreement state machine for one height.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use tracing::{debug, error, info, warn};

use ibft_core_types::{
    CommitSignature, Committee, Context, DecidedRecord, Height, Message, MessageKind, Payload,
    Phase, Round, RoundChangeJustification, SignedMessage, SigningProvider, Timeout, Value,
    ValueDigest,
};
use ibft_core_votekeeper::{QuorumTracker, Threshold};

use crate::validation::{self, View};
use crate::{
    select_proposal_value, Error, Implementor, Input, Justifier, Output, Params, Rejection, State,
};

/// Where a message handled by the instance came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Origin {
    /// Received from the network.
    Remote,

    /// Unpacked from the round-change justification of a buffered PrePrepare.
    Relayed,

    /// Produced by this instance.
    Local,
}

/// The work produced by a single input.
struct Step<Ctx: Context> {
    queue: VecDeque<(SignedMessage<Ctx>, Origin)>,
    outputs: Vec<Output<Ctx>>,
}

impl<Ctx: Context> Step<Ctx> {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            outputs: Vec::new(),
        }
    }

    fn push(&mut self, output: Output<Ctx>) {
        self.outputs.push(output);
    }
}

/// Drives one height from the first PrePrepare to a decision.
///
/// Inputs are processed one at a time; every own message is signed, returned as a
/// [`Output::Broadcast`] and fed back through the same admission path as remote ones.
pub struct Instance<Ctx, I>
where
    Ctx: Context,
{
    ctx: Ctx,
    committee: Ctx::Committee,
    implementor: I,
    params: Params,
    quorum: usize,
    duty_value: Ctx::Value,
    state: State<Ctx>,
}

impl<Ctx, I> Instance<Ctx, I>
where
    Ctx: Context,
    I: Implementor<Ctx>,
{
    /// Create an instance for `height`, which will propose `duty_value` whenever it leads a
    /// round without any previously prepared value to carry over.
    pub fn new(
        ctx: Ctx,
        committee: Ctx::Committee,
        height: Height,
        params: Params,
        implementor: I,
        duty_value: Ctx::Value,
    ) -> Result<Self, Error<Ctx>> {
        committee.check()?;

        if !committee.contains(ctx.address()) {
            return Err(Error::NotAMember(ctx.address().clone()));
        }

        let quorum = implementor.quorum(&committee);

        Ok(Self {
            ctx,
            committee,
            implementor,
            params,
            quorum,
            duty_value,
            state: State::new(height, quorum),
        })
    }

    pub fn height(&self) -> Height {
        self.state.height
    }

    pub fn round(&self) -> Round {
        self.state.round
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn decided(&self) -> Option<&DecidedRecord<Ctx>> {
        self.state.decided.as_ref()
    }

    pub fn is_halted(&self) -> bool {
        self.state.halted
    }

    pub fn tracker(&self) -> &QuorumTracker<Ctx> {
        &self.state.tracker
    }

    pub fn state(&self) -> &State<Ctx> {
        &self.state
    }

    pub fn committee(&self) -> &Ctx::Committee {
        &self.committee
    }

    pub fn address(&self) -> &Ctx::Address {
        self.ctx.address()
    }

    /// The leader of the given round at this height.
    pub fn leader(&self, round: Round) -> Option<&Ctx::Address> {
        self.implementor
            .leader(&self.committee, self.state.height, round)
    }

    /// Process one input and return the side effects to perform, in order.
    ///
    /// A fatal error halts the instance: every later call returns [`Error::Halted`].
    pub fn process(&mut self, input: Input<Ctx>) -> Result<Vec<Output<Ctx>>, Error<Ctx>> {
        if self.state.halted {
            return Err(Error::Halted(self.state.height));
        }

        let mut step = Step::new();

        let result = self
            .dispatch(input, &mut step)
            .and_then(|()| self.drain(&mut step));

        match result {
            Ok(()) => Ok(step.outputs),
            Err(e) => {
                error!(
                    height = %self.state.height, round = %self.state.round,
                    phase = %self.state.phase, error = %e,
                    "Fatal consensus error, halting instance"
                );

                self.state.halted = true;
                Err(e)
            }
        }
    }

    fn dispatch(&mut self, input: Input<Ctx>, step: &mut Step<Ctx>) -> Result<(), Error<Ctx>> {
        match input {
            Input::Start => {
                self.start(step);
                Ok(())
            }
            Input::Message(message) => {
                step.queue.push_back((message, Origin::Remote));
                Ok(())
            }
            Input::TimeoutElapsed(timeout) => {
                self.on_timeout(timeout, step);
                Ok(())
            }
        }
    }

    fn drain(&mut self, step: &mut Step<Ctx>) -> Result<(), Error<Ctx>> {
        while let Some((message, origin)) = step.queue.pop_front() {
            self.on_message(message, origin, step)?;
        }

        Ok(())
    }

    fn start(&mut self, step: &mut Step<Ctx>) {
        if self.state.started {
            debug!(height = %self.state.height, "Instance already started");
            return;
        }

        self.state.started = true;

        let (height, round) = (self.state.height, self.state.round);
        info!(%height, %round, leader = ?self.leader(round), "Starting instance");

        step.push(Output::PhaseEntered {
            height,
            round,
            phase: self.state.phase,
        });

        self.schedule_round_timer(round, step);

        if self.is_local_leader(round) {
            let message = Message::pre_prepare(
                height,
                round,
                self.ctx.address().clone(),
                self.duty_value.clone(),
                RoundChangeJustification::empty(),
            );

            self.broadcast(message, step);
        }
    }

    fn on_message(
        &mut self,
        message: SignedMessage<Ctx>,
        origin: Origin,
        step: &mut Step<Ctx>,
    ) -> Result<(), Error<Ctx>> {
        match self.admit(&message) {
            Ok(()) => self.apply(message, step),

            Err(Rejection::FutureRound) => {
                self.buffer(message, origin, step);
                Ok(())
            }

            Err(reason) => {
                self.reject(&message, origin, reason, step);
                Ok(())
            }
        }
    }

    /// Decide whether a message may be applied to the state.
    fn admit(&mut self, message: &SignedMessage<Ctx>) -> Result<(), Rejection> {
        if self.state.phase.is_decided() {
            return Err(Rejection::AlreadyDecided);
        }

        if message.height() != self.state.height {
            return Err(Rejection::WrongHeight);
        }

        if !self.committee.contains(message.sender()) {
            return Err(Rejection::UnknownSender);
        }

        validation::verify_signature::<Ctx>(self.ctx.signing_provider(), message)?;

        validation::check_round(
            message.kind(),
            message.round(),
            self.state.round,
            self.params.future_round_tolerance,
        )?;

        let view = self.view();

        match message.kind() {
            MessageKind::PrePrepare => self.implementor.validate_pre_prepare(&view, message),
            MessageKind::Prepare => self.implementor.validate_prepare(&view, message),
            MessageKind::Commit => self.implementor.validate_commit(&view, message),
            MessageKind::ChangeRound => self.implementor.validate_change_round(&view, message),
        }?;

        self.check_duplicate(message)
    }

    /// The first valid message per (sender, round, kind) wins.
    ///
    /// Only messages that passed validation get here, so an invalid message never ends up
    /// in the evidence.
    fn check_duplicate(&mut self, message: &SignedMessage<Ctx>) -> Result<(), Rejection> {
        let (round, kind) = (message.round(), message.kind());

        let existing = match kind {
            MessageKind::PrePrepare => self
                .state
                .proposals
                .get(&round)
                .filter(|p| p.sender() == message.sender()),
            _ => self.state.tracker.get(round, kind, message.sender()),
        };

        match existing {
            None => Ok(()),
            Some(existing) if existing.same_signed_content(message) => {
                Err(Rejection::DuplicateIgnored)
            }
            Some(existing) => {
                let existing = existing.clone();
                self.state
                    .tracker
                    .record_equivocation(existing, message.clone());

                Err(Rejection::Equivocation)
            }
        }
    }

    fn view(&self) -> View<'_, Ctx> {
        View {
            height: self.state.height,
            round: self.state.round,
            phase: self.state.phase,
            quorum: self.quorum,
            committee: &self.committee,
            verifier: self.ctx.signing_provider(),
            proposals: &self.state.proposals,
            tracker: &self.state.tracker,
        }
    }

    fn buffer(&mut self, message: SignedMessage<Ctx>, origin: Origin, step: &mut Step<Ctx>) {
        let (sender, kind, round) = (message.sender().clone(), message.kind(), message.round());

        // A leader's PrePrepare proves the ChangeRound quorum for its round,
        // which lets an instance that missed it catch up.
        let relayed = match &message.message.payload {
            Payload::PrePrepare { justification, .. } => justification.change_rounds.clone(),
            _ => Vec::new(),
        };

        if !self.state.buffer.insert(message) {
            self.reject_parts(&sender, kind, round, origin, Rejection::DuplicateIgnored, step);
            return;
        }

        debug!(
            height = %self.state.height, current = %self.state.round,
            %round, %kind, %sender, "Buffering message for a future round"
        );

        step.push(Output::Buffered {
            sender,
            kind,
            round,
        });

        step.queue
            .extend(relayed.into_iter().map(|m| (m, Origin::Relayed)));
    }

    fn reject(
        &self,
        message: &SignedMessage<Ctx>,
        origin: Origin,
        reason: Rejection,
        step: &mut Step<Ctx>,
    ) {
        self.reject_parts(
            message.sender(),
            message.kind(),
            message.round(),
            origin,
            reason,
            step,
        );
    }

    fn reject_parts(
        &self,
        sender: &Ctx::Address,
        kind: MessageKind,
        round: Round,
        origin: Origin,
        reason: Rejection,
        step: &mut Step<Ctx>,
    ) {
        let height = self.state.height;

        match origin {
            Origin::Local => {
                warn!(%height, %round, %kind, %reason, "Own message was not admitted");
            }

            Origin::Relayed => {
                debug!(%height, %round, %kind, %sender, %reason, "Dropping relayed ChangeRound");
            }

            Origin::Remote => {
                if reason.is_failure() {
                    warn!(%height, %round, %kind, %sender, %reason, "Rejected message");
                } else {
                    debug!(%height, %round, %kind, %sender, %reason, "Ignored message");
                }

                step.push(Output::Rejected {
                    sender: sender.clone(),
                    kind,
                    round,
                    reason,
                });
            }
        }
    }

    fn apply(&mut self, message: SignedMessage<Ctx>, step: &mut Step<Ctx>) -> Result<(), Error<Ctx>> {
        let (kind, round) = (message.kind(), message.round());

        if kind == MessageKind::PrePrepare {
            self.on_pre_prepare(message, step);
            return Ok(());
        }

        let threshold = self.state.tracker.add(message)?;

        match (kind, threshold) {
            (MessageKind::Prepare, Threshold::Value(value_id)) => {
                self.on_prepare_quorum(round, value_id, step)
            }
            (MessageKind::Commit, Threshold::Value(value_id)) => {
                self.on_commit_quorum(round, value_id, step)
            }
            (MessageKind::ChangeRound, Threshold::Any) => self.on_change_round_quorum(round, step),
            _ => (),
        }

        Ok(())
    }

    fn on_pre_prepare(&mut self, message: SignedMessage<Ctx>, step: &mut Step<Ctx>) {
        let round = message.round();
        let Some(value_id) = message.value_id() else {
            return;
        };

        debug!(
            height = %self.state.height, %round, %value_id,
            leader = %message.sender(), "Accepted PrePrepare"
        );

        self.state.proposals.insert(round, message);

        if self.state.phase != Phase::Idle {
            debug!(
                height = %self.state.height, %round, phase = %self.state.phase,
                "Not preparing, the instance already left the idle phase of this round"
            );
            return;
        }

        self.enter_phase(Phase::PrePrepared, step);

        let prepare = Message::prepare(
            self.state.height,
            round,
            self.ctx.address().clone(),
            value_id,
        );

        self.broadcast(prepare, step);
    }

    fn on_prepare_quorum(&mut self, round: Round, value_id: ValueDigest, step: &mut Step<Ctx>) {
        if round != self.state.round || self.state.phase != Phase::PrePrepared {
            debug!(
                height = %self.state.height, %round, %value_id, phase = %self.state.phase,
                "Prepare quorum outside the PrePrepared phase, not committing"
            );
            return;
        }

        debug!(height = %self.state.height, %round, %value_id, "Prepare quorum reached");

        self.enter_phase(Phase::Prepared, step);

        let commit = Message::commit(
            self.state.height,
            round,
            self.ctx.address().clone(),
            value_id,
        );

        self.broadcast(commit, step);
        self.enter_phase(Phase::Committed, step);
    }

    fn on_commit_quorum(&mut self, round: Round, value_id: ValueDigest, step: &mut Step<Ctx>) {
        let height = self.state.height;

        let Some(value) = self
            .state
            .proposed_value(round)
            .filter(|value| value.digest() == value_id)
            .cloned()
        else {
            warn!(%height, %round, %value_id, "Commit quorum without a matching proposal");
            return;
        };

        let commit_signatures = self
            .state
            .tracker
            .messages_for(round, MessageKind::Commit, &value_id)
            .into_iter()
            .map(|m| CommitSignature::new(m.message.sender, m.signature))
            .collect();

        let record = DecidedRecord::new(height, round, value_id, commit_signatures);

        info!(%height, %round, %value_id, "Decided");

        self.state.decided = Some(record.clone());
        self.state.timer_round = None;
        self.state.target_round = None;
        self.state.buffer.clear();
        self.enter_phase(Phase::Decided, step);

        step.push(Output::Decided { record, value });
    }

    fn on_change_round_quorum(&mut self, round: Round, step: &mut Step<Ctx>) {
        if round <= self.state.round {
            return;
        }

        let height = self.state.height;
        info!(%height, from = %self.state.round, to = %round, "ChangeRound quorum reached, moving to new round");

        self.state.round = round;
        self.state.phase = Phase::Idle;
        self.state.target_round = None;
        self.state.own_change_round = None;
        self.state.buffer.discard_below(round);

        step.push(Output::PhaseEntered {
            height,
            round,
            phase: Phase::Idle,
        });

        self.schedule_round_timer(round, step);

        if self.is_local_leader(round) {
            let change_rounds = self.state.tracker.messages(round, MessageKind::ChangeRound);

            let value = select_proposal_value(&change_rounds)
                .map(|prepared| prepared.value.clone())
                .unwrap_or_else(|| self.duty_value.clone());

            debug!(%height, %round, value_id = %value.digest(), "Proposing as the new leader");

            let message = Message::pre_prepare(
                height,
                round,
                self.ctx.address().clone(),
                value,
                RoundChangeJustification::new(change_rounds),
            );

            self.broadcast(message, step);
        }

        let buffered = self.state.buffer.take_round(round);
        step.queue
            .extend(buffered.into_iter().map(|m| (m, Origin::Remote)));
    }

    fn on_timeout(&mut self, timeout: Timeout, step: &mut Step<Ctx>) {
        let height = self.state.height;

        if timeout.height != height
            || self.state.phase.is_decided()
            || self.state.timer_round != Some(timeout.round)
        {
            debug!(%height, %timeout, "Ignoring timeout that is not the pending round timer");
            return;
        }

        let current = self.state.round;
        let cap = current.add(self.params.future_round_tolerance);

        let target = match (self.state.phase, self.state.target_round) {
            (Phase::ChangingRound, Some(target)) => target.next(),
            _ => current.next(),
        }
        .min(cap);

        // The target cannot move past what peers accept: resend the pending ChangeRound.
        if self.state.target_round == Some(target) {
            if let Some(change_round) = self.state.own_change_round.clone() {
                warn!(%height, round = %current, %target, "Round change still pending, rebroadcasting");
                step.push(Output::Broadcast(change_round));
            }

            self.schedule_round_timer(target, step);
            return;
        }

        warn!(%height, round = %current, %target, phase = %self.state.phase, "Round timed out, asking for a round change");

        self.state.target_round = Some(target);
        self.enter_phase(Phase::ChangingRound, step);

        let (prepared, justification) =
            Justifier::build(&self.state.tracker, &self.state.proposals);

        let message = Message::change_round(
            height,
            target,
            self.ctx.address().clone(),
            prepared,
            justification,
        );

        let signed = self.broadcast(message, step);
        self.state.own_change_round = Some(signed);

        self.schedule_round_timer(target, step);
    }

    fn enter_phase(&mut self, phase: Phase, step: &mut Step<Ctx>) {
        if self.state.phase == phase {
            return;
        }

        self.state.phase = phase;

        step.push(Output::PhaseEntered {
            height: self.state.height,
            round: self.state.round,
            phase,
        });
    }

    fn schedule_round_timer(&mut self, round: Round, step: &mut Step<Ctx>) {
        self.state.timer_round = Some(round);
        step.push(Output::ScheduleTimeout(Timeout::new(self.state.height, round)));
    }

    fn is_local_leader(&self, round: Round) -> bool {
        self.implementor.is_leader(
            &self.committee,
            self.state.height,
            round,
            self.ctx.address(),
        )
    }

    /// Sign, broadcast and feed back an own message.
    ///
    /// The own message is handled before anything else queued, so that it counts before
    /// the messages that depend on it, eg. buffered Commits behind the own Prepare.
    fn broadcast(&self, message: Message<Ctx>, step: &mut Step<Ctx>) -> SignedMessage<Ctx> {
        let signature = self.ctx.signing_provider().sign(&message.to_sign_bytes());
        let signed = SignedMessage::new(message, signature);

        step.push(Output::Broadcast(signed.clone()));
        step.queue.push_front((signed.clone(), Origin::Local));

        signed
    }
}
