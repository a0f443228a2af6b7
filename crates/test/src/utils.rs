//! Helpers to build committees and signed messages in tests.

use rand::rngs::StdRng;
use rand::SeedableRng;

use ibft_core_types::{Height, Message, Round, ValueDigest};

use crate::{
    Address, Committee, Operator, PrepareJustification, PreparedValue, PrivateKey,
    RoundChangeJustification, SignedMessage, TestContext, Value,
};

/// `n` operators with deterministic keys, in committee order.
pub fn make_operators(n: usize) -> Vec<(Operator, PrivateKey)> {
    make_operators_with_seed(n, 0x1BF7)
}

pub fn make_operators_with_seed(n: usize, seed: u64) -> Vec<(Operator, PrivateKey)> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n)
        .map(|_| {
            let sk = PrivateKey::generate(&mut rng);
            (Operator::new(sk.public_key()), sk)
        })
        .collect()
}

/// A committee of `n` operators together with their contexts, in committee order.
pub fn make_committee(n: usize) -> (Committee, Vec<TestContext>) {
    let operators = make_operators(n);
    let committee = Committee::new(operators.iter().map(|(op, _)| *op));
    let contexts = operators
        .into_iter()
        .map(|(_, sk)| TestContext::new(sk))
        .collect();

    (committee, contexts)
}

/// Sign a message with the given context's key.
pub fn sign(ctx: &TestContext, message: Message<TestContext>) -> SignedMessage {
    let signature = ctx.private_key().sign(&message.to_sign_bytes());
    SignedMessage::new(message, signature)
}

fn address(ctx: &TestContext) -> Address {
    *ibft_core_types::Context::address(ctx)
}

pub fn pre_prepare(ctx: &TestContext, height: u64, round: u64, value: Value) -> SignedMessage {
    pre_prepare_justified(ctx, height, round, value, RoundChangeJustification::empty())
}

pub fn pre_prepare_justified(
    ctx: &TestContext,
    height: u64,
    round: u64,
    value: Value,
    justification: RoundChangeJustification,
) -> SignedMessage {
    let message = Message::pre_prepare(
        Height::new(height),
        Round::new(round),
        address(ctx),
        value,
        justification,
    );
    sign(ctx, message)
}

pub fn prepare(ctx: &TestContext, height: u64, round: u64, value_id: ValueDigest) -> SignedMessage {
    let message = Message::prepare(Height::new(height), Round::new(round), address(ctx), value_id);
    sign(ctx, message)
}

pub fn commit(ctx: &TestContext, height: u64, round: u64, value_id: ValueDigest) -> SignedMessage {
    let message = Message::commit(Height::new(height), Round::new(round), address(ctx), value_id);
    sign(ctx, message)
}

/// A ChangeRound without any prepared value.
pub fn change_round(ctx: &TestContext, height: u64, round: u64) -> SignedMessage {
    change_round_prepared(ctx, height, round, None, PrepareJustification::empty())
}

pub fn change_round_prepared(
    ctx: &TestContext,
    height: u64,
    round: u64,
    prepared: Option<PreparedValue>,
    justification: PrepareJustification,
) -> SignedMessage {
    let message = Message::change_round(
        Height::new(height),
        Round::new(round),
        address(ctx),
        prepared,
        justification,
    );
    sign(ctx, message)
}

/// Prepares from the given contexts for the same height, round and digest.
pub fn prepares<'a>(
    contexts: impl IntoIterator<Item = &'a TestContext>,
    height: u64,
    round: u64,
    value_id: ValueDigest,
) -> Vec<SignedMessage> {
    contexts
        .into_iter()
        .map(|ctx| prepare(ctx, height, round, value_id))
        .collect()
}
