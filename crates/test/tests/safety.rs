use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ibft_core_consensus::{Params, Rejection};
use ibft_core_types::{MessageKind, Round};

use dvnode_ibft_test::utils::{commit, pre_prepare, prepare};
use dvnode_ibft_test::{Network, Value};

const HEIGHT: u64 = 5;

fn duty(i: usize) -> Value {
    Value::new(1_000 + i as u64)
}

/// Deliver in random order with duplicates, firing timers whenever the committee goes quiet.
fn run_shuffled(net: &mut Network, rng: &mut StdRng, rounds: usize) {
    for _ in 0..rounds {
        while net.step_random(rng, 0.1) {}

        if net.all_live_decided() {
            return;
        }

        net.fire_timeouts();
    }
}

fn assert_agreement(net: &Network, seed: u64) {
    let decided: Vec<_> = net.live_decisions().into_iter().flatten().collect();

    if let Some(first) = decided.first() {
        for record in &decided {
            assert_eq!(record.value_id, first.value_id, "seed {seed}: two values decided");
        }
    }

    for node in net.nodes() {
        assert!(node.error.is_none(), "seed {seed}: {:?}", node.error);
    }
}

#[test]
fn shuffled_delivery_never_decides_two_values() {
    for seed in 0..32 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut net = Network::new(4, HEIGHT, duty);

        net.start();
        run_shuffled(&mut net, &mut rng, 20);

        assert_agreement(&net, seed);
    }
}

#[test]
fn shuffled_delivery_with_a_crashed_operator() {
    for seed in 0..32 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut net = Network::new(4, HEIGHT, duty);

        let crashed = rng.gen_range(0..4);
        net.silence(crashed);
        net.start();
        run_shuffled(&mut net, &mut rng, 20);

        assert_agreement(&net, seed);
    }
}

#[test]
fn lossy_delivery_never_decides_two_values() {
    for seed in 0..16 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut net = Network::new(7, HEIGHT, duty);

        let mut drops = StdRng::seed_from_u64(seed ^ 0x5EED);
        net.drop_where(move |_| drops.gen_bool(0.2));
        net.start();
        run_shuffled(&mut net, &mut rng, 20);

        assert_agreement(&net, seed);
    }
}

#[test]
fn committee_recovers_after_losing_every_commit() {
    let mut net = Network::new(4, HEIGHT, duty);

    net.drop_where(|envelope| {
        envelope.message.kind() == MessageKind::Commit && envelope.message.round() == Round::FIRST
    });
    net.start();
    net.run_until_quiet(10_000);
    net.clear_filter();

    for _ in 0..4 {
        net.fire_timeouts();
        net.run_until_quiet(10_000);
        if net.all_live_decided() {
            break;
        }
    }

    assert!(net.all_live_decided());
    assert_agreement(&net, 0);

    // Round 1 prepared this value everywhere, so no later round may pick another one.
    let leader = net.leader(1);
    for record in net.decisions().into_iter().flatten() {
        assert!(record.round > Round::FIRST);
        assert_eq!(record.value_id, duty(leader).id());
    }
}

#[test]
fn equivocating_leader_cannot_split_the_committee() {
    let mut net = Network::with_params(4, HEIGHT, Params::default(), duty);
    let leader = net.leader(1);
    net.silence(leader);
    net.start();

    let a = Value::new(1);
    let b = Value::new(2);
    let honest: Vec<_> = (0..4).filter(|&i| i != leader).collect();
    let (majority, other) = (&honest[..2], honest[2]);

    // Two honest operators see one proposal, the third sees another,
    // and the leader backs both sides.
    let ctx = net.context(leader).clone();
    for &i in majority {
        net.inject(i, pre_prepare(&ctx, HEIGHT, 1, a.clone()));
        net.inject(i, prepare(&ctx, HEIGHT, 1, a.id()));
    }
    net.inject(other, pre_prepare(&ctx, HEIGHT, 1, b.clone()));
    net.inject(other, prepare(&ctx, HEIGHT, 1, b.id()));

    net.run_until_quiet(10_000);

    // The split side never prepares, so even the leader's Commit does not count there.
    for &i in majority {
        net.inject(i, commit(&ctx, HEIGHT, 1, a.id()));
    }
    net.inject(other, commit(&ctx, HEIGHT, 1, b.id()));

    net.run_until_quiet(10_000);

    for &i in majority {
        let (record, value) = net.node(i).decision.as_ref().unwrap();
        assert_eq!(record.value_id, a.id());
        assert_eq!(value, &a);
    }

    assert!(net.node(other).decision.is_none());
    assert!(net.node(other).rejected(Rejection::UnknownValue) > 0);
}
