use ibft_core_consensus::{Input, Rejection};
use ibft_core_types::{MessageKind, Payload, Phase, Round};

use dvnode_ibft_test::utils::commit;
use dvnode_ibft_test::{Network, Value};

const HEIGHT: u64 = 5;

fn duty(i: usize) -> Value {
    Value::new(100 + i as u64)
}

#[test]
fn leader_election_at_height_five() {
    let net = Network::new(4, HEIGHT, duty);

    assert_eq!(net.leader(1), 2);
    assert_eq!(net.leader(2), 3);
    assert_eq!(net.leader(3), 0);
    assert_eq!(net.leader(4), 1);
}

#[test]
fn honest_committee_decides_in_the_first_round() {
    let mut net = Network::new(4, HEIGHT, duty);
    net.start();
    net.run_until_quiet(1_000);

    let expected = duty(2).id();

    for (i, decision) in net.decisions().into_iter().enumerate() {
        let record = decision.unwrap_or_else(|| panic!("node {i} did not decide"));

        assert_eq!(record.height.as_u64(), HEIGHT);
        assert_eq!(record.round, Round::FIRST);
        assert_eq!(record.value_id, expected);
        assert_eq!(record.commit_signatures.len(), 3, "node {i}");
    }

    for node in net.nodes() {
        assert_eq!(node.instance.phase(), Phase::Decided);
        assert_eq!(node.decision.as_ref().map(|(_, v)| v), Some(&duty(2)));
        assert_eq!(node.rejected(Rejection::UnknownValue), 0);
        assert!(node.error.is_none());
    }
}

#[test]
fn silent_leader_is_replaced() {
    let mut net = Network::new(4, HEIGHT, duty);
    net.silence(2);
    net.start();
    net.run_until_quiet(1_000);

    assert!(net.live_decisions().iter().all(Option::is_none));

    net.fire_timeouts();

    for i in [0, 1, 3] {
        let sent = net.node(i).sent(MessageKind::ChangeRound);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].round(), Round::new(2));
        assert_eq!(sent[0].value_id(), None);
    }

    net.run_until_quiet(1_000);

    let new_leader = net.leader(2);
    assert_eq!(new_leader, 3);

    let proposals = net.node(new_leader).sent(MessageKind::PrePrepare);
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0].round(), Round::new(2));

    let Payload::PrePrepare {
        value,
        justification,
    } = &proposals[0].message.payload
    else {
        panic!("expected a PrePrepare");
    };
    assert_eq!(value, &duty(3));
    assert!(justification.len() >= 3);

    for decision in net.live_decisions() {
        let record = decision.unwrap();
        assert_eq!(record.round, Round::new(2));
        assert_eq!(record.value_id, duty(3).id());
    }
}

#[test]
fn prepared_value_survives_a_leader_crash() {
    let mut net = Network::new(4, HEIGHT, duty);

    // Everyone prepares the round 1 value, but no Commit gets through.
    net.drop_where(|envelope| envelope.message.kind() == MessageKind::Commit);
    net.start();
    net.run_until_quiet(1_000);

    let prepared = duty(2);
    for node in net.nodes() {
        assert_eq!(node.instance.phase(), Phase::Committed);
        assert_eq!(
            node.instance.tracker().highest_prepared(),
            Some((Round::FIRST, prepared.id()))
        );
    }

    net.silence(2);
    net.clear_filter();
    net.fire_timeouts();

    for i in [0, 1, 3] {
        let sent = net.node(i).sent(MessageKind::ChangeRound);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.prepared_round(), Some(Round::FIRST));
        assert_eq!(sent[0].value_id(), Some(prepared.id()));
    }

    net.run_until_quiet(1_000);

    let proposals = net.node(3).sent(MessageKind::PrePrepare);
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0].round(), Round::new(2));
    assert_eq!(proposals[0].value_id(), Some(prepared.id()));

    for node in net.nodes().iter().filter(|n| !n.silent) {
        let (record, value) = node.decision.as_ref().unwrap();
        assert_eq!(record.round, Round::new(2));
        assert_eq!(value, &prepared);
    }
}

#[test]
fn commit_for_a_value_never_proposed_is_rejected() {
    let mut net = Network::new(4, HEIGHT, duty);
    net.process(0, Input::Start);

    let bogus = Value::new(999).id();
    let message = commit(net.context(1), HEIGHT, 1, bogus);
    net.inject(0, message);

    let node = net.node(0);
    assert_eq!(node.rejected(Rejection::UnknownValue), 1);
    assert_eq!(
        node.instance.tracker().senders(Round::FIRST, MessageKind::Commit),
        0
    );
    assert_eq!(node.instance.phase(), Phase::Idle);
}

#[test]
fn lagging_operator_catches_up_from_the_leader_proof() {
    let mut net = Network::new(4, HEIGHT, duty);
    net.silence(2);

    // Operator 0 never hears a ChangeRound directly.
    net.drop_where(|envelope| envelope.to == 0 && envelope.message.kind() == MessageKind::ChangeRound);
    net.start();
    net.fire_timeouts();
    net.run_until_quiet(1_000);

    let node = net.node(0);
    assert!(node.buffered >= 1);

    let (record, _) = node.decision.as_ref().expect("operator 0 decided");
    assert_eq!(record.round, Round::new(2));
    assert_eq!(record.value_id, duty(3).id());
}

#[test]
fn two_silent_operators_stall_the_committee() {
    let mut net = Network::new(4, HEIGHT, duty);
    net.silence(0);
    net.silence(1);
    net.start();

    for _ in 0..5 {
        net.run_until_quiet(1_000);
        net.fire_timeouts();
    }
    net.run_until_quiet(1_000);

    assert!(net.live_decisions().iter().all(Option::is_none));

    for node in net.nodes().iter().filter(|n| !n.silent) {
        assert_eq!(node.instance.round(), Round::FIRST);
        assert_eq!(node.instance.phase(), Phase::ChangingRound);
        assert_eq!(node.instance.state().target_round, Some(Round::new(3)));
    }
}

#[test]
fn seven_operators_survive_two_faults() {
    let mut net = Network::new(7, HEIGHT, duty);

    let first = net.leader(1);
    let second = net.leader(2);
    net.silence(first);
    net.silence(second);
    net.start();

    for _ in 0..4 {
        net.run_until_quiet(10_000);
        if net.all_live_decided() {
            break;
        }
        net.fire_timeouts();
    }

    let decided: Vec<_> = net.live_decisions().into_iter().flatten().collect();
    assert_eq!(decided.len(), 5);

    let third = net.leader(3);
    for record in decided {
        assert_eq!(record.round, Round::new(3));
        assert_eq!(record.value_id, duty(third).id());
        assert_eq!(record.commit_signatures.len(), 5);
    }
}
