//! Belief store and commit path tests.
//!
//! Covers ownership, duplicate suppression, polarity flips and the sink
//! announcement that follows an accepted commit.

mod common;

use common::{peer, port_of, recv_raw, Recorder};
use mpp::{BeliefStore, CommitOutcome, Context, FleetPorts, Rejection, RunState, Transport, TransportConfig};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;

const SINK: u16 = 4000;

fn ports() -> FleetPorts {
    FleetPorts {
        bus: 3999,
        belief_sink: SINK,
    }
}

#[test]
fn test_rx_done_scenario_reaches_sink_once() {
    let recorder = Recorder::default();
    let mut store = BeliefStore::new("NET");
    let mut state = RunState::Running;
    let mut ctx = Context::new(&recorder, &mut store, ports(), 4010, &mut state);

    let first = ctx.commit("NET.rx_done", true, json!({"rx_len": 64}));
    assert_eq!(first, CommitOutcome::Committed { sent: true });

    let again = ctx.commit("NET.rx_done", true, json!({"rx_len": 128}));
    assert_eq!(again, CommitOutcome::Rejected(Rejection::Duplicate));

    let foreign = ctx.commit("OTHER.rx_done", true, json!({}));
    assert_eq!(foreign, CommitOutcome::Rejected(Rejection::NotOwner));

    assert_eq!(
        recorder.sent_to(SINK),
        vec![json!({
            "belief": {
                "component": "NET",
                "subject": "NET.rx_done",
                "polarity": true,
                "context": {"rx_len": 64}
            }
        })]
    );
    assert_eq!(store.len(), 1);
    assert_eq!(store.entries()[0].context, json!({"rx_len": 64}));
}

#[test]
fn test_polarity_flip_is_a_new_fact() {
    let recorder = Recorder::default();
    let mut store = BeliefStore::new("NET");
    let mut state = RunState::Running;
    let mut ctx = Context::new(&recorder, &mut store, ports(), 4010, &mut state);

    assert!(ctx.commit("NET.link_up", true, json!({})).is_committed());
    assert!(ctx.commit("NET.link_up", false, json!({})).is_committed());
    assert!(!ctx.commit("NET.link_up", true, json!({})).is_committed());
    assert_eq!(ctx.beliefs().len(), 2);

    let polarities: Vec<bool> = recorder
        .sent_to(SINK)
        .iter()
        .map(|e| e["belief"]["polarity"].as_bool().unwrap())
        .collect();
    assert_eq!(polarities, vec![true, false]);
}

#[test]
fn test_owner_name_alone_is_not_a_subject() {
    let recorder = Recorder::default();
    let mut store = BeliefStore::new("NET");
    let mut state = RunState::Running;
    let mut ctx = Context::new(&recorder, &mut store, ports(), 4010, &mut state);

    assert_eq!(
        ctx.commit("NET", true, json!({})),
        CommitOutcome::Rejected(Rejection::NotOwner)
    );
    assert_eq!(
        ctx.commit("NETWORK.up", true, json!({})),
        CommitOutcome::Rejected(Rejection::NotOwner)
    );
    assert!(recorder.sent.borrow().is_empty());
}

#[tokio::test]
async fn test_commit_over_loopback_is_newline_terminated() {
    let sink = peer();
    let transport = Transport::open(0, None, &TransportConfig::default()).unwrap();
    let mut store = BeliefStore::new("NET");
    let mut state = RunState::Running;
    let fleet = FleetPorts {
        bus: 3999,
        belief_sink: port_of(&sink),
    };
    let mut ctx = Context::new(&transport, &mut store, fleet, 0, &mut state);

    let outcome = ctx.commit("NET.rx_done", true, json!({"rx_len": 64}));
    assert_eq!(outcome, CommitOutcome::Committed { sent: true });

    let raw = recv_raw(&sink);
    assert_eq!(raw.last(), Some(&b'\n'));
    let envelope: Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(envelope["belief"]["component"], "NET");
    assert_eq!(envelope["belief"]["subject"], "NET.rx_done");
}

proptest! {
    #[test]
    fn prop_foreign_subjects_never_journaled(subject in "[A-Za-z]{1,6}(\\.[a-z_]{1,6})?") {
        prop_assume!(!subject.starts_with("NET."));
        let mut store = BeliefStore::new("NET");
        prop_assert_eq!(store.record(&subject, true, json!({})).unwrap_err(), Rejection::NotOwner);
        prop_assert!(store.is_empty());
    }

    #[test]
    fn prop_journal_holds_each_pair_once(
        commits in proptest::collection::vec(("[a-c]{1,2}", any::<bool>()), 0..40)
    ) {
        let mut store = BeliefStore::new("NET");
        let mut expected = Vec::new();
        let mut seen = HashSet::new();

        for (suffix, polarity) in &commits {
            let subject = format!("NET.{}", suffix);
            let result = store.record(&subject, *polarity, json!({}));
            if seen.insert((subject.clone(), *polarity)) {
                prop_assert!(result.is_ok());
                expected.push((subject, *polarity));
            } else {
                prop_assert_eq!(result.unwrap_err(), Rejection::Duplicate);
            }
        }

        let journaled: Vec<(String, bool)> = store
            .entries()
            .iter()
            .map(|b| (b.subject.clone(), b.polarity))
            .collect();
        prop_assert_eq!(journaled, expected);
    }

    #[test]
    fn prop_one_sink_envelope_per_accepted_commit(
        commits in proptest::collection::vec(("[a-z]{1,3}", "[A-Z]{2,4}", any::<bool>()), 0..30)
    ) {
        let recorder = Recorder::default();
        let mut store = BeliefStore::new("NET");
        let mut state = RunState::Running;
        let mut accepted = 0usize;
        {
            let mut ctx = Context::new(&recorder, &mut store, ports(), 4010, &mut state);
            for (suffix, owner, polarity) in &commits {
                let subject = format!("{}.{}", owner, suffix);
                if ctx.commit(&subject, *polarity, json!({})).is_committed() {
                    accepted += 1;
                }
            }
        }
        prop_assert_eq!(store.len(), accepted);
        prop_assert_eq!(recorder.sent_to(SINK).len(), accepted);
    }
}
