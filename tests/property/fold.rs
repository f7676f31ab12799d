// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Write-Model Folding
//!
//! Generates histories of lockout policy events on one organization, with
//! events of a neighbouring organization interleaved, and checks that:
//! - folding matches a direct interpretation of the history
//! - folding in two slices equals folding everything at once
//! - hydrating from the store equals folding the raw log

use iam_command::aggregate::AggregateType;
use iam_command::event_store::InMemoryEventStore;
use iam_command::events::{Changes, Event, PendingEvent, PolicyEvent};
use iam_command::policy::{LockoutChange, LockoutPolicy, PolicySchema};
use iam_command::write_model::policy::PolicyWriteModel;
use iam_command::write_model::{filter_and_fold, Reducer};
use iam_command::{EntityState, PolicyLevel};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::Index;

const INSTANCE: &str = "instance-1";
const ORG: &str = "org-1";
const NEIGHBOUR: &str = "org-2";

#[derive(Debug, Clone)]
enum Op {
    Add(LockoutPolicy),
    Change(Vec<LockoutChange>),
    Remove,
    /// Added on the neighbouring organization
    Foreign(LockoutPolicy),
}

fn lockout_strategy() -> impl Strategy<Value = LockoutPolicy> {
    (0u64..20, 0u64..20, any::<bool>()).prop_map(|(password, otp, show)| LockoutPolicy {
        max_password_attempts: password,
        max_otp_attempts: otp,
        show_lockout_failures: show,
    })
}

fn change_strategy() -> impl Strategy<Value = LockoutChange> {
    prop_oneof![
        (0u64..20).prop_map(LockoutChange::MaxPasswordAttempts),
        (0u64..20).prop_map(LockoutChange::MaxOtpAttempts),
        any::<bool>().prop_map(LockoutChange::ShowLockoutFailures),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        lockout_strategy().prop_map(Op::Add),
        vec(change_strategy(), 1..4).prop_map(Op::Change),
        Just(Op::Remove),
        lockout_strategy().prop_map(Op::Foreign),
    ]
}

fn pending(op: &Op) -> PendingEvent {
    let own = PolicyLevel::org(ORG).aggregate(AggregateType::LockoutPolicy, INSTANCE);
    let neighbour = PolicyLevel::org(NEIGHBOUR).aggregate(AggregateType::LockoutPolicy, INSTANCE);
    let event = match op {
        Op::Add(policy) => PendingEvent::new(&own, "prop", &PolicyEvent::Added(policy.clone())),
        Op::Change(changes) => PendingEvent::new(
            &own,
            "prop",
            &PolicyEvent::<LockoutPolicy>::Changed(Changes::new(changes.clone())),
        ),
        Op::Remove => PendingEvent::new(&own, "prop", &PolicyEvent::<LockoutPolicy>::Removed),
        Op::Foreign(policy) => {
            PendingEvent::new(&neighbour, "prop", &PolicyEvent::Added(policy.clone()))
        }
    };
    event.unwrap()
}

async fn seeded(ops: &[Op]) -> InMemoryEventStore {
    let store = InMemoryEventStore::new();
    if !ops.is_empty() {
        store.seed(ops.iter().map(pending).collect()).await.unwrap();
    }
    store
}

fn fresh() -> PolicyWriteModel<LockoutPolicy> {
    PolicyWriteModel::new(PolicyLevel::org(ORG), INSTANCE)
}

fn fold_slices(slices: &[&[Event]]) -> PolicyWriteModel<LockoutPolicy> {
    let mut model = fresh();
    for slice in slices {
        model.append_events(slice);
        model.reduce().unwrap();
    }
    model
}

/// Direct reading of the history: state, policy and own event count
fn interpret(ops: &[Op]) -> (EntityState, Option<LockoutPolicy>, u64) {
    let mut state = EntityState::Unspecified;
    let mut policy: Option<LockoutPolicy> = None;
    let mut sequence = 0;
    for op in ops {
        match op {
            Op::Add(added) => {
                state = EntityState::Active;
                policy = Some(added.clone());
            }
            Op::Change(changes) => {
                if let Some(current) = policy.as_mut() {
                    for change in changes {
                        current.apply(change);
                    }
                }
            }
            Op::Remove => {
                state = EntityState::Removed;
                policy = None;
            }
            Op::Foreign(_) => continue,
        }
        sequence += 1;
    }
    (state, policy, sequence)
}

proptest! {
    #[test]
    fn prop_fold_matches_interpretation(ops in vec(op_strategy(), 0..24)) {
        let store = tokio_test::block_on(seeded(&ops));
        let log = tokio_test::block_on(store.events());

        let model = fold_slices(&[&log]);

        let (state, policy, sequence) = interpret(&ops);
        prop_assert_eq!(model.state, state);
        prop_assert_eq!(&model.policy, &policy);
        prop_assert_eq!(model.base().processed_sequence, sequence);
    }

    #[test]
    fn prop_incremental_fold_equals_full_fold(
        ops in vec(op_strategy(), 0..24),
        split in any::<Index>(),
    ) {
        let store = tokio_test::block_on(seeded(&ops));
        let log = tokio_test::block_on(store.events());
        let at = split.index(log.len() + 1);

        let full = fold_slices(&[&log]);
        let incremental = fold_slices(&[&log[..at], &log[at..]]);

        prop_assert_eq!(incremental, full);
    }

    #[test]
    fn prop_hydration_equals_folding_the_log(ops in vec(op_strategy(), 0..24)) {
        let store = tokio_test::block_on(seeded(&ops));
        let log = tokio_test::block_on(store.events());

        let mut hydrated = fresh();
        tokio_test::block_on(filter_and_fold(&store, &mut hydrated)).unwrap();

        prop_assert_eq!(hydrated, fold_slices(&[&log]));
    }
}
