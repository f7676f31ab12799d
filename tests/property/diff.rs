// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Change Diffs
//!
//! A diff applied to its source must reach the desired value, and diffing
//! again afterwards must find nothing to change.

use iam_command::diff::ChangeSet;
use iam_command::policy::{LockoutPolicy, PasswordComplexityPolicy, PolicySchema};
use proptest::prelude::*;

fn lockout_strategy() -> impl Strategy<Value = LockoutPolicy> {
    (0u64..5, 0u64..5, any::<bool>()).prop_map(|(password, otp, show)| LockoutPolicy {
        max_password_attempts: password,
        max_otp_attempts: otp,
        show_lockout_failures: show,
    })
}

fn complexity_strategy() -> impl Strategy<Value = PasswordComplexityPolicy> {
    (1u64..16, any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(min_length, has_uppercase, has_lowercase, has_number, has_symbol)| {
            PasswordComplexityPolicy {
                min_length,
                has_uppercase,
                has_lowercase,
                has_number,
                has_symbol,
            }
        },
    )
}

/// Apply the diff from `current` to `desired` and return the result
fn converge<P: PolicySchema>(current: &P, desired: &P) -> P {
    let mut converged = current.clone();
    for change in current.changes(desired).unwrap_or_default() {
        converged.apply(&change);
    }
    converged
}

#[derive(Debug, Clone, PartialEq)]
enum Field {
    Name(String),
    Tags(Vec<String>),
    Timeout(u64),
}

proptest! {
    #[test]
    fn prop_lockout_diff_converges(current in lockout_strategy(), desired in lockout_strategy()) {
        let converged = converge(&current, &desired);

        prop_assert_eq!(&converged, &desired);
        prop_assert_eq!(converged.changes(&desired), None);
    }

    #[test]
    fn prop_complexity_diff_converges(
        current in complexity_strategy(),
        desired in complexity_strategy(),
    ) {
        let converged = converge(&current, &desired);

        prop_assert_eq!(&converged, &desired);
        prop_assert_eq!(converged.changes(&desired), None);
    }

    #[test]
    fn prop_diff_has_one_entry_per_differing_field(
        current in complexity_strategy(),
        desired in complexity_strategy(),
    ) {
        let differing = [
            current.min_length != desired.min_length,
            current.has_uppercase != desired.has_uppercase,
            current.has_lowercase != desired.has_lowercase,
            current.has_number != desired.has_number,
            current.has_symbol != desired.has_symbol,
        ]
        .iter()
        .filter(|differs| **differs)
        .count();

        let changes = current.changes(&desired).unwrap_or_default();

        prop_assert_eq!(changes.len(), differing);
    }

    #[test]
    fn prop_change_set_keeps_schema_order(
        name in "[a-z]{0,3}",
        tags in proptest::collection::vec("[a-z]{1,2}", 0..3),
        timeout in 0u64..3,
    ) {
        let changes = ChangeSet::new()
            .field(&String::new(), &name, Field::Name)
            .field(&Vec::new(), &tags, Field::Tags)
            .field(&0, &timeout, Field::Timeout)
            .into_changes()
            .unwrap_or_default();

        let mut expected = Vec::new();
        if !name.is_empty() {
            expected.push(Field::Name(name));
        }
        if !tags.is_empty() {
            expected.push(Field::Tags(tags));
        }
        if timeout != 0 {
            expected.push(Field::Timeout(timeout));
        }
        prop_assert_eq!(changes, expected);
    }
}
