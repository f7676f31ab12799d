// Copyright (c) 2025 - Cowboy AI, Inc.
//! Change-Diff Builder
//!
//! Compares desired values against a hydrated write model and collects one
//! change entry per differing field. Fields are offered in the entity's schema
//! order, so the resulting list is stable no matter how the caller built its
//! input.
//!
//! ```rust
//! use iam_command::diff::ChangeSet;
//!
//! #[derive(Debug, PartialEq)]
//! enum Change { Name(String), Timeout(u64) }
//!
//! let changes = ChangeSet::new()
//!     .field(&"old".to_string(), &"new".to_string(), Change::Name)
//!     .field(&10, &10, Change::Timeout)
//!     .into_changes();
//!
//! assert_eq!(changes, Some(vec![Change::Name("new".to_string())]));
//! assert_eq!(ChangeSet::<Change>::new().into_changes(), None);
//! ```

/// Ordered field changes under construction
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet<C> {
    changes: Vec<C>,
}

impl<C> Default for ChangeSet<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ChangeSet<C> {
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Full desired value; changed if not equal to `current`
    ///
    /// Collections compare by full content.
    pub fn field<T>(mut self, current: &T, desired: &T, make: impl FnOnce(T) -> C) -> Self
    where
        T: PartialEq + Clone,
    {
        if current != desired {
            self.changes.push(make(desired.clone()));
        }
        self
    }

    /// Optional desired value; `None` leaves the field as it is
    pub fn optional<T>(self, current: &T, desired: Option<&T>, make: impl FnOnce(T) -> C) -> Self
    where
        T: PartialEq + Clone,
    {
        match desired {
            Some(desired) => self.field(current, desired, make),
            None => self,
        }
    }

    /// Optional desired value against a field that may not be set yet
    pub fn optional_unset<T>(
        mut self,
        current: Option<&T>,
        desired: Option<&T>,
        make: impl FnOnce(T) -> C,
    ) -> Self
    where
        T: PartialEq + Clone,
    {
        if let Some(desired) = desired {
            if current != Some(desired) {
                self.changes.push(make(desired.clone()));
            }
        }
        self
    }

    /// Secret replacement; a present value always changes, absence never does
    ///
    /// Secrets are never compared to the stored ciphertext.
    pub fn secret<T>(mut self, desired: Option<T>, make: impl FnOnce(T) -> C) -> Self {
        if let Some(desired) = desired {
            self.changes.push(make(desired));
        }
        self
    }

    /// `None` when nothing differs
    pub fn into_changes(self) -> Option<Vec<C>> {
        if self.changes.is_empty() {
            None
        } else {
            Some(self.changes)
        }
    }
}
