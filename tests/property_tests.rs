// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Entry Point
//!
//! Uses proptest to check properties of write-model folding and of the
//! change diff that must hold for every generated history.

mod property;
