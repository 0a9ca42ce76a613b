// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Replica synchronization: drift detection, mutations and event handling.

pub mod drift;
pub mod engine;
pub mod executor;

pub use drift::needs_sync;
pub use engine::{ReconcileOutcome, Reconciler, TargetReport};
pub use executor::{MutationExecutor, MutationOutcome};
