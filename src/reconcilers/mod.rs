// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watch loops that feed cluster events to the reconciliation engine.

pub mod dispatcher;

pub use dispatcher::WatchDispatcher;
