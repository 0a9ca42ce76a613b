// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! One-directional drift detection between a replica and its source.

use crate::types::ManagedResource;

/// True when some key of the source's data is missing from the replica or
/// holds a different value. Keys only present on the replica are ignored.
pub fn needs_sync<K: ManagedResource>(replica: &K, source: &K) -> bool {
    let replica_data = replica.data();
    source
        .data()
        .iter()
        .any(|(key, value)| replica_data.get(key) != Some(value))
}
