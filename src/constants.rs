// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Prefix shared by every label the engine reads or writes
pub const LABEL_PREFIX: &str = "mirrorverse.dev/";

/// Kubernetes label keys used by Mirrorverse
pub mod labels {
    /// When set to "true", marks an object as a mirror source
    pub const SYNC_SOURCE: &str = "mirrorverse.dev/sync-source";
    /// Namespaces to replicate into
    pub const TARGETS: &str = "mirrorverse.dev/targets";
    /// Namespaces to leave out, even when listed in targets
    pub const EXCLUDE: &str = "mirrorverse.dev/exclude";
    /// Update mode for replicas ("replace" or "patch")
    pub const STRATEGY: &str = "mirrorverse.dev/strategy";
    /// When "true", replicas are deleted together with their source
    pub const CLEANUP: &str = "mirrorverse.dev/cleanup";
    /// Marks an object as a replica managed by Mirrorverse
    pub const SYNC_REPLICA: &str = "mirrorverse.dev/sync-replica";
    /// Origin pointer of a replica, `<name>.<namespace>`
    pub const SYNC_SOURCE_REF: &str = "mirrorverse.dev/sync-source-ref";
    /// Timestamp of the last successful sync
    pub const LAST_SYNCED: &str = "mirrorverse.dev/last-synced";
    /// When "true", the replica is no longer synced automatically
    pub const STALE: &str = "mirrorverse.dev/stale";

    /// Every reserved key, used when building merge patches
    pub const RESERVED: [&str; 9] = [
        SYNC_SOURCE,
        TARGETS,
        EXCLUDE,
        STRATEGY,
        CLEANUP,
        SYNC_REPLICA,
        SYNC_SOURCE_REF,
        LAST_SYNCED,
        STALE,
    ];
}

/// Annotations that never make it onto a replica
pub mod annotations {
    pub const LAST_APPLIED_CONFIGURATION: &str = "kubectl.kubernetes.io/last-applied-configuration";
}

/// Separates name and namespace in the sync-source-ref label
pub const REF_DELIMITER: char = '.';

/// Label-safe format for the last-synced timestamp (label values cannot hold ':')
pub const LAST_SYNCED_FORMAT: &str = "%Y-%m-%dT%H-%M-%SZ";

/// Watch stream configuration
pub mod watch {
    /// Default delay before a closed watch stream is reopened
    pub const RECONNECT_DELAY_SECS: u64 = 2;
    /// Resource version the watch is opened at; "0" replays existing objects as Added
    pub const INITIAL_RESOURCE_VERSION: &str = "0";
}
