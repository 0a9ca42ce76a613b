// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconciliation engine: decides what each watch event means for replicas.

use crate::config::Config;
use crate::constants::labels;
use crate::sync::drift::needs_sync;
use crate::sync::executor::{MutationExecutor, MutationOutcome};
use crate::types::{sync_timestamp, ManagedResource, ReplicaRecord, Role, SourceDeclaration};
use kube::{api::WatchEvent, Client, ResourceExt};
use tracing::{debug, info, instrument, warn};

/// Per-namespace results of an operation spanning several targets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
}

/// What handling one event amounted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Plain objects, replica additions, bookmarks and error events
    Ignored,
    /// A source was (re)applied to its target namespaces
    Materialized(TargetReport),
    /// A deleted source's replicas were removed
    CleanedUp(TargetReport),
    /// A deleted source's replicas were flagged stale
    MarkedStale(TargetReport),
    /// A drifted replica was converged to its source
    Resynced,
    /// The replica matched its source
    InSync,
    /// The replica cannot or must not be synced
    Skipped,
    /// Converging the replica failed
    Failed,
}

/// Event-driven reconciliation for one resource kind
pub struct Reconciler<K> {
    executor: MutationExecutor<K>,
    config: Config,
}

impl<K: ManagedResource> Reconciler<K> {
    pub fn new(client: Client, config: Config) -> Self {
        Self {
            executor: MutationExecutor::new(client),
            config,
        }
    }

    /// Handle one watch event to completion
    pub async fn handle_event(&self, event: WatchEvent<K>) -> ReconcileOutcome {
        match event {
            WatchEvent::Added(obj) => {
                debug!("{} added: {}/{}", K::KIND, obj.namespace().unwrap_or_default(), obj.name_any());
                match self.classify(obj) {
                    Role::Source(source) => self.materialize(&source).await,
                    _ => ReconcileOutcome::Ignored,
                }
            }
            WatchEvent::Modified(obj) => {
                debug!("{} updated: {}/{}", K::KIND, obj.namespace().unwrap_or_default(), obj.name_any());
                match self.classify(obj) {
                    Role::Source(source) => self.materialize(&source).await,
                    Role::Replica(replica) => self.resync_replica(&replica).await,
                    Role::Plain(_) => ReconcileOutcome::Ignored,
                }
            }
            WatchEvent::Deleted(obj) => {
                debug!("{} deleted: {}/{}", K::KIND, obj.namespace().unwrap_or_default(), obj.name_any());
                match self.classify(obj) {
                    Role::Source(source) => self.retire(&source).await,
                    _ => ReconcileOutcome::Ignored,
                }
            }
            WatchEvent::Bookmark(_) => ReconcileOutcome::Ignored,
            WatchEvent::Error(err) => {
                warn!(
                    code = err.code,
                    reason = %err.reason,
                    "Error event in {} watch: {}",
                    K::KIND,
                    err.message
                );
                ReconcileOutcome::Ignored
            }
        }
    }

    fn classify(&self, obj: K) -> Role<K> {
        Role::classify(obj, self.config.list_delimiter)
    }

    /// Create or update the replica in every target namespace
    #[instrument(skip(self, source), fields(kind = %K::KIND, source = %source.source_ref()))]
    async fn materialize(&self, source: &SourceDeclaration<K>) -> ReconcileOutcome {
        let targets = source.target_namespaces();
        let source_namespace = source.namespace();
        let strategy = source
            .strategy
            .clone()
            .or_default(&self.config.default_strategy);
        let synced_at = sync_timestamp();
        let mut report = TargetReport::default();

        info!("Syncing source to {} target namespace(s)", targets.len());

        for namespace in targets.iter() {
            if namespace == source_namespace {
                warn!("Target namespace {} is the source namespace, skipping", namespace);
                report.skipped.push(namespace.to_string());
                continue;
            }

            let replica = source.build_replica(namespace, &synced_at);
            match self
                .executor
                .create_or_update(&replica, namespace, &strategy)
                .await
            {
                Ok(MutationOutcome::Skipped) => report.skipped.push(namespace.to_string()),
                Ok(_) => report.succeeded.push(namespace.to_string()),
                Err(e) => {
                    warn!(
                        "Failed to sync {} {} to namespace {}: {}",
                        K::KIND,
                        source.name(),
                        namespace,
                        e
                    );
                    report.failed.push(namespace.to_string());
                }
            }
        }

        ReconcileOutcome::Materialized(report)
    }

    /// Bring a modified replica back in line with its source if it drifted
    #[instrument(skip(self, replica), fields(kind = %K::KIND, replica = %format!("{}/{}", replica.namespace(), replica.name())))]
    async fn resync_replica(&self, replica: &ReplicaRecord<K>) -> ReconcileOutcome {
        if replica.stale {
            debug!("Replica is stale, not syncing");
            return ReconcileOutcome::Skipped;
        }

        let Some(source_ref) = &replica.source_ref else {
            warn!(
                "Replica has a missing or malformed {} label, not syncing",
                labels::SYNC_SOURCE_REF
            );
            return ReconcileOutcome::Skipped;
        };

        let source = match self
            .executor
            .get(&source_ref.name, &source_ref.namespace)
            .await
        {
            Ok(Some(obj)) => obj,
            Ok(None) => {
                warn!("Source {} not found, not syncing", source_ref);
                return ReconcileOutcome::Skipped;
            }
            Err(e) => {
                warn!("Failed to fetch source {}: {}", source_ref, e);
                return ReconcileOutcome::Failed;
            }
        };

        let source = match self.classify(source) {
            Role::Source(source) => source,
            _ => {
                warn!("{} is no longer a sync source, not syncing", source_ref);
                return ReconcileOutcome::Skipped;
            }
        };

        if !needs_sync(&replica.resource, &source.resource) {
            debug!("Replica matches source {}, nothing to do", source_ref);
            return ReconcileOutcome::InSync;
        }

        info!("Replica drifted from source {}, syncing", source_ref);

        let namespace = replica.namespace();
        let strategy = replica
            .strategy
            .clone()
            .or_default(&self.config.default_strategy);
        let mut desired = replica.resource.clone();
        desired.copy_data_from(&source.resource);

        match self.executor.update(&desired, &namespace, &strategy).await {
            Ok(MutationOutcome::Updated) => {}
            Ok(_) => return ReconcileOutcome::Skipped,
            Err(e) => {
                warn!("Failed to sync replica from {}: {}", source_ref, e);
                return ReconcileOutcome::Failed;
            }
        }

        let mut refreshed = desired.labels().clone();
        refreshed.insert(labels::LAST_SYNCED.to_string(), sync_timestamp());
        if let Err(e) = self.executor.set_labels(&desired, refreshed).await {
            warn!("Failed to refresh {} label: {}", labels::LAST_SYNCED, e);
        }

        ReconcileOutcome::Resynced
    }

    /// React to a deleted source: remove or flag its replicas
    #[instrument(skip(self, source), fields(kind = %K::KIND, source = %source.source_ref(), cleanup = source.cleanup))]
    async fn retire(&self, source: &SourceDeclaration<K>) -> ReconcileOutcome {
        if source.cleanup {
            ReconcileOutcome::CleanedUp(self.delete_replicas(source).await)
        } else {
            ReconcileOutcome::MarkedStale(self.mark_replicas_stale(source).await)
        }
    }

    async fn delete_replicas(&self, source: &SourceDeclaration<K>) -> TargetReport {
        let name = source.name();
        let source_namespace = source.namespace();
        let mut report = TargetReport::default();

        for namespace in source.target_namespaces().iter() {
            if namespace == source_namespace {
                report.skipped.push(namespace.to_string());
                continue;
            }

            match self.executor.delete(&name, namespace).await {
                Ok(_) => report.succeeded.push(namespace.to_string()),
                Err(e) => {
                    warn!(
                        "Failed to delete {} {}/{}: {}",
                        K::KIND,
                        namespace,
                        name,
                        e
                    );
                    report.failed.push(namespace.to_string());
                }
            }
        }

        report
    }

    async fn mark_replicas_stale(&self, source: &SourceDeclaration<K>) -> TargetReport {
        let name = source.name();
        let source_ref = source.source_ref();
        let mut report = TargetReport::default();

        for namespace in source.target_namespaces().iter() {
            let replica = match self.executor.get(&name, namespace).await {
                Ok(Some(obj)) => match self.classify(obj) {
                    Role::Replica(replica) if replica.source_ref.as_ref() == Some(&source_ref) => {
                        replica
                    }
                    _ => {
                        debug!(
                            "{} {}/{} is not a replica of {}, leaving it alone",
                            K::KIND,
                            namespace,
                            name,
                            source_ref
                        );
                        report.skipped.push(namespace.to_string());
                        continue;
                    }
                },
                Ok(None) => {
                    debug!("No replica in namespace {}", namespace);
                    report.skipped.push(namespace.to_string());
                    continue;
                }
                Err(e) => {
                    warn!("Failed to fetch replica in namespace {}: {}", namespace, e);
                    report.failed.push(namespace.to_string());
                    continue;
                }
            };

            let mut stale_labels = replica.resource.labels().clone();
            stale_labels.insert(labels::STALE.to_string(), "true".to_string());

            match self.executor.set_labels(&replica.resource, stale_labels).await {
                Ok(MutationOutcome::Updated) => {
                    info!("Marked {} {}/{} as stale", K::KIND, namespace, name);
                    report.succeeded.push(namespace.to_string());
                }
                Ok(_) => report.skipped.push(namespace.to_string()),
                Err(e) => {
                    warn!(
                        "Failed to mark {} {}/{} as stale: {}",
                        K::KIND,
                        namespace,
                        name,
                        e
                    );
                    report.failed.push(namespace.to_string());
                }
            }
        }

        report
    }
}
