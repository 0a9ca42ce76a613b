// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Label schema parsing and classification of observed objects.
//!
//! Every watch event is classified once into a [`Role`]. The label-encoded
//! configuration (target lists, source reference, strategy) is parsed at that
//! point and the engine only ever works with the typed values.

use crate::constants::{labels, LABEL_PREFIX, LAST_SYNCED_FORMAT, REF_DELIMITER};
use crate::error::MirrorverseError;
use crate::types::resource::ManagedResource;
use chrono::Utc;
use kube::ResourceExt;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// How a replica converges towards its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Full-object overwrite
    Replace,
    /// Merge patch; keys only present on the replica are kept
    Patch,
    /// No strategy label
    Unset,
    /// A strategy label with a value Mirrorverse does not know
    Unrecognized(String),
}

impl Strategy {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" => Strategy::Unset,
            "replace" => Strategy::Replace,
            "patch" => Strategy::Patch,
            other => Strategy::Unrecognized(other.to_string()),
        }
    }

    fn from_labels(labels: &BTreeMap<String, String>) -> Self {
        labels
            .get(labels::STRATEGY)
            .map_or(Strategy::Unset, |v| Strategy::parse(v))
    }

    /// Value written to a replica's strategy label, if any
    pub fn label_value(&self) -> Option<&str> {
        match self {
            Strategy::Replace => Some("replace"),
            Strategy::Patch => Some("patch"),
            Strategy::Unset => None,
            Strategy::Unrecognized(value) => Some(value),
        }
    }

    /// Fall back to `default` when no strategy was declared
    pub fn or_default(self, default: &Strategy) -> Strategy {
        match self {
            Strategy::Unset => default.clone(),
            other => other,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label_value().unwrap_or("<unset>"))
    }
}

/// Origin of a replica, encoded as `<name>.<namespace>`; split on the last dot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub name: String,
    pub namespace: String,
}

impl FromStr for SourceRef {
    type Err = MirrorverseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Object names may contain dots, namespaces never do
        match s.rsplit_once(REF_DELIMITER) {
            Some((name, namespace)) if !name.is_empty() && !namespace.is_empty() => Ok(SourceRef {
                name: name.to_string(),
                namespace: namespace.to_string(),
            }),
            _ => Err(MirrorverseError::InvalidLabel(format!(
                "{} must be '<name>{}<namespace>', got '{}'",
                labels::SYNC_SOURCE_REF,
                REF_DELIMITER,
                s
            ))),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, REF_DELIMITER, self.namespace)
    }
}

/// Split a delimiter-joined namespace list, trimming and dropping empties.
/// Duplicates are removed, keeping the first occurrence.
pub fn parse_namespace_list(value: Option<&String>, delimiter: char) -> Vec<String> {
    let mut seen = BTreeSet::new();
    value
        .into_iter()
        .flat_map(|v| v.split(delimiter))
        .map(str::trim)
        .filter(|ns| !ns.is_empty())
        .filter(|ns| seen.insert(ns.to_string()))
        .map(str::to_string)
        .collect()
}

/// Namespaces a source replicates into: `targets - exclude`, in target order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetNamespaceSet(Vec<String>);

impl TargetNamespaceSet {
    pub fn resolve(targets: &[String], exclude: &BTreeSet<String>) -> Self {
        let mut namespaces: Vec<String> = Vec::with_capacity(targets.len());
        for ns in targets {
            let ns = ns.trim();
            if ns.is_empty() || exclude.contains(ns) || namespaces.iter().any(|n| n == ns) {
                continue;
            }
            namespaces.push(ns.to_string());
        }
        TargetNamespaceSet(namespaces)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Timestamp for the last-synced label
pub fn sync_timestamp() -> String {
    Utc::now().format(LAST_SYNCED_FORMAT).to_string()
}

/// An object labelled `sync-source=true`
#[derive(Debug, Clone)]
pub struct SourceDeclaration<K> {
    pub resource: K,
    pub targets: Vec<String>,
    pub exclude: BTreeSet<String>,
    pub strategy: Strategy,
    pub cleanup: bool,
}

impl<K: ManagedResource> SourceDeclaration<K> {
    fn parse(resource: K, list_delimiter: char) -> Self {
        let labels = resource.labels();
        let targets = parse_namespace_list(labels.get(labels::TARGETS), list_delimiter);
        let exclude = parse_namespace_list(labels.get(labels::EXCLUDE), list_delimiter)
            .into_iter()
            .collect();
        let strategy = Strategy::from_labels(labels);
        let cleanup = labels.get(labels::CLEANUP).is_some_and(|v| v == "true");

        SourceDeclaration {
            resource,
            targets,
            exclude,
            strategy,
            cleanup,
        }
    }

    pub fn name(&self) -> String {
        self.resource.name_any()
    }

    pub fn namespace(&self) -> String {
        self.resource.namespace().unwrap_or_default()
    }

    pub fn source_ref(&self) -> SourceRef {
        SourceRef {
            name: self.name(),
            namespace: self.namespace(),
        }
    }

    pub fn target_namespaces(&self) -> TargetNamespaceSet {
        TargetNamespaceSet::resolve(&self.targets, &self.exclude)
    }

    /// Build the replica of this source for `namespace`.
    ///
    /// Reserved labels are replaced by exactly the managed set: sync-replica,
    /// sync-source-ref, last-synced and, when declared, strategy.
    pub fn build_replica(&self, namespace: &str, synced_at: &str) -> K {
        let mut replica = self
            .resource
            .clone_stripping_system_metadata()
            .with_namespace(namespace);

        let replica_labels = replica.labels_mut();
        replica_labels.retain(|k, _| !k.starts_with(LABEL_PREFIX));
        replica_labels.insert(labels::SYNC_REPLICA.to_string(), "true".to_string());
        replica_labels.insert(
            labels::SYNC_SOURCE_REF.to_string(),
            self.source_ref().to_string(),
        );
        replica_labels.insert(labels::LAST_SYNCED.to_string(), synced_at.to_string());
        if let Some(strategy) = self.strategy.label_value() {
            replica_labels.insert(labels::STRATEGY.to_string(), strategy.to_string());
        }

        replica
    }
}

/// An object labelled `sync-replica=true`
#[derive(Debug, Clone)]
pub struct ReplicaRecord<K> {
    pub resource: K,
    /// None when the reference label is missing or malformed
    pub source_ref: Option<SourceRef>,
    pub strategy: Strategy,
    pub last_synced: Option<String>,
    pub stale: bool,
}

impl<K: ManagedResource> ReplicaRecord<K> {
    fn parse(resource: K) -> Self {
        let labels = resource.labels();
        let source_ref = labels
            .get(labels::SYNC_SOURCE_REF)
            .and_then(|v| v.parse::<SourceRef>().ok());
        let strategy = Strategy::from_labels(labels);
        let last_synced = labels.get(labels::LAST_SYNCED).cloned();
        let stale = labels.get(labels::STALE).is_some_and(|v| v == "true");

        ReplicaRecord {
            resource,
            source_ref,
            strategy,
            last_synced,
            stale,
        }
    }

    pub fn name(&self) -> String {
        self.resource.name_any()
    }

    pub fn namespace(&self) -> String {
        self.resource.namespace().unwrap_or_default()
    }
}

/// Role of an observed object, recomputed from its labels on every event
#[derive(Debug, Clone)]
pub enum Role<K> {
    Source(SourceDeclaration<K>),
    Replica(ReplicaRecord<K>),
    Plain(K),
}

impl<K: ManagedResource> Role<K> {
    /// `sync-source` takes precedence over `sync-replica`
    pub fn classify(resource: K, list_delimiter: char) -> Self {
        let labels = resource.labels();
        if labels.get(labels::SYNC_SOURCE).is_some_and(|v| v == "true") {
            Role::Source(SourceDeclaration::parse(resource, list_delimiter))
        } else if labels.get(labels::SYNC_REPLICA).is_some_and(|v| v == "true") {
            Role::Replica(ReplicaRecord::parse(resource))
        } else {
            Role::Plain(resource)
        }
    }
}
