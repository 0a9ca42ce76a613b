// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The two resource kinds Mirrorverse replicates, behind one capability trait.

use crate::constants::{annotations, labels};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::NamespaceResourceScope;
use kube::api::ObjectMeta;
use kube::{Resource, ResourceExt};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    ConfigMap,
    Secret,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::ConfigMap => write!(f, "ConfigMap"),
            ResourceKind::Secret => write!(f, "Secret"),
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::ConfigMap {}
    impl Sealed for super::Secret {}
}

/// A namespaced object whose data can be mirrored.
///
/// Implemented for [`ConfigMap`] and [`Secret`] only. Identity and labels come
/// from [`ResourceExt`]; this trait adds the data view and the copy helpers the
/// engine needs.
pub trait ManagedResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
    + sealed::Sealed
{
    const KIND: ResourceKind;

    /// Data as a byte map, regardless of how the kind stores it
    fn data(&self) -> BTreeMap<String, Vec<u8>>;

    /// Overwrite this object's payload with the payload of `other`
    fn copy_data_from(&mut self, other: &Self);

    /// The payload fields as they appear in a JSON merge patch
    fn data_patch(&self) -> Map<String, Value>;

    /// Copy keeping only name, namespace, labels and annotations.
    ///
    /// Server-owned fields (uid, resourceVersion, creationTimestamp,
    /// managedFields, ...) are dropped, as is the kubectl
    /// last-applied-configuration annotation.
    fn clone_stripping_system_metadata(&self) -> Self {
        let meta = self.meta();
        let mut filtered_annotations = meta.annotations.clone();
        if let Some(a) = filtered_annotations.as_mut() {
            a.remove(annotations::LAST_APPLIED_CONFIGURATION);
        }

        let mut copy = self.clone();
        *copy.meta_mut() = ObjectMeta {
            name: meta.name.clone(),
            namespace: meta.namespace.clone(),
            labels: meta.labels.clone(),
            annotations: filtered_annotations,
            ..Default::default()
        };
        copy
    }

    /// Copy targeted at another namespace
    fn with_namespace(&self, namespace: &str) -> Self {
        let mut copy = self.clone();
        copy.meta_mut().namespace = Some(namespace.to_string());
        copy
    }

    /// JSON merge patch converging an existing object towards this one.
    ///
    /// Data keys are merged, so keys only present on the live object survive.
    /// Reserved labels missing from this object are removed.
    fn merge_patch(&self) -> Value {
        let mut patch_labels: Map<String, Value> = self
            .labels()
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        for key in labels::RESERVED {
            patch_labels.entry(key.to_string()).or_insert(Value::Null);
        }

        let mut patch = self.data_patch();
        patch.insert(
            "metadata".to_string(),
            json!({
                "labels": patch_labels,
                "annotations": self.annotations(),
            }),
        );
        Value::Object(patch)
    }
}

impl ManagedResource for ConfigMap {
    const KIND: ResourceKind = ResourceKind::ConfigMap;

    fn data(&self) -> BTreeMap<String, Vec<u8>> {
        let text = self
            .data
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.as_bytes().to_vec()));
        let binary = self
            .binary_data
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.0.clone()));
        text.chain(binary).collect()
    }

    fn copy_data_from(&mut self, other: &Self) {
        self.data = other.data.clone();
        self.binary_data = other.binary_data.clone();
    }

    fn data_patch(&self) -> Map<String, Value> {
        let mut patch = Map::new();
        if let Some(data) = &self.data {
            patch.insert("data".to_string(), json!(data));
        }
        if let Some(binary_data) = &self.binary_data {
            patch.insert("binaryData".to_string(), json!(binary_data));
        }
        patch
    }
}

impl ManagedResource for Secret {
    const KIND: ResourceKind = ResourceKind::Secret;

    fn data(&self) -> BTreeMap<String, Vec<u8>> {
        let encoded = self
            .data
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.0.clone()));
        // stringData is write-only and wins over data on the server
        let plain = self
            .string_data
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.as_bytes().to_vec()));
        encoded.chain(plain).collect()
    }

    fn copy_data_from(&mut self, other: &Self) {
        self.data = other.data.clone();
        self.string_data = other.string_data.clone();
    }

    fn data_patch(&self) -> Map<String, Value> {
        let mut patch = Map::new();
        if let Some(data) = &self.data {
            patch.insert("data".to_string(), json!(data));
        }
        if let Some(string_data) = &self.string_data {
            patch.insert("stringData".to_string(), json!(string_data));
        }
        patch
    }
}
