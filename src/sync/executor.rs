// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Create, update, delete and relabel operations against the API server.

use crate::error::{MirrorverseError, Result};
use crate::types::{ManagedResource, Strategy};
use kube::{
    api::{DeleteParams, Patch, PatchParams, PostParams},
    Api, Client, ResourceExt,
};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tracing::{debug, info, instrument, warn};

/// What a mutation ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Created,
    Updated,
    Deleted,
    /// The object was not there; nothing to do
    AlreadyAbsent,
    /// The mutation was not attempted (unknown strategy)
    Skipped,
}

/// Performs mutations for one resource kind.
///
/// Expected races are outcomes, not errors: an existing object on create
/// falls back to an update and a missing object on delete is `AlreadyAbsent`.
/// Nothing is retried here.
pub struct MutationExecutor<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for MutationExecutor<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: ManagedResource> MutationExecutor<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn api(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Fetch an object, `None` when it does not exist
    #[instrument(skip(self), fields(kind = %K::KIND))]
    pub async fn get(&self, name: &str, namespace: &str) -> Result<Option<K>> {
        Ok(self.api(namespace).get_opt(name).await?)
    }

    /// Create the object in `namespace`, updating it with `strategy` if it already exists
    #[instrument(skip(self, resource), fields(kind = %K::KIND, name = %resource.name_any(), strategy = %strategy))]
    pub async fn create_or_update(
        &self,
        resource: &K,
        namespace: &str,
        strategy: &Strategy,
    ) -> Result<MutationOutcome> {
        let name = resource.name_any();
        let resource = resource.with_namespace(namespace);

        match self
            .api(namespace)
            .create(&PostParams::default(), &resource)
            .await
            .map_err(MirrorverseError::from)
        {
            Ok(_) => {
                info!("Created {} {}/{}", K::KIND, namespace, name);
                Ok(MutationOutcome::Created)
            }
            Err(e) if e.is_api_code(409) => {
                debug!(
                    "{} {}/{} already exists, updating",
                    K::KIND,
                    namespace,
                    name
                );
                self.update(&resource, namespace, strategy).await
            }
            Err(e) => Err(e),
        }
    }

    /// Converge the live object towards `resource`.
    ///
    /// `Replace` sends the full object; when it carries a resourceVersion the
    /// API server rejects the write on conflict. `Patch` sends a merge patch.
    #[instrument(skip(self, resource), fields(kind = %K::KIND, name = %resource.name_any(), strategy = %strategy))]
    pub async fn update(
        &self,
        resource: &K,
        namespace: &str,
        strategy: &Strategy,
    ) -> Result<MutationOutcome> {
        let name = resource.name_any();
        let api = self.api(namespace);

        match strategy {
            Strategy::Replace => {
                api.replace(&name, &PostParams::default(), &resource.with_namespace(namespace))
                    .await?;
            }
            Strategy::Patch => {
                api.patch(
                    &name,
                    &PatchParams::default(),
                    &Patch::Merge(resource.merge_patch()),
                )
                .await?;
            }
            Strategy::Unset | Strategy::Unrecognized(_) => {
                warn!(
                    "Unknown strategy '{}' for {} {}/{}, not updating",
                    strategy,
                    K::KIND,
                    namespace,
                    name
                );
                return Ok(MutationOutcome::Skipped);
            }
        }

        info!(
            "Updated {} {}/{} with strategy '{}'",
            K::KIND,
            namespace,
            name,
            strategy
        );
        Ok(MutationOutcome::Updated)
    }

    /// Delete an object; a missing object counts as deleted
    #[instrument(skip(self), fields(kind = %K::KIND))]
    pub async fn delete(&self, name: &str, namespace: &str) -> Result<MutationOutcome> {
        match self
            .api(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(MirrorverseError::from)
        {
            Ok(_) => {
                info!("Deleted {} {}/{}", K::KIND, namespace, name);
                Ok(MutationOutcome::Deleted)
            }
            Err(e) if e.is_api_code(404) => {
                debug!("{} {}/{} already gone", K::KIND, namespace, name);
                Ok(MutationOutcome::AlreadyAbsent)
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the labels of the live object, leaving everything else as read
    #[instrument(skip(self, resource, labels), fields(kind = %K::KIND, name = %resource.name_any()))]
    pub async fn set_labels(
        &self,
        resource: &K,
        labels: BTreeMap<String, String>,
    ) -> Result<MutationOutcome> {
        let name = resource.name_any();
        let namespace = resource.namespace().unwrap_or_default();
        let api = self.api(&namespace);

        let Some(mut current) = api.get_opt(&name).await? else {
            debug!("{} {}/{} disappeared before relabeling", K::KIND, namespace, name);
            return Ok(MutationOutcome::AlreadyAbsent);
        };

        current.meta_mut().labels = Some(labels);
        api.replace(&name, &PostParams::default(), &current).await?;

        info!("Updated labels of {} {}/{}", K::KIND, namespace, name);
        Ok(MutationOutcome::Updated)
    }
}
