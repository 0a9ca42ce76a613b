// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace discovery

use crate::error::Result;
use k8s_openapi::api::core::v1::Namespace;
use kube::{api::ListParams, Api, Client, ResourceExt};
use tracing::{debug, instrument};

/// Names of all namespaces currently in the cluster
#[instrument(skip(client))]
pub async fn list_namespace_names(client: &Client) -> Result<Vec<String>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let names: Vec<String> = namespaces
        .list(&ListParams::default())
        .await?
        .items
        .iter()
        .map(|ns| ns.name_any())
        .collect();

    debug!("Found {} namespace(s)", names.len());
    Ok(names)
}
