// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! API server client creation

use crate::error::{MirrorverseError, Result};
use kube::Client;
use tracing::{info, instrument};

/// Connect to the API server using in-cluster config or the local kubeconfig
#[instrument]
pub async fn acquire_client() -> Result<Client> {
    let client = Client::try_default().await.map_err(|e| {
        MirrorverseError::ConfigError(format!("Failed to create Kubernetes client: {}", e))
    })?;

    info!(
        "Connected to Kubernetes cluster (default namespace: {})",
        client.default_namespace()
    );
    Ok(client)
}
