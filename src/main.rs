// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mirrorverse::config::Config;
use mirrorverse::kubernetes::{acquire_client, list_namespace_names};
use mirrorverse::reconcilers::WatchDispatcher;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Mirrorverse operator");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: list_delimiter='{}', default_strategy={}, reconnect_delay={:?}",
        config.list_delimiter, config.default_strategy, config.reconnect_delay
    );

    let client = acquire_client().await?;

    match list_namespace_names(&client).await {
        Ok(names) => info!("Namespaces in cluster: {}", names.join(", ")),
        Err(e) => warn!("Failed to list namespaces: {}", e),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let configmaps = tokio::spawn(
        WatchDispatcher::<ConfigMap>::new(client.clone(), config.clone()).run(shutdown_rx.clone()),
    );
    let secrets =
        tokio::spawn(WatchDispatcher::<Secret>::new(client, config).run(shutdown_rx));

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let (configmaps, secrets) = tokio::join!(configmaps, secrets);
    for (kind, result) in [("ConfigMap", configmaps), ("Secret", secrets)] {
        match result {
            Ok(Ok(())) => info!("{} watch stopped", kind),
            Ok(Err(e)) => error!("{} watch failed: {}", kind, e),
            Err(e) => error!("{} watch task did not complete: {}", kind, e),
        }
    }

    info!("Mirrorverse operator stopped");
    Ok(())
}
