// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watch dispatcher - streams cluster-wide events of one kind into the reconciler.

use crate::config::Config;
use crate::constants::watch::INITIAL_RESOURCE_VERSION;
use crate::error::{MirrorverseError, Result};
use crate::sync::Reconciler;
use crate::types::ManagedResource;
use futures::StreamExt;
use kube::{api::WatchParams, Api, Client};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Keeps a watch open on all objects of kind `K` and hands every event to
/// the reconciler, one at a time and in arrival order.
///
/// Every (re)connect starts from resource version "0", so the API server
/// replays the current state as `Added` events and nothing is missed while
/// disconnected.
pub struct WatchDispatcher<K> {
    client: Client,
    reconciler: Reconciler<K>,
    reconnect_delay: Duration,
}

impl<K: ManagedResource> WatchDispatcher<K> {
    pub fn new(client: Client, config: Config) -> Self {
        Self {
            reconnect_delay: config.reconnect_delay,
            reconciler: Reconciler::new(client.clone(), config),
            client,
        }
    }

    /// Run until `shutdown` turns true.
    ///
    /// Fails only when the very first watch cannot be opened; later
    /// failures are logged and retried after the reconnect delay.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let api: Api<K> = Api::all(self.client.clone());
        let params = WatchParams::default();
        let mut connected_before = false;

        info!("Starting {} watch", K::KIND);

        loop {
            let opened = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                opened = api.watch(&params, INITIAL_RESOURCE_VERSION) => opened,
            };

            match opened {
                Ok(stream) => {
                    connected_before = true;
                    debug!("{} watch open", K::KIND);
                    futures::pin_mut!(stream);

                    loop {
                        let next = tokio::select! {
                            biased;
                            _ = shutdown_requested(&mut shutdown) => {
                                info!("Stopping {} watch", K::KIND);
                                return Ok(());
                            }
                            next = stream.next() => next,
                        };

                        match next {
                            Some(Ok(event)) => {
                                let outcome = self.reconciler.handle_event(event).await;
                                debug!(?outcome, "Handled {} event", K::KIND);
                            }
                            Some(Err(e)) => warn!("Error reading {} watch stream: {}", K::KIND, e),
                            None => break,
                        }
                    }

                    warn!(
                        "{} watch closed, reopening in {:?}",
                        K::KIND,
                        self.reconnect_delay
                    );
                }
                Err(source) if !connected_before => {
                    return Err(MirrorverseError::WatchOpenError {
                        kind: K::KIND.to_string(),
                        source,
                    });
                }
                Err(e) => warn!(
                    "Failed to reopen {} watch, retrying in {:?}: {}",
                    K::KIND,
                    self.reconnect_delay,
                    e
                ),
            }

            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                _ = sleep(self.reconnect_delay) => {}
            }
        }

        info!("Stopping {} watch", K::KIND);
        Ok(())
    }
}

/// Resolves once shutdown is signalled; never resolves if the sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
