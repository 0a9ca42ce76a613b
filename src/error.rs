// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorverseError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to open watch for {kind}: {source}")]
    WatchOpenError {
        kind: String,
        #[source]
        source: kube::Error,
    },

    #[error("Invalid label value: {0}")]
    InvalidLabel(String),
}

impl MirrorverseError {
    /// True when the API server answered with the given HTTP status code
    pub fn is_api_code(&self, code: u16) -> bool {
        matches!(self, MirrorverseError::KubeError(kube::Error::Api(err)) if err.code == code)
    }
}

pub type Result<T> = std::result::Result<T, MirrorverseError>;
