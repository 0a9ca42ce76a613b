// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::watch::RECONNECT_DELAY_SECS;
use crate::types::Strategy;
use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Delimiter between namespaces in the targets and exclude labels
    pub list_delimiter: char,
    /// Strategy used when neither source nor replica declares one
    pub default_strategy: Strategy,
    /// Fixed delay before a closed watch stream is reopened
    pub reconnect_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            list_delimiter: '_',
            default_strategy: Strategy::Replace,
            reconnect_delay: Duration::from_secs(RECONNECT_DELAY_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let list_delimiter = match env::var("MIRRORVERSE_LIST_DELIMITER") {
            Ok(value) => parse_delimiter(&value)?,
            Err(_) => defaults.list_delimiter,
        };

        let default_strategy = match env::var("MIRRORVERSE_DEFAULT_STRATEGY") {
            Ok(value) => match Strategy::parse(&value) {
                s @ (Strategy::Replace | Strategy::Patch) => s,
                _ => bail!("MIRRORVERSE_DEFAULT_STRATEGY must be 'replace' or 'patch', got '{}'", value),
            },
            Err(_) => defaults.default_strategy,
        };

        let reconnect_delay = match env::var("MIRRORVERSE_RECONNECT_DELAY_SECS") {
            Ok(value) => Duration::from_secs(
                value
                    .trim()
                    .parse()
                    .context("MIRRORVERSE_RECONNECT_DELAY_SECS must be a whole number of seconds")?,
            ),
            Err(_) => defaults.reconnect_delay,
        };

        Ok(Config {
            list_delimiter,
            default_strategy,
            reconnect_delay,
        })
    }
}

fn parse_delimiter(value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_whitespace() => Ok(c),
        _ => bail!("MIRRORVERSE_LIST_DELIMITER must be a single non-whitespace character, got '{}'", value),
    }
}
