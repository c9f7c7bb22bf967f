// Copyright (c) 2026 Trellis Platform
// SPDX-License-Identifier: AGPL-3.0
//! Gateway configuration.
//!
//! A plain serde struct constructed explicitly at startup and injected into
//! the gateway; nothing here self-initializes lazily. `from_env` covers the
//! common deployment path where only the host differs per environment.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::entity::PageRequest;
use crate::infrastructure::poll::PollPolicy;

/// Entity class reported on bare transition launches. The remote state
/// machine keys transitions off this class name.
pub const DEFAULT_ENTITY_CLASS: &str = "com.cyoda.tdb.model.treenode.TreeNodeEntity";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the remote entity API, e.g. `https://host/api`.
    pub api_url: String,

    /// Entity class passed to the bare-transition endpoint.
    #[serde(default = "default_entity_class")]
    pub entity_class: String,

    /// Snapshot-search poll budget and interval.
    #[serde(default)]
    pub poll: PollPolicy,

    /// Result-page coordinates for snapshot fetches.
    #[serde(default)]
    pub page: PageRequest,
}

fn default_entity_class() -> String {
    DEFAULT_ENTITY_CLASS.to_string()
}

impl GatewayConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            entity_class: default_entity_class(),
            poll: PollPolicy::default(),
            page: PageRequest::default(),
        }
    }

    /// Reads configuration from the environment. `TRELLIS_HOST` is required;
    /// the remaining knobs fall back to their defaults.
    ///
    /// - `TRELLIS_HOST` — API host, expanded to `https://{host}/api`
    /// - `TRELLIS_ENTITY_CLASS` — bare-transition entity class
    /// - `TRELLIS_POLL_BUDGET_SECS` / `TRELLIS_POLL_INTERVAL_MS`
    /// - `TRELLIS_PAGE_SIZE`
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("TRELLIS_HOST").map_err(|_| anyhow!("TRELLIS_HOST not found"))?;
        let mut config = Self::new(format!("https://{host}/api"));

        if let Ok(class) = std::env::var("TRELLIS_ENTITY_CLASS") {
            config.entity_class = class;
        }
        if let Ok(secs) = std::env::var("TRELLIS_POLL_BUDGET_SECS") {
            let secs: u64 = secs.parse().context("TRELLIS_POLL_BUDGET_SECS")?;
            config.poll.budget = Duration::from_secs(secs);
        }
        if let Ok(millis) = std::env::var("TRELLIS_POLL_INTERVAL_MS") {
            let millis: u64 = millis.parse().context("TRELLIS_POLL_INTERVAL_MS")?;
            config.poll.interval = Duration::from_millis(millis);
        }
        if let Ok(size) = std::env::var("TRELLIS_PAGE_SIZE") {
            config.page.page_size = size.parse().context("TRELLIS_PAGE_SIZE")?;
        }

        Ok(config)
    }
}
