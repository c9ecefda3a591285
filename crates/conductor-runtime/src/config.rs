// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Environment-driven configuration for the agent binary.

use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Agent configuration, read from `CONDUCTOR_*` environment variables.
/// Every variable has a default; unset is never an error.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Name reported in logs. `CONDUCTOR_AGENT_NAME`, default `conductor-agent`.
    pub agent_name: String,
    /// Target name the built-in store registers under.
    /// `CONDUCTOR_STORE_TARGET`, default `store`.
    pub store_target: String,
    /// Per-request timeout. `CONDUCTOR_REQUEST_TIMEOUT_MS`, default 30000.
    pub request_timeout: Duration,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let agent_name =
            env::var("CONDUCTOR_AGENT_NAME").unwrap_or_else(|_| "conductor-agent".to_string());
        let store_target =
            env::var("CONDUCTOR_STORE_TARGET").unwrap_or_else(|_| "store".to_string());

        let request_timeout = match env::var("CONDUCTOR_REQUEST_TIMEOUT_MS") {
            Err(_) => Duration::from_millis(30_000),
            Ok(raw) => {
                let millis: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "CONDUCTOR_REQUEST_TIMEOUT_MS",
                    reason: format!("'{raw}' is not a number of milliseconds"),
                })?;
                Duration::from_millis(millis)
            }
        };

        Ok(AgentConfig {
            agent_name,
            store_target,
            request_timeout,
        })
    }
}
