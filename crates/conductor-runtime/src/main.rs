// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The conductor agent.
//!
//! Runs inside a launched process and serves invocation requests over
//! stdio until the launcher closes the channel. Stdout carries the wire
//! protocol, so all logging goes to stderr.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use conductor_runtime::remote::SnapshotInterceptor;
use conductor_runtime::{AgentConfig, Dispatcher, register_store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AgentConfig::from_env().context("failed to read agent configuration")?;
    info!(
        agent = %config.agent_name,
        store_target = %config.store_target,
        "agent starting"
    );

    let mut dispatcher = Dispatcher::new();
    dispatcher.intercept(SnapshotInterceptor::default());
    register_store(&mut dispatcher, config.store_target.as_str());

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    conductor_protocol::serve(stdin, stdout, &dispatcher)
        .await
        .context("invocation server failed")?;

    info!("agent stopping, channel closed by launcher");
    Ok(())
}
