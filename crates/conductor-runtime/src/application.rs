// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Handle over a launched application.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use conductor_core::OptionSet;
use conductor_protocol::{ChannelError, InvocationChannel};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::RemoteError;
use crate::platform::Platform;
use crate::profile::UseProfile;
use crate::remote::RemoteMethodCall;

/// What the launcher started and must tear down on close.
pub(crate) enum ProcessHandle {
    /// A real child process speaking the protocol over piped stdio.
    Child(tokio::process::Child),
    /// An in-process server task behind a duplex pipe.
    Task(tokio::task::JoinHandle<()>),
}

/// A launched application and its invocation channel.
///
/// Dropping the handle without calling [`close`](Self::close) aborts the
/// channel's reader but skips profile teardown; orderly shutdown should go
/// through `close`.
pub struct Application {
    id: Uuid,
    display_name: String,
    options: OptionSet,
    platform: Arc<dyn Platform>,
    channel: Arc<InvocationChannel>,
    profiles: Vec<UseProfile>,
    launched_at: DateTime<Utc>,
    process: Mutex<Option<ProcessHandle>>,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("platform", &self.platform.name())
            .finish_non_exhaustive()
    }
}

impl Application {
    pub(crate) fn new(
        platform: Arc<dyn Platform>,
        display_name: String,
        options: OptionSet,
        channel: Arc<InvocationChannel>,
        profiles: Vec<UseProfile>,
        process: ProcessHandle,
    ) -> Self {
        Application {
            id: Uuid::new_v4(),
            display_name,
            options,
            platform,
            channel,
            profiles,
            launched_at: Utc::now(),
            process: Mutex::new(Some(process)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The fully realized option set this application was launched with.
    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn launched_at(&self) -> DateTime<Utc> {
        self.launched_at
    }

    pub(crate) fn profiles(&self) -> &[UseProfile] {
        &self.profiles
    }

    /// The invocation channel to the executing side.
    pub fn channel(&self) -> &Arc<InvocationChannel> {
        &self.channel
    }

    /// Submit a call and await its serialized result.
    pub async fn submit(&self, call: RemoteMethodCall) -> Result<Value, ChannelError> {
        let (target, method, args) = call.into_parts();
        self.channel.submit(&target, &method, args).await
    }

    /// Submit a call and decode its result.
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        call: RemoteMethodCall,
    ) -> Result<T, RemoteError> {
        let method = call.method().to_string();
        let value = self.submit(call).await?;
        serde_json::from_value(value).map_err(|err| RemoteError::Decode {
            method,
            reason: err.to_string(),
        })
    }

    /// Close the application.
    ///
    /// Profiles are notified first; a failing `on_closing` is logged and
    /// skipped so teardown always completes. The channel is then closed and
    /// the underlying process or server task stopped. Idempotent.
    #[instrument(skip(self), fields(application = %self.display_name))]
    pub async fn close(&self) {
        let Some(process) = self.process.lock().await.take() else {
            return;
        };

        for use_profile in &self.profiles {
            let profile = use_profile.profile();
            if let Err(err) = profile.on_closing(self.platform.as_ref(), self) {
                warn!(profile = profile.name(), error = %err, "profile teardown failed");
            }
        }

        self.channel.close().await;

        match process {
            ProcessHandle::Child(mut child) => {
                if let Err(err) = child.start_kill() {
                    warn!(error = %err, "failed to signal child process");
                }
                match child.wait().await {
                    Ok(status) => info!(%status, "process exited"),
                    Err(err) => warn!(error = %err, "failed to reap child process"),
                }
            }
            ProcessHandle::Task(task) => {
                task.abort();
            }
        }
    }
}
