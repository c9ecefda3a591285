// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for conductor-runtime integration tests.
//!
//! Provides an in-process platform wired to the built-in store target and
//! a profile implementation that records its lifecycle callbacks.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use conductor_core::OptionSet;
use conductor_runtime::remote::{Dispatcher, SnapshotInterceptor};
use conductor_runtime::{
    ArtifactDeployer, DeploymentArtifact, LaunchError, Platform, Profile, RemoteProcess,
    RemoteShell, VirtualPlatform, register_store,
};

/// An in-process platform serving the built-in store under the target
/// name `store`, with snapshot normalization installed.
pub fn store_platform(name: &str) -> Arc<VirtualPlatform> {
    store_platform_with(name, OptionSet::new())
}

/// Same as [`store_platform`], with platform-level options.
pub fn store_platform_with(name: &str, options: OptionSet) -> Arc<VirtualPlatform> {
    let mut dispatcher = Dispatcher::new();
    dispatcher.intercept(SnapshotInterceptor::default());
    register_store(&mut dispatcher, "store");
    Arc::new(VirtualPlatform::new(name, Arc::new(dispatcher)).with_options(options))
}

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::default()
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Profile that appends each lifecycle callback to a shared log.
pub struct RecordingProfile {
    label: &'static str,
    log: EventLog,
    fail_launching: bool,
    fail_closing: bool,
}

impl RecordingProfile {
    pub fn new(label: &'static str, log: &EventLog) -> Self {
        RecordingProfile {
            label,
            log: Arc::clone(log),
            fail_launching: false,
            fail_closing: false,
        }
    }

    /// Make `on_launching` reject the launch.
    pub fn failing_launch(mut self) -> Self {
        self.fail_launching = true;
        self
    }

    /// Make `on_closing` return an error.
    pub fn failing_close(mut self) -> Self {
        self.fail_closing = true;
        self
    }

    fn record(&self, event: &str) {
        self.log.lock().unwrap().push(format!("{}:{event}", self.label));
    }
}

/// In-memory stand-in for a remote host: records every command executed
/// and every artifact deployed, handing out sequential pids.
#[derive(Default)]
pub struct RecordingRemoteHost {
    commands: Mutex<Vec<(String, String)>>,
    deployed: Mutex<Vec<(String, DeploymentArtifact)>>,
    next_pid: AtomicU32,
}

impl RecordingRemoteHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<(String, String)> {
        self.commands.lock().unwrap().clone()
    }

    pub fn deployed(&self) -> Vec<(String, DeploymentArtifact)> {
        self.deployed.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteShell for RecordingRemoteHost {
    async fn execute(
        &self,
        host: &str,
        command: &str,
        _options: &OptionSet,
    ) -> Result<RemoteProcess, LaunchError> {
        self.commands
            .lock()
            .unwrap()
            .push((host.to_string(), command.to_string()));
        Ok(RemoteProcess {
            host: host.to_string(),
            pid: self.next_pid.fetch_add(1, Ordering::SeqCst) + 1,
        })
    }
}

#[async_trait]
impl ArtifactDeployer for RecordingRemoteHost {
    async fn deploy(
        &self,
        artifacts: &[DeploymentArtifact],
        host: &str,
    ) -> Result<(), LaunchError> {
        let mut deployed = self.deployed.lock().unwrap();
        for artifact in artifacts {
            deployed.push((host.to_string(), artifact.clone()));
        }
        Ok(())
    }
}

impl Profile for RecordingProfile {
    fn name(&self) -> &str {
        self.label
    }

    fn on_launching(
        &self,
        _platform: &dyn Platform,
        _options: &mut OptionSet,
    ) -> Result<(), LaunchError> {
        self.record("launching");
        if self.fail_launching {
            return Err(LaunchError::ProfileRejected {
                profile: self.label.to_string(),
                reason: "rejected by test profile".to_string(),
            });
        }
        Ok(())
    }

    fn on_launched(
        &self,
        _platform: &dyn Platform,
        _application: &conductor_runtime::Application,
    ) {
        self.record("launched");
    }

    fn on_closing(
        &self,
        _platform: &dyn Platform,
        _application: &conductor_runtime::Application,
    ) -> Result<(), LaunchError> {
        self.record("closing");
        if self.fail_closing {
            return Err(LaunchError::ProfileRejected {
                profile: self.label.to_string(),
                reason: "teardown failed in test profile".to_string(),
            });
        }
        Ok(())
    }
}
