// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Platforms that launch and host applications.
//!
//! [`LocalPlatform`] spawns real child processes and talks to them over
//! piped stdio. [`VirtualPlatform`] hosts the executing side in-process
//! over a duplex pipe, which keeps the full launch and invocation path
//! exercisable without spawning anything.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use conductor_core::{OptionSet, Timeout};
use conductor_protocol::{InvocationChannel, InvocationHandler, serve};
use tokio::process::Command;
use tracing::{info, instrument, warn};

use crate::application::{Application, ProcessHandle};
use crate::error::LaunchError;
use crate::launch;
use crate::options::{Arguments, DisplayName, EnvironmentVariables, Executable, WorkingDirectory};

/// Identity of something applications can be launched on.
pub trait Platform: Send + Sync {
    /// Name of this platform, used in diagnostics.
    fn name(&self) -> &str;

    /// Options every launch on this platform starts from.
    fn options(&self) -> &OptionSet;
}

/// A platform that can launch applications.
#[async_trait]
pub trait Launcher: Platform {
    /// Launch an application described by the platform's options overlaid
    /// with `overrides`.
    async fn launch(self: Arc<Self>, overrides: OptionSet) -> Result<Application, LaunchError>;
}

/// Launches child processes on the local host.
pub struct LocalPlatform {
    name: String,
    options: OptionSet,
}

impl LocalPlatform {
    pub fn new(name: impl Into<String>) -> Self {
        LocalPlatform {
            name: name.into(),
            options: OptionSet::new(),
        }
    }

    /// Replace the platform-level options.
    pub fn with_options(mut self, options: OptionSet) -> Self {
        self.options = options;
        self
    }
}

impl Platform for LocalPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &OptionSet {
        &self.options
    }
}

#[async_trait]
impl Launcher for LocalPlatform {
    #[instrument(skip(self, overrides), fields(platform = %self.name))]
    async fn launch(self: Arc<Self>, overrides: OptionSet) -> Result<Application, LaunchError> {
        let (mut options, profiles) = launch::prepare(self.as_ref(), overrides)?;

        let executable = options
            .get::<Executable>()
            .ok_or(LaunchError::MissingExecutable)?;
        let display_name = options.get_or_insert_default(DisplayName::of(executable.name()));

        let mut command = Command::new(executable.name());
        command.args(options.get_or_default::<Arguments>().resolve());
        for (name, value) in options.get_or_default::<EnvironmentVariables>().realize() {
            command.env(name, value);
        }
        if let Some(directory) = options.get::<WorkingDirectory>() {
            command.current_dir(directory.path());
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|err| LaunchError::StartFailed(err.to_string()))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LaunchError::StartFailed("child stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LaunchError::StartFailed("child stdout not captured".into()))?;

        let timeout = options.get_or_default::<Timeout>().duration();
        let channel = InvocationChannel::open(stdout, stdin, timeout);

        info!(
            executable = executable.name(),
            application = display_name.as_str(),
            "launched process"
        );

        let application = Application::new(
            self,
            display_name.as_str().to_string(),
            options,
            Arc::new(channel),
            profiles,
            ProcessHandle::Child(child),
        );
        launch::notify_launched(&application);
        Ok(application)
    }
}

/// Hosts the executing side in-process behind a duplex pipe.
///
/// The supplied handler, typically a [`crate::remote::Dispatcher`], serves
/// every application launched on this platform.
pub struct VirtualPlatform {
    name: String,
    options: OptionSet,
    handler: Arc<dyn InvocationHandler>,
}

impl VirtualPlatform {
    pub fn new(name: impl Into<String>, handler: Arc<dyn InvocationHandler>) -> Self {
        VirtualPlatform {
            name: name.into(),
            options: OptionSet::new(),
            handler,
        }
    }

    /// Replace the platform-level options.
    pub fn with_options(mut self, options: OptionSet) -> Self {
        self.options = options;
        self
    }
}

impl Platform for VirtualPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &OptionSet {
        &self.options
    }
}

#[async_trait]
impl Launcher for VirtualPlatform {
    #[instrument(skip(self, overrides), fields(platform = %self.name))]
    async fn launch(self: Arc<Self>, overrides: OptionSet) -> Result<Application, LaunchError> {
        let (mut options, profiles) = launch::prepare(self.as_ref(), overrides)?;
        let display_name = options.get_or_insert_default(DisplayName::of("in-process"));

        let (host_side, application_side) = tokio::io::duplex(64 * 1024);
        let (host_read, host_write) = tokio::io::split(host_side);
        let (application_read, application_write) = tokio::io::split(application_side);

        let handler = Arc::clone(&self.handler);
        let server = tokio::spawn(async move {
            if let Err(err) = serve(application_read, application_write, handler.as_ref()).await {
                warn!(error = %err, "in-process server ended with error");
            }
        });

        let timeout = options.get_or_default::<Timeout>().duration();
        let channel = InvocationChannel::open(host_read, host_write, timeout);

        let application = Application::new(
            self,
            display_name.as_str().to_string(),
            options,
            Arc::new(channel),
            profiles,
            ProcessHandle::Task(server),
        );
        launch::notify_launched(&application);
        Ok(application)
    }
}

/// Where a deployable artifact comes from and where it lands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentArtifact {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl DeploymentArtifact {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        DeploymentArtifact {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Handle for a process started on a remote host through a [`RemoteShell`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteProcess {
    pub host: String,
    pub pid: u32,
}

/// Executes command lines on named remote hosts.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run `command` on `host`. Working directory and environment overrides
    /// are taken from `options` when present.
    async fn execute(
        &self,
        host: &str,
        command: &str,
        options: &OptionSet,
    ) -> Result<RemoteProcess, LaunchError>;
}

/// Copies artifacts onto a named remote host ahead of a launch.
#[async_trait]
pub trait ArtifactDeployer: Send + Sync {
    async fn deploy(
        &self,
        artifacts: &[DeploymentArtifact],
        host: &str,
    ) -> Result<(), LaunchError>;
}
