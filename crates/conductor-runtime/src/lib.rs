// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Runtime layer for conductor.
//!
//! Builds on [`conductor_core`] (option composition) and
//! [`conductor_protocol`] (framed invocation channel) to provide:
//!
//! - Process-shaped option types (`Executable`, `Arguments`, ...)
//! - The `Profile` lifecycle (launch-time customization hooks)
//! - Remote method dispatch with call-site and execution-site interceptors
//! - Platforms that launch and track applications, locally or in-process
//! - A client-side `RemoteStore` proxy over a launched agent

pub mod application;
pub mod config;
pub mod error;
pub mod launch;
pub mod options;
pub mod platform;
pub mod profile;
pub mod remote;
pub mod store;

pub use application::Application;
pub use config::{AgentConfig, ConfigError};
pub use error::{DispatchError, LaunchError, RemoteError};
pub use options::{
    Argument, Arguments, DisplayName, EnvironmentVariable, EnvironmentVariables, Executable,
    WorkingDirectory,
};
pub use platform::{
    ArtifactDeployer, DeploymentArtifact, LocalPlatform, Launcher, Platform, RemoteProcess,
    RemoteShell, VirtualPlatform,
};
pub use profile::{OpenPortProfile, Profile, Profiles, UseProfile};
pub use remote::{
    CallSiteInterceptor, Dispatcher, ExecutionSiteInterceptor, MethodTable, RemoteMethodCall,
    SnapshotInterceptor,
};
pub use store::{RemoteStore, register_store};
