// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the runtime layer.
//!
//! `LaunchError` covers everything that can go wrong while realizing options
//! and starting an application. `DispatchError` is the execution-site error
//! for remote method dispatch and maps onto wire-level `RemoteFailure` codes.
//! `RemoteError` is the caller-side error surfaced by proxies.

use conductor_core::OptionError;
use conductor_protocol::{ChannelError, RemoteFailure};
use thiserror::Error;

/// Errors raised while preparing or launching an application.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// No `Executable` option was present in the realized option set.
    #[error("no executable was defined for the launch")]
    MissingExecutable,

    /// A profile vetoed the launch during `on_launching`.
    #[error("profile '{profile}' rejected the launch: {reason}")]
    ProfileRejected { profile: String, reason: String },

    /// Option realization failed (for example port allocation).
    #[error(transparent)]
    Option(#[from] OptionError),

    /// The underlying process could not be started.
    #[error("failed to start process: {0}")]
    StartFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Execution-site errors raised while dispatching a remote method call.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no target registered under '{target}'")]
    TargetNotFound { target: String },

    #[error("failed to resolve target '{target}': {reason}")]
    TargetResolution { target: String, reason: String },

    #[error("no method named '{method}' on target '{target}'")]
    MethodNotFound { target: String, method: String },

    #[error("method '{method}' failed: {reason}")]
    InvocationFailed { method: String, reason: String },

    #[error("method '{method}' is not supported for remote execution")]
    Unsupported { method: String },

    #[error("cannot serialize argument {position} of '{method}': {reason}")]
    Serialization {
        method: String,
        position: usize,
        reason: String,
    },

    #[error("invalid argument {position} of '{method}': {reason}")]
    InvalidArgument {
        method: String,
        position: usize,
        reason: String,
    },
}

impl DispatchError {
    /// Stable machine-readable code carried in the wire-level failure.
    pub fn error_code(&self) -> &'static str {
        match self {
            DispatchError::TargetNotFound { .. } => "TARGET_NOT_FOUND",
            DispatchError::TargetResolution { .. } => "TARGET_RESOLUTION_FAILED",
            DispatchError::MethodNotFound { .. } => "METHOD_NOT_FOUND",
            DispatchError::InvocationFailed { .. } => "INVOCATION_FAILED",
            DispatchError::Unsupported { .. } => "UNSUPPORTED",
            DispatchError::Serialization { .. } => "SERIALIZATION_ERROR",
            DispatchError::InvalidArgument { .. } => "INVALID_ARGUMENT",
        }
    }

    /// Convert into the failure payload sent back over the channel.
    pub fn to_failure(&self) -> RemoteFailure {
        RemoteFailure::new(self.error_code(), self.to_string())
    }
}

/// Caller-side errors surfaced by remote proxies and `Application::invoke`.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The operation is rejected locally, without any remote round trip.
    #[error("the method '{method}' is not supported for remote execution")]
    Unsupported { method: &'static str },

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("cannot decode result of '{method}': {reason}")]
    Decode { method: String, reason: String },
}

impl RemoteError {
    /// The remote failure carried by this error, if it is one.
    pub fn remote_failure(&self) -> Option<&RemoteFailure> {
        match self {
            RemoteError::Channel(ChannelError::Remote(failure)) => Some(failure),
            _ => None,
        }
    }
}
