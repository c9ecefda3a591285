// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Invocation request/response messages.
//!
//! One request carries one invocation; the peer answers with exactly one
//! response carrying a result or a structured failure. Requests and
//! responses are correlated by `id`, so several invocations may be in
//! flight on one stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A serialized method invocation bound for a remote process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Correlation id, unique per channel.
    pub id: u64,
    /// Name of the registered target (producer) to invoke on.
    pub target: String,
    /// Method name within the target's dispatch table.
    pub method: String,
    /// Serialized positional arguments.
    pub args: Vec<Value>,
}

/// The answer to a single [`InvocationRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationResponse {
    /// Correlation id echoed from the request.
    pub id: u64,
    /// Result or structured failure.
    pub outcome: Outcome,
}

/// Result-or-failure of a remote invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The invocation completed; `value` is the serialized result.
    Ok {
        /// Serialized return value (JSON `null` for unit results).
        value: Value,
    },
    /// The invocation failed on the executing side.
    Err {
        /// Structured failure report.
        failure: RemoteFailure,
    },
}

impl Outcome {
    /// A successful outcome.
    pub fn ok(value: Value) -> Self {
        Outcome::Ok { value }
    }

    /// A failed outcome.
    pub fn err(failure: RemoteFailure) -> Self {
        Outcome::Err { failure }
    }

    /// Whether the outcome is a success.
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok { .. })
    }
}

/// A failure reported by the executing side of a channel.
///
/// `code` is a stable machine-readable string (for example
/// `TARGET_NOT_FOUND` or `INVOCATION_FAILED`); `message` carries the
/// original cause's description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFailure {
    /// Stable error code.
    pub code: String,
    /// Human-readable description carrying the original cause.
    pub message: String,
}

impl RemoteFailure {
    /// Build a failure from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code, self.message)
    }
}
