// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Interceptor seams around remote invocation.
//!
//! Call-site interceptors run on the submitting side, before a call leaves
//! and after its result (or failure) comes back. Execution-site interceptors
//! run on the dispatching side, around the handler itself. The two sides are
//! deliberately separate traits: a call-site hook never sees handler errors
//! before they are converted to wire failures, and an execution-site hook
//! never sees channel-level conditions such as timeouts.

use std::collections::HashSet;

use conductor_protocol::RemoteFailure;
use serde_json::Value;

use crate::error::DispatchError;

/// Hooks on the submitting side of a remote call.
pub trait CallSiteInterceptor: Send + Sync {
    /// Rewrite arguments before submission. An error aborts the call locally.
    fn before_remote(&self, _method: &str, _args: &mut Vec<Value>) -> Result<(), DispatchError> {
        Ok(())
    }

    /// Rewrite a successful result after it arrives.
    fn after_remote(&self, _method: &str, result: Value) -> Value {
        result
    }

    /// Rewrite a remote failure before it is surfaced to the caller.
    fn on_failure(&self, _method: &str, failure: RemoteFailure) -> RemoteFailure {
        failure
    }
}

/// Hooks on the dispatching side of a remote call.
pub trait ExecutionSiteInterceptor: Send + Sync {
    /// Rewrite arguments before the handler runs. An error fails the call.
    fn before_execution(&self, _method: &str, _args: &mut Vec<Value>) -> Result<(), DispatchError> {
        Ok(())
    }

    /// Rewrite a successful handler result before it is sent back.
    fn after_execution(&self, _method: &str, result: Value) -> Value {
        result
    }

    /// Rewrite a handler error before it is converted to a wire failure.
    fn on_execution_failure(&self, _method: &str, error: DispatchError) -> DispatchError {
        error
    }
}

/// Execution-site interceptor that turns live-view results into concrete,
/// deterministically ordered snapshots before they cross the wire.
///
/// Handlers that iterate hash-ordered state (`keys`, `entries`) produce
/// arrays in an unstable order; for the configured methods this interceptor
/// sorts plain string arrays lexicographically and arrays of `[key, value]`
/// pairs by key.
pub struct SnapshotInterceptor {
    methods: HashSet<String>,
}

impl SnapshotInterceptor {
    pub fn for_methods<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SnapshotInterceptor {
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for SnapshotInterceptor {
    fn default() -> Self {
        SnapshotInterceptor::for_methods(["keys", "entries"])
    }
}

impl ExecutionSiteInterceptor for SnapshotInterceptor {
    fn after_execution(&self, method: &str, result: Value) -> Value {
        if !self.methods.contains(method) {
            return result;
        }
        match result {
            Value::Array(mut items) => {
                items.sort_by(|a, b| sort_key(a).cmp(sort_key(b)));
                Value::Array(items)
            }
            other => other,
        }
    }
}

fn sort_key(value: &Value) -> &str {
    match value {
        Value::String(s) => s.as_str(),
        // A [key, value] pair sorts by its key.
        Value::Array(pair) => pair.first().and_then(Value::as_str).unwrap_or(""),
        _ => "",
    }
}
