// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Builder for calls submitted to a remote target.

use serde::Serialize;
use serde_json::Value;

use crate::error::DispatchError;

/// A method call addressed to a named target on the executing side.
///
/// Arguments are serialized at build time so that a value the wire format
/// cannot represent fails immediately, naming the method and the parameter
/// position, instead of surfacing later as an opaque channel error.
#[derive(Clone, Debug)]
pub struct RemoteMethodCall {
    target: String,
    method: String,
    args: Vec<Value>,
}

impl RemoteMethodCall {
    pub fn new(target: impl Into<String>, method: impl Into<String>) -> Self {
        RemoteMethodCall {
            target: target.into(),
            method: method.into(),
            args: Vec::new(),
        }
    }

    /// Append a serialized argument.
    pub fn arg<T: Serialize>(mut self, value: &T) -> Result<Self, DispatchError> {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.args.push(value);
                Ok(self)
            }
            Err(err) => Err(DispatchError::Serialization {
                method: self.method.clone(),
                position: self.args.len(),
                reason: err.to_string(),
            }),
        }
    }

    /// Append an already serialized argument.
    pub fn raw_arg(mut self, value: Value) -> Self {
        self.args.push(value);
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn into_parts(self) -> (String, String, Vec<Value>) {
        (self.target, self.method, self.args)
    }
}
