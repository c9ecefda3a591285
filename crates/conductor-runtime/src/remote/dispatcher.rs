// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Execution-site dispatch of remote method calls.
//!
//! Targets are registered as named producers. The first call addressed to a
//! target runs its producer to build a [`MethodTable`]; the table is cached
//! so subsequent calls reuse the same resolved target.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use conductor_protocol::{InvocationHandler, InvocationRequest, Outcome};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::DispatchError;

pub(crate) type MethodHandler =
    Arc<dyn Fn(Vec<Value>) -> Result<Value, DispatchError> + Send + Sync>;
type Producer = Arc<dyn Fn() -> Result<MethodTable, DispatchError> + Send + Sync>;

/// Named method handlers for a single resolved target.
pub struct MethodTable {
    methods: HashMap<String, MethodHandler>,
}

impl MethodTable {
    pub fn new() -> Self {
        MethodTable {
            methods: HashMap::new(),
        }
    }

    /// Register a handler under `name`.
    ///
    /// Method names must be distinct; overloading by arity or argument type
    /// is not supported, so a duplicate registration is a programming error
    /// and panics.
    pub fn method(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(Vec<Value>) -> Result<Value, DispatchError> + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        if self.methods.insert(name.clone(), Arc::new(handler)).is_some() {
            panic!("duplicate method '{name}' in method table");
        }
        self
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub(crate) fn handler(&self, name: &str) -> Option<&MethodHandler> {
        self.methods.get(name)
    }
}

impl Default for MethodTable {
    fn default() -> Self {
        MethodTable::new()
    }
}

/// Routes incoming invocation requests to registered targets.
pub struct Dispatcher {
    producers: HashMap<String, Producer>,
    resolved: Mutex<HashMap<String, Arc<MethodTable>>>,
    interceptors: Vec<Arc<dyn crate::remote::ExecutionSiteInterceptor>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher {
            producers: HashMap::new(),
            resolved: Mutex::new(HashMap::new()),
            interceptors: Vec::new(),
        }
    }

    /// Register a target producer under `name`. The producer runs on first
    /// use and its table is cached for the lifetime of the dispatcher.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        producer: impl Fn() -> Result<MethodTable, DispatchError> + Send + Sync + 'static,
    ) {
        self.producers.insert(name.into(), Arc::new(producer));
    }

    /// Add an execution-site interceptor. Interceptors run in the order
    /// they were added, across every registered target.
    pub fn intercept(&mut self, interceptor: impl crate::remote::ExecutionSiteInterceptor + 'static) {
        self.interceptors.push(Arc::new(interceptor));
    }

    /// Dispatch a single request, converting any error into a failure
    /// outcome for the wire.
    #[instrument(skip(self, request), fields(target = %request.target, method = %request.method))]
    pub fn dispatch(&self, request: InvocationRequest) -> Outcome {
        match self.dispatch_inner(&request.target, &request.method, request.args) {
            Ok(value) => Outcome::ok(value),
            Err(err) => {
                warn!(code = err.error_code(), error = %err, "dispatch failed");
                Outcome::err(err.to_failure())
            }
        }
    }

    fn resolve(&self, target: &str) -> Result<Arc<MethodTable>, DispatchError> {
        let mut resolved = self
            .resolved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(table) = resolved.get(target) {
            return Ok(Arc::clone(table));
        }
        let producer = self
            .producers
            .get(target)
            .ok_or_else(|| DispatchError::TargetNotFound {
                target: target.to_string(),
            })?;
        let table = producer().map_err(|err| DispatchError::TargetResolution {
            target: target.to_string(),
            reason: err.to_string(),
        })?;
        debug!(target, methods = table.len(), "resolved target");
        let table = Arc::new(table);
        resolved.insert(target.to_string(), Arc::clone(&table));
        Ok(table)
    }

    fn dispatch_inner(
        &self,
        target: &str,
        method: &str,
        mut args: Vec<Value>,
    ) -> Result<Value, DispatchError> {
        let table = self.resolve(target)?;
        let handler = table
            .handler(method)
            .cloned()
            .ok_or_else(|| DispatchError::MethodNotFound {
                target: target.to_string(),
                method: method.to_string(),
            })?;

        for interceptor in &self.interceptors {
            interceptor.before_execution(method, &mut args)?;
        }

        match handler(args) {
            Ok(mut result) => {
                for interceptor in &self.interceptors {
                    result = interceptor.after_execution(method, result);
                }
                Ok(result)
            }
            Err(err) => {
                let mut err = err;
                for interceptor in &self.interceptors {
                    err = interceptor.on_execution_failure(method, err);
                }
                Err(err)
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new()
    }
}

#[async_trait]
impl InvocationHandler for Dispatcher {
    async fn handle(&self, request: InvocationRequest) -> Outcome {
        self.dispatch(request)
    }
}
