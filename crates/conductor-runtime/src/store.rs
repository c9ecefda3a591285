// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Key-value store target and its client-side proxy.
//!
//! [`register_store`] installs the executing-side target on a dispatcher;
//! its state lives for the lifetime of the resolved target. [`RemoteStore`]
//! is the caller-side proxy over an application's invocation channel.
//!
//! Change notification is deliberately absent from the remote surface:
//! [`RemoteStore::watch`] fails immediately, without a round trip, because
//! a subscription cannot be represented over the serialized channel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use conductor_protocol::ChannelError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::application::Application;
use crate::error::{DispatchError, RemoteError};
use crate::remote::{CallSiteInterceptor, Dispatcher, MethodTable};

/// Register a store target under `name`. The backing map is created when
/// the target is first resolved and shared by every method.
pub fn register_store(dispatcher: &mut Dispatcher, name: impl Into<String>) {
    dispatcher.register(name, || Ok(store_table()));
}

type Store = Arc<Mutex<HashMap<String, Value>>>;

fn store_table() -> MethodTable {
    let store: Store = Arc::default();

    MethodTable::new()
        .method("get", {
            let store = store.clone();
            move |args| {
                let key = string_arg("get", 0, &args)?;
                Ok(lock(&store).get(&key).cloned().unwrap_or(Value::Null))
            }
        })
        .method("put", {
            let store = store.clone();
            move |args| {
                let key = string_arg("put", 0, &args)?;
                let value = args.get(1).cloned().ok_or_else(|| missing_arg("put", 1))?;
                Ok(lock(&store).insert(key, value).unwrap_or(Value::Null))
            }
        })
        .method("remove", {
            let store = store.clone();
            move |args| {
                let key = string_arg("remove", 0, &args)?;
                Ok(lock(&store).remove(&key).unwrap_or(Value::Null))
            }
        })
        .method("contains", {
            let store = store.clone();
            move |args| {
                let key = string_arg("contains", 0, &args)?;
                Ok(Value::Bool(lock(&store).contains_key(&key)))
            }
        })
        .method("len", {
            let store = store.clone();
            move |_| Ok(Value::from(lock(&store).len()))
        })
        .method("clear", {
            let store = store.clone();
            move |_| {
                lock(&store).clear();
                Ok(Value::Null)
            }
        })
        .method("keys", {
            let store = store.clone();
            move |_| {
                // Hash order; a snapshot interceptor makes this deterministic.
                Ok(Value::Array(
                    lock(&store).keys().cloned().map(Value::String).collect(),
                ))
            }
        })
        .method("entries", {
            let store = store.clone();
            move |_| {
                Ok(Value::Array(
                    lock(&store)
                        .iter()
                        .map(|(k, v)| Value::Array(vec![Value::String(k.clone()), v.clone()]))
                        .collect(),
                ))
            }
        })
        .method("put_all", {
            let store = store.clone();
            move |args| {
                let entries = match args.first() {
                    Some(Value::Object(map)) => map.clone(),
                    _ => {
                        return Err(DispatchError::InvalidArgument {
                            method: "put_all".into(),
                            position: 0,
                            reason: "expected an object of entries".into(),
                        });
                    }
                };
                let mut guard = lock(&store);
                for (key, value) in entries {
                    guard.insert(key, value);
                }
                Ok(Value::Null)
            }
        })
}

fn lock(store: &Store) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn string_arg(method: &str, position: usize, args: &[Value]) -> Result<String, DispatchError> {
    args.get(position)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DispatchError::InvalidArgument {
            method: method.to_string(),
            position,
            reason: "expected a string".into(),
        })
}

fn missing_arg(method: &str, position: usize) -> DispatchError {
    DispatchError::InvalidArgument {
        method: method.to_string(),
        position,
        reason: "missing argument".into(),
    }
}

/// Caller-side proxy over a store target in a launched application.
pub struct RemoteStore {
    channel: Arc<conductor_protocol::InvocationChannel>,
    target: String,
    interceptors: Vec<Arc<dyn CallSiteInterceptor>>,
}

impl RemoteStore {
    /// Open a proxy over `application`'s channel, addressing `target`.
    pub fn open(application: &Application, target: impl Into<String>) -> Self {
        RemoteStore {
            channel: Arc::clone(application.channel()),
            target: target.into(),
            interceptors: Vec::new(),
        }
    }

    /// Add a call-site interceptor. Interceptors run in addition order.
    pub fn intercept(&mut self, interceptor: impl CallSiteInterceptor + 'static) {
        self.interceptors.push(Arc::new(interceptor));
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>, RemoteError> {
        let value = self.remotely_invoke("get", vec![Value::from(key)]).await?;
        Ok(non_null(value))
    }

    /// Insert `value` under `key`, returning the previous value if any.
    pub async fn put<V: Serialize>(
        &self,
        key: &str,
        value: &V,
    ) -> Result<Option<Value>, RemoteError> {
        let value = serialize_arg("put", 1, value)?;
        let previous = self
            .remotely_invoke("put", vec![Value::from(key), value])
            .await?;
        Ok(non_null(previous))
    }

    pub async fn remove(&self, key: &str) -> Result<Option<Value>, RemoteError> {
        let value = self
            .remotely_invoke("remove", vec![Value::from(key)])
            .await?;
        Ok(non_null(value))
    }

    pub async fn contains(&self, key: &str) -> Result<bool, RemoteError> {
        let value = self
            .remotely_invoke("contains", vec![Value::from(key)])
            .await?;
        decode("contains", value)
    }

    pub async fn len(&self) -> Result<usize, RemoteError> {
        let value = self.remotely_invoke("len", Vec::new()).await?;
        decode("len", value)
    }

    pub async fn is_empty(&self) -> Result<bool, RemoteError> {
        Ok(self.len().await? == 0)
    }

    pub async fn clear(&self) -> Result<(), RemoteError> {
        self.remotely_invoke("clear", Vec::new()).await?;
        Ok(())
    }

    /// A point-in-time snapshot of the keys.
    pub async fn keys(&self) -> Result<Vec<String>, RemoteError> {
        let value = self.remotely_invoke("keys", Vec::new()).await?;
        decode("keys", value)
    }

    /// A point-in-time snapshot of the entries.
    pub async fn entries(&self) -> Result<Vec<(String, Value)>, RemoteError> {
        let value = self.remotely_invoke("entries", Vec::new()).await?;
        decode("entries", value)
    }

    /// Insert every entry. The entries are copied into a concrete map
    /// before submission, whatever collection they came from.
    pub async fn put_all<I, V>(&self, entries: I) -> Result<(), RemoteError>
    where
        I: IntoIterator<Item = (String, V)>,
        V: Serialize,
    {
        let mut map = Map::new();
        for (position, (key, value)) in entries.into_iter().enumerate() {
            map.insert(key, serialize_arg("put_all", position, &value)?);
        }
        self.remotely_invoke("put_all", vec![Value::Object(map)])
            .await?;
        Ok(())
    }

    /// Change notification is not supported over the serialized channel.
    /// Fails immediately without contacting the executing side.
    pub fn watch(&self) -> Result<(), RemoteError> {
        Err(RemoteError::Unsupported { method: "watch" })
    }

    #[instrument(skip(self, args), fields(target = %self.target, method = %method))]
    async fn remotely_invoke(
        &self,
        method: &'static str,
        mut args: Vec<Value>,
    ) -> Result<Value, RemoteError> {
        for interceptor in &self.interceptors {
            interceptor.before_remote(method, &mut args)?;
        }

        match self.channel.submit(&self.target, method, args).await {
            Ok(mut result) => {
                for interceptor in &self.interceptors {
                    result = interceptor.after_remote(method, result);
                }
                Ok(result)
            }
            Err(ChannelError::Remote(mut failure)) => {
                for interceptor in &self.interceptors {
                    failure = interceptor.on_failure(method, failure);
                }
                Err(ChannelError::Remote(failure).into())
            }
            Err(other) => Err(other.into()),
        }
    }
}

fn non_null(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        other => Some(other),
    }
}

fn serialize_arg<V: Serialize>(
    method: &str,
    position: usize,
    value: &V,
) -> Result<Value, RemoteError> {
    serde_json::to_value(value).map_err(|err| {
        DispatchError::Serialization {
            method: method.to_string(),
            position,
            reason: err.to_string(),
        }
        .into()
    })
}

fn decode<T: DeserializeOwned>(method: &'static str, value: Value) -> Result<T, RemoteError> {
    serde_json::from_value(value).map_err(|err| RemoteError::Decode {
        method: method.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(table: &MethodTable, method: &str, args: Vec<Value>) -> Result<Value, DispatchError> {
        (table.handler(method).unwrap())(args)
    }

    #[test]
    fn test_put_get_remove_round_trip() {
        let table = store_table();
        assert_eq!(call(&table, "get", vec![json!("k")]).unwrap(), Value::Null);
        assert_eq!(
            call(&table, "put", vec![json!("k"), json!(1)]).unwrap(),
            Value::Null
        );
        assert_eq!(
            call(&table, "put", vec![json!("k"), json!(2)]).unwrap(),
            json!(1)
        );
        assert_eq!(call(&table, "get", vec![json!("k")]).unwrap(), json!(2));
        assert_eq!(call(&table, "remove", vec![json!("k")]).unwrap(), json!(2));
        assert_eq!(call(&table, "len", vec![]).unwrap(), json!(0));
    }

    #[test]
    fn test_put_all_and_clear() {
        let table = store_table();
        let entries = json!({"a": 1, "b": 2});
        call(&table, "put_all", vec![entries]).unwrap();
        assert_eq!(call(&table, "len", vec![]).unwrap(), json!(2));
        assert_eq!(call(&table, "contains", vec![json!("a")]).unwrap(), json!(true));
        call(&table, "clear", vec![]).unwrap();
        assert_eq!(call(&table, "len", vec![]).unwrap(), json!(0));
    }

    #[test]
    fn test_non_string_key_is_invalid_argument() {
        let table = store_table();
        let err = call(&table, "get", vec![json!(42)]).unwrap_err();
        match err {
            DispatchError::InvalidArgument { method, position, .. } => {
                assert_eq!(method, "get");
                assert_eq!(position, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_put_all_rejects_non_object() {
        let table = store_table();
        let err = call(&table, "put_all", vec![json!([1, 2])]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_each_resolved_store_is_independent() {
        let first = store_table();
        let second = store_table();
        call(&first, "put", vec![json!("k"), json!(1)]).unwrap();
        assert_eq!(call(&second, "len", vec![]).unwrap(), json!(0));
    }
}
