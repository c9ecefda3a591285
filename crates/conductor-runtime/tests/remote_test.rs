// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Integration tests for remote invocation through a launched application.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use conductor_core::{OptionSet, Timeout};
use conductor_protocol::{
    ChannelError, InvocationHandler, InvocationRequest, Outcome, RemoteFailure,
};
use conductor_runtime::remote::{CallSiteInterceptor, RemoteMethodCall};
use conductor_runtime::store::RemoteStore;
use conductor_runtime::{Launcher, RemoteError, VirtualPlatform};
use serde_json::{Value, json};

use common::store_platform;

#[tokio::test]
async fn test_store_round_trip() {
    let platform = store_platform("virtual");
    let application = platform.launch(OptionSet::new()).await.unwrap();
    let store = RemoteStore::open(&application, "store");

    assert_eq!(store.get("alpha").await.unwrap(), None);
    assert_eq!(store.put("alpha", &1).await.unwrap(), None);
    assert_eq!(store.put("alpha", &2).await.unwrap(), Some(json!(1)));
    assert_eq!(store.get("alpha").await.unwrap(), Some(json!(2)));
    assert!(store.contains("alpha").await.unwrap());
    assert_eq!(store.len().await.unwrap(), 1);
    assert_eq!(store.remove("alpha").await.unwrap(), Some(json!(2)));
    assert!(store.is_empty().await.unwrap());

    application.close().await;
}

#[tokio::test]
async fn test_keys_and_entries_are_ordered_snapshots() {
    let platform = store_platform("virtual");
    let application = platform.launch(OptionSet::new()).await.unwrap();
    let store = RemoteStore::open(&application, "store");

    store.put("cherry", &3).await.unwrap();
    store.put("apple", &1).await.unwrap();
    store.put("banana", &2).await.unwrap();

    assert_eq!(store.keys().await.unwrap(), vec!["apple", "banana", "cherry"]);

    let entries = store.entries().await.unwrap();
    assert_eq!(
        entries,
        vec![
            ("apple".to_string(), json!(1)),
            ("banana".to_string(), json!(2)),
            ("cherry".to_string(), json!(3)),
        ]
    );

    // The snapshot is detached from live state.
    store.clear().await.unwrap();
    assert_eq!(entries.len(), 3);

    application.close().await;
}

#[tokio::test]
async fn test_put_all_accepts_any_entry_collection() {
    let platform = store_platform("virtual");
    let application = platform.launch(OptionSet::new()).await.unwrap();
    let store = RemoteStore::open(&application, "store");

    let mut map = HashMap::new();
    map.insert("a".to_string(), 1);
    map.insert("b".to_string(), 2);
    store.put_all(map).await.unwrap();

    let pairs = vec![("c".to_string(), 3), ("d".to_string(), 4)];
    store.put_all(pairs).await.unwrap();

    assert_eq!(store.len().await.unwrap(), 4);
    assert_eq!(store.keys().await.unwrap(), vec!["a", "b", "c", "d"]);

    application.close().await;
}

/// Counts every request that reaches the executing side.
struct CountingHandler {
    requests: Arc<AtomicU64>,
}

#[async_trait]
impl InvocationHandler for CountingHandler {
    async fn handle(&self, _request: InvocationRequest) -> Outcome {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Outcome::err(RemoteFailure::new("UNSUPPORTED", "not under test"))
    }
}

#[tokio::test]
async fn test_watch_fails_fast_without_a_round_trip() {
    let requests = Arc::new(AtomicU64::new(0));
    let platform = Arc::new(VirtualPlatform::new(
        "virtual",
        Arc::new(CountingHandler {
            requests: Arc::clone(&requests),
        }),
    ));
    let application = platform.launch(OptionSet::new()).await.unwrap();
    let store = RemoteStore::open(&application, "store");

    let err = store.watch().unwrap_err();
    assert!(matches!(err, RemoteError::Unsupported { method: "watch" }));
    assert_eq!(requests.load(Ordering::SeqCst), 0);

    application.close().await;
}

#[tokio::test]
async fn test_dispatch_failures_pass_through_to_the_caller() {
    let platform = store_platform("virtual");
    let application = platform.launch(OptionSet::new()).await.unwrap();

    let err = application
        .submit(RemoteMethodCall::new("store", "missing"))
        .await
        .unwrap_err();
    match err {
        ChannelError::Remote(failure) => assert_eq!(failure.code, "METHOD_NOT_FOUND"),
        other => panic!("unexpected error: {other:?}"),
    }

    let err = application
        .submit(RemoteMethodCall::new("nowhere", "get"))
        .await
        .unwrap_err();
    match err {
        ChannelError::Remote(failure) => assert_eq!(failure.code, "TARGET_NOT_FOUND"),
        other => panic!("unexpected error: {other:?}"),
    }

    application.close().await;
}

/// Never answers, so every submission runs into its deadline.
struct StallingHandler;

#[async_trait]
impl InvocationHandler for StallingHandler {
    async fn handle(&self, _request: InvocationRequest) -> Outcome {
        futures::future::pending().await
    }
}

#[tokio::test]
async fn test_timeout_is_distinct_from_remote_failure() {
    let platform = Arc::new(
        VirtualPlatform::new("virtual", Arc::new(StallingHandler))
            .with_options(OptionSet::of(Timeout::from_millis(100))),
    );
    let application = platform.launch(OptionSet::new()).await.unwrap();

    let err = application
        .submit(RemoteMethodCall::new("store", "get").raw_arg(json!("k")))
        .await
        .unwrap_err();
    assert!(matches!(err, ChannelError::Timeout(_)));

    application.close().await;
}

/// Tags remote failures with the proxy method they came from.
struct TaggingInterceptor;

impl CallSiteInterceptor for TaggingInterceptor {
    fn on_failure(&self, method: &str, failure: RemoteFailure) -> RemoteFailure {
        RemoteFailure::new(failure.code, format!("store.{method}: {}", failure.message))
    }
}

#[tokio::test]
async fn test_call_site_interceptor_sees_failures() {
    let platform = store_platform("virtual");
    let application = platform.launch(OptionSet::new()).await.unwrap();

    let mut store = RemoteStore::open(&application, "nowhere");
    store.intercept(TaggingInterceptor);

    let err = store.get("k").await.unwrap_err();
    let failure = err.remote_failure().expect("remote failure");
    assert_eq!(failure.code, "TARGET_NOT_FOUND");
    assert!(failure.message.starts_with("store.get:"));

    application.close().await;
}

#[tokio::test]
async fn test_invoke_decodes_typed_results() {
    let platform = store_platform("virtual");
    let application = platform.launch(OptionSet::new()).await.unwrap();
    let store = RemoteStore::open(&application, "store");

    store.put("k", &"v").await.unwrap();
    let len: usize = application
        .invoke(RemoteMethodCall::new("store", "len"))
        .await
        .unwrap();
    assert_eq!(len, 1);

    // A shape mismatch is a decode error, not a remote failure.
    let err = application
        .invoke::<Vec<Value>>(RemoteMethodCall::new("store", "len"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Decode { .. }));

    application.close().await;
}

#[tokio::test]
async fn test_closed_application_fails_pending_work() {
    let platform = store_platform("virtual");
    let application = platform.launch(OptionSet::new()).await.unwrap();
    let store = RemoteStore::open(&application, "store");

    application.close().await;

    let err = store.get("k").await.unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Channel(ChannelError::ConnectionClosed)
    ));
}
