// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Remote method dispatch.
//!
//! The calling side builds a [`RemoteMethodCall`] and submits it over an
//! invocation channel. The executing side resolves the named target through
//! a [`Dispatcher`] and runs the matching handler from its [`MethodTable`].
//! Both sides expose interceptor seams: [`CallSiteInterceptor`] runs around
//! submission, [`ExecutionSiteInterceptor`] runs around handler execution.

pub mod call;
pub mod dispatcher;
pub mod interceptor;

pub use call::RemoteMethodCall;
pub use dispatcher::{Dispatcher, MethodTable};
pub use interceptor::{CallSiteInterceptor, ExecutionSiteInterceptor, SnapshotInterceptor};
