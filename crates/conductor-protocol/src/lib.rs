// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Wire protocol layer for conductor.
//!
//! The protocol is deliberately small: each request carries one serialized
//! invocation and receives one serialized result-or-failure. It runs over
//! any bidirectional byte stream: a child process's stdio, a socket, or an
//! in-memory duplex pair in tests. Framing is a fixed header (length +
//! message type) followed by a JSON payload.

pub mod channel;
pub mod frame;
pub mod messages;
pub mod server;

pub use channel::{ChannelError, InvocationChannel};
pub use frame::{Frame, FrameError, FramedStream, HEADER_SIZE, MAX_FRAME_SIZE, MessageType};
pub use messages::{InvocationRequest, InvocationResponse, Outcome, RemoteFailure};
pub use server::{InvocationHandler, serve};
