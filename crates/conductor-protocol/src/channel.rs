// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Caller-side invocation channel.
//!
//! An [`InvocationChannel`] owns the write half of a connection and a
//! background task draining the read half. Submissions are correlated with
//! responses by request id, so any number of invocations may be in flight
//! concurrently; each one resolves independently. No ordering is guaranteed
//! between two independently submitted invocations - callers that need
//! sequencing must await one result before submitting the next.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::frame::{Frame, FrameError, MessageType, read_frame, write_frame};
use crate::messages::{InvocationRequest, InvocationResponse, Outcome, RemoteFailure};

/// Errors that can occur while submitting through a channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The executing side reported a structured failure. This is an
    /// application-level error; the channel itself is still usable.
    #[error("remote failure: {0}")]
    Remote(RemoteFailure),

    /// No response arrived within the caller's wait budget. Distinct from
    /// [`ChannelError::Remote`] so callers can decide to retry.
    #[error("invocation timed out after {0}ms")]
    Timeout(u64),

    /// The connection went away before a response arrived.
    #[error("connection closed")]
    ConnectionClosed,

    /// A request could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Framing or transport failure while writing.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Raw I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

type PendingMap = Arc<StdMutex<HashMap<u64, oneshot::Sender<Outcome>>>>;

/// Caller-side handle for a bidirectional invocation stream.
pub struct InvocationChannel {
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
    pending: PendingMap,
    next_id: AtomicU64,
    default_timeout: Duration,
    reader_task: JoinHandle<()>,
    closed: AtomicBool,
}

impl InvocationChannel {
    /// Wrap the two halves of a connection, spawning the reader task.
    ///
    /// `default_timeout` bounds [`submit`](Self::submit); use
    /// [`submit_with_timeout`](Self::submit_with_timeout) to override per
    /// call.
    pub fn open<R, W>(reader: R, writer: W, default_timeout: Duration) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let pending: PendingMap = Arc::new(StdMutex::new(HashMap::new()));
        let reader_task = tokio::spawn(read_loop(reader, Arc::clone(&pending)));

        Self {
            writer: Mutex::new(Box::new(writer)),
            pending,
            next_id: AtomicU64::new(1),
            default_timeout,
            reader_task,
            closed: AtomicBool::new(false),
        }
    }

    /// Submit an invocation and await its result, bounded by the channel's
    /// default timeout.
    pub async fn submit(
        &self,
        target: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, ChannelError> {
        self.submit_with_timeout(target, method, args, self.default_timeout)
            .await
    }

    /// Submit an invocation and await its result within `timeout`.
    #[instrument(skip(self, args), fields(target = %target, method = %method))]
    pub async fn submit_with_timeout(
        &self,
        target: &str,
        method: &str,
        args: Vec<Value>,
        timeout: Duration,
    ) -> Result<Value, ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::ConnectionClosed);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = InvocationRequest {
            id,
            target: target.to_string(),
            method: method.to_string(),
            args,
        };

        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending map poisoned")
            .insert(id, tx);

        let frame = match Frame::request(&request) {
            Ok(frame) => frame,
            Err(e) => {
                self.forget(id);
                return Err(e.into());
            }
        };

        {
            let mut writer = self.writer.lock().await;
            if let Err(e) = write_frame(&mut *writer, &frame).await {
                self.forget(id);
                return Err(write_error(e));
            }
        }
        debug!(id, "invocation submitted");

        match tokio::time::timeout(timeout, rx).await {
            Err(_) => {
                self.forget(id);
                Err(ChannelError::Timeout(timeout.as_millis() as u64))
            }
            // Sender dropped: the reader task cleared pending on close.
            Ok(Err(_)) => Err(ChannelError::ConnectionClosed),
            Ok(Ok(Outcome::Ok { value })) => Ok(value),
            Ok(Ok(Outcome::Err { failure })) => Err(ChannelError::Remote(failure)),
        }
    }

    /// Whether the channel has been closed or its reader has terminated.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.reader_task.is_finished()
    }

    /// Tear the channel down: stop the reader, fail pending submissions,
    /// and shut the writer. Idempotent.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.reader_task.abort();
        self.pending.lock().expect("pending map poisoned").clear();

        use tokio::io::AsyncWriteExt;
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
        info!("invocation channel closed");
    }

    fn forget(&self, id: u64) {
        self.pending.lock().expect("pending map poisoned").remove(&id);
    }
}

/// Classify a write failure: a peer that has gone away is reported as
/// [`ChannelError::ConnectionClosed`], everything else keeps its cause.
fn write_error(err: FrameError) -> ChannelError {
    match err {
        FrameError::ConnectionClosed => ChannelError::ConnectionClosed,
        FrameError::Io(io) => match io.kind() {
            std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::WriteZero => ChannelError::ConnectionClosed,
            _ => ChannelError::Io(io),
        },
        other => ChannelError::Frame(other),
    }
}

impl Drop for InvocationChannel {
    fn drop(&mut self) {
        // Stop the reader on drop (non-async, best effort).
        self.reader_task.abort();
    }
}

async fn read_loop<R: AsyncRead + Send + Unpin>(mut reader: R, pending: PendingMap) {
    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed) => {
                debug!("peer closed the connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "invocation stream failed");
                break;
            }
        };

        match frame.message_type {
            MessageType::Response => match frame.decode::<InvocationResponse>() {
                Ok(response) => {
                    let sender = pending
                        .lock()
                        .expect("pending map poisoned")
                        .remove(&response.id);
                    match sender {
                        // The submitter may have timed out and forgotten the id.
                        Some(sender) => {
                            let _ = sender.send(response.outcome);
                        }
                        None => debug!(id = response.id, "response for abandoned invocation"),
                    }
                }
                Err(e) => warn!(error = %e, "undecodable response frame"),
            },
            MessageType::Error => warn!("peer reported a protocol-level error"),
            MessageType::Request => warn!("unexpected request frame on caller side"),
        }
    }

    // Fail everything still waiting: dropping the senders wakes the
    // receivers with a closed-channel error.
    pending.lock().expect("pending map poisoned").clear();
}
