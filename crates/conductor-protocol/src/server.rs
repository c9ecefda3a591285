// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Executing-side serve loop.
//!
//! [`serve`] drains requests from a connection, hands each to an
//! [`InvocationHandler`], and writes exactly one response per request.
//! Requests on one connection are handled sequentially; concurrency comes
//! from the handler itself and from callers multiplexing independent
//! invocations by id.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, instrument, warn};

use crate::frame::{Frame, FrameError, MessageType, read_frame, write_frame};
use crate::messages::{InvocationRequest, InvocationResponse, Outcome, RemoteFailure};

/// Something that can execute one invocation and report its outcome.
///
/// Implementations must never panic across this boundary: failures are
/// reported as [`Outcome::Err`] so the caller's handle resolves.
#[async_trait]
pub trait InvocationHandler: Send + Sync {
    /// Execute `request` and produce its outcome.
    async fn handle(&self, request: InvocationRequest) -> Outcome;
}

/// Serve a single connection until the peer closes it.
///
/// Returns `Ok(())` on orderly close, or the frame error that ended the
/// connection otherwise.
#[instrument(skip_all)]
pub async fn serve<R, W, H>(mut reader: R, mut writer: W, handler: &H) -> Result<(), FrameError>
where
    R: AsyncRead + Send + Unpin,
    W: AsyncWrite + Send + Unpin,
    H: InvocationHandler + ?Sized,
{
    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed) => {
                debug!("connection closed by peer");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match frame.message_type {
            MessageType::Request => match frame.decode::<InvocationRequest>() {
                Ok(request) => {
                    let id = request.id;
                    debug!(id, target = %request.target, method = %request.method, "handling invocation");
                    let outcome = handler.handle(request).await;
                    let response = InvocationResponse { id, outcome };
                    write_frame(&mut writer, &Frame::response(&response)?).await?;
                }
                Err(e) => {
                    warn!(error = %e, "undecodable request frame");
                    let failure =
                        RemoteFailure::new("MALFORMED_REQUEST", format!("undecodable request: {e}"));
                    write_frame(&mut writer, &Frame::error(&failure)?).await?;
                }
            },
            other => warn!(message_type = ?other, "ignoring unexpected frame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelError, InvocationChannel};
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::duplex;

    struct UppercaseHandler;

    #[async_trait]
    impl InvocationHandler for UppercaseHandler {
        async fn handle(&self, request: InvocationRequest) -> Outcome {
            match request.method.as_str() {
                "upper" => {
                    let input = request.args[0].as_str().unwrap_or_default();
                    Outcome::ok(json!(input.to_uppercase()))
                }
                unknown => Outcome::err(RemoteFailure::new(
                    "METHOD_NOT_FOUND",
                    format!("no method named '{unknown}'"),
                )),
            }
        }
    }

    #[tokio::test]
    async fn test_serve_round_trip() {
        let (local, remote) = duplex(4096);
        let (remote_read, remote_write) = tokio::io::split(remote);
        let server =
            tokio::spawn(
                async move { serve(remote_read, remote_write, &UppercaseHandler).await },
            );

        let (read_half, write_half) = tokio::io::split(local);
        let channel = InvocationChannel::open(read_half, write_half, Duration::from_secs(5));

        let value = channel
            .submit("any", "upper", vec![json!("quiet")])
            .await
            .unwrap();
        assert_eq!(value, json!("QUIET"));

        channel.close().await;
        assert!(server.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_serve_reports_handler_failure() {
        let (local, remote) = duplex(4096);
        let (remote_read, remote_write) = tokio::io::split(remote);
        tokio::spawn(async move { serve(remote_read, remote_write, &UppercaseHandler).await });

        let (read_half, write_half) = tokio::io::split(local);
        let channel = InvocationChannel::open(read_half, write_half, Duration::from_secs(5));

        match channel.submit("any", "nope", vec![]).await.unwrap_err() {
            ChannelError::Remote(failure) => assert_eq!(failure.code, "METHOD_NOT_FOUND"),
            other => panic!("expected Remote, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_serve_ends_cleanly_on_peer_close() {
        let (local, remote) = duplex(64);
        let (remote_read, remote_write) = tokio::io::split(remote);
        let server =
            tokio::spawn(
                async move { serve(remote_read, remote_write, &UppercaseHandler).await },
            );

        drop(local);
        assert!(server.await.unwrap().is_ok());
    }
}
