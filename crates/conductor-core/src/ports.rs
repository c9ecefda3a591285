// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Discovery of locally bindable TCP ports.
//!
//! Profiles use this to pick listen ports for applications they are about
//! to launch. Availability is probed by actually binding, so a port handed
//! out here can still be lost to another process before the application
//! binds it; callers that need a hard reservation must hold the socket.

use std::net::{Ipv4Addr, TcpListener};

use tracing::debug;

use crate::error::OptionError;

/// An iterator over the bindable ports of an inclusive range.
#[derive(Clone, Debug)]
pub struct AvailablePorts {
    start: u16,
    end: u16,
    next: u16,
    exhausted: bool,
}

impl AvailablePorts {
    /// Probe ports from `start` to `end`, inclusive.
    pub fn new(start: u16, end: u16) -> Result<Self, OptionError> {
        if start > end {
            return Err(OptionError::InvalidValue {
                option: "AvailablePorts",
                reason: format!("range start {start} is above range end {end}"),
            });
        }
        Ok(Self {
            start,
            end,
            next: start,
            exhausted: false,
        })
    }

    /// The commonly usable ephemeral-adjacent range, 30000..=39999.
    pub fn ephemeral() -> Self {
        Self {
            start: 30000,
            end: 39999,
            next: 30000,
            exhausted: false,
        }
    }

    /// The next port in the range that accepts a local bind.
    ///
    /// Fails with [`OptionError::PortsExhausted`] once the range has no
    /// bindable port left; intended to abort a launch before any process
    /// is spawned.
    pub fn next_available(&mut self) -> Result<u16, OptionError> {
        while !self.exhausted {
            let candidate = self.next;
            if candidate == self.end {
                self.exhausted = true;
            } else {
                self.next += 1;
            }

            if TcpListener::bind((Ipv4Addr::LOCALHOST, candidate)).is_ok() {
                debug!(port = candidate, "found available port");
                return Ok(candidate);
            }
            debug!(port = candidate, "port unavailable, probing next");
        }

        Err(OptionError::PortsExhausted {
            start: self.start,
            end: self.end,
        })
    }
}

impl Iterator for AvailablePorts {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        self.next_available().ok()
    }
}
