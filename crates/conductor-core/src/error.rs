// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for option resolution.

use thiserror::Error;

/// Result type using OptionError.
pub type Result<T> = std::result::Result<T, OptionError>;

/// Errors raised while building or resolving launch options.
///
/// These are configuration errors: they surface before any process is
/// spawned or any remote resource is consumed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OptionError {
    /// Every port in the configured range was already bound.
    #[error("no available port in range {start}..={end}")]
    PortsExhausted {
        /// First port probed.
        start: u16,
        /// Last port probed.
        end: u16,
    },

    /// An option was constructed with a value it cannot represent.
    #[error("invalid value for option {option}: {reason}")]
    InvalidValue {
        /// The option type that rejected the value.
        option: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
