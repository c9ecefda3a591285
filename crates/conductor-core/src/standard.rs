// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Standard options understood by every launcher and channel.

use std::time::Duration;

use crate::options::ConfigOption;

/// How long a caller blocks waiting for a remote result or an
/// eventually-true condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeout(Duration);

impl Timeout {
    /// Wrap an explicit duration.
    pub fn of(duration: Duration) -> Self {
        Self(duration)
    }

    /// A timeout in whole seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// A timeout in milliseconds.
    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// The wait budget.
    pub fn duration(&self) -> Duration {
        self.0
    }
}

impl Default for Timeout {
    /// 30 seconds, matching the default request timeout of the wire client.
    fn default() -> Self {
        Self(Duration::from_secs(30))
    }
}

impl ConfigOption for Timeout {}

/// Whether launchers emit their resolved configuration at `info` level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    enabled: bool,
}

impl Diagnostics {
    /// Diagnostics turned on.
    pub fn enabled() -> Self {
        Self { enabled: true }
    }

    /// Diagnostics turned off (the default).
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Whether diagnostics output is requested.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl ConfigOption for Diagnostics {}

/// Resource limits for a launched application.
///
/// Composable: when added over an existing value, the existing value's
/// populated fields win and absent fields fall back to the newer value.
/// This lets a platform pin a limit that per-launch options cannot relax
/// while still filling in anything the platform left unspecified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Resources {
    cpu_millis: Option<u64>,
    memory_bytes: Option<u64>,
}

impl Resources {
    /// No limits specified.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Set the CPU budget in millicores.
    pub fn with_cpu_millis(mut self, cpu_millis: u64) -> Self {
        self.cpu_millis = Some(cpu_millis);
        self
    }

    /// Set the memory ceiling in bytes.
    pub fn with_memory_bytes(mut self, memory_bytes: u64) -> Self {
        self.memory_bytes = Some(memory_bytes);
        self
    }

    /// CPU budget in millicores, if limited.
    pub fn cpu_millis(&self) -> Option<u64> {
        self.cpu_millis
    }

    /// Memory ceiling in bytes, if limited.
    pub fn memory_bytes(&self) -> Option<u64> {
        self.memory_bytes
    }
}

impl ConfigOption for Resources {
    fn compose(self, newer: Self) -> Self {
        Self {
            cpu_millis: self.cpu_millis.or(newer.cpu_millis),
            memory_bytes: self.memory_bytes.or(newer.memory_bytes),
        }
    }
}
