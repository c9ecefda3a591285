// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Core option-composition model for conductor.
//!
//! Everything a launcher consumes is expressed as a typed option collected
//! into an [`OptionSet`]. Scalar options replace on re-add (last wins),
//! composable options merge via [`ConfigOption::compose`], and collector
//! options accumulate elements in insertion order.

pub mod error;
pub mod options;
pub mod ports;
pub mod standard;

pub use error::{OptionError, Result};
pub use options::{Collectable, Collector, ConfigOption, OptionSet};
pub use ports::AvailablePorts;
pub use standard::{Diagnostics, Resources, Timeout};
