// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Process-shaped option types used to describe a launch.
//!
//! Scalar options (`Executable`, `DisplayName`, `WorkingDirectory`) replace
//! each other on re-addition, newest wins. `Argument` and
//! `EnvironmentVariable` are collectable: adding them to an option set
//! accumulates into their `Arguments` / `EnvironmentVariables` collectors
//! instead of replacing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use conductor_core::{Collectable, Collector, ConfigOption};

/// The program to launch. Required by process-backed platforms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Executable(String);

impl Executable {
    pub fn named(name: impl Into<String>) -> Self {
        Executable(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl ConfigOption for Executable {}

/// Human-readable name attached to a launched application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn of(name: impl Into<String>) -> Self {
        DisplayName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ConfigOption for DisplayName {}

/// Working directory for the launched process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkingDirectory(PathBuf);

impl WorkingDirectory {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        WorkingDirectory(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl ConfigOption for WorkingDirectory {}

/// A single command-line argument. Collects into [`Arguments`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argument(String);

impl Argument {
    pub fn of(value: impl Into<String>) -> Self {
        Argument(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Collectable for Argument {
    type Collector = Arguments;
}

/// Ordered accumulation of command-line arguments.
///
/// Re-adding an `Arguments` option to a set appends rather than replaces,
/// and collected `Argument` values route here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Arguments(Vec<Argument>);

impl Arguments {
    pub fn of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arguments(values.into_iter().map(Argument::of).collect())
    }

    /// Remove the first argument equal to `value`, keeping the rest in order.
    pub fn without(mut self, value: impl AsRef<str>) -> Self {
        if let Some(index) = self.0.iter().position(|a| a.as_str() == value.as_ref()) {
            self.0.remove(index);
        }
        self
    }

    /// The argument strings in accumulation order, ready for a command line.
    pub fn resolve(&self) -> Vec<String> {
        self.0.iter().map(|a| a.0.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ConfigOption for Arguments {
    fn compose(self, newer: Self) -> Self {
        let mut combined = self.0;
        combined.extend(newer.0);
        Arguments(combined)
    }
}

impl Collector<Argument> for Arguments {
    fn with(mut self, element: Argument) -> Self {
        self.0.push(element);
        self
    }

    fn without(mut self, element: &Argument) -> Self {
        if let Some(index) = self.0.iter().position(|a| a == element) {
            self.0.remove(index);
        }
        self
    }

    fn to_vec(&self) -> Vec<Argument> {
        self.0.clone()
    }
}

/// A single environment variable. Collects into [`EnvironmentVariables`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvironmentVariable {
    name: String,
    value: String,
}

impl EnvironmentVariable {
    pub fn of(name: impl Into<String>, value: impl Into<String>) -> Self {
        EnvironmentVariable {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Collectable for EnvironmentVariable {
    type Collector = EnvironmentVariables;
}

/// Accumulated environment variables for a launch.
///
/// Accumulation keeps every addition in order; [`realize`](Self::realize)
/// flattens them so that a later variable with the same name wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvironmentVariables(Vec<EnvironmentVariable>);

impl EnvironmentVariables {
    pub fn of<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        EnvironmentVariables(
            pairs
                .into_iter()
                .map(|(n, v)| EnvironmentVariable::of(n, v))
                .collect(),
        )
    }

    /// Flatten into a name-to-value map, later additions overriding earlier
    /// ones with the same name.
    pub fn realize(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for var in &self.0 {
            map.insert(var.name.clone(), var.value.clone());
        }
        map
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ConfigOption for EnvironmentVariables {
    fn compose(self, newer: Self) -> Self {
        let mut combined = self.0;
        combined.extend(newer.0);
        EnvironmentVariables(combined)
    }
}

impl Collector<EnvironmentVariable> for EnvironmentVariables {
    fn with(mut self, element: EnvironmentVariable) -> Self {
        self.0.push(element);
        self
    }

    fn without(mut self, element: &EnvironmentVariable) -> Self {
        if let Some(index) = self.0.iter().position(|v| v == element) {
            self.0.remove(index);
        }
        self
    }

    fn to_vec(&self) -> Vec<EnvironmentVariable> {
        self.0.clone()
    }
}
