// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Launch-time customization via profiles.
//!
//! A [`Profile`] observes and rewrites the option set before a launch, is
//! notified once the application is running, and again when it is closing.
//! Profiles are carried inside the option set itself as [`UseProfile`]
//! options, which accumulate in registration order into the [`Profiles`]
//! collector.

use std::fmt;
use std::sync::Arc;

use conductor_core::{AvailablePorts, Collectable, Collector, ConfigOption, OptionSet};
use tracing::info;

use crate::application::Application;
use crate::error::LaunchError;
use crate::options::{Argument, EnvironmentVariable};
use crate::platform::Platform;

/// Hooks invoked around the lifetime of a launched application.
///
/// `on_launching` runs before the process starts and may rewrite the
/// option set; returning an error aborts the launch. `on_closing` runs
/// during shutdown; its errors are logged and swallowed, closing always
/// proceeds.
pub trait Profile: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Called before launch with the fully merged option set.
    fn on_launching(
        &self,
        platform: &dyn Platform,
        options: &mut OptionSet,
    ) -> Result<(), LaunchError>;

    /// Called once the application has been launched.
    fn on_launched(&self, _platform: &dyn Platform, _application: &Application) {}

    /// Called while the application is closing. Best effort.
    fn on_closing(
        &self,
        _platform: &dyn Platform,
        _application: &Application,
    ) -> Result<(), LaunchError> {
        Ok(())
    }
}

/// Wraps a [`Profile`] so it can travel inside an option set.
#[derive(Clone)]
pub struct UseProfile(Arc<dyn Profile>);

impl UseProfile {
    pub fn of(profile: impl Profile + 'static) -> Self {
        UseProfile(Arc::new(profile))
    }

    pub fn profile(&self) -> &Arc<dyn Profile> {
        &self.0
    }
}

impl fmt::Debug for UseProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UseProfile").field(&self.0.name()).finish()
    }
}

impl PartialEq for UseProfile {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Collectable for UseProfile {
    type Collector = Profiles;
}

/// Registration-ordered accumulation of profiles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profiles(Vec<UseProfile>);

impl Profiles {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ConfigOption for Profiles {
    fn compose(self, newer: Self) -> Self {
        let mut combined = self.0;
        combined.extend(newer.0);
        Profiles(combined)
    }
}

impl Collector<UseProfile> for Profiles {
    fn with(mut self, element: UseProfile) -> Self {
        self.0.push(element);
        self
    }

    fn without(mut self, element: &UseProfile) -> Self {
        if let Some(index) = self.0.iter().position(|p| p == element) {
            self.0.remove(index);
        }
        self
    }

    fn to_vec(&self) -> Vec<UseProfile> {
        self.0.clone()
    }
}

/// Profile that allocates a free TCP port before launch and passes it to
/// the application as both a `--port=N` argument and an environment
/// variable. Exhaustion of the port range aborts the launch.
pub struct OpenPortProfile {
    start: u16,
    end: u16,
    variable: String,
}

impl OpenPortProfile {
    pub fn new(start: u16, end: u16) -> Self {
        OpenPortProfile {
            start,
            end,
            variable: "CONDUCTOR_PORT".to_string(),
        }
    }

    /// Use a different environment variable name for the allocated port.
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = variable.into();
        self
    }
}

impl Profile for OpenPortProfile {
    fn name(&self) -> &str {
        "open-port"
    }

    fn on_launching(
        &self,
        platform: &dyn Platform,
        options: &mut OptionSet,
    ) -> Result<(), LaunchError> {
        let mut ports = AvailablePorts::new(self.start, self.end)?;
        let port = ports.next_available()?;
        info!(platform = platform.name(), port, "allocated port for launch");
        options.collect(Argument::of(format!("--port={port}")));
        options.collect(EnvironmentVariable::of(&self.variable, port.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Renaming(&'static str);

    impl Profile for Renaming {
        fn name(&self) -> &str {
            "renaming"
        }

        fn on_launching(
            &self,
            _platform: &dyn Platform,
            options: &mut OptionSet,
        ) -> Result<(), LaunchError> {
            options.add(crate::options::DisplayName::of(self.0));
            Ok(())
        }
    }

    #[test]
    fn test_profiles_accumulate_in_registration_order() {
        let mut options = OptionSet::new();
        options.collect(UseProfile::of(Renaming("a")));
        options.collect(UseProfile::of(Renaming("b")));

        let profiles = options.instances_of::<UseProfile>();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].profile().name(), "renaming");
    }

    #[test]
    fn test_use_profile_equality_is_identity() {
        let first = UseProfile::of(Renaming("a"));
        let clone = first.clone();
        let other = UseProfile::of(Renaming("a"));
        assert_eq!(first, clone);
        assert_ne!(first, other);
    }
}
