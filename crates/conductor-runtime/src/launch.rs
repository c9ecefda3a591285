// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The launch pipeline shared by every launcher.
//!
//! Launchers differ in how they start the executing side, but all of them
//! realize options the same way: platform options first, caller overrides
//! on top, then each registered profile in order. A profile error during
//! `on_launching` aborts the launch before anything starts.

use conductor_core::{Diagnostics, OptionSet};
use tracing::{debug, error, info};

use crate::application::Application;
use crate::error::LaunchError;
use crate::platform::Platform;
use crate::profile::UseProfile;

/// Merge platform and caller options and run every profile's
/// `on_launching` hook in registration order.
///
/// Returns the realized option set and the profile snapshot taken before
/// the hooks ran; launchers carry the snapshot into the application so the
/// same profiles see `on_launched` and `on_closing`.
pub fn prepare(
    platform: &dyn Platform,
    overrides: OptionSet,
) -> Result<(OptionSet, Vec<UseProfile>), LaunchError> {
    let mut options = platform.options().clone();
    options.add_all(overrides);

    let profiles = options.instances_of::<UseProfile>();
    for use_profile in &profiles {
        let profile = use_profile.profile();
        debug!(profile = profile.name(), "realizing profile");
        if let Err(err) = profile.on_launching(platform, &mut options) {
            error!(profile = profile.name(), error = %err, "profile aborted launch");
            return Err(err);
        }
    }

    if options.get_or_default::<Diagnostics>().is_enabled() {
        info!(platform = platform.name(), options = ?options, "realized launch options");
    }

    Ok((options, profiles))
}

/// Notify every profile that the application is up, in registration order.
pub fn notify_launched(application: &Application) {
    let platform = application.platform();
    for use_profile in application.profiles() {
        use_profile.profile().on_launched(platform, application);
    }
}
