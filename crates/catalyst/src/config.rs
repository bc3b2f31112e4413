//! CLI configuration: thin wrapper around `catalyst_config` shared types.
//!
//! Adds CLI-specific resolution that respects `GlobalOpts` flag overrides
//! (--controller, --username, --insecure, --timeout, --time-zone).

use catalyst_config::{Config, ConfigError, Profile};
use catalyst_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use catalyst_config::{config_path, load_config, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// Build a `ControllerConfig` from the config file, profile, and CLI overrides.
///
/// Without a matching profile, `--controller` plus environment credentials
/// are enough to run a query.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config()?;

    let (profile_name, base) = match cfg.profile(global.profile.as_deref()) {
        Ok((name, profile)) => (name, profile.clone()),
        Err(ConfigError::UnknownProfile { profile }) if global.controller.is_some() => {
            (profile, Profile::default())
        }
        Err(ConfigError::UnknownProfile { profile }) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile,
                available: available_profiles(&cfg),
            });
        }
        Err(ConfigError::UnknownProfile { .. }) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
        Err(err) => return Err(err.into()),
    };

    let profile = apply_overrides(base, global);
    tracing::debug!(
        profile = %profile_name,
        controller = %profile.controller,
        "resolved controller profile"
    );

    let username = match global.username.clone() {
        Some(username) => username,
        None => catalyst_config::resolve_username(&profile, &profile_name)?,
    };
    let password = catalyst_config::resolve_password(&profile, &profile_name)?;

    Ok(catalyst_config::build_controller_config(
        &profile,
        &cfg.defaults,
        username,
        password,
    )?)
}

/// Layer flag and env overrides on top of a profile. Flags win.
fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref controller) = global.controller {
        profile.controller.clone_from(controller);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if let Some(ref zone) = global.time_zone {
        profile.time_zone = Some(zone.clone());
    }
    profile
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        return "(none)".into();
    }
    cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}
