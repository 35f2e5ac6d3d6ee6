//! CLI configuration: thin wrapper around `sensorlink_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--backend, --node, --timeout, ...).

use std::time::Duration;

use sensorlink_core::{ConsoleConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use sensorlink_config::{
    Config, DEFAULT_BACKEND, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Backend settings plus the node to address, after flag overrides.
#[derive(Debug)]
pub struct Target {
    pub console: ConsoleConfig,
    pub node_id: Option<u32>,
}

impl Target {
    pub fn require_node(&self) -> Result<u32, CliError> {
        self.node_id.ok_or(CliError::NoNode)
    }
}

/// Resolve the backend and node from the config file, profile and flags.
///
/// Flags (and their env vars) win over the profile; the profile wins over
/// `[defaults]`.
pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<Target, CliError> {
    let profile = cfg
        .profile(global.profile.as_deref())
        .map_err(|_| CliError::ProfileNotFound {
            name: global.profile.clone().unwrap_or_default(),
            available: available_profiles(cfg),
        })?
        .map(|(_, p)| p);

    // 1. Backend URL (flag > env > profile). A flag-supplied backend keeps
    //    the profile's TLS and timeout settings.
    let flag_backend = global.backend.as_deref().filter(|s| !s.trim().is_empty());
    let base = match (flag_backend, profile) {
        (Some(raw), p) => Profile {
            backend: raw.to_owned(),
            ..p.cloned().unwrap_or_default()
        },
        (None, Some(p)) if !p.backend.trim().is_empty() => p.clone(),
        (None, _) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };
    let mut console = sensorlink_config::profile_to_console_config(&base, cfg.defaults.timeout)?;

    // 2. TLS and timeout overrides
    if global.insecure {
        console.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        console.timeout = Duration::from_secs(secs);
    }

    Ok(Target {
        console,
        node_id: global.node.or_else(|| profile.and_then(|p| p.node_id)),
    })
}

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}
