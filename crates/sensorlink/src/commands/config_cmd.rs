//! Config subcommand handlers.

use std::io::IsTerminal;

use dialoguer::Input;

use sensorlink_config::ConfigError;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, DEFAULT_BACKEND, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn interactive(global: &GlobalOpts) -> bool {
    !global.yes && std::io::stdin().is_terminal()
}

fn prompt_backend(global: &GlobalOpts) -> Result<String, CliError> {
    if let Some(b) = &global.backend {
        return Ok(b.clone());
    }
    if !interactive(global) {
        return Ok(DEFAULT_BACKEND.into());
    }
    Input::new()
        .with_prompt("Backend URL")
        .default(DEFAULT_BACKEND.to_owned())
        .validate_with(|s: &String| {
            sensorlink_config::parse_backend(s)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)
}

fn prompt_node(global: &GlobalOpts) -> Result<Option<u32>, CliError> {
    if global.node.is_some() || !interactive(global) {
        return Ok(global.node);
    }
    let raw: String = Input::new()
        .with_prompt("Default node id (blank for none)")
        .allow_empty(true)
        .validate_with(|s: &String| {
            if s.trim().is_empty() || s.trim().parse::<u32>().is_ok() {
                Ok(())
            } else {
                Err("expected a node id such as 12345")
            }
        })
        .interact_text()
        .map_err(prompt_err)?;
    Ok(raw.trim().parse().ok())
}

fn init(name: String, force: bool, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    if cfg.profiles.contains_key(&name) && !force {
        return Err(CliError::Validation {
            field: "profile".into(),
            reason: format!("'{name}' already exists (pass --force to overwrite)"),
        });
    }

    let backend = prompt_backend(global)?;
    sensorlink_config::parse_backend(&backend)?;
    let node_id = prompt_node(global)?;

    cfg.profiles.insert(
        name.clone(),
        Profile {
            backend,
            node_id,
            timeout: global.timeout,
            ca_cert: None,
            insecure: global.insecure.then_some(true),
        },
    );
    if cfg
        .default_profile
        .as_ref()
        .is_none_or(|d| !cfg.profiles.contains_key(d))
    {
        cfg.default_profile = Some(name.clone());
    }

    let path = config::save_config(&cfg)?;
    output::note(
        &format!("✓ Profile '{name}' written to {}", path.display()),
        global.quiet,
    );
    Ok(())
}

fn to_toml(cfg: &Config) -> Result<String, CliError> {
    Ok(toml::to_string_pretty(cfg).map_err(ConfigError::from)?)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { name, force } => init(name, force, global),

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let text = to_toml(&cfg)?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |_| text.clone(),
                |c| {
                    let mut names: Vec<&str> = c.profiles.keys().map(String::as_str).collect();
                    names.sort_unstable();
                    names.join("\n")
                },
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}
