//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use sensorlink_core::{CoreError, OptionItem, OptionValue};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` becomes mandatory.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// `none` (any case) or an empty string: clear the field.
pub fn is_clear(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw.eq_ignore_ascii_case("none")
}

/// Match operator input against a reported option list, by value first and
/// then by label (case-insensitive, whitespace-insensitive).
///
/// Returns `Ok(None)` for an explicit clear. Input that matches nothing is
/// passed through unchanged so the payload builder reports it with the
/// field's name.
pub fn resolve_option(options: &[OptionItem], raw: &str) -> Option<OptionValue> {
    if is_clear(raw) {
        return None;
    }
    let wanted = OptionValue::new(raw);
    if options.iter().any(|o| o.value == wanted) {
        return Some(wanted);
    }
    let squash = |s: &str| {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase()
    };
    let key = squash(raw);
    Some(
        options
            .iter()
            .find(|o| squash(&o.label) == key)
            .map_or(wanted, |o| o.value.clone()),
    )
}

/// A scalar edit: `none` clears, anything else must be a non-negative integer.
pub fn parse_scalar(field: &str, raw: &str) -> Result<Option<OptionValue>, CoreError> {
    if is_clear(raw) {
        return Ok(None);
    }
    match raw.trim().parse::<u64>() {
        Ok(v) => Ok(Some(OptionValue::new(v.to_string()))),
        Err(_) => Err(CoreError::InvalidValue {
            field: field.into(),
            value: raw.into(),
        }),
    }
}

/// `90` → `1m 30s`.
pub fn format_secs(secs: u64) -> String {
    humantime::format_duration(Duration::from_secs(secs)).to_string()
}

/// Stderr spinner for backend round-trips; hidden in quiet mode.
pub fn spinner(message: impl Into<String>, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> Vec<OptionItem> {
        vec![OptionItem::new(112_i64, "1 Hz"), OptionItem::new(113_i64, "2 Hz")]
    }

    #[test]
    fn options_match_by_value_or_label() {
        let opts = rates();
        assert_eq!(resolve_option(&opts, "113"), Some(OptionValue::from(113_i64)));
        assert_eq!(resolve_option(&opts, "1hz"), Some(OptionValue::from(112_i64)));
        assert_eq!(resolve_option(&opts, "NONE"), None);
        assert_eq!(resolve_option(&opts, "5 Hz"), Some(OptionValue::new("5 Hz")));
    }

    #[test]
    fn scalars_are_non_negative_integers() {
        assert_eq!(
            parse_scalar("inactivity_timeout", "300").ok().flatten(),
            Some(OptionValue::from(300_i64))
        );
        assert!(matches!(parse_scalar("x", "none"), Ok(None)));
        assert!(parse_scalar("diagnostic_interval", "-5").is_err());
        assert!(parse_scalar("diagnostic_interval", "2.5").is_err());
    }

    #[test]
    fn seconds_are_humanized() {
        assert_eq!(format_secs(90), "1m 30s");
        assert_eq!(format_secs(0), "0s");
    }
}
