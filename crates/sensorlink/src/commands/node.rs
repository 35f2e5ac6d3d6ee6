//! Node command handlers.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tabled::Tabled;
use tracing::warn;

use sensorlink_core::model::option::label_of;
use sensorlink_core::summary::{read_summary, render_plain};
use sensorlink_core::{
    CapabilityFlags, CommandAck, ConfigurationSnapshot, CoreError, DiagnosticFlag, Field,
    FieldKind, IdleAck, NodeForm, NodeSession, OptionItem, OptionValue, Severity, SummaryPart,
    channel_label,
};

use crate::cli::{GlobalOpts, NodeArgs, NodeCommand, WriteArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row types ─────────────────────────────────────────────────

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Options")]
    options: String,
}

#[derive(Tabled)]
struct FlagRow {
    #[tabled(rename = "Flag")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&DiagnosticFlag> for FlagRow {
    fn from(f: &DiagnosticFlag) -> Self {
        Self {
            name: f.name.clone(),
            value: flag_value(&f.value),
        }
    }
}

fn flag_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Bool(true) => "yes".into(),
        serde_json::Value::Bool(false) => "no".into(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".into(),
        other => other.to_string(),
    }
}

/// Everything `node read` shows, for structured output.
#[derive(Serialize)]
struct ReadView<'a> {
    summary: Vec<SummaryPart>,
    supported: Vec<Field>,
    form: &'a NodeForm,
    snapshot: &'a ConfigurationSnapshot,
}

// ── Detail builders ─────────────────────────────────────────────────

fn option_list(options: &[OptionItem]) -> String {
    if options.is_empty() {
        return "-".into();
    }
    options
        .iter()
        .map(|o| {
            if o.label == o.value.as_str() {
                o.label.clone()
            } else {
                format!("{}={}", o.value, o.label)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn shown(options: &[OptionItem], value: Option<&OptionValue>) -> String {
    match value {
        None => "-".into(),
        Some(v) => label_of(options, v).map_or_else(|| v.to_string(), str::to_owned),
    }
}

/// Legal options for `field` as the form currently stands.
fn domain<'a>(snapshot: &'a ConfigurationSnapshot, form: &'a NodeForm, field: Field) -> &'a [OptionItem] {
    match field {
        Field::TransducerType => &form.cascade().transducers,
        Field::SensorType => form.sensor_domain(),
        Field::WireType => form.wire_domain(),
        other => snapshot
            .option_field(other)
            .map_or(&[][..], |f| f.options.as_slice()),
    }
}

fn field_rows(snapshot: &ConfigurationSnapshot, form: &NodeForm, caps: &CapabilityFlags) -> Vec<FieldRow> {
    let mut rows = vec![
        FieldRow {
            field: "Sample Rate".into(),
            value: shown(&snapshot.sample_rate.options, form.sample_rate()),
            options: option_list(&snapshot.sample_rate.options),
        },
        FieldRow {
            field: "Radio Power".into(),
            value: form
                .tx_power()
                .map_or_else(|| "-".into(), |p| format!("{p} dBm")),
            options: snapshot
                .tx_power
                .options
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        },
        FieldRow {
            field: "Channels".into(),
            value: form
                .enabled_channels()
                .into_iter()
                .map(channel_label)
                .collect::<Vec<_>>()
                .join(", "),
            options: snapshot
                .channels
                .iter()
                .map(|c| c.id.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        },
    ];

    for field in caps.supported_fields() {
        let options = match field.kind() {
            FieldKind::Scalar => "integer >= 0".to_owned(),
            FieldKind::Enumerated | FieldKind::Dependent => {
                option_list(domain(snapshot, form, field))
            }
        };
        let mut value = shown(domain(snapshot, form, field), form.value(field));
        match form.timer_enabled(field) {
            Some(true) => value.push_str(" (on)"),
            Some(false) => value.push_str(" (off)"),
            None => {}
        }
        rows.push(FieldRow {
            field: field.label().into(),
            value,
            options,
        });
    }
    rows
}

fn summary_line(parts: &[SummaryPart], color: bool) -> String {
    parts
        .iter()
        .map(|p| format!("{}: {}", p.label, output::paint(p.severity, &p.value, color)))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn ack_message(ack: &CommandAck, fallback: &str) -> String {
    ack.message
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_owned())
}

// ── Shared flows ────────────────────────────────────────────────────

async fn request_idle(session: &NodeSession, global: &GlobalOpts) -> Result<IdleAck, CliError> {
    let pb = util::spinner(format!("Setting node {} idle...", session.node_id()), global.quiet);
    let ack = session.set_idle().await;
    pb.finish_and_clear();
    let ack = ack?;
    if !ack.idle_confirmed {
        let reason = ack
            .reason
            .as_deref()
            .or(ack.idle_status.reason.as_deref())
            .unwrap_or("node did not confirm idle");
        warn!(node_id = session.node_id(), reason, "idle not confirmed");
    }
    Ok(ack)
}

/// Set idle, then read. The read itself enforces the idle gate.
pub(crate) async fn idle_then_read(
    session: &NodeSession,
    global: &GlobalOpts,
) -> Result<Arc<ConfigurationSnapshot>, CliError> {
    request_idle(session, global).await?;
    let pb = util::spinner("Reading configuration...", global.quiet);
    let snapshot = session.read().await;
    pb.finish_and_clear();
    Ok(snapshot?)
}

/// Apply `args` to the form. Returns the names of edited fields the node
/// does not support; the payload leaves those out.
fn apply_edits(
    form: &mut NodeForm,
    snapshot: &ConfigurationSnapshot,
    caps: &CapabilityFlags,
    args: &WriteArgs,
) -> Result<Vec<&'static str>, CoreError> {
    if let Some(raw) = &args.rate {
        form.set_sample_rate(util::resolve_option(&snapshot.sample_rate.options, raw));
    }
    if let Some(dbm) = args.power {
        form.set_tx_power(dbm);
    }
    if let Some(ids) = &args.channels {
        form.set_enabled_channels(ids)?;
    }

    let edits = [
        (Field::InputRange, &args.input_range),
        (Field::Unit, &args.unit),
        (Field::CjcUnit, &args.cjc_unit),
        (Field::LowPassFilter, &args.low_pass),
        (Field::StorageLimitMode, &args.storage_limit),
        (Field::DataMode, &args.data_mode),
        (Field::DefaultMode, &args.default_mode),
        (Field::LostBeaconTimeout, &args.lost_beacon),
        (Field::DiagnosticInterval, &args.diagnostic),
        (Field::InactivityTimeout, &args.inactivity),
        (Field::CheckRadioInterval, &args.check_radio),
        // Transducer before sensor and wire: changing it resets both.
        (Field::TransducerType, &args.transducer),
        (Field::SensorType, &args.sensor),
        (Field::WireType, &args.wire),
    ];

    let mut ignored = Vec::new();
    for (field, raw) in edits {
        let Some(raw) = raw else { continue };
        if !caps.supports(field) {
            ignored.push(field.label());
            continue;
        }
        let value = match field.kind() {
            FieldKind::Scalar => util::parse_scalar(field.as_ref(), raw)?,
            FieldKind::Enumerated | FieldKind::Dependent => {
                util::resolve_option(domain(snapshot, form, field), raw)
            }
        };
        form.set_value(field, value);
    }

    let flags = [
        (Field::LostBeaconTimeout, args.lost_beacon_enabled),
        (Field::DiagnosticInterval, args.diagnostic_enabled),
        (Field::InactivityTimeout, args.inactivity_enabled),
    ];
    for (field, enabled) in flags {
        let Some(enabled) = enabled else { continue };
        if !caps.supports(field) {
            if !ignored.contains(&field.label()) {
                ignored.push(field.label());
            }
            continue;
        }
        form.set_timer_enabled(field, enabled)?;
    }
    Ok(ignored)
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    session: &NodeSession,
    args: NodeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let node_id = session.node_id();

    match args.command {
        NodeCommand::Read => {
            let snapshot = idle_then_read(session, global).await?;
            let caps = session.capabilities();
            let form = session.form().ok_or(CoreError::NoSnapshot { node_id })?;
            let view = ReadView {
                summary: read_summary(&snapshot, Utc::now()),
                supported: caps.supported_fields().collect(),
                form: &form,
                snapshot: &snapshot,
            };
            let out = output::render_single(
                &global.output,
                &view,
                |v| {
                    format!(
                        "{}\n{}",
                        summary_line(&v.summary, color),
                        output::render_table(&field_rows(v.snapshot, v.form, &caps))
                    )
                },
                |v| render_plain(&v.summary),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NodeCommand::Write(args) => {
            let snapshot = idle_then_read(session, global).await?;
            let caps = session.capabilities();
            let ignored = session.edit_form(|form| apply_edits(form, &snapshot, &caps, &args))?;
            for label in ignored {
                output::note(
                    &format!("Ignoring {label}: not supported by this node"),
                    global.quiet,
                );
            }

            if args.dry_run {
                let request = session.preview_write()?;
                let out = output::render_single(
                    &global.output,
                    &request,
                    |r| serde_json::to_string_pretty(r).unwrap_or_default(),
                    |r| r.node_id.to_string(),
                )?;
                output::print_output(&out, global.quiet);
                return Ok(());
            }

            let pb = util::spinner("Writing configuration...", global.quiet);
            let receipt = session.write().await;
            pb.finish_and_clear();
            let receipt = receipt?;
            let out = output::render_single(
                &global.output,
                &receipt,
                |r| {
                    let msg = r.message.as_deref().unwrap_or("Configuration written");
                    output::paint(Severity::Ok, msg, color)
                },
                |r| r.request.node_id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NodeCommand::Probe => {
            let ack = session.probe().await?;
            output::note(&ack_message(&ack, "Probe sent"), global.quiet);
            Ok(())
        }

        NodeCommand::Idle => {
            let ack = request_idle(session, global).await?;
            let out = output::render_single(
                &global.output,
                &ack,
                |a| {
                    if a.idle_confirmed {
                        output::paint(Severity::Ok, "Node is idle", color)
                    } else {
                        let reason = a
                            .reason
                            .as_deref()
                            .or(a.idle_status.reason.as_deref())
                            .unwrap_or("confirmation pending");
                        output::paint(
                            Severity::Warn,
                            &format!("Idle not confirmed: {reason}"),
                            color,
                        )
                    }
                },
                |a| a.idle_confirmed.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NodeCommand::Sleep => {
            if !util::confirm(&format!("Put node {node_id} to sleep?"), "node sleep", global.yes)? {
                return Ok(());
            }
            let ack = session.sleep().await?;
            output::note(&ack_message(&ack, "Sleep command sent"), global.quiet);
            Ok(())
        }

        NodeCommand::CyclePower => {
            let ack = session.cycle_power().await?;
            output::note(&ack_message(&ack, "Power cycle sent"), global.quiet);
            Ok(())
        }

        NodeCommand::ClearStorage => {
            if !util::confirm(
                &format!("Erase all logged data on node {node_id}?"),
                "node clear-storage",
                global.yes,
            )? {
                return Ok(());
            }
            idle_then_read(session, global).await?;
            let ack = session.clear_storage().await?;
            output::note(&ack_message(&ack, "Storage cleared"), global.quiet);
            Ok(())
        }

        NodeCommand::Diagnostics => {
            let diag = session.diagnostics().await?;
            let out = output::render_list(
                &global.output,
                &diag.flags,
                |f| FlagRow::from(f),
                |f| format!("{}={}", f.name, flag_value(&f.value)),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn write_args(args: &[&str]) -> WriteArgs {
        let mut argv = vec!["sensorlink", "node", "write"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            crate::cli::Command::Node(NodeArgs {
                command: NodeCommand::Write(w),
            }) => w,
            other => panic!("unexpected {other:?}"),
        }
    }

    fn snapshot() -> ConfigurationSnapshot {
        let cfg = serde_json::from_value(serde_json::json!({
            "model": "TC-Link-200",
            "state": 0,
            "current_rate": 112,
            "supported_rates": [
                {"enum_val": 112, "str_val": "1 Hz"},
                {"enum_val": 113, "str_val": "2 Hz"},
            ],
            "current_power": 10,
            "channels": [{"id": 1, "enabled": true}, {"id": 2, "enabled": false}],
            "current_low_pass": 294,
            "low_pass_options": [
                {"value": 294, "label": "294 Hz"},
                {"value": 33, "label": "33 Hz"},
            ],
            "current_inactivity_timeout": 300,
        }))
        .unwrap();
        sensorlink_core::convert::snapshot_from_config(9, cfg, Utc::now())
    }

    #[test]
    fn edits_resolve_labels_and_clear() {
        let snap = snapshot();
        let caps = CapabilityFlags::derive(&snap);
        let mut form = NodeForm::from_snapshot(&snap);
        let args = write_args(&[
            "--rate",
            "2 hz",
            "--low-pass",
            "33 Hz",
            "--inactivity",
            "none",
            "--channels",
            "1,2",
        ]);
        let ignored = apply_edits(&mut form, &snap, &caps, &args).unwrap();
        assert!(ignored.is_empty());
        assert_eq!(form.sample_rate(), Some(&OptionValue::from(113_i64)));
        assert_eq!(form.value(Field::LowPassFilter), Some(&OptionValue::from(33_i64)));
        assert_eq!(form.value(Field::InactivityTimeout), None);
        assert_eq!(form.enabled_channels(), vec![1, 2]);
    }

    #[test]
    fn unsupported_edits_are_reported() {
        let snap = snapshot();
        let caps = CapabilityFlags::derive(&snap);
        let mut form = NodeForm::from_snapshot(&snap);
        let args = write_args(&["--transducer", "RTD", "--check-radio", "5"]);
        let ignored = apply_edits(&mut form, &snap, &caps, &args).unwrap();
        assert_eq!(ignored, vec!["Check Radio Interval", "Transducer Type"]);
    }

    #[test]
    fn timer_flags_set_only_when_given() {
        let snap = snapshot();
        let caps = CapabilityFlags::derive(&snap);

        let mut form = NodeForm::from_snapshot(&snap);
        let args = write_args(&["--inactivity", "60"]);
        apply_edits(&mut form, &snap, &caps, &args).unwrap();
        assert_eq!(form.timer_enabled(Field::InactivityTimeout), None);

        let mut form = NodeForm::from_snapshot(&snap);
        let args = write_args(&["--inactivity-enabled", "off", "--lost-beacon-enabled", "true"]);
        let ignored = apply_edits(&mut form, &snap, &caps, &args).unwrap();
        assert_eq!(form.timer_enabled(Field::InactivityTimeout), Some(false));
        assert_eq!(form.timer_enabled(Field::LostBeaconTimeout), None);
        assert_eq!(ignored, vec!["Lost Beacon Timeout"]);

        let row = field_rows(&snap, &form, &caps)
            .into_iter()
            .find(|r| r.field == "Inactivity Timeout")
            .unwrap();
        assert_eq!(row.value, "300 (off)");
    }

    #[test]
    fn bad_scalar_rejected_locally() {
        let snap = snapshot();
        let caps = CapabilityFlags::derive(&snap);
        let mut form = NodeForm::from_snapshot(&snap);
        let args = write_args(&["--inactivity=-1"]);
        assert!(matches!(
            apply_edits(&mut form, &snap, &caps, &args),
            Err(CoreError::InvalidValue { .. })
        ));
    }

    #[test]
    fn field_table_lists_supported_fields() {
        let snap = snapshot();
        let caps = CapabilityFlags::derive(&snap);
        let form = NodeForm::from_snapshot(&snap);
        let rows = field_rows(&snap, &form, &caps);
        let names: Vec<&str> = rows.iter().map(|r| r.field.as_str()).collect();
        assert!(names.contains(&"Low Pass Filter"));
        assert!(!names.contains(&"Transducer Type"));
        let rate = rows.iter().find(|r| r.field == "Sample Rate").unwrap();
        assert_eq!(rate.value, "1 Hz");
        assert_eq!(rate.options, "112=1 Hz, 113=2 Hz");
    }
}
