// ── Read summary ──
//
// The status line shown after a read, as labelled parts with a severity
// each so the binary can colour them.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::model::{ConfigurationSnapshot, channel_label};
use crate::staleness::{Severity, classify_last_comm, classify_storage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryPart {
    pub label: &'static str,
    pub value: String,
    pub severity: Severity,
}

impl SummaryPart {
    fn plain(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            severity: Severity::Unknown,
        }
    }
}

/// Summary parts for `snapshot`, in display order. Absent facts are skipped.
pub fn read_summary(snapshot: &ConfigurationSnapshot, now: DateTime<Utc>) -> Vec<SummaryPart> {
    let mut parts = vec![
        SummaryPart::plain("Model", snapshot.model.as_deref().unwrap_or("N/A")),
        SummaryPart::plain("FW", snapshot.firmware.as_deref().unwrap_or("N/A")),
    ];
    if let Some(addr) = &snapshot.node_address {
        parts.push(SummaryPart::plain("Node Address", addr.clone()));
    }

    if let Some(raw) = snapshot.last_comm.as_deref().filter(|s| !s.is_empty()) {
        let staleness = classify_last_comm(Some(raw), now);
        let shown = staleness.at.map_or_else(
            || raw.to_owned(),
            |at| {
                at.with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            },
        );
        let value = match staleness.age_secs {
            Some(age) if staleness.severity.is_alarming() => format!("{shown} ({age}s ago)"),
            _ => shown,
        };
        parts.push(SummaryPart {
            label: "Last Comm",
            value,
            severity: staleness.severity,
        });
    }

    if let Some(text) = &snapshot.state_text {
        let value = match snapshot.state_code {
            Some(code) => format!("{text} ({code})"),
            None => text.clone(),
        };
        let severity = match snapshot.state_code {
            Some(code) if code != 0 => Severity::Warn,
            _ => Severity::Unknown,
        };
        parts.push(SummaryPart {
            label: "State",
            value,
            severity,
        });
    }

    if let Some(text) = &snapshot.comm_protocol_text {
        let value = match snapshot.comm_protocol {
            Some(code) => format!("{text} ({code})"),
            None => text.clone(),
        };
        parts.push(SummaryPart::plain("Comm Protocol", value));
    }
    if let Some(region) = &snapshot.region {
        parts.push(SummaryPart::plain("Region", region.clone()));
    }
    if let Some(freq) = &snapshot.frequency {
        parts.push(SummaryPart::plain("Frequency", freq.clone()));
    }
    if let Some(power) = snapshot.tx_power.current {
        parts.push(SummaryPart::plain("Radio Power", format!("{power} dBm")));
    }
    if let Some(range) = snapshot.input_range.current_label() {
        parts.push(SummaryPart::plain("Input Range", range));
    }

    let channels: Vec<String> = snapshot
        .enabled_channels()
        .into_iter()
        .map(channel_label)
        .collect();
    if !channels.is_empty() {
        parts.push(SummaryPart::plain("Active Channels", channels.join(", ")));
    }

    if let Some(mode) = &snapshot.sampling_mode {
        parts.push(SummaryPart::plain("Sampling", mode.clone()));
    }
    if let Some(mode) = snapshot.data_mode.current.as_ref().filter(|m| m.as_str() != "1") {
        parts.push(SummaryPart::plain("Data Mode", mode.to_string()));
    }
    if let Some(pct) = snapshot.storage_pct {
        parts.push(SummaryPart {
            label: "Storage",
            value: format!("{pct}%"),
            severity: classify_storage(Some(pct)),
        });
    }
    parts
}

/// `Label: value | Label: value` without styling.
pub fn render_plain(parts: &[SummaryPart]) -> String {
    parts
        .iter()
        .map(|p| format!("{}: {}", p.label, p.value))
        .collect::<Vec<_>>()
        .join(" | ")
}
