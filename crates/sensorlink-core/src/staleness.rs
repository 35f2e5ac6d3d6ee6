// ── Staleness and link health ──
//
// Severity buckets for last-communication age, storage usage and the
// base-station link. Pure functions; rendering lives in the binary.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

use sensorlink_api::models::BaseStatus;

/// Age at or below which a timestamp is fresh.
pub const WARN_AFTER_SECS: f64 = 30.0;
/// Age above which a timestamp is critical.
pub const CRITICAL_AFTER_SECS: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Ok,
    Warn,
    Critical,
    /// Missing or unparsable input; rendered as plain text.
    Unknown,
}

impl Severity {
    pub fn is_alarming(self) -> bool {
        matches!(self, Self::Warn | Self::Critical)
    }
}

pub fn classify_age_secs(age: f64) -> Severity {
    if age.is_nan() {
        Severity::Unknown
    } else if age <= WARN_AFTER_SECS {
        Severity::Ok
    } else if age <= CRITICAL_AFTER_SECS {
        Severity::Warn
    } else {
        Severity::Critical
    }
}

/// Parse a node timestamp. Naive `YYYY-MM-DD HH:MM:SS[.f]` is UTC; RFC 3339
/// is also accepted.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// A classified timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Staleness {
    pub severity: Severity,
    pub at: Option<DateTime<Utc>>,
    pub age_secs: Option<i64>,
}

pub fn classify_last_comm(raw: Option<&str>, now: DateTime<Utc>) -> Staleness {
    let Some(at) = raw.and_then(parse_timestamp) else {
        return Staleness {
            severity: Severity::Unknown,
            at: None,
            age_secs: None,
        };
    };
    let age = now.signed_duration_since(at);
    let age_ms = age.num_milliseconds();
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    let age_f = age_ms as f64 / 1000.0;
    Staleness {
        severity: classify_age_secs(age_f),
        at: Some(at),
        age_secs: Some(age.num_seconds()),
    }
}

/// Storage usage: below 70 % ok, 70 to 90 % inclusive warn, above 90 % critical.
pub fn classify_storage(pct: Option<f64>) -> Severity {
    match pct {
        Some(p) if p.is_nan() => Severity::Unknown,
        Some(p) if p > 90.0 => Severity::Critical,
        Some(p) if p >= 70.0 => Severity::Warn,
        Some(_) => Severity::Ok,
        None => Severity::Unknown,
    }
}

// ── Base-station link ────────────────────────────────────────────────

/// Link health as judged by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LinkHealth {
    Healthy,
    Degraded,
    Offline,
}

impl LinkHealth {
    pub fn severity(self) -> Severity {
        match self {
            Self::Healthy => Severity::Ok,
            Self::Degraded => Severity::Warn,
            Self::Offline => Severity::Critical,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Degraded => "Degraded",
            Self::Offline => "Offline",
        }
    }
}

/// Display model of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseLinkView {
    pub pill: String,
    pub severity: Severity,
    pub connected: bool,
    pub link_health: Option<LinkHealth>,
    pub beacon: Option<bool>,
    /// Identity and connection facts.
    pub detail: Vec<String>,
    /// Link diagnostics; empty when the backend reports none.
    pub link_detail: Vec<String>,
}

impl BaseLinkView {
    pub fn from_status(status: &BaseStatus) -> Self {
        let link_health = status
            .link_health
            .as_deref()
            .and_then(|h| h.trim().parse::<LinkHealth>().ok());

        let (pill, severity) = match link_health {
            Some(h) => (format!("Link: {}", h.title()), h.severity()),
            None if status.connected => ("Connected".to_owned(), Severity::Ok),
            None => ("Disconnected".to_owned(), Severity::Critical),
        };

        let mut detail = vec![
            format!("Status: {}", status.message.as_deref().unwrap_or("N/A")),
            format!("Port: {}", status.port.as_deref().unwrap_or("N/A")),
            format!("Last: {}", status.ts.as_deref().unwrap_or("N/A")),
        ];
        push_some(&mut detail, "Model", status.base_model.as_deref());
        push_some(&mut detail, "FW", status.base_fw.as_deref());
        push_some(&mut detail, "S/N", status.base_serial.as_deref());
        push_some(&mut detail, "Connection", status.base_connection.as_deref());
        push_some(&mut detail, "Region", status.base_region.as_deref());
        push_some(&mut detail, "Radio", status.base_radio.as_deref());

        let mut link_detail = Vec::new();
        push_some(&mut link_detail, "Last Comm", status.base_last_comm.as_deref());
        push_some(&mut link_detail, "State", status.base_link.as_deref());
        push_some(&mut link_detail, "Link Health", status.link_health.as_deref());
        push_some(&mut link_detail, "Reason", status.link_health_reason.as_deref());
        if let Some(age) = status.ping_age_sec {
            link_detail.push(format!("Ping Age: {age}s"));
        }
        if let Some(age) = status.comm_age_sec {
            link_detail.push(format!("Comm Age: {age}s"));
        }

        Self {
            pill,
            severity,
            connected: status.connected,
            link_health,
            beacon: status.beacon_state,
            detail,
            link_detail,
        }
    }

    pub fn beacon_label(&self) -> &'static str {
        match self.beacon {
            Some(true) => "Beacon: ON",
            Some(false) => "Beacon: OFF",
            None => "Beacon: ?",
        }
    }
}

fn push_some(lines: &mut Vec<String>, key: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        lines.push(format!("{key}: {v}"));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn age_buckets() {
        assert_eq!(classify_age_secs(0.0), Severity::Ok);
        assert_eq!(classify_age_secs(30.0), Severity::Ok);
        assert_eq!(classify_age_secs(30.001), Severity::Warn);
        assert_eq!(classify_age_secs(120.0), Severity::Warn);
        assert_eq!(classify_age_secs(120.5), Severity::Critical);
        assert_eq!(classify_age_secs(f64::NAN), Severity::Unknown);
        for a in 0..=30 {
            assert_eq!(classify_age_secs(f64::from(a)), Severity::Ok);
        }
        for a in 31..=120 {
            assert_eq!(classify_age_secs(f64::from(a)), Severity::Warn);
        }
        for a in 121..1000 {
            assert_eq!(classify_age_secs(f64::from(a)), Severity::Critical);
        }
    }

    #[test]
    fn last_comm_is_utc() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 45).unwrap();
        let s = classify_last_comm(Some("2024-05-01 12:00:00"), now);
        assert_eq!(s.severity, Severity::Warn);
        assert_eq!(s.age_secs, Some(45));

        let s = classify_last_comm(Some("2024-05-01 11:50:00.250"), now);
        assert_eq!(s.severity, Severity::Critical);

        let s = classify_last_comm(Some("2024-05-01T12:00:30Z"), now);
        assert_eq!(s.severity, Severity::Ok);
    }

    #[test]
    fn unparsable_last_comm_is_unknown() {
        let now = Utc::now();
        assert_eq!(classify_last_comm(None, now).severity, Severity::Unknown);
        assert_eq!(classify_last_comm(Some(""), now).severity, Severity::Unknown);
        assert_eq!(
            classify_last_comm(Some("yesterday"), now).severity,
            Severity::Unknown
        );
        assert!(!Severity::Unknown.is_alarming());
    }

    #[test]
    fn storage_buckets() {
        assert_eq!(classify_storage(Some(0.0)), Severity::Ok);
        assert_eq!(classify_storage(Some(69.9)), Severity::Ok);
        assert_eq!(classify_storage(Some(70.0)), Severity::Warn);
        assert_eq!(classify_storage(Some(90.0)), Severity::Warn);
        assert_eq!(classify_storage(Some(90.1)), Severity::Critical);
        assert_eq!(classify_storage(None), Severity::Unknown);
        assert_eq!(classify_storage(Some(f64::NAN)), Severity::Unknown);
    }

    #[test]
    fn link_health_overrides_connection_pill() {
        let status: BaseStatus = serde_json::from_value(json!({
            "connected": true,
            "link_health": "degraded",
            "link_health_reason": "ping stale",
            "ping_age_sec": 42.5,
            "beacon_state": false,
        }))
        .unwrap();
        let view = BaseLinkView::from_status(&status);
        assert_eq!(view.pill, "Link: Degraded");
        assert_eq!(view.severity, Severity::Warn);
        assert_eq!(view.beacon_label(), "Beacon: OFF");
        assert!(view.link_detail.contains(&"Reason: ping stale".to_owned()));
        assert!(view.link_detail.contains(&"Ping Age: 42.5s".to_owned()));
    }

    #[test]
    fn connection_pill_without_health() {
        let status: BaseStatus = serde_json::from_value(json!({"connected": false})).unwrap();
        let view = BaseLinkView::from_status(&status);
        assert_eq!(view.pill, "Disconnected");
        assert_eq!(view.severity, Severity::Critical);
        assert_eq!(view.beacon_label(), "Beacon: ?");
        assert!(view.link_detail.is_empty());

        let status: BaseStatus =
            serde_json::from_value(json!({"connected": true, "link_health": "OFFLINE"})).unwrap();
        assert_eq!(BaseLinkView::from_status(&status).pill, "Link: Offline");
    }
}
