// ── Sampling run controller ──
//
// Lifecycle of one sampling run: Idle → Running on a start acknowledgement,
// back to Idle on stop or when status polling says so. Polling is driven by
// the caller; nothing here schedules itself.

use serde::Serialize;
use strum::Display;
use tracing::{debug, info};

use sensorlink_api::models::{
    DataType, DurationUnit, LogTransmitMode, SamplingRun, SamplingStartRequest, SamplingStatus,
};

use crate::error::CoreError;
use crate::model::OptionValue;

/// Longest timed run the backend accepts.
pub const MAX_DURATION_SEC: u64 = 86_400;

/// Seconds for a timed run. The unit is matched by prefix (seconds when
/// unknown); see [`scaled_duration_sec`] for the value rules.
pub fn parse_duration_sec(raw_value: &str, raw_unit: &str, continuous: bool) -> u64 {
    if continuous {
        return 0;
    }
    let unit = raw_unit.parse::<DurationUnit>().unwrap_or_default();
    scaled_duration_sec(raw_value, unit)
}

/// `raw_value` × unit in whole seconds. Fractions are kept until after the
/// multiplication ("1.5" min is 90 s); negative or unparsable values become
/// 0 and the result is clamped to [`MAX_DURATION_SEC`].
#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn scaled_duration_sec(raw_value: &str, unit: DurationUnit) -> u64 {
    let value = raw_value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(0.0);
    let multiplier = match unit {
        DurationUnit::Seconds => 1.0,
        DurationUnit::Minutes => 60.0,
        DurationUnit::Hours => 3600.0,
    };
    // Clamped into [0, MAX_DURATION_SEC] before the cast.
    (value * multiplier)
        .trunc()
        .clamp(0.0, MAX_DURATION_SEC as f64) as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SamplingDuration {
    Continuous,
    Timed { seconds: u64 },
}

impl SamplingDuration {
    /// A timed run from operator input such as `("1.5", Minutes)`.
    pub fn timed(raw_value: &str, unit: DurationUnit) -> Self {
        Self::Timed {
            seconds: scaled_duration_sec(raw_value, unit),
        }
    }

    pub fn is_continuous(self) -> bool {
        matches!(self, Self::Continuous)
    }

    pub fn seconds(self) -> u64 {
        match self {
            Self::Continuous => 0,
            Self::Timed { seconds } => seconds.min(MAX_DURATION_SEC),
        }
    }
}

/// Operator's parameters for a new run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SamplingParams {
    pub rate: Option<OptionValue>,
    pub mode: LogTransmitMode,
    pub data_type: DataType,
    pub duration: SamplingDuration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
}

/// Locally held view of the node's sampling run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SamplingRunState {
    pub phase: RunPhase,
    pub run_id: Option<String>,
    pub sample_rate: Option<i64>,
    pub mode_label: Option<String>,
    pub data_type: Option<String>,
    pub continuous: bool,
    pub duration_sec: u64,
    pub time_left_sec: Option<u64>,
    pub node_state: Option<String>,
    pub link_state: Option<String>,
    pub freshness_reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SamplingRunController {
    state: SamplingRunState,
}

impl SamplingRunController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SamplingRunState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.phase == RunPhase::Running
    }

    /// Validate `params` into the backend request. A run needs a known rate.
    pub fn request(params: &SamplingParams) -> Result<SamplingStartRequest, CoreError> {
        let rate = params
            .rate
            .as_ref()
            .and_then(OptionValue::as_i64)
            .ok_or(CoreError::UnknownSampleRate)?;
        // Timed runs go out normalized to whole seconds.
        Ok(SamplingStartRequest {
            sample_rate: Some(rate),
            log_transmit_mode: params.mode,
            data_type: params.data_type,
            continuous: params.duration.is_continuous(),
            duration_value: params.duration.seconds(),
            duration_units: DurationUnit::Seconds,
        })
    }

    /// Start acknowledged: optimistically Running. A continuous run always
    /// carries duration 0; a timed one takes the acknowledged duration, else
    /// the locally computed one.
    pub fn on_started(&mut self, params: &SamplingParams, run: &SamplingRun) {
        let continuous = params.duration.is_continuous();
        let duration_sec = if continuous {
            0
        } else {
            run.duration_sec.unwrap_or_else(|| params.duration.seconds())
        };
        self.state = SamplingRunState {
            phase: RunPhase::Running,
            run_id: run.run_id.clone(),
            sample_rate: run
                .sample_rate
                .or_else(|| params.rate.as_ref().and_then(OptionValue::as_i64)),
            mode_label: run
                .mode_label
                .clone()
                .or_else(|| Some(params.mode.label().to_owned())),
            data_type: run.data_type.clone(),
            continuous,
            duration_sec,
            time_left_sec: (!continuous).then_some(duration_sec),
            ..SamplingRunState::default()
        };
        info!(continuous, duration_sec, "sampling started");
    }

    pub fn on_stopped(&mut self, run: Option<&SamplingRun>) {
        self.state.phase = RunPhase::Idle;
        self.state.time_left_sec = None;
        if let Some(run) = run {
            self.absorb_run(run);
            self.state.phase = RunPhase::Idle;
        }
        info!("sampling stopped");
    }

    /// Overwrite the local view with a status poll.
    pub fn on_status(&mut self, status: &SamplingStatus) {
        self.absorb_run(&status.run);
        self.state.time_left_sec = status.time_left_sec;
        self.state.node_state.clone_from(&status.node_state);
        self.state.link_state.clone_from(&status.link_state);
        self.state.freshness_reason.clone_from(&status.freshness_reason);
        debug!(phase = %self.state.phase, time_left_sec = ?status.time_left_sec, "sampling status");
    }

    fn absorb_run(&mut self, run: &SamplingRun) {
        self.state.phase = if run.state.as_deref() == Some("running") {
            RunPhase::Running
        } else {
            RunPhase::Idle
        };
        if run.run_id.is_some() {
            self.state.run_id.clone_from(&run.run_id);
        }
        if run.sample_rate.is_some() {
            self.state.sample_rate = run.sample_rate;
        }
        if run.mode_label.is_some() {
            self.state.mode_label.clone_from(&run.mode_label);
        }
        if run.data_type.is_some() {
            self.state.data_type.clone_from(&run.data_type);
        }
        if let Some(continuous) = run.continuous {
            self.state.continuous = continuous;
        }
        if let Some(duration) = run.duration_sec {
            self.state.duration_sec = if self.state.continuous { 0 } else { duration };
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn params(duration: SamplingDuration) -> SamplingParams {
        SamplingParams {
            rate: Some(OptionValue::from(1_i64)),
            mode: LogTransmitMode::Transmit,
            data_type: DataType::Float,
            duration,
        }
    }

    #[test]
    fn duration_math() {
        assert_eq!(parse_duration_sec("60", "s", false), 60);
        assert_eq!(parse_duration_sec("5", "min", false), 300);
        assert_eq!(parse_duration_sec("2", "hours", false), 7200);
        assert_eq!(parse_duration_sec("-4", "s", false), 0);
        assert_eq!(parse_duration_sec("abc", "s", false), 0);
        assert_eq!(parse_duration_sec("10", "fortnights", false), 10);
        assert_eq!(parse_duration_sec("48", "h", false), MAX_DURATION_SEC);
        assert_eq!(parse_duration_sec("60", "s", true), 0);
    }

    #[test]
    fn fractional_durations_scale_before_truncating() {
        assert_eq!(parse_duration_sec("1.5", "min", false), 90);
        assert_eq!(parse_duration_sec("0.25", "hours", false), 900);
        assert_eq!(parse_duration_sec("2.9", "s", false), 2);
        assert_eq!(parse_duration_sec("NaN", "s", false), 0);

        let p = params(SamplingDuration::timed("1.5", DurationUnit::Minutes));
        let req = SamplingRunController::request(&p).unwrap();
        assert!(!req.continuous);
        assert_eq!(req.duration_value, 90);
        assert_eq!(req.duration_units, DurationUnit::Seconds);
    }

    #[test]
    fn request_requires_rate() {
        let mut p = params(SamplingDuration::Continuous);
        p.rate = None;
        assert!(matches!(
            SamplingRunController::request(&p),
            Err(CoreError::UnknownSampleRate)
        ));
    }

    #[test]
    fn continuous_request_and_ack() {
        let p = params(SamplingDuration::Continuous);
        let req = SamplingRunController::request(&p).unwrap();
        assert!(req.continuous);
        assert_eq!(req.duration_value, 0);

        let mut ctl = SamplingRunController::new();
        // A stale duration in the ack must not leak into a continuous run.
        let run: SamplingRun =
            serde_json::from_value(json!({"duration_sec": 600, "mode_label": "Transmit"})).unwrap();
        ctl.on_started(&p, &run);
        assert!(ctl.is_running());
        assert!(ctl.state().continuous);
        assert_eq!(ctl.state().duration_sec, 0);
        assert_eq!(ctl.state().time_left_sec, None);
    }

    #[test]
    fn timed_run_uses_ack_duration_or_local() {
        let p = params(SamplingDuration::Timed { seconds: 60 });
        let mut ctl = SamplingRunController::new();
        ctl.on_started(&p, &SamplingRun::default());
        assert_eq!(ctl.state().duration_sec, 60);
        assert!(!ctl.state().continuous);
        assert_eq!(ctl.state().mode_label.as_deref(), Some("Transmit"));

        let run: SamplingRun = serde_json::from_value(json!({"duration_sec": 59})).unwrap();
        ctl.on_started(&p, &run);
        assert_eq!(ctl.state().duration_sec, 59);
    }

    #[test]
    fn status_overwrites_local_view() {
        let mut ctl = SamplingRunController::new();
        ctl.on_started(&params(SamplingDuration::Continuous), &SamplingRun::default());

        let status: SamplingStatus = serde_json::from_value(json!({
            "node_state": "Idle",
            "link_state": "online",
            "run": {"state": "stopped", "mode_label": "Log"},
            "time_left_sec": 0,
        }))
        .unwrap();
        ctl.on_status(&status);
        assert_eq!(ctl.state().phase, RunPhase::Idle);
        assert_eq!(ctl.state().mode_label.as_deref(), Some("Log"));
        assert_eq!(ctl.state().node_state.as_deref(), Some("Idle"));

        let status: SamplingStatus = serde_json::from_value(json!({
            "run": {"state": "running", "continuous": false, "duration_sec": 120},
            "time_left_sec": 42,
        }))
        .unwrap();
        ctl.on_status(&status);
        assert!(ctl.is_running());
        assert_eq!(ctl.state().duration_sec, 120);
        assert_eq!(ctl.state().time_left_sec, Some(42));
    }

    #[test]
    fn stop_returns_to_idle() {
        let mut ctl = SamplingRunController::new();
        ctl.on_started(&params(SamplingDuration::Continuous), &SamplingRun::default());
        ctl.on_stopped(None);
        assert_eq!(ctl.state().phase, RunPhase::Idle);
    }
}
