//! Sampling command handlers.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use sensorlink_core::{
    DataType, DurationUnit, IdleState, LogTransmitMode, NodeSession, OptionValue, RunPhase,
    SamplingDuration, SamplingParams, SamplingRunState, Severity,
};

use crate::cli::{
    DataTypeArg, GlobalOpts, ModeArg, SamplingArgs, SamplingCommand, StartArgs, UnitArg,
};
use crate::error::CliError;
use crate::output;

use super::{node, util};

// ── Arg conversions ─────────────────────────────────────────────────

impl From<ModeArg> for LogTransmitMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Log => Self::Log,
            ModeArg::Transmit => Self::Transmit,
            ModeArg::LogAndTransmit => Self::LogAndTransmit,
        }
    }
}

impl From<DataTypeArg> for DataType {
    fn from(d: DataTypeArg) -> Self {
        match d {
            DataTypeArg::Float => Self::Float,
            DataTypeArg::Calibrated => Self::Calibrated,
        }
    }
}

impl From<UnitArg> for DurationUnit {
    fn from(u: UnitArg) -> Self {
        match u {
            UnitArg::S => Self::Seconds,
            UnitArg::Min => Self::Minutes,
            UnitArg::H => Self::Hours,
        }
    }
}

// ── Detail builders ─────────────────────────────────────────────────

fn run_detail(s: &SamplingRunState, color: bool) -> String {
    let phase = match s.phase {
        RunPhase::Running => output::paint(Severity::Ok, "running", color),
        RunPhase::Idle => "idle".to_owned(),
    };
    let mut lines = vec![format!(
        "Run:        {phase}{}",
        s.run_id
            .as_deref()
            .map(|id| format!(" ({id})"))
            .unwrap_or_default()
    )];
    if let Some(rate) = s.sample_rate {
        lines.push(format!("Rate:       {rate}"));
    }
    if let Some(mode) = &s.mode_label {
        lines.push(format!("Mode:       {mode}"));
    }
    if let Some(dt) = &s.data_type {
        lines.push(format!("Data type:  {dt}"));
    }
    if s.continuous {
        lines.push("Duration:   continuous".into());
    } else if s.duration_sec > 0 {
        lines.push(format!("Duration:   {}", util::format_secs(s.duration_sec)));
    }
    if let Some(left) = s.time_left_sec {
        lines.push(format!("Time left:  {}", util::format_secs(left)));
    }
    if let Some(state) = &s.node_state {
        lines.push(format!("Node:       {state}"));
    }
    if let Some(link) = &s.link_state {
        lines.push(format!("Link:       {link}"));
    }
    if let Some(reason) = &s.freshness_reason {
        lines.push(format!("Freshness:  {reason}"));
    }
    lines.join("\n")
}

fn print_run(state: &SamplingRunState, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        state,
        |s| run_detail(s, color),
        |s| s.phase.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Rate resolution ─────────────────────────────────────────────────

/// An integer rate is sent as-is. Anything else (a label, or nothing) needs
/// the node's option list, so the node is set idle and read first.
async fn resolve_rate(
    session: &NodeSession,
    raw: Option<&str>,
    global: &GlobalOpts,
) -> Result<Option<OptionValue>, CliError> {
    if let Some(raw) = raw {
        let value = OptionValue::new(raw);
        if value.as_i64().is_some() {
            return Ok(Some(value));
        }
    }
    let snapshot = node::idle_then_read(session, global).await?;
    Ok(match raw {
        Some(raw) => util::resolve_option(&snapshot.sample_rate.options, raw),
        None => session.form().and_then(|f| f.sample_rate().cloned()),
    })
}

// ── Watching ────────────────────────────────────────────────────────

/// Poll the run until it leaves `Running`, or until Ctrl-C.
async fn watch(
    session: &NodeSession,
    initial: SamplingRunState,
    interval: Duration,
    global: &GlobalOpts,
) -> Result<SamplingRunState, CliError> {
    let pb = if global.quiet {
        ProgressBar::hidden()
    } else if initial.continuous || initial.duration_sec == 0 {
        util::spinner("Sampling (continuous)...", false)
    } else {
        let pb = ProgressBar::new(initial.duration_sec);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {msg}")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let mut state = initial;
    while state.phase == RunPhase::Running {
        if let Some(left) = state.time_left_sec {
            pb.set_position(state.duration_sec.saturating_sub(left));
            pb.set_message(format!("{} left", util::format_secs(left)));
        }
        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                pb.finish_and_clear();
                output::note("Stopped watching; the run continues", global.quiet);
                return Ok(state);
            }
        }
        match session.refresh_sampling_status().await {
            Ok(next) => state = next,
            Err(e) => {
                // Observational: a failed poll leaves the run view as it was.
                tracing::warn!(error = %e, "sampling status poll failed");
            }
        }
    }
    pb.finish_and_clear();
    Ok(state)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &NodeSession,
    args: SamplingArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SamplingCommand::Start(start) => {
            let StartArgs {
                rate,
                mode,
                data_type,
                continuous,
                duration,
                unit,
                watch: follow,
            } = start;

            let rate = resolve_rate(session, rate.as_deref(), global).await?;
            let params = SamplingParams {
                rate,
                mode: mode.into(),
                data_type: data_type.into(),
                duration: if continuous {
                    SamplingDuration::Continuous
                } else {
                    SamplingDuration::timed(&duration, unit.into())
                },
            };

            let pb = util::spinner("Starting sampling...", global.quiet);
            let state = session.start_sampling(params).await;
            pb.finish_and_clear();
            let mut state = state?;

            // The start acknowledgement carries no progress; poll once.
            if let Ok(polled) = session.refresh_sampling_status().await {
                state = polled;
            }
            if follow {
                state = watch(session, state, Duration::from_secs(2), global).await?;
            }
            print_run(&state, global)
        }

        SamplingCommand::Stop => {
            let pb = util::spinner("Stopping sampling...", global.quiet);
            let state = session.stop_sampling().await;
            pb.finish_and_clear();
            let mut state = state?;
            if let Ok(polled) = session.refresh_sampling_status().await {
                state = polled;
            }
            if session.idle_state() == IdleState::Confirmed {
                output::note("Node is idle", global.quiet);
            } else {
                output::note(
                    "Stop sent; idle not confirmed (run: sensorlink node idle)",
                    global.quiet,
                );
            }
            print_run(&state, global)
        }

        SamplingCommand::Status(status) => {
            let mut state = session.refresh_sampling_status().await?;
            if status.watch {
                let interval = Duration::from_secs(status.interval.max(1));
                state = watch(session, state, interval, global).await?;
            }
            print_run(&state, global)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn detail_shows_continuous_and_time_left() {
        let state = SamplingRunState {
            phase: RunPhase::Running,
            run_id: Some("r-1".into()),
            continuous: false,
            duration_sec: 3600,
            time_left_sec: Some(90),
            mode_label: Some("Log and Transmit".into()),
            ..SamplingRunState::default()
        };
        let text = run_detail(&state, false);
        assert!(text.contains("running (r-1)"));
        assert!(text.contains("Duration:   1h"));
        assert!(text.contains("Time left:  1m 30s"));

        let idle = SamplingRunState {
            continuous: true,
            ..SamplingRunState::default()
        };
        let text = run_detail(&idle, false);
        assert!(text.starts_with("Run:        idle"));
        assert!(text.contains("continuous"));
    }

    #[test]
    fn fractional_duration_flag_scales_to_seconds() {
        use crate::cli::{Cli, Command};
        use clap::Parser;

        let cli = Cli::try_parse_from([
            "sensorlink", "sampling", "start", "--duration", "1.5", "--unit", "min",
        ])
        .unwrap();
        let Command::Sampling(SamplingArgs {
            command: SamplingCommand::Start(start),
        }) = cli.command
        else {
            panic!("expected sampling start");
        };
        let duration = SamplingDuration::timed(&start.duration, start.unit.into());
        assert_eq!(duration.seconds(), 90);

        assert!(
            Cli::try_parse_from(["sensorlink", "sampling", "start", "--duration", "soon"]).is_err()
        );
    }

    #[test]
    fn unit_args_map_to_wire_units() {
        assert_eq!(DurationUnit::from(UnitArg::Min), DurationUnit::Minutes);
        assert_eq!(LogTransmitMode::from(ModeArg::LogAndTransmit).key(), "log_and_transmit");
        assert_eq!(DataType::from(DataTypeArg::Calibrated), DataType::Calibrated);
    }
}
