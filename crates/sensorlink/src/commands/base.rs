//! Base station command handlers.

use sensorlink_core::{BaseLinkView, CommandAck, NodeSession, Severity};

use crate::cli::{BaseArgs, BaseCommand, BeaconArg, GlobalOpts};
use crate::error::CliError;
use crate::output;

fn detail(view: &BaseLinkView, color: bool) -> String {
    let mut lines = vec![format!(
        "{}  {}",
        output::paint(view.severity, &view.pill, color),
        view.beacon_label()
    )];
    lines.extend(view.detail.iter().cloned());
    if !view.link_detail.is_empty() {
        lines.push(String::new());
        lines.push(output::accent("Link", color));
        lines.extend(view.link_detail.iter().map(|l| format!("  {l}")));
    }
    lines.join("\n")
}

fn report(ack: &CommandAck, fallback: &str, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let msg = ack.message.as_deref().unwrap_or(fallback);
    output::note(&output::paint(Severity::Ok, msg, color), global.quiet);
}

pub async fn handle(
    session: &NodeSession,
    args: BaseArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        BaseCommand::Status => {
            let color = output::should_color(&global.color);
            let status = session.base_status().await?;
            let view = BaseLinkView::from_status(&status);
            let out = output::render_single(
                &global.output,
                &view,
                |v| detail(v, color),
                |v| v.pill.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BaseCommand::Connect => {
            let ack = session.connect().await?;
            report(&ack, "Base station connected", global);
            Ok(())
        }

        BaseCommand::Disconnect => {
            let ack = session.disconnect().await?;
            report(&ack, "Base station disconnected", global);
            Ok(())
        }

        BaseCommand::Beacon { state } => {
            let target = match state {
                Some(BeaconArg::On) => Some(true),
                Some(BeaconArg::Off) => Some(false),
                None => {
                    // Toggling needs the current state; this process has none yet.
                    session.base_status().await?;
                    None
                }
            };
            let enabled = session.set_beacon(target).await?;
            output::note(
                if enabled { "Beacon: ON" } else { "Beacon: OFF" },
                global.quiet,
            );
            Ok(())
        }
    }
}
