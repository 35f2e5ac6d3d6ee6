//! Backend log handler.

use sensorlink_core::NodeSession;

use crate::cli::{GlobalOpts, LogsArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    session: &NodeSession,
    args: LogsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut lines = session.logs().await?.logs;
    if let Some(n) = args.tail {
        let skip = lines.len().saturating_sub(n);
        lines.drain(..skip);
    }
    let out = output::render_single(
        &global.output,
        lines.as_slice(),
        |l| l.join("\n"),
        |l| l.join("\n"),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
