//! Command dispatch: bridges CLI args -> NodeSession operations -> output formatting.

pub mod base;
pub mod config_cmd;
pub mod logs;
pub mod node;
pub mod sampling;
pub mod util;

use sensorlink_core::NodeSession;

use crate::cli::{Command, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;

pub async fn dispatch(cmd: Command, target: &Target, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Node(args) => node::handle(&node_session(target)?, args, global).await,
        Command::Sampling(args) => sampling::handle(&node_session(target)?, args, global).await,
        Command::Base(args) => base::handle(&base_session(target)?, args, global).await,
        Command::Logs(args) => logs::handle(&base_session(target)?, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

fn node_session(target: &Target) -> Result<NodeSession, CliError> {
    let node_id = target.require_node()?;
    Ok(NodeSession::new(&target.console, node_id)?)
}

/// Base-station commands never address the node, so one is optional.
fn base_session(target: &Target) -> Result<NodeSession, CliError> {
    Ok(NodeSession::new(
        &target.console,
        target.node_id.unwrap_or_default(),
    )?)
}
