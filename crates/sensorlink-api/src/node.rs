// Node endpoints
//
// Configuration read/write plus the single-shot node commands (probe, idle,
// sleep, power cycle, storage clear). Every command is scoped by the
// node's wireless address.

use tracing::debug;

use crate::client::BackendClient;
use crate::error::Error;
use crate::models::{CommandAck, Diagnostics, IdleAck, NodeConfig, WriteRequest};

impl BackendClient {
    /// Read the node's full configuration.
    ///
    /// `GET /api/read/{node}`
    pub async fn read_config(&self, node_id: u32) -> Result<NodeConfig, Error> {
        let url = self.node_url("read", node_id)?;
        debug!(node_id, "reading node configuration");
        self.get(url).await
    }

    /// Named feature flags for the node.
    ///
    /// `GET /api/diagnostics/{node}`
    pub async fn diagnostics(&self, node_id: u32) -> Result<Diagnostics, Error> {
        let url = self.node_url("diagnostics", node_id)?;
        self.get(url).await
    }

    /// Ping the node over the radio link.
    ///
    /// `GET /api/probe/{node}`
    pub async fn probe(&self, node_id: u32) -> Result<CommandAck, Error> {
        let url = self.node_url("probe", node_id)?;
        debug!(node_id, "probing node");
        self.get(url).await
    }

    /// Ask the node to enter idle. A successful answer does not mean idle
    /// was confirmed; check [`IdleAck::idle_confirmed`].
    ///
    /// `POST /api/node_idle/{node}`
    pub async fn set_idle(&self, node_id: u32) -> Result<IdleAck, Error> {
        let url = self.node_url("node_idle", node_id)?;
        debug!(node_id, "sending set-to-idle");
        self.post_empty(url).await
    }

    /// Put the node to sleep. Waking it requires a physical power cycle.
    ///
    /// `POST /api/node_sleep/{node}`
    pub async fn sleep(&self, node_id: u32) -> Result<CommandAck, Error> {
        let url = self.node_url("node_sleep", node_id)?;
        debug!(node_id, "sending sleep");
        self.post_empty(url).await
    }

    /// `POST /api/node_cycle_power/{node}`
    pub async fn cycle_power(&self, node_id: u32) -> Result<CommandAck, Error> {
        let url = self.node_url("node_cycle_power", node_id)?;
        debug!(node_id, "sending power cycle");
        self.post_empty(url).await
    }

    /// Erase the node's datalogging storage.
    ///
    /// `POST /api/clear_storage/{node}`
    pub async fn clear_storage(&self, node_id: u32) -> Result<CommandAck, Error> {
        let url = self.node_url("clear_storage", node_id)?;
        debug!(node_id, "clearing node storage");
        self.post_empty(url).await
    }

    /// Write a configuration payload.
    ///
    /// `POST /api/write`
    pub async fn write_config(&self, request: &WriteRequest) -> Result<CommandAck, Error> {
        let url = self.api_url("write")?;
        debug!(node_id = request.node_id, "writing node configuration");
        self.post(url, request).await
    }
}
