// Base-station endpoints
//
// Link management (connect/reconnect/disconnect), status, beacon control
// and the backend's log ring.

use serde_json::json;
use tracing::debug;

use crate::client::BackendClient;
use crate::error::Error;
use crate::models::{BaseStatus, CommandAck, LogLines};

impl BackendClient {
    /// `POST /api/connect`
    pub async fn connect(&self) -> Result<CommandAck, Error> {
        let url = self.api_url("connect")?;
        debug!("connecting base station");
        self.post_empty(url).await
    }

    /// `POST /api/reconnect`
    pub async fn reconnect(&self) -> Result<CommandAck, Error> {
        let url = self.api_url("reconnect")?;
        debug!("reconnecting base station");
        self.post_empty(url).await
    }

    /// `POST /api/disconnect`
    pub async fn disconnect(&self) -> Result<CommandAck, Error> {
        let url = self.api_url("disconnect")?;
        debug!("disconnecting base station");
        self.post_empty(url).await
    }

    /// `GET /api/status`
    pub async fn base_status(&self) -> Result<BaseStatus, Error> {
        let url = self.api_url("status")?;
        self.get(url).await
    }

    /// `POST /api/beacon` with `{"enabled": bool}`
    pub async fn set_beacon(&self, enabled: bool) -> Result<CommandAck, Error> {
        let url = self.api_url("beacon")?;
        debug!(enabled, "setting base beacon");
        self.post(url, &json!({ "enabled": enabled })).await
    }

    /// `GET /api/logs`
    pub async fn logs(&self) -> Result<LogLines, Error> {
        let url = self.api_url("logs")?;
        self.get(url).await
    }
}
