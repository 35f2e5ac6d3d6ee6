// Sampling-run endpoints

use tracing::debug;

use crate::client::BackendClient;
use crate::error::Error;
use crate::models::{SamplingStartAck, SamplingStartRequest, SamplingStatus, SamplingStopAck};

impl BackendClient {
    /// `POST /api/sampling/start/{node}`
    pub async fn start_sampling(
        &self,
        node_id: u32,
        request: &SamplingStartRequest,
    ) -> Result<SamplingStartAck, Error> {
        let url = self.node_url("sampling/start", node_id)?;
        debug!(
            node_id,
            mode = request.log_transmit_mode.key(),
            continuous = request.continuous,
            "starting sampling run"
        );
        self.post(url, request).await
    }

    /// `POST /api/sampling/stop/{node}`
    pub async fn stop_sampling(&self, node_id: u32) -> Result<SamplingStopAck, Error> {
        let url = self.node_url("sampling/stop", node_id)?;
        debug!(node_id, "stopping sampling run");
        self.post_empty(url).await
    }

    /// `GET /api/sampling/status/{node}`
    pub async fn sampling_status(&self, node_id: u32) -> Result<SamplingStatus, Error> {
        let url = self.node_url("sampling/status", node_id)?;
        self.get(url).await
    }
}
