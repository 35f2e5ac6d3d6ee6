// ── Node session ──
//
// One operator panel bound to one node. Owns the idle gate, the latest
// snapshot with its capability flags, the editable form and the sampling
// run view. Every backend outcome is fed through here so that state
// transitions happen in one place.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use strum::Display;
use tracing::{debug, info, warn};

use sensorlink_api::BackendClient;
use sensorlink_api::models::{
    BaseStatus, CommandAck, Diagnostics, IdleAck, LogLines, WriteRequest,
};

use crate::capability::CapabilityFlags;
use crate::config::ConsoleConfig;
use crate::convert::snapshot_from_config;
use crate::error::CoreError;
use crate::form::NodeForm;
use crate::idle::{IdleGate, IdleState, StateChangingCommand};
use crate::model::ConfigurationSnapshot;
use crate::payload::WritePayloadBuilder;
use crate::sampling::{SamplingParams, SamplingRunController, SamplingRunState};

// ── Actions ──────────────────────────────────────────────────────────

/// Operator actions that may not overlap with themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "title_case")]
pub enum Action {
    Connect,
    Disconnect,
    Beacon,
    Read,
    Write,
    SetIdle,
    Probe,
    Sleep,
    CyclePower,
    ClearStorage,
    StartSampling,
    StopSampling,
}

impl Action {
    /// Read and Write share one slot: neither may start while the other
    /// is outstanding against the same node.
    fn slot(self) -> Self {
        match self {
            Self::Write => Self::Read,
            other => other,
        }
    }
}

/// Held while an action is outstanding; releases its slot on drop.
struct InFlight<'a> {
    slots: &'a Mutex<HashSet<Action>>,
    slot: Action,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.slots).remove(&self.slot);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Session state ────────────────────────────────────────────────────

#[derive(Default)]
struct SessionState {
    gate: IdleGate,
    snapshot: Option<Arc<ConfigurationSnapshot>>,
    caps: CapabilityFlags,
    form: Option<NodeForm>,
    sampling: SamplingRunController,
    beacon: Option<bool>,
}

/// A successful write: what was sent and the backend's reply.
#[derive(Debug, Clone, Serialize)]
pub struct WriteReceipt {
    pub request: WriteRequest,
    pub message: Option<String>,
}

// ── NodeSession ──────────────────────────────────────────────────────

/// Session-scoped state for one node, cheaply cloneable.
///
/// Network calls are the only suspension points; state is locked only
/// between them, so status polling and log fetches never wait on an
/// outstanding read or write.
#[derive(Clone)]
pub struct NodeSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: BackendClient,
    node_id: u32,
    state: Mutex<SessionState>,
    in_flight: Mutex<HashSet<Action>>,
}

impl NodeSession {
    /// Build a session for `node_id` against the configured backend.
    pub fn new(config: &ConsoleConfig, node_id: u32) -> Result<Self, CoreError> {
        let client = BackendClient::new(config.backend_url.clone(), &config.transport())?;
        Ok(Self::with_client(client, node_id))
    }

    pub fn with_client(client: BackendClient, node_id: u32) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                client,
                node_id,
                state: Mutex::new(SessionState::default()),
                in_flight: Mutex::new(HashSet::new()),
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn node_id(&self) -> u32 {
        self.inner.node_id
    }

    pub fn idle_state(&self) -> IdleState {
        self.state().gate.state()
    }

    pub fn snapshot(&self) -> Option<Arc<ConfigurationSnapshot>> {
        self.state().snapshot.clone()
    }

    pub fn capabilities(&self) -> CapabilityFlags {
        self.state().caps.clone()
    }

    pub fn form(&self) -> Option<NodeForm> {
        self.state().form.clone()
    }

    pub fn sampling_state(&self) -> SamplingRunState {
        self.state().sampling.state().clone()
    }

    /// Beacon state from the last base-status poll or beacon command.
    pub fn beacon_state(&self) -> Option<bool> {
        self.state().beacon
    }

    pub fn is_busy(&self, action: Action) -> bool {
        lock(&self.inner.in_flight).contains(&action.slot())
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.inner.state)
    }

    fn begin(&self, action: Action) -> Result<InFlight<'_>, CoreError> {
        let slot = action.slot();
        if !lock(&self.inner.in_flight).insert(slot) {
            return Err(CoreError::Busy {
                action: slot.to_string(),
            });
        }
        Ok(InFlight {
            slots: &self.inner.in_flight,
            slot,
        })
    }

    /// Record a command failure against the gate and name the operation.
    fn failed(&self, operation: &str, err: sensorlink_api::Error) -> CoreError {
        let err = CoreError::from(err).during(operation);
        warn!(node_id = self.inner.node_id, operation, error = %err, "command failed");
        self.state().gate.observe_failure(operation);
        err
    }

    // ── Base station ─────────────────────────────────────────────────

    /// Connect the base station, retrying once through reconnect when the
    /// backend reports failure. Idle confirmation is revoked either way.
    pub async fn connect(&self) -> Result<CommandAck, CoreError> {
        let _guard = self.begin(Action::Connect)?;
        let client = &self.inner.client;
        let result = match client.connect().await {
            Err(e) if e.is_backend_rejection() => {
                debug!(error = %e, "connect rejected, trying reconnect");
                self.state().gate.observe_command(StateChangingCommand::Reconnect);
                client.reconnect().await
            }
            other => other,
        };
        self.state().gate.observe_command(StateChangingCommand::Connect);
        match result {
            Ok(ack) => {
                info!("base station connected");
                Ok(ack)
            }
            Err(e) => Err(self.failed("connect", e)),
        }
    }

    pub async fn disconnect(&self) -> Result<CommandAck, CoreError> {
        let _guard = self.begin(Action::Disconnect)?;
        let result = self.inner.client.disconnect().await;
        self.state().gate.observe_command(StateChangingCommand::Disconnect);
        match result {
            Ok(ack) => {
                info!("base station disconnected");
                Ok(ack)
            }
            Err(e) => Err(self.failed("disconnect", e)),
        }
    }

    /// Poll the base station. Observational: never touches the gate.
    pub async fn base_status(&self) -> Result<BaseStatus, CoreError> {
        let status = self
            .inner
            .client
            .base_status()
            .await
            .map_err(|e| CoreError::from(e).during("base status"))?;
        self.state().beacon = status.beacon_state;
        Ok(status)
    }

    /// Switch the beacon. Without an explicit target the last known state
    /// is inverted (unknown counts as off). Returns the state requested.
    pub async fn set_beacon(&self, enabled: Option<bool>) -> Result<bool, CoreError> {
        let _guard = self.begin(Action::Beacon)?;
        let target = enabled.unwrap_or_else(|| self.state().beacon != Some(true));
        match self.inner.client.set_beacon(target).await {
            Ok(_) => {
                self.state().beacon = Some(target);
                info!(enabled = target, "beacon switched");
                Ok(target)
            }
            Err(e) => Err(self.failed("beacon", e)),
        }
    }

    pub async fn logs(&self) -> Result<LogLines, CoreError> {
        self.inner
            .client
            .logs()
            .await
            .map_err(|e| CoreError::from(e).during("logs"))
    }

    // ── Node configuration ───────────────────────────────────────────

    /// Read the node configuration. Requires confirmed idle; the result
    /// replaces the snapshot, capability flags and form wholesale.
    pub async fn read(&self) -> Result<Arc<ConfigurationSnapshot>, CoreError> {
        let _guard = self.begin(Action::Read)?;
        self.state().gate.require_confirmed()?;

        let node_id = self.inner.node_id;
        match self.inner.client.read_config(node_id).await {
            Ok(cfg) => {
                let snapshot = Arc::new(snapshot_from_config(node_id, cfg, Utc::now()));
                let caps = CapabilityFlags::derive(&snapshot);
                let mut state = self.state();
                state.gate.observe_read(snapshot.state_code);
                state.form = Some(NodeForm::from_snapshot(&snapshot));
                state.caps = caps;
                state.snapshot = Some(Arc::clone(&snapshot));
                debug!(node_id, state = ?snapshot.state_code, "configuration read");
                Ok(snapshot)
            }
            Err(e) => {
                let err = CoreError::from(e).during("read");
                warn!(node_id, error = %err, "read failed");
                self.state().gate.observe_read_failed();
                Err(err)
            }
        }
    }

    pub async fn diagnostics(&self) -> Result<Diagnostics, CoreError> {
        self.inner
            .client
            .diagnostics(self.inner.node_id)
            .await
            .map_err(|e| CoreError::from(e).during("diagnostics"))
    }

    /// Apply edits to the form. Fails if nothing has been read yet.
    pub fn edit_form<R>(
        &self,
        edit: impl FnOnce(&mut NodeForm) -> Result<R, CoreError>,
    ) -> Result<R, CoreError> {
        let mut state = self.state();
        let form = state.form.as_mut().ok_or(CoreError::NoSnapshot {
            node_id: self.inner.node_id,
        })?;
        edit(form)
    }

    /// Build the write payload from the current form without sending it.
    pub fn preview_write(&self) -> Result<WriteRequest, CoreError> {
        let state = self.state();
        state.gate.require_confirmed()?;
        let (Some(snapshot), Some(form)) = (&state.snapshot, &state.form) else {
            return Err(CoreError::NoSnapshot {
                node_id: self.inner.node_id,
            });
        };
        WritePayloadBuilder::new(snapshot, &state.caps, &state.gate).build(form)
    }

    /// Validate and send the form. Local validation failures never reach
    /// the backend; a rejected write revokes idle confirmation.
    pub async fn write(&self) -> Result<WriteReceipt, CoreError> {
        let _guard = self.begin(Action::Write)?;
        let request = self.preview_write()?;
        match self.inner.client.write_config(&request).await {
            Ok(ack) => {
                info!(node_id = request.node_id, "configuration written");
                Ok(WriteReceipt {
                    request,
                    message: ack.message,
                })
            }
            Err(e) => Err(self.failed("write", e)),
        }
    }

    // ── Node commands ────────────────────────────────────────────────

    /// Ask the node to go idle. Only an explicit `idle_confirmed` confirms.
    pub async fn set_idle(&self) -> Result<IdleAck, CoreError> {
        let _guard = self.begin(Action::SetIdle)?;
        match self.inner.client.set_idle(self.inner.node_id).await {
            Ok(ack) => {
                self.state().gate.observe_idle_result(ack.idle_confirmed);
                info!(
                    node_id = self.inner.node_id,
                    confirmed = ack.idle_confirmed,
                    "idle requested"
                );
                Ok(ack)
            }
            Err(e) => Err(self.failed("set idle", e)),
        }
    }

    pub async fn probe(&self) -> Result<CommandAck, CoreError> {
        let _guard = self.begin(Action::Probe)?;
        let result = self.inner.client.probe(self.inner.node_id).await;
        self.state_changing(StateChangingCommand::Probe, result)
    }

    pub async fn sleep(&self) -> Result<CommandAck, CoreError> {
        let _guard = self.begin(Action::Sleep)?;
        let result = self.inner.client.sleep(self.inner.node_id).await;
        self.state_changing(StateChangingCommand::Sleep, result)
    }

    pub async fn cycle_power(&self) -> Result<CommandAck, CoreError> {
        let _guard = self.begin(Action::CyclePower)?;
        let result = self.inner.client.cycle_power(self.inner.node_id).await;
        self.state_changing(StateChangingCommand::CyclePower, result)
    }

    fn state_changing(
        &self,
        command: StateChangingCommand,
        result: Result<CommandAck, sensorlink_api::Error>,
    ) -> Result<CommandAck, CoreError> {
        self.state().gate.observe_command(command);
        match result {
            Ok(ack) => {
                info!(node_id = self.inner.node_id, %command, "node command sent");
                Ok(ack)
            }
            Err(e) => Err(self.failed(&command.to_string(), e)),
        }
    }

    /// Erase the node's datalogging storage. Only offered once a read has
    /// identified the node.
    pub async fn clear_storage(&self) -> Result<CommandAck, CoreError> {
        let _guard = self.begin(Action::ClearStorage)?;
        if self.state().snapshot.is_none() {
            return Err(CoreError::NoSnapshot {
                node_id: self.inner.node_id,
            });
        }
        match self.inner.client.clear_storage(self.inner.node_id).await {
            Ok(ack) => {
                info!(node_id = self.inner.node_id, "storage cleared");
                Ok(ack)
            }
            Err(e) => Err(self.failed("clear storage", e)),
        }
    }

    // ── Sampling ─────────────────────────────────────────────────────

    /// Start a run. Without an explicit rate the form's rate is used.
    pub async fn start_sampling(
        &self,
        mut params: SamplingParams,
    ) -> Result<SamplingRunState, CoreError> {
        let _guard = self.begin(Action::StartSampling)?;
        if params.rate.is_none() {
            params.rate = self
                .state()
                .form
                .as_ref()
                .and_then(|f| f.sample_rate().cloned());
        }
        let request = SamplingRunController::request(&params)?;

        let result = self
            .inner
            .client
            .start_sampling(self.inner.node_id, &request)
            .await;
        self.state()
            .gate
            .observe_command(StateChangingCommand::StartSampling);
        match result {
            Ok(ack) => {
                let mut state = self.state();
                state.sampling.on_started(&params, &ack.run);
                Ok(state.sampling.state().clone())
            }
            Err(e) => Err(self.failed("start sampling", e)),
        }
    }

    /// Stop the run. Idle is confirmed only if the node reports it.
    pub async fn stop_sampling(&self) -> Result<SamplingRunState, CoreError> {
        let _guard = self.begin(Action::StopSampling)?;
        match self.inner.client.stop_sampling(self.inner.node_id).await {
            Ok(ack) => {
                let confirmed = ack
                    .idle_status
                    .as_ref()
                    .is_some_and(|s| s.state_confirmed);
                let mut state = self.state();
                state.gate.observe_stop(confirmed);
                state.sampling.on_stopped(ack.run.as_ref());
                Ok(state.sampling.state().clone())
            }
            Err(e) => Err(self.failed("stop sampling", e)),
        }
    }

    /// Poll the run. Observational: overwrites the run view, never the gate.
    pub async fn refresh_sampling_status(&self) -> Result<SamplingRunState, CoreError> {
        let status = self
            .inner
            .client
            .sampling_status(self.inner.node_id)
            .await
            .map_err(|e| CoreError::from(e).during("sampling status"))?;
        let mut state = self.state();
        state.sampling.on_status(&status);
        Ok(state.sampling.state().clone())
    }
}
